//! Stances, predictions and the analysis context handed to a predictor.

use crate::domain::history::HistoryStore;
use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stance {
    Buy,
    Sell,
    None,
}

impl Stance {
    /// +1 for buy, -1 for sell, 0 for no action.
    pub fn signal(self) -> i8 {
        match self {
            Stance::Buy => 1,
            Stance::Sell => -1,
            Stance::None => 0,
        }
    }
}

impl fmt::Display for Stance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stance::Buy => write!(f, "buy"),
            Stance::Sell => write!(f, "sell"),
            Stance::None => write!(f, "none"),
        }
    }
}

/// A stance taken on `date` at `reference_price` (that day's close).
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub stance: Stance,
    pub reference_price: f64,
    pub date: NaiveDate,
}

/// Everything a predictor may look at for one simulated day.
///
/// The context owns its snapshot, so a predictor holding it can never reach
/// bars past the simulated day.
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    pub symbol: String,
    pub snapshot: HistoryStore,
    pub studies: HashMap<IndicatorType, IndicatorSeries>,
}

impl AnalysisContext {
    pub fn new(symbol: impl Into<String>, snapshot: HistoryStore) -> Self {
        Self {
            symbol: symbol.into(),
            snapshot,
            studies: HashMap::new(),
        }
    }

    pub fn study(&self, indicator: &IndicatorType) -> Option<&IndicatorSeries> {
        self.studies.get(indicator)
    }
}
