//! Prediction verification against the bars that followed it.
//!
//! The verification window is `[index, index + horizon)` of the full
//! history, where `index` is the prediction date's position. It includes
//! the prediction day itself and is clipped at the end of history.
//!
//! Two methods are supported:
//! - `order`: the stance is treated as an order that must move at least
//!   `threshold_pct` in its favour within the window. A buy at 100 with a
//!   5% threshold needs some day's high strictly above 105; a sell needs
//!   some day's low strictly below 95. An exact 5% move does not count.
//! - `direction`: the mean close across the window must be strictly above
//!   (buy) or below (sell) the reference price.
//!
//! A `none` stance is never scored. A window shorter than the horizon that
//! cannot settle the outcome is reported as insufficient data, never as a
//! failure. On such a window an order is only settled by a bar after the
//! prediction day.

use crate::domain::date_index;
use crate::domain::error::TimeMachineError;
use crate::domain::history::HistoryStore;
use crate::domain::ohlcv::Bar;
use crate::domain::prediction::{Prediction, Stance};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_HORIZON: usize = 60;
pub const DEFAULT_THRESHOLD_PCT: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationMethod {
    #[default]
    Direction,
    Order,
}

impl fmt::Display for VerificationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationMethod::Direction => write!(f, "direction"),
            VerificationMethod::Order => write!(f, "order"),
        }
    }
}

impl FromStr for VerificationMethod {
    type Err = TimeMachineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "direction" => Ok(VerificationMethod::Direction),
            "order" => Ok(VerificationMethod::Order),
            other => Err(TimeMachineError::InvalidParameter {
                name: "method".into(),
                reason: format!("expected direction or order, got {:?}", other),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerifyParams {
    pub horizon: usize,
    pub method: VerificationMethod,
    pub threshold_pct: f64,
}

impl Default for VerifyParams {
    fn default() -> Self {
        Self {
            horizon: DEFAULT_HORIZON,
            method: VerificationMethod::default(),
            threshold_pct: DEFAULT_THRESHOLD_PCT,
        }
    }
}

impl VerifyParams {
    pub fn validate(&self) -> Result<(), TimeMachineError> {
        if self.horizon == 0 {
            return Err(TimeMachineError::InvalidParameter {
                name: "horizon".into(),
                reason: "horizon must be positive".into(),
            });
        }
        if !(self.threshold_pct > 0.0 && self.threshold_pct < 1.0) {
            return Err(TimeMachineError::InvalidParameter {
                name: "threshold_pct".into(),
                reason: "threshold_pct must be between 0 and 1".into(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure,
    /// No-action stance; nothing was evaluated.
    Neutral,
    /// The window ended before the outcome could be decided.
    InsufficientData,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success => write!(f, "success"),
            Outcome::Failure => write!(f, "failure"),
            Outcome::Neutral => write!(f, "neutral"),
            Outcome::InsufficientData => write!(f, "insufficient_data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VerificationResult {
    pub stance: Stance,
    pub reference_price: f64,
    /// Date of the bar the prediction resolved to.
    pub prediction_date: NaiveDate,
    pub method: VerificationMethod,
    pub horizon: usize,
    pub window_size_used: usize,
    pub outcome: Outcome,
    /// Order method: price a day had to beat.
    pub target_price: Option<f64>,
    /// Per-day pass/fail across the window, in date order.
    pub daily_passes: Vec<bool>,
    /// Order method: highest high (buy) or lowest low (sell) in the window.
    pub extreme_price: Option<f64>,
    /// Direction method: mean close across the window.
    pub mean_close: Option<f64>,
}

impl VerificationResult {
    /// `Some(true)` on success, `Some(false)` on failure, `None` when the
    /// stance was neutral or the data ran out.
    pub fn success(&self) -> Option<bool> {
        match self.outcome {
            Outcome::Success => Some(true),
            Outcome::Failure => Some(false),
            Outcome::Neutral | Outcome::InsufficientData => None,
        }
    }

    pub fn insufficient_data(&self) -> bool {
        self.outcome == Outcome::InsufficientData
    }

    /// Fewer than `horizon` bars were available.
    pub fn truncated(&self) -> bool {
        self.window_size_used < self.horizon
    }

    pub fn pass_count(&self) -> usize {
        self.daily_passes.iter().filter(|&&p| p).count()
    }
}

#[derive(Clone, Copy)]
enum Side {
    Long,
    Short,
}

/// Score `prediction` against the bars of `store` that follow it.
pub fn verify(
    store: &HistoryStore,
    prediction: &Prediction,
    params: &VerifyParams,
) -> Result<VerificationResult, TimeMachineError> {
    params.validate()?;
    let index = date_index::resolve(store, prediction.date)?;
    let window = store.window(index, params.horizon);

    let mut result = VerificationResult {
        stance: prediction.stance,
        reference_price: prediction.reference_price,
        prediction_date: store.bar_at(index)?.date,
        method: params.method,
        horizon: params.horizon,
        window_size_used: window.len(),
        outcome: Outcome::Neutral,
        target_price: None,
        daily_passes: Vec::new(),
        extreme_price: None,
        mean_close: None,
    };

    let side = match prediction.stance {
        Stance::Buy => Side::Long,
        Stance::Sell => Side::Short,
        Stance::None => return Ok(result),
    };

    match params.method {
        VerificationMethod::Order => score_order(&mut result, window, side, params.threshold_pct),
        VerificationMethod::Direction => score_direction(&mut result, window, side),
    }
    Ok(result)
}

fn score_order(result: &mut VerificationResult, window: &[Bar], side: Side, threshold_pct: f64) {
    let reference = result.reference_price;
    let (target, prices): (f64, Vec<f64>) = match side {
        Side::Long => (
            reference * (1.0 + threshold_pct),
            window.iter().map(|b| b.high).collect(),
        ),
        Side::Short => (
            reference * (1.0 - threshold_pct),
            window.iter().map(|b| b.low).collect(),
        ),
    };

    result.target_price = Some(target);
    result.daily_passes = prices
        .iter()
        .map(|&p| match side {
            Side::Long => p > target,
            Side::Short => p < target,
        })
        .collect();
    result.extreme_price = match side {
        Side::Long => prices.iter().copied().reduce(f64::max),
        Side::Short => prices.iter().copied().reduce(f64::min),
    };

    // The prediction day's own range printed before its close. On a short
    // window only a later bar can settle the order.
    let hit = if result.truncated() {
        result.daily_passes.iter().skip(1).any(|&p| p)
    } else {
        result.daily_passes.iter().any(|&p| p)
    };
    result.outcome = if hit {
        Outcome::Success
    } else if result.truncated() {
        Outcome::InsufficientData
    } else {
        Outcome::Failure
    };
}

fn score_direction(result: &mut VerificationResult, window: &[Bar], side: Side) {
    let reference = result.reference_price;
    result.daily_passes = window
        .iter()
        .map(|b| match side {
            Side::Long => b.close > reference,
            Side::Short => b.close < reference,
        })
        .collect();

    if window.is_empty() {
        result.outcome = Outcome::InsufficientData;
        return;
    }

    let mean = window.iter().map(|b| b.close).sum::<f64>() / window.len() as f64;
    result.mean_close = Some(mean);

    result.outcome = if result.truncated() {
        Outcome::InsufficientData
    } else {
        let moved = match side {
            Side::Long => mean > reference,
            Side::Short => mean < reference,
        };
        if moved {
            Outcome::Success
        } else {
            Outcome::Failure
        }
    };
}
