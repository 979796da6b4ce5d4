#![allow(dead_code)]

use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Mutex;
pub use timemachine::domain::error::TimeMachineError;
pub use timemachine::domain::history::HistoryStore;
pub use timemachine::domain::ohlcv::Bar;
use timemachine::domain::prediction::{AnalysisContext, Stance};
use timemachine::ports::data_port::DataPort;
use timemachine::ports::predictor_port::PredictorPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Bar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn load_history(&self, symbol: &str) -> Result<HistoryStore, TimeMachineError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(TimeMachineError::DataSource {
                reason: reason.clone(),
            });
        }
        HistoryStore::from_bars(self.data.get(symbol).cloned().unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, TimeMachineError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

/// Returns a fixed stance and records the latest date of every snapshot it
/// was handed.
pub struct FixedPredictor {
    pub stance: Stance,
    pub seen: Mutex<Vec<(NaiveDate, usize)>>,
}

impl FixedPredictor {
    pub fn new(stance: Stance) -> Self {
        Self {
            stance,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn seen(&self) -> Vec<(NaiveDate, usize)> {
        let mut seen = self.seen.lock().unwrap().clone();
        seen.sort();
        seen
    }
}

impl PredictorPort for FixedPredictor {
    fn analyze(&self, context: &mut AnalysisContext) {
        if let Some(last) = context.snapshot.last_date() {
            self.seen
                .lock()
                .unwrap()
                .push((last, context.snapshot.len()));
        }
    }

    fn predict(&self, _context: &AnalysisContext) -> Stance {
        self.stance
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(date: &str, close: f64) -> Bar {
    Bar::new(
        NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        close,
        close + 1.0,
        close - 2.0,
        close,
        1000,
    )
    .unwrap()
}

/// `count` consecutive calendar days starting at `start_date`, close rising
/// by one each day.
pub fn generate_bars(start_date: &str, count: usize, start_price: f64) -> Vec<Bar> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    (0..count)
        .map(|i| {
            let p = start_price + i as f64;
            Bar::new(
                start + chrono::Duration::days(i as i64),
                p,
                p + 1.0,
                p - 1.0,
                p,
                1000,
            )
            .unwrap()
        })
        .collect()
}
