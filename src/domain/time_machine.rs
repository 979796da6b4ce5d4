//! Point-in-time simulation driver.
//!
//! For each simulated day the driver clips the canonical history to that
//! day, lets a predictor look only at the clipped copy, then scores the
//! returned stance against the full history. The canonical history is never
//! mutated, so batch runs evaluate days in parallel.

use crate::domain::date_index;
use crate::domain::error::TimeMachineError;
use crate::domain::history::HistoryStore;
use crate::domain::prediction::{Prediction, Stance};
use crate::domain::snapshot;
use crate::domain::verifier::{self, Outcome, VerificationResult, VerifyParams};
use crate::ports::predictor_port::PredictorPort;
use chrono::NaiveDate;
use log::{debug, info, warn};
use rayon::prelude::*;

/// Bars of history required before a day is simulated in a batch run.
pub const DEFAULT_MIN_HISTORY: usize = 200;

#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub symbol: String,
    pub min_history: usize,
    pub verify: VerifyParams,
}

impl SimulationConfig {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            min_history: DEFAULT_MIN_HISTORY,
            verify: VerifyParams::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOutcome {
    pub prediction: Prediction,
    /// Bars the predictor could see.
    pub snapshot_len: usize,
    pub verification: VerificationResult,
}

pub struct TimeMachine {
    history: HistoryStore,
    config: SimulationConfig,
}

impl TimeMachine {
    pub fn new(history: HistoryStore, config: SimulationConfig) -> Result<Self, TimeMachineError> {
        config.verify.validate()?;
        if history.is_empty() {
            return Err(TimeMachineError::DataSource {
                reason: format!("no price history for {}", config.symbol),
            });
        }
        Ok(Self { history, config })
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Simulate the bar at `index`: predict from `[0, index]`, verify
    /// against the full history.
    pub fn simulate_index(
        &self,
        predictor: &dyn PredictorPort,
        index: usize,
    ) -> Result<SimulationOutcome, TimeMachineError> {
        let today = self.history.bar_at(index)?;
        let snapshot = snapshot::truncate(&self.history, index)?;
        let snapshot_len = snapshot.len();

        let mut context = predictor.profile(&self.config.symbol, snapshot);
        predictor.analyze(&mut context);
        let stance = predictor.predict(&context);

        let prediction = Prediction {
            stance,
            reference_price: today.close,
            date: today.date,
        };
        let verification = verifier::verify(&self.history, &prediction, &self.config.verify)?;
        debug!(
            "{} {}: {} at {:.2} -> {}",
            self.config.symbol,
            prediction.date,
            stance,
            prediction.reference_price,
            verification.outcome
        );

        Ok(SimulationOutcome {
            prediction,
            snapshot_len,
            verification,
        })
    }

    /// Simulate the first bar on or after `date`.
    pub fn simulate_at(
        &self,
        predictor: &dyn PredictorPort,
        date: NaiveDate,
    ) -> Result<SimulationOutcome, TimeMachineError> {
        let index = date_index::resolve(&self.history, date)?;
        if index + 1 < self.config.min_history {
            warn!(
                "{} has only {} bars up to {}, fewer than min_history {}",
                self.config.symbol,
                index + 1,
                self.history.bar_at(index)?.date,
                self.config.min_history
            );
        }
        info!("Outlook on day: {}", self.history.bar_at(index)?.date);
        self.simulate_index(predictor, index)
    }

    /// Simulate every bar dated within `[start, end]` that has at least
    /// `min_history` bars behind it. Days are evaluated in parallel and
    /// returned in date order.
    pub fn simulate_range(
        &self,
        predictor: &dyn PredictorPort,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<SimulationOutcome>, TimeMachineError> {
        if start > end {
            return Err(TimeMachineError::InvalidParameter {
                name: "start_date".into(),
                reason: format!("start {} is after end {}", start, end),
            });
        }

        let first = date_index::resolve(&self.history, start)?;
        let stop = date_index::index_after(&self.history, end);
        let warm = first.max(self.config.min_history.saturating_sub(1));

        if warm > first {
            warn!(
                "skipping {} days before {} bars of history are available",
                warm.min(stop) - first,
                self.config.min_history
            );
        }
        if warm >= stop {
            return Ok(Vec::new());
        }

        info!(
            "Simulating {} days of {} from {} to {}",
            stop - warm,
            self.config.symbol,
            self.history.bar_at(warm)?.date,
            self.history.bar_at(stop - 1)?.date
        );

        (warm..stop)
            .into_par_iter()
            .map(|index| self.simulate_index(predictor, index))
            .collect()
    }
}

/// Outcome tally over a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub success: usize,
    pub failure: usize,
    pub neutral: usize,
    pub insufficient_data: usize,
}

impl Summary {
    pub fn from_outcomes(outcomes: &[SimulationOutcome]) -> Self {
        outcomes.iter().fold(Summary::default(), |mut acc, o| {
            match o.verification.outcome {
                Outcome::Success => acc.success += 1,
                Outcome::Failure => acc.failure += 1,
                Outcome::Neutral => acc.neutral += 1,
                Outcome::InsufficientData => acc.insufficient_data += 1,
            }
            acc
        })
    }

    pub fn total(&self) -> usize {
        self.success + self.failure + self.neutral + self.insufficient_data
    }

    /// Share of decided predictions that succeeded.
    pub fn hit_rate(&self) -> Option<f64> {
        let decided = self.success + self.failure;
        if decided == 0 {
            None
        } else {
            Some(self.success as f64 / decided as f64)
        }
    }
}

impl SimulationOutcome {
    pub fn stance(&self) -> Stance {
        self.prediction.stance
    }
}
