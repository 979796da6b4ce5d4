//! Price history source port trait.

use crate::domain::error::TimeMachineError;
use crate::domain::history::HistoryStore;

pub trait DataPort {
    /// Load the full daily history for `symbol`.
    fn load_history(&self, symbol: &str) -> Result<HistoryStore, TimeMachineError>;

    fn list_symbols(&self) -> Result<Vec<String>, TimeMachineError>;
}
