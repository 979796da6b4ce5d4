//! Prediction collaborator port trait.
//!
//! A predictor only ever receives an [`AnalysisContext`] built from a
//! snapshot, never the full history.

use crate::domain::history::HistoryStore;
use crate::domain::prediction::{AnalysisContext, Stance};

pub trait PredictorPort: Send + Sync {
    /// Wrap a snapshot for analysis.
    fn profile(&self, symbol: &str, snapshot: HistoryStore) -> AnalysisContext {
        AnalysisContext::new(symbol, snapshot)
    }

    /// Derive studies, enriching the context in place.
    fn analyze(&self, context: &mut AnalysisContext);

    fn predict(&self, context: &AnalysisContext) -> Stance;
}
