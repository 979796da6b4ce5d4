//! Simulation report port trait.

use crate::domain::error::TimeMachineError;
use crate::domain::time_machine::SimulationOutcome;
use std::path::Path;

/// Port for writing per-date simulation outcomes.
pub trait ReportPort {
    fn write(&self, outcomes: &[SimulationOutcome], output_path: &Path)
        -> Result<(), TimeMachineError>;
}
