//! CSV report adapter: one row per simulated day.

use crate::domain::error::TimeMachineError;
use crate::domain::prediction::Stance;
use crate::domain::time_machine::SimulationOutcome;
use crate::domain::verifier::{Outcome, VerificationMethod};
use crate::ports::report_port::ReportPort;
use chrono::NaiveDate;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
struct ReportRow {
    date: NaiveDate,
    stance: Stance,
    signal: i8,
    reference_price: f64,
    method: VerificationMethod,
    horizon: usize,
    window_size_used: usize,
    outcome: Outcome,
    truncated: bool,
    target_price: Option<f64>,
    extreme_price: Option<f64>,
    mean_close: Option<f64>,
    pass_count: usize,
    snapshot_len: usize,
}

impl From<&SimulationOutcome> for ReportRow {
    fn from(o: &SimulationOutcome) -> Self {
        let v = &o.verification;
        Self {
            date: o.prediction.date,
            stance: v.stance,
            signal: v.stance.signal(),
            reference_price: v.reference_price,
            method: v.method,
            horizon: v.horizon,
            window_size_used: v.window_size_used,
            outcome: v.outcome,
            truncated: v.truncated(),
            target_price: v.target_price,
            extreme_price: v.extreme_price,
            mean_close: v.mean_close,
            pass_count: v.pass_count(),
            snapshot_len: o.snapshot_len,
        }
    }
}

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn write_to<W: std::io::Write>(
        outcomes: &[SimulationOutcome],
        writer: W,
    ) -> Result<(), TimeMachineError> {
        let mut wtr = csv::Writer::from_writer(writer);
        for outcome in outcomes {
            wtr.serialize(ReportRow::from(outcome))
                .map_err(|e| TimeMachineError::Io(std::io::Error::other(e)))?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        outcomes: &[SimulationOutcome],
        output_path: &Path,
    ) -> Result<(), TimeMachineError> {
        let file = std::fs::File::create(output_path)?;
        Self::write_to(outcomes, file)
    }
}
