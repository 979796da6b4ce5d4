//! CSV file data adapter.
//!
//! Reads `<base_path>/<SYMBOL>.csv`: a header line, then one row per day
//! as `date,open,high,low,close,volume`. Rows may be in any order. Field
//! parsing and validation belong to [`HistoryStore::load`]; this adapter
//! only splits lines and tracks line numbers.

use crate::domain::error::TimeMachineError;
use crate::domain::history::{HistoryStore, RawBar};
use crate::ports::data_port::DataPort;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    /// Read raw rows from any CSV source with a header line.
    pub fn read_rows<R: std::io::Read>(reader: R) -> Result<Vec<RawBar>, TimeMachineError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| {
                let line = e.position().map(|p| p.line() as usize).unwrap_or(0);
                TimeMachineError::malformed(line, format!("CSV parse error: {}", e))
            })?;
            if record.iter().all(|f| f.is_empty()) {
                continue;
            }
            let line = record.position().map(|p| p.line() as usize).unwrap_or(0);
            rows.push(RawBar::new(line, record.iter()));
        }
        Ok(rows)
    }

    pub fn load_file(path: &Path) -> Result<HistoryStore, TimeMachineError> {
        let file = fs::File::open(path).map_err(|e| TimeMachineError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;
        let rows = Self::read_rows(file)?;
        debug!("read {} rows from {}", rows.len(), path.display());
        HistoryStore::load(rows)
    }
}

impl DataPort for CsvAdapter {
    fn load_history(&self, symbol: &str) -> Result<HistoryStore, TimeMachineError> {
        Self::load_file(&self.csv_path(symbol))
    }

    fn list_symbols(&self) -> Result<Vec<String>, TimeMachineError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| TimeMachineError::DataSource {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| TimeMachineError::DataSource {
                reason: format!("directory entry error: {}", e),
            })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("csv") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    symbols.push(stem.to_string());
                }
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
