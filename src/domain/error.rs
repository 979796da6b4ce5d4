//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for timemachine.
#[derive(Debug, thiserror::Error)]
pub enum TimeMachineError {
    #[error("malformed data at line {line}: {reason}")]
    MalformedData { line: usize, reason: String },

    #[error("index {index} out of range for history of {len} bars")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("no bar on or after {date}")]
    DateNotFound { date: NaiveDate },

    #[error("invalid calendar date {year:04}-{month:02}-{day:02}")]
    InvalidDate { year: i32, month: u32, day: u32 },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TimeMachineError {
    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        TimeMachineError::MalformedData {
            line,
            reason: reason.into(),
        }
    }
}

impl From<&TimeMachineError> for std::process::ExitCode {
    fn from(err: &TimeMachineError) -> Self {
        let code: u8 = match err {
            TimeMachineError::Io(_) => 1,
            TimeMachineError::ConfigParse { .. }
            | TimeMachineError::ConfigMissing { .. }
            | TimeMachineError::ConfigInvalid { .. }
            | TimeMachineError::InvalidParameter { .. } => 2,
            TimeMachineError::DataSource { .. } => 3,
            TimeMachineError::MalformedData { .. } => 4,
            TimeMachineError::IndexOutOfRange { .. }
            | TimeMachineError::DateNotFound { .. }
            | TimeMachineError::InvalidDate { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
