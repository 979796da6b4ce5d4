//! Configuration validation.
//!
//! Validates all config fields before a simulation runs, so that a bad
//! value is reported against its section and key rather than surfacing
//! later as a silently defaulted parameter.

use crate::domain::error::TimeMachineError;
use crate::domain::verifier::VerificationMethod;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), TimeMachineError> {
    require_non_empty(config, "data", "path")?;
    require_non_empty(config, "data", "symbol")?;
    Ok(())
}

pub fn validate_simulation_config(config: &dyn ConfigPort) -> Result<(), TimeMachineError> {
    validate_min_history(config)?;
    validate_dates(config)?;
    validate_horizon(config)?;
    validate_threshold(config)?;
    validate_method(config)?;
    Ok(())
}

fn require_non_empty(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<(), TimeMachineError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(TimeMachineError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> TimeMachineError {
    TimeMachineError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn parse_optional<T: std::str::FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    expected: &str,
) -> Result<Option<T>, TimeMachineError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| invalid(section, key, format!("expected {}, got {:?}", expected, raw))),
    }
}

fn validate_min_history(config: &dyn ConfigPort) -> Result<(), TimeMachineError> {
    if let Some(value) = parse_optional::<i64>(config, "simulation", "min_history", "an integer")? {
        if value < 0 {
            return Err(invalid(
                "simulation",
                "min_history",
                "min_history must be non-negative",
            ));
        }
    }
    Ok(())
}

pub fn parse_date(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<NaiveDate>, TimeMachineError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| invalid(section, key, format!("invalid {} format, expected YYYY-MM-DD", key))),
    }
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), TimeMachineError> {
    parse_date(config, "simulation", "date")?;
    let start = parse_date(config, "simulation", "start_date")?;
    let end = parse_date(config, "simulation", "end_date")?;

    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(invalid(
                "simulation",
                "start_date",
                "start_date must not be after end_date",
            ));
        }
    }
    Ok(())
}

fn validate_horizon(config: &dyn ConfigPort) -> Result<(), TimeMachineError> {
    if let Some(value) = parse_optional::<i64>(config, "verification", "horizon", "an integer")? {
        if value <= 0 {
            return Err(invalid("verification", "horizon", "horizon must be positive"));
        }
    }
    Ok(())
}

fn validate_threshold(config: &dyn ConfigPort) -> Result<(), TimeMachineError> {
    if let Some(value) = parse_optional::<f64>(config, "verification", "threshold_pct", "a number")? {
        if !(value > 0.0 && value < 1.0) {
            return Err(invalid(
                "verification",
                "threshold_pct",
                "threshold_pct must be between 0 and 1",
            ));
        }
    }
    Ok(())
}

fn validate_method(config: &dyn ConfigPort) -> Result<(), TimeMachineError> {
    if let Some(raw) = config.get_string("verification", "method") {
        raw.parse::<VerificationMethod>()
            .map_err(|_| invalid("verification", "method", "method must be direction or order"))?;
    }
    Ok(())
}
