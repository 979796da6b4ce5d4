//! Core domain types and logic.

pub mod config_validation;
pub mod date_index;
pub mod error;
pub mod history;
pub mod indicator;
pub mod ohlcv;
pub mod prediction;
pub mod snapshot;
pub mod time_machine;
pub mod verifier;
