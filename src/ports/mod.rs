//! Port traits for the collaborators around the backtesting core.

pub mod config_port;
pub mod data_port;
pub mod predictor_port;
pub mod report_port;
