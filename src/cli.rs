//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::bollinger_predictor::BollingerPredictor;
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::{
    parse_date, validate_data_config, validate_simulation_config,
};
use crate::domain::error::TimeMachineError;
use crate::domain::time_machine::{
    SimulationConfig, SimulationOutcome, Summary, TimeMachine, DEFAULT_MIN_HISTORY,
};
use crate::domain::verifier::{
    VerificationMethod, VerifyParams, DEFAULT_HORIZON, DEFAULT_THRESHOLD_PCT,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::predictor_port::PredictorPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(
    name = "timemachine",
    about = "Replay price history to score predictions without look-ahead"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Predict and verify a single simulated day
    Simulate {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        /// Simulated day (YYYY-MM-DD); the first bar on or after it is used
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        horizon: Option<usize>,
        /// direction or order
        #[arg(long)]
        method: Option<String>,
    },
    /// Predict and verify every day in a date range
    Batch {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long)]
        horizon: Option<usize>,
        #[arg(long)]
        method: Option<String>,
        /// Write per-day results as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show the data range for a symbol
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub symbol: Option<String>,
    pub horizon: Option<usize>,
    pub method: Option<String>,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Simulate {
            config,
            symbol,
            date,
            horizon,
            method,
        } => run_simulate(
            &config,
            &Overrides {
                symbol,
                horizon,
                method,
            },
            date,
        ),
        Command::Batch {
            config,
            symbol,
            start,
            end,
            horizon,
            method,
            output,
        } => run_batch(
            &config,
            &Overrides {
                symbol,
                horizon,
                method,
            },
            start,
            end,
            output.as_deref(),
        ),
        Command::Info { config, symbol } => run_info(&config, symbol.as_deref()),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = TimeMachineError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn fail(err: TimeMachineError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

/// Assemble the simulation context from config plus overrides.
pub fn build_simulation_config(
    config: &dyn ConfigPort,
    overrides: &Overrides,
) -> Result<SimulationConfig, TimeMachineError> {
    let symbol = overrides
        .symbol
        .clone()
        .or_else(|| config.get_string("data", "symbol"))
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| TimeMachineError::ConfigMissing {
            section: "data".into(),
            key: "symbol".into(),
        })?;

    let method = match overrides
        .method
        .clone()
        .or_else(|| config.get_string("verification", "method"))
    {
        Some(m) => m.parse::<VerificationMethod>()?,
        None => VerificationMethod::default(),
    };

    let horizon = match overrides.horizon {
        Some(h) => h,
        None => {
            let h = config.get_int("verification", "horizon", DEFAULT_HORIZON as i64);
            usize::try_from(h).map_err(|_| TimeMachineError::ConfigInvalid {
                section: "verification".into(),
                key: "horizon".into(),
                reason: "horizon must be positive".into(),
            })?
        }
    };

    let min_history = config.get_int("simulation", "min_history", DEFAULT_MIN_HISTORY as i64);
    let min_history = usize::try_from(min_history).map_err(|_| TimeMachineError::ConfigInvalid {
        section: "simulation".into(),
        key: "min_history".into(),
        reason: "min_history must be non-negative".into(),
    })?;

    let verify = VerifyParams {
        horizon,
        method,
        threshold_pct: config.get_double("verification", "threshold_pct", DEFAULT_THRESHOLD_PCT),
    };
    verify.validate()?;

    Ok(SimulationConfig {
        symbol,
        min_history,
        verify,
    })
}

/// A command-line date wins over `[simulation] <key>`.
pub fn resolve_date(
    cli_date: Option<NaiveDate>,
    config: &dyn ConfigPort,
    key: &str,
) -> Result<Option<NaiveDate>, TimeMachineError> {
    match cli_date {
        Some(d) => Ok(Some(d)),
        None => parse_date(config, "simulation", key),
    }
}

fn data_adapter(config: &dyn ConfigPort) -> Result<CsvAdapter, TimeMachineError> {
    let path = config
        .get_string("data", "path")
        .ok_or_else(|| TimeMachineError::ConfigMissing {
            section: "data".into(),
            key: "path".into(),
        })?;
    Ok(CsvAdapter::new(PathBuf::from(path.trim())))
}

/// Load history and build the driver for one symbol.
pub fn open_time_machine(
    data_port: &dyn DataPort,
    sim_config: SimulationConfig,
) -> Result<TimeMachine, TimeMachineError> {
    info!("Loading history for {}", sim_config.symbol);
    let history = data_port.load_history(&sim_config.symbol)?;
    info!(
        "Loaded {} bars for {} ({} to {})",
        history.len(),
        sim_config.symbol,
        history
            .first_date()
            .map(|d| d.to_string())
            .unwrap_or_default(),
        history
            .last_date()
            .map(|d| d.to_string())
            .unwrap_or_default()
    );
    TimeMachine::new(history, sim_config)
}

pub fn run_simulation_pipeline(
    data_port: &dyn DataPort,
    predictor: &dyn PredictorPort,
    sim_config: SimulationConfig,
    date: NaiveDate,
) -> Result<SimulationOutcome, TimeMachineError> {
    let machine = open_time_machine(data_port, sim_config)?;
    machine.simulate_at(predictor, date)
}

pub fn run_batch_pipeline(
    data_port: &dyn DataPort,
    predictor: &dyn PredictorPort,
    sim_config: SimulationConfig,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<Vec<SimulationOutcome>, TimeMachineError> {
    let machine = open_time_machine(data_port, sim_config)?;
    let history = machine.history();
    let start = match start.or_else(|| history.first_date()) {
        Some(d) => d,
        None => return Ok(Vec::new()),
    };
    let end = match end.or_else(|| history.last_date()) {
        Some(d) => d,
        None => return Ok(Vec::new()),
    };
    machine.simulate_range(predictor, start, end)
}

pub fn format_outcome(outcome: &SimulationOutcome) -> String {
    let v = &outcome.verification;
    let mut line = format!(
        "{} {} @ {:.2} [{} over {}/{} bars{}] -> {}",
        outcome.prediction.date,
        v.stance,
        v.reference_price,
        v.method,
        v.window_size_used,
        v.horizon,
        if v.truncated() { ", truncated" } else { "" },
        v.outcome
    );
    if let Some(target) = v.target_price {
        line.push_str(&format!(", target {:.2}", target));
    }
    if let Some(extreme) = v.extreme_price {
        line.push_str(&format!(", extreme {:.2}", extreme));
    }
    if let Some(mean) = v.mean_close {
        line.push_str(&format!(", mean close {:.2}", mean));
    }
    if !v.daily_passes.is_empty() {
        line.push_str(&format!(
            ", {} of {} days passed",
            v.pass_count(),
            v.daily_passes.len()
        ));
    }
    line
}

fn run_simulate(config_path: &Path, overrides: &Overrides, date: Option<NaiveDate>) -> ExitCode {
    info!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    if let Err(e) = validate_simulation_config(&config) {
        return fail(e);
    }

    let sim_config = match build_simulation_config(&config, overrides) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };

    let date = match resolve_date(date, &config, "date") {
        Ok(Some(d)) => d,
        Ok(None) => {
            return fail(TimeMachineError::ConfigMissing {
                section: "simulation".into(),
                key: "date".into(),
            });
        }
        Err(e) => return fail(e),
    };

    let data_port = match data_adapter(&config) {
        Ok(a) => a,
        Err(e) => return fail(e),
    };
    let predictor = BollingerPredictor::default();

    match run_simulation_pipeline(&data_port, &predictor, sim_config, date) {
        Ok(outcome) => {
            println!("{}", format_outcome(&outcome));
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn run_batch(
    config_path: &Path,
    overrides: &Overrides,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    output: Option<&Path>,
) -> ExitCode {
    info!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    if let Err(e) = validate_simulation_config(&config) {
        return fail(e);
    }

    let sim_config = match build_simulation_config(&config, overrides) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };

    let start = match resolve_date(start, &config, "start_date") {
        Ok(d) => d,
        Err(e) => return fail(e),
    };
    let end = match resolve_date(end, &config, "end_date") {
        Ok(d) => d,
        Err(e) => return fail(e),
    };

    let data_port = match data_adapter(&config) {
        Ok(a) => a,
        Err(e) => return fail(e),
    };
    let predictor = BollingerPredictor::default();

    let outcomes = match run_batch_pipeline(&data_port, &predictor, sim_config, start, end) {
        Ok(o) => o,
        Err(e) => return fail(e),
    };
    if outcomes.is_empty() {
        warn!("no days were simulated");
    }

    for outcome in &outcomes {
        println!("{}", format_outcome(outcome));
    }

    let summary = Summary::from_outcomes(&outcomes);
    println!("\n=== Summary ===");
    println!("Days simulated:    {}", summary.total());
    println!("Success:           {}", summary.success);
    println!("Failure:           {}", summary.failure);
    println!("Neutral:           {}", summary.neutral);
    println!("Insufficient data: {}", summary.insufficient_data);
    match summary.hit_rate() {
        Some(rate) => println!("Hit rate:          {:.1}%", rate * 100.0),
        None => println!("Hit rate:          n/a"),
    }

    if let Some(path) = output {
        if let Err(e) = CsvReportAdapter.write(&outcomes, path) {
            return fail(e);
        }
        info!("Report written to: {}", path.display());
    }

    ExitCode::SUCCESS
}

fn run_info(config_path: &Path, symbol: Option<&str>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let data_port = match data_adapter(&config) {
        Ok(a) => a,
        Err(e) => return fail(e),
    };

    let symbols = match symbol
        .map(str::to_string)
        .or_else(|| config.get_string("data", "symbol"))
        .map(|s| s.trim().to_uppercase())
    {
        Some(s) => vec![s],
        None => match data_port.list_symbols() {
            Ok(s) => s,
            Err(e) => return fail(e),
        },
    };

    for s in &symbols {
        match data_port.load_history(s) {
            Ok(history) => match (history.first_date(), history.last_date()) {
                (Some(first), Some(last)) => {
                    println!("{}: {} bars, {} to {}", s, history.len(), first, last)
                }
                _ => println!("{}: no data", s),
            },
            Err(e) => eprintln!("error reading {}: {}", s, e),
        }
    }
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    if let Err(e) = validate_data_config(&config) {
        return fail(e);
    }
    if let Err(e) = validate_simulation_config(&config) {
        return fail(e);
    }
    let sim_config = match build_simulation_config(&config, &Overrides::default()) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };

    eprintln!("\nSimulation:");
    eprintln!("  symbol:        {}", sim_config.symbol);
    eprintln!("  min_history:   {}", sim_config.min_history);
    eprintln!("  horizon:       {}", sim_config.verify.horizon);
    eprintln!("  method:        {}", sim_config.verify.method);
    eprintln!("  threshold_pct: {}", sim_config.verify.threshold_pct);
    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}
