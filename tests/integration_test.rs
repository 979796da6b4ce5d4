//! Integration tests for the simulation pipeline.
//!
//! Tests cover:
//! - Single-day pipeline with a mock data port
//! - Batch pipeline ordering, warm-up and outcome tally
//! - Predictors never receiving bars past the simulated day
//! - CSV files on disk through to verification results
//! - Error propagation from the data port and date resolution

mod common;

use common::*;
use std::fs;
use timemachine::adapters::bollinger_predictor::BollingerPredictor;
use timemachine::adapters::csv_adapter::CsvAdapter;
use timemachine::cli::{open_time_machine, run_batch_pipeline, run_simulation_pipeline};
use timemachine::domain::date_index;
use timemachine::domain::prediction::Stance;
use timemachine::domain::time_machine::{SimulationConfig, Summary};
use timemachine::domain::verifier::{Outcome, VerificationMethod, VerifyParams};
use timemachine::ports::data_port::DataPort;

fn sim_config(method: VerificationMethod, horizon: usize, min_history: usize) -> SimulationConfig {
    SimulationConfig {
        symbol: "AMZN".into(),
        min_history,
        verify: VerifyParams {
            horizon,
            method,
            threshold_pct: 0.05,
        },
    }
}

mod single_day {
    use super::*;

    #[test]
    fn order_buy_in_rising_market_succeeds() {
        // 2011-07-01 is index 11, close 111; target 116.55 first beaten by the 117 high.
        let port = MockDataPort::new().with_bars("AMZN", generate_bars("2011-06-20", 30, 100.0));
        let predictor = FixedPredictor::new(Stance::Buy);

        let outcome = run_simulation_pipeline(
            &port,
            &predictor,
            sim_config(VerificationMethod::Order, 10, 1),
            date(2011, 7, 1),
        )
        .unwrap();

        let v = &outcome.verification;
        assert_eq!(outcome.prediction.date, date(2011, 7, 1));
        assert_eq!(outcome.prediction.reference_price, 111.0);
        assert_eq!(outcome.snapshot_len, 12);
        assert_eq!(v.outcome, Outcome::Success);
        assert_eq!(v.window_size_used, 10);
        assert_eq!(
            v.daily_passes,
            vec![false, false, false, false, false, true, true, true, true, true]
        );
        assert_eq!(v.extreme_price, Some(121.0));
        assert_eq!(predictor.seen(), vec![(date(2011, 7, 1), 12)]);
    }

    #[test]
    fn direction_sell_in_rising_market_fails() {
        let port = MockDataPort::new().with_bars("AMZN", generate_bars("2011-06-20", 30, 100.0));
        let outcome = run_simulation_pipeline(
            &port,
            &FixedPredictor::new(Stance::Sell),
            sim_config(VerificationMethod::Direction, 10, 1),
            date(2011, 7, 1),
        )
        .unwrap();

        assert_eq!(outcome.verification.outcome, Outcome::Failure);
        assert_eq!(outcome.verification.mean_close, Some(115.5));
    }

    #[test]
    fn weekend_date_moves_to_next_trading_day() {
        let port = MockDataPort::new().with_bars(
            "AMZN",
            vec![
                make_bar("2011-07-01", 100.0),
                make_bar("2011-07-05", 101.0),
                make_bar("2011-07-06", 102.0),
            ],
        );
        let predictor = FixedPredictor::new(Stance::None);
        let outcome = run_simulation_pipeline(
            &port,
            &predictor,
            sim_config(VerificationMethod::Order, 60, 1),
            date(2011, 7, 2),
        )
        .unwrap();

        assert_eq!(outcome.prediction.date, date(2011, 7, 5));
        assert_eq!(outcome.verification.outcome, Outcome::Neutral);
        assert_eq!(predictor.seen(), vec![(date(2011, 7, 5), 2)]);
    }

    #[test]
    fn calendar_jump_selects_simulated_day() {
        let port = MockDataPort::new().with_bars(
            "AMZN",
            vec![
                make_bar("2011-07-01", 100.0),
                make_bar("2011-07-05", 101.0),
                make_bar("2011-07-06", 102.0),
            ],
        );
        let machine = open_time_machine(&port, sim_config(VerificationMethod::Order, 5, 1)).unwrap();
        let predictor = FixedPredictor::new(Stance::Buy);

        let index = date_index::jump_to(machine.history(), 2011, 7, 4).unwrap();
        let outcome = machine.simulate_index(&predictor, index).unwrap();
        assert_eq!(outcome.prediction.date, date(2011, 7, 5));
        assert_eq!(predictor.seen(), vec![(date(2011, 7, 5), 2)]);

        let err = date_index::jump_to(machine.history(), 2011, 2, 29).unwrap_err();
        assert!(matches!(err, TimeMachineError::InvalidDate { day: 29, .. }));
    }

    #[test]
    fn last_bar_order_is_insufficient_even_when_its_range_clears_target() {
        // The last bar's own high of 110 is above 105 but printed before the close.
        let high_day = Bar::new(date(2011, 7, 5), 100.0, 110.0, 99.0, 100.0, 1000).unwrap();
        let port = MockDataPort::new()
            .with_bars("AMZN", vec![make_bar("2011-07-01", 100.0), high_day]);
        let outcome = run_simulation_pipeline(
            &port,
            &FixedPredictor::new(Stance::Buy),
            sim_config(VerificationMethod::Order, 60, 1),
            date(2011, 7, 5),
        )
        .unwrap();

        let v = &outcome.verification;
        assert_eq!(v.window_size_used, 1);
        assert_eq!(v.daily_passes, vec![true]);
        assert_eq!(v.outcome, Outcome::InsufficientData);
        assert!(v.insufficient_data());
    }

    #[test]
    fn date_after_history_is_not_found() {
        let port = MockDataPort::new().with_bars("AMZN", generate_bars("2011-06-20", 5, 100.0));
        let err = run_simulation_pipeline(
            &port,
            &FixedPredictor::new(Stance::Buy),
            sim_config(VerificationMethod::Order, 10, 1),
            date(2012, 1, 1),
        )
        .unwrap_err();
        assert!(matches!(err, TimeMachineError::DateNotFound { .. }));
    }

    #[test]
    fn data_port_error_propagates() {
        let port = MockDataPort::new().with_error("AMZN", "disk on fire");
        let err = run_simulation_pipeline(
            &port,
            &FixedPredictor::new(Stance::Buy),
            sim_config(VerificationMethod::Order, 10, 1),
            date(2011, 7, 1),
        )
        .unwrap_err();
        match err {
            TimeMachineError::DataSource { reason } => assert_eq!(reason, "disk on fire"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_history_is_rejected() {
        let port = MockDataPort::new();
        let err = run_simulation_pipeline(
            &port,
            &FixedPredictor::new(Stance::Buy),
            sim_config(VerificationMethod::Order, 10, 1),
            date(2011, 7, 1),
        )
        .unwrap_err();
        assert!(matches!(err, TimeMachineError::DataSource { .. }));
    }
}

mod batch {
    use super::*;

    #[test]
    fn predictor_never_sees_the_future() {
        let bars = generate_bars("2011-01-01", 40, 50.0);
        let port = MockDataPort::new().with_bars("AMZN", bars.clone());
        let predictor = FixedPredictor::new(Stance::Buy);

        let outcomes = run_batch_pipeline(
            &port,
            &predictor,
            sim_config(VerificationMethod::Order, 5, 10),
            None,
            None,
        )
        .unwrap();

        assert_eq!(outcomes.len(), 31);
        let seen = predictor.seen();
        assert_eq!(seen.len(), 31);
        for (outcome, (last_seen, len)) in outcomes.iter().zip(seen) {
            assert_eq!(last_seen, outcome.prediction.date);
            assert_eq!(len, outcome.snapshot_len);
            assert_eq!(bars[len - 1].date, last_seen);
        }
    }

    #[test]
    fn canonical_history_is_untouched() {
        let port = MockDataPort::new().with_bars("AMZN", generate_bars("2011-01-01", 30, 50.0));
        let before = port.load_history("AMZN").unwrap();
        let machine = open_time_machine(&port, sim_config(VerificationMethod::Order, 5, 1)).unwrap();

        machine
            .simulate_range(&FixedPredictor::new(Stance::Sell), date(2011, 1, 1), date(2011, 1, 30))
            .unwrap();

        assert_eq!(machine.history(), &before);
    }

    #[test]
    fn range_tally_flags_tail_as_insufficient() {
        // +1/day: a 5% move never arrives within 3 days, and the last two
        // days run out of history.
        let port = MockDataPort::new().with_bars("AMZN", generate_bars("2011-01-01", 10, 100.0));
        let outcomes = run_batch_pipeline(
            &port,
            &FixedPredictor::new(Stance::Buy),
            sim_config(VerificationMethod::Order, 3, 1),
            Some(date(2011, 1, 1)),
            Some(date(2011, 1, 10)),
        )
        .unwrap();

        let summary = Summary::from_outcomes(&outcomes);
        assert_eq!(summary.total(), 10);
        assert_eq!(summary.failure, 8);
        assert_eq!(summary.insufficient_data, 2);
        assert_eq!(summary.hit_rate(), Some(0.0));
        assert!(outcomes[9].verification.truncated());
    }

    #[test]
    fn neutral_predictor_tallies_only_neutral() {
        let port = MockDataPort::new().with_bars("AMZN", generate_bars("2011-01-01", 10, 100.0));
        let outcomes = run_batch_pipeline(
            &port,
            &FixedPredictor::new(Stance::None),
            sim_config(VerificationMethod::Direction, 3, 1),
            None,
            None,
        )
        .unwrap();
        let summary = Summary::from_outcomes(&outcomes);
        assert_eq!(summary.neutral, 10);
        assert_eq!(summary.hit_rate(), None);
    }
}

mod csv_files {
    use super::*;

    fn write_history(dir: &tempfile::TempDir, symbol: &str, rows: &[String]) {
        let mut content = String::from("Date,Open,High,Low,Close,Volume\n");
        for row in rows {
            content.push_str(row);
            content.push('\n');
        }
        fs::write(dir.path().join(format!("{}.csv", symbol)), content).unwrap();
    }

    #[test]
    fn newest_first_file_runs_end_to_end() {
        let dir = tempfile::TempDir::new().unwrap();
        let bars = generate_bars("2011-01-01", 25, 100.0);
        let rows: Vec<String> = bars
            .iter()
            .rev()
            .map(|b| {
                format!(
                    "{},{:.2},{:.2},{:.2},{:.2},{}",
                    b.date, b.open, b.high, b.low, b.close, b.volume
                )
            })
            .collect();
        write_history(&dir, "AMZN", &rows);

        let port = CsvAdapter::new(dir.path().to_path_buf());
        let outcome = run_simulation_pipeline(
            &port,
            &FixedPredictor::new(Stance::Buy),
            sim_config(VerificationMethod::Order, 10, 1),
            date(2011, 1, 5),
        )
        .unwrap();

        assert_eq!(outcome.snapshot_len, 5);
        assert_eq!(outcome.prediction.reference_price, 104.0);
        assert_eq!(outcome.verification.outcome, Outcome::Success);
    }

    #[test]
    fn malformed_row_aborts_load() {
        let dir = tempfile::TempDir::new().unwrap();
        write_history(
            &dir,
            "AMZN",
            &[
                "2011-01-03,100,101,99,100,1000".to_string(),
                "2011-01-04,100,101,99,100,lots".to_string(),
            ],
        );
        let port = CsvAdapter::new(dir.path().to_path_buf());
        let err = port.load_history("AMZN").unwrap_err();
        assert!(matches!(err, TimeMachineError::MalformedData { line: 3, .. }));
    }

    #[test]
    fn duplicate_date_aborts_load() {
        let dir = tempfile::TempDir::new().unwrap();
        write_history(
            &dir,
            "AMZN",
            &[
                "2011-01-03,100,101,99,100,1000".to_string(),
                "2011-01-03,100,102,99,101,1000".to_string(),
            ],
        );
        let port = CsvAdapter::new(dir.path().to_path_buf());
        assert!(matches!(
            port.load_history("AMZN"),
            Err(TimeMachineError::MalformedData { .. })
        ));
    }

    #[test]
    fn reference_predictor_runs_over_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let bars = generate_bars("2010-01-01", 260, 100.0);
        let rows: Vec<String> = bars
            .iter()
            .map(|b| format!("{},{},{},{},{},{}", b.date, b.open, b.high, b.low, b.close, b.volume))
            .collect();
        write_history(&dir, "AMZN", &rows);

        let port = CsvAdapter::new(dir.path().to_path_buf());
        let outcomes = run_batch_pipeline(
            &port,
            &BollingerPredictor::default(),
            sim_config(VerificationMethod::Order, 20, 200),
            None,
            None,
        )
        .unwrap();

        // A steady climb never closes outside the bands.
        assert_eq!(outcomes.len(), 61);
        assert!(outcomes.iter().all(|o| o.verification.outcome == Outcome::Neutral));
        assert!(outcomes.iter().all(|o| o.snapshot_len >= 200));
    }
}
