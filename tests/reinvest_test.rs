//! Integration tests for the reinvestment pipeline.
//!
//! Tests cover:
//! - Simulation over month-stamped equity frames
//! - Determinism of repeated runs
//! - CSV in / CSV out through the pipeline, text columns included
//! - Gaps in the equity column
//! - Missing input and missing equity column

mod common;

use approx::assert_relative_eq;
use common::*;
use proptest::prelude::*;
use reinvestor::domain::error::ReinvestorError;
use reinvestor::domain::indicator::OutputMode;
use reinvestor::domain::reinvest::{
    EQUITY_REINVEST, MULTIPLIER, PNL, PNL_REINVEST, Reinvestor, equity_curve, simulate_frame,
};

/// Equity levels whose period returns are exactly `pnl` up to rounding.
fn levels(pnl: &[f64]) -> Vec<f64> {
    let mut level = 100.0;
    pnl.iter()
        .map(|r| {
            level *= 1.0 + r;
            level
        })
        .collect()
}

#[test]
fn rebalance_locks_in_gains_once() {
    // Oct 2023 .. Dec 2024; January appears once
    let mut pnl = vec![0.0, 0.1, 0.1, 0.05];
    pnl.extend(std::iter::repeat_n(0.01, 11));
    let frame = monthly_equity_frame(10, &levels(&pnl));

    let (out, run) = simulate_frame(&frame, &[1], OutputMode::Append).unwrap();

    assert_eq!(run.rebalance_count(), 1);
    assert!(run.steps[3].rebalanced);

    let multiplier = out.column(MULTIPLIER).unwrap();
    for v in &multiplier[..3] {
        assert_relative_eq!(v.unwrap(), 1.0);
    }
    for v in &multiplier[3..] {
        assert_relative_eq!(v.unwrap(), 1.2, epsilon = 1e-12);
    }

    let scaled = out.column(PNL_REINVEST).unwrap();
    assert_relative_eq!(scaled[3].unwrap(), 0.06, epsilon = 1e-12);
    assert_relative_eq!(scaled[4].unwrap(), 0.012, epsilon = 1e-12);
}

#[test]
fn appended_columns_in_order() {
    let frame = monthly_equity_frame(1, &[100.0, 110.0, 104.5]);
    let (out, _) = simulate_frame(&frame, &[1], OutputMode::Append).unwrap();
    assert_eq!(
        out.column_names(),
        vec!["equity", PNL, MULTIPLIER, PNL_REINVEST, EQUITY_REINVEST]
    );

    let (only, _) = simulate_frame(&frame, &[1], OutputMode::ColumnsOnly).unwrap();
    assert_eq!(
        only.column_names(),
        vec![PNL, MULTIPLIER, PNL_REINVEST, EQUITY_REINVEST]
    );
    assert_eq!(only.index(), frame.index());
}

#[test]
fn no_trigger_equity_is_compounded_pnl() {
    let pnl = [0.0, 0.10, -0.05, 0.20];
    let frame = monthly_equity_frame(5, &levels(&pnl));
    let (out, run) = simulate_frame(&frame, &[12], OutputMode::Append).unwrap();

    assert_eq!(run.rebalance_count(), 0);
    let expected = equity_curve(pnl);
    let equity = out.column(EQUITY_REINVEST).unwrap();
    for (got, want) in equity.iter().zip(&expected) {
        assert_relative_eq!(got.unwrap(), *want, epsilon = 1e-12);
    }
    assert_relative_eq!(run.final_equity().unwrap(), 1.254, epsilon = 1e-12);
}

#[test]
fn missing_equity_column_is_schema_error() {
    let frame = monthly_equity_frame(1, &[1.0, 2.0])
        .select(&[])
        .unwrap()
        .with_values("balance", &[1.0, 2.0])
        .unwrap();
    let err = simulate_frame(&frame, &[1], OutputMode::Append).unwrap_err();
    assert!(matches!(err, ReinvestorError::Schema { field } if field == "equity"));
}

proptest! {
    #[test]
    fn simulation_is_deterministic(
        pnl in prop::collection::vec(-0.5f64..0.5, 0..40),
        tags in prop::collection::vec(1u32..=12, 40),
        triggers in prop::collection::btree_set(1u32..=12, 0..4),
    ) {
        let periods: Vec<(u32, f64)> = tags.iter().copied().zip(pnl.iter().copied()).collect();
        let first = Reinvestor::new(triggers.iter().copied()).run(periods.clone());
        let second = Reinvestor::new(triggers.iter().copied()).run(periods);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn multiplier_only_moves_on_rebalance(
        pnl in prop::collection::vec(-0.2f64..0.2, 1..40),
        tags in prop::collection::vec(1u32..=12, 40),
        trigger in 1u32..=12,
    ) {
        let run = Reinvestor::new([trigger]).run(tags.iter().copied().zip(pnl.iter().copied()));
        let mut previous = 1.0;
        for step in &run.steps {
            if !step.rebalanced {
                prop_assert_eq!(step.multiplier, previous);
            }
            previous = step.multiplier;
        }
    }
}

mod pipeline {
    use super::*;
    use reinvestor::adapters::csv_adapter::CsvAdapter;
    use reinvestor::cli::{self, ReinvestJob};
    use std::fs;
    use tempfile::TempDir;

    fn job(input: &str, output: &str) -> ReinvestJob {
        ReinvestJob {
            input: input.into(),
            output: output.into(),
            rebalance_months: vec![1],
            delimiter: b',',
        }
    }

    #[test]
    fn pipeline_writes_to_output_port() {
        let frame = monthly_equity_frame(11, &[100.0, 110.0, 121.0, 133.1]);
        let data = MockDataPort::new().with_frame("eq.csv", frame);
        let output = MemoryOutputPort::default();

        let run = cli::run_reinvest_pipeline(&job("eq.csv", "out.csv"), &data, &output).unwrap();
        assert_eq!(run.rebalance_count(), 1);
        assert!(output.written.borrow().contains_key("out.csv"));
    }

    #[test]
    fn missing_input_writes_nothing() {
        let data = MockDataPort::new();
        let output = MemoryOutputPort::default();
        let err = cli::run_reinvest_pipeline(&job("nope.csv", "out.csv"), &data, &output)
            .unwrap_err();
        assert!(matches!(err, ReinvestorError::NotFound { .. }));
        assert!(output.written.borrow().is_empty());
    }

    #[test]
    fn csv_in_csv_out() {
        let dir = TempDir::new().unwrap();
        write_file(
            dir.path(),
            "my_equity.csv",
            "time,equity\n2023-12-01,100\n2024-01-01,110\n2024-02-01,104.5\n",
        );
        let input = dir.path().join("my_equity.csv");
        let job = cli::build_reinvest_job(None, input.to_str(), None, Some("1")).unwrap();
        assert!(job.output.ends_with("reinvest_my_equity.csv"));

        let csv = CsvAdapter::new(Default::default());
        cli::run_reinvest_pipeline(&job, &csv, &csv).unwrap();

        let written = fs::read_to_string(dir.path().join("reinvest_my_equity.csv")).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(
            lines[0],
            "time;equity;pnl;multiplier;pnl_reinvest;equity_reinvest"
        );
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("2023-12-01;100;0;1;0;1"));
    }

    #[test]
    fn csv_keeps_text_columns_and_time_strings() {
        let dir = TempDir::new().unwrap();
        write_file(
            dir.path(),
            "tagged.csv",
            "time,equity,strategy\n\
             2023-12-01T00:00:00+01:00,100,trend\n\
             2024-01-01T00:00:00+01:00,110,trend\n\
             2024-02-01T00:00:00+01:00,104.5,carry\n",
        );
        let input = dir.path().join("tagged.csv");
        let job = cli::build_reinvest_job(None, input.to_str(), None, Some("1")).unwrap();

        let csv = CsvAdapter::new(Default::default());
        cli::run_reinvest_pipeline(&job, &csv, &csv).unwrap();

        let written = fs::read_to_string(dir.path().join("reinvest_tagged.csv")).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(
            lines[0],
            "time;equity;strategy;pnl;multiplier;pnl_reinvest;equity_reinvest"
        );
        assert!(lines[1].starts_with("2023-12-01T00:00:00+01:00;100;trend;0;1;0;1"));
        assert!(lines[3].starts_with("2024-02-01T00:00:00+01:00;104.5;carry;"));
    }

    #[test]
    fn gap_in_equity_bridges_to_last_value() {
        let frame = monthly_equity_frame(11, &[0.0, 0.0, 0.0])
            .with_column("equity", vec![Some(100.0), None, Some(110.0)])
            .unwrap();
        let data = MockDataPort::new().with_frame("eq.csv", frame);
        let output = MemoryOutputPort::default();

        cli::run_reinvest_pipeline(&job("eq.csv", "out.csv"), &data, &output).unwrap();

        let written = output.written.borrow();
        let pnl = written["out.csv"].column(PNL).unwrap();
        assert_eq!(pnl[0], Some(0.0));
        assert_eq!(pnl[1], Some(0.0));
        assert_relative_eq!(pnl[2].unwrap(), 0.1, epsilon = 1e-12);
    }

    #[test]
    fn csv_missing_input_is_not_found() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("absent.csv");
        let job = cli::build_reinvest_job(None, input.to_str(), None, None).unwrap();

        let csv = CsvAdapter::new(Default::default());
        let err = cli::run_reinvest_pipeline(&job, &csv, &csv).unwrap_err();
        assert!(matches!(err, ReinvestorError::NotFound { .. }));
        assert!(!dir.path().join("reinvest_absent.csv").exists());
    }
}
