//! Reinvestment simulation.
//!
//! Converts a non-reinvested return stream into a reinvested one. Every time
//! the calendar moves *into* a trigger tag from a non-trigger tag (a rising
//! edge), the compounded gain so far is locked in as the new capital base:
//!
//! ```text
//! multiplier    := 1 + cumulative_result      (rising edge only)
//! today_result  := pnl × multiplier
//! cumulative    += today_result
//! equity[t]     := Π (1 + today_result[s]), s ≤ t
//! ```
//!
//! The run state lives in a [`Reinvestor`] value owned by the caller. Periods
//! must be fed in time order; each step depends on every step before it.

use crate::domain::error::ReinvestorError;
use crate::domain::frame::{Column, Frame};
use crate::domain::indicator::OutputMode;
use chrono::Datelike;
use std::collections::BTreeSet;

pub const EQUITY: &str = "equity";
pub const PNL: &str = "pnl";
pub const MULTIPLIER: &str = "multiplier";
pub const PNL_REINVEST: &str = "pnl_reinvest";
pub const EQUITY_REINVEST: &str = "equity_reinvest";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReinvestStep {
    pub multiplier: f64,
    pub today_result: f64,
    pub cumulative_result: f64,
    pub rebalanced: bool,
}

#[derive(Debug, Clone)]
pub struct Reinvestor {
    triggers: BTreeSet<u32>,
    multiplier: f64,
    cumulative_result: f64,
    previous_tag: Option<u32>,
}

impl Reinvestor {
    pub fn new(triggers: impl IntoIterator<Item = u32>) -> Self {
        Self {
            triggers: triggers.into_iter().collect(),
            multiplier: 1.0,
            cumulative_result: 0.0,
            previous_tag: None,
        }
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    pub fn cumulative_result(&self) -> f64 {
        self.cumulative_result
    }

    pub fn previous_tag(&self) -> Option<u32> {
        self.previous_tag
    }

    fn is_trigger(&self, tag: u32) -> bool {
        self.triggers.contains(&tag)
    }

    /// Processes one period.
    pub fn step(&mut self, tag: u32, pnl: f64) -> ReinvestStep {
        let rebalanced = match self.previous_tag {
            Some(prev) => self.is_trigger(tag) && !self.is_trigger(prev),
            None => false,
        };
        if rebalanced {
            self.multiplier = 1.0 + self.cumulative_result;
            log::debug!(
                "rebalance on tag {}: multiplier {:.6}",
                tag,
                self.multiplier
            );
        }

        let today_result = pnl * self.multiplier;
        self.cumulative_result += today_result;
        self.previous_tag = Some(tag);

        ReinvestStep {
            multiplier: self.multiplier,
            today_result,
            cumulative_result: self.cumulative_result,
            rebalanced,
        }
    }

    /// Feeds every period through the simulator; the state is dropped afterwards.
    pub fn run(mut self, periods: impl IntoIterator<Item = (u32, f64)>) -> ReinvestRun {
        let steps: Vec<ReinvestStep> = periods
            .into_iter()
            .map(|(tag, pnl)| self.step(tag, pnl))
            .collect();
        let equity = equity_curve(steps.iter().map(|s| s.today_result));
        ReinvestRun { steps, equity }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReinvestRun {
    pub steps: Vec<ReinvestStep>,
    pub equity: Vec<f64>,
}

impl ReinvestRun {
    pub fn rebalance_count(&self) -> usize {
        self.steps.iter().filter(|s| s.rebalanced).count()
    }

    pub fn final_equity(&self) -> Option<f64> {
        self.equity.last().copied()
    }
}

/// Cumulative product of `1 + r`, anchored at 1.0 before the first period.
pub fn equity_curve(returns: impl IntoIterator<Item = f64>) -> Vec<f64> {
    let mut level = 1.0;
    returns
        .into_iter()
        .map(|r| {
            level *= 1.0 + r;
            level
        })
        .collect()
}

/// Period-over-period fractional change; the first period is 0.
///
/// A missing value yields a 0 return and the last defined value stays the
/// base for the next change, so gaps behave like a forward-filled series.
pub fn pct_change(values: &[Option<f64>], field: &str) -> Result<Vec<f64>, ReinvestorError> {
    let mut out = Vec::with_capacity(values.len());
    let mut previous: Option<f64> = None;
    for (row, value) in values.iter().enumerate() {
        let Some(current) = value.filter(|v| !v.is_nan()) else {
            out.push(0.0);
            continue;
        };
        let change = match previous {
            None => 0.0,
            Some(prev) if prev == 0.0 => {
                return Err(ReinvestorError::InvalidValue {
                    field: field.to_string(),
                    row,
                    reason: "previous value is zero".to_string(),
                });
            }
            Some(prev) => current / prev - 1.0,
        };
        out.push(change);
        previous = Some(current);
    }
    Ok(out)
}

/// Runs the simulator over an equity frame, tagging each period with the
/// month of its timestamp.
///
/// Adds `pnl`, `multiplier`, `pnl_reinvest` and `equity_reinvest`. The
/// input frame is left untouched.
pub fn simulate_frame(
    frame: &Frame,
    rebalance_months: &[u32],
    mode: OutputMode,
) -> Result<(Frame, ReinvestRun), ReinvestorError> {
    let equity = frame.require(EQUITY)?;
    let pnl = pct_change(equity, EQUITY)?;
    let tags = frame.index().iter().map(|ts| ts.month());

    let run = Reinvestor::new(rebalance_months.iter().copied()).run(tags.zip(pnl.iter().copied()));

    let derived = vec![
        Column::new(PNL, pnl.iter().copied().map(Some).collect()),
        Column::new(
            MULTIPLIER,
            run.steps.iter().map(|s| Some(s.multiplier)).collect(),
        ),
        Column::new(
            PNL_REINVEST,
            run.steps.iter().map(|s| Some(s.today_result)).collect(),
        ),
        Column::new(EQUITY_REINVEST, run.equity.iter().copied().map(Some).collect()),
    ];

    let out = match mode {
        OutputMode::Append => {
            let mut out = frame.clone();
            for column in derived {
                out.insert_column(column)?;
            }
            out
        }
        OutputMode::ColumnsOnly => {
            let mut out = frame.select(&[])?;
            for column in derived {
                out.insert_column(column)?;
            }
            out
        }
    };
    Ok((out, run))
}
