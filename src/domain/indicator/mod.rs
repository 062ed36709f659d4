//! Technical indicator transforms over column-named frames.
//!
//! Each transform borrows a [`Frame`], computes its derived columns with
//! [`WindowBuffer`](crate::domain::window::WindowBuffer) aggregates and
//! returns a new frame. Every transform resolves missing values with its own
//! fixed policy:
//!
//! | transform    | policy       |
//! |--------------|--------------|
//! | stochastic   | forward-fill |
//! | donchian     | drop rows    |
//! | atr          | drop rows    |
//! | deciles      | keep         |
//! | bollinger    | drop rows    |
//!
//! The policy is applied to the whole augmented frame before the output mode
//! selects columns, so `Append` and `ColumnsOnly` always agree on rows.

pub mod atr;
pub mod bollinger;
pub mod deciles;
pub mod donchian;
pub mod stochastic;

use crate::domain::error::ReinvestorError;
use crate::domain::frame::{Column, Frame};
use std::fmt;
use std::num::NonZeroUsize;

pub use atr::atr;
pub use bollinger::bollinger_bands;
pub use deciles::deciles;
pub use donchian::donchian;
pub use stochastic::stochastic;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Input columns followed by the derived columns.
    #[default]
    Append,
    /// Derived columns only.
    ColumnsOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MissingPolicy {
    ForwardFill,
    DropRows,
    Keep,
}

pub(crate) fn window_size(name: &str, value: usize) -> Result<NonZeroUsize, ReinvestorError> {
    NonZeroUsize::new(value)
        .ok_or_else(|| ReinvestorError::invalid_parameter(name, "must be at least 1"))
}

pub(crate) fn assemble(
    input: &Frame,
    derived: Vec<Column>,
    policy: MissingPolicy,
    mode: OutputMode,
) -> Result<Frame, ReinvestorError> {
    let names: Vec<String> = derived.iter().map(|c| c.name.clone()).collect();
    let mut frame = input.clone();
    for column in derived {
        frame.insert_column(column)?;
    }

    let frame = match policy {
        MissingPolicy::ForwardFill => frame.forward_fill(),
        MissingPolicy::DropRows => frame.drop_incomplete(),
        MissingPolicy::Keep => frame,
    };

    match mode {
        OutputMode::Append => Ok(frame),
        OutputMode::ColumnsOnly => {
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            frame.select(&names)
        }
    }
}

/// Indicator identity plus parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorType {
    Stochastic {
        k_period: usize,
        d_period: usize,
        smooth_k: usize,
    },
    Donchian {
        period: usize,
        offset: isize,
    },
    Atr {
        period: usize,
        relative: bool,
    },
    Deciles {
        column: String,
    },
    Bollinger {
        window: usize,
        num_std_dev: f64,
    },
}

impl IndicatorType {
    pub fn apply(&self, frame: &Frame, mode: OutputMode) -> Result<Frame, ReinvestorError> {
        match self {
            IndicatorType::Stochastic {
                k_period,
                d_period,
                smooth_k,
            } => stochastic(frame, *k_period, *d_period, *smooth_k, mode),
            IndicatorType::Donchian { period, offset } => donchian(frame, *period, *offset, mode),
            IndicatorType::Atr { period, relative } => atr(frame, *period, *relative, mode),
            IndicatorType::Deciles { column } => deciles(frame, column, mode),
            IndicatorType::Bollinger {
                window,
                num_std_dev,
            } => bollinger_bands(frame, *window, *num_std_dev, mode),
        }
    }

    /// Short lowercase name, used for output file suffixes.
    pub fn slug(&self) -> &'static str {
        match self {
            IndicatorType::Stochastic { .. } => "stochastic",
            IndicatorType::Donchian { .. } => "donchian",
            IndicatorType::Atr { .. } => "atr",
            IndicatorType::Deciles { .. } => "deciles",
            IndicatorType::Bollinger { .. } => "bollinger",
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Stochastic {
                k_period,
                d_period,
                smooth_k,
            } => write!(f, "STOCHASTIC({},{},{})", k_period, d_period, smooth_k),
            IndicatorType::Donchian { period, offset } => {
                write!(f, "DONCHIAN({},{})", period, offset)
            }
            IndicatorType::Atr { period, relative } => {
                if *relative {
                    write!(f, "ATR%({})", period)
                } else {
                    write!(f, "ATR({})", period)
                }
            }
            IndicatorType::Deciles { column } => write!(f, "DECILES({})", column),
            IndicatorType::Bollinger {
                window,
                num_std_dev,
            } => write!(f, "BOLLINGER({},{})", window, num_std_dev),
        }
    }
}
