//! Bollinger Bands.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) of Close over `window` periods
//! - Upper: Middle + (num_std_dev × StdDev)
//! - Lower: Middle - (num_std_dev × StdDev)
//!
//! Where StdDev is the sample standard deviation (divides by N-1), so a
//! one-period window never produces a band.
//!
//! Incomplete rows are dropped: the first (window-1) rows never appear.

use crate::domain::error::ReinvestorError;
use crate::domain::frame::{Column, Frame};
use crate::domain::indicator::{MissingPolicy, OutputMode, assemble, window_size};
use crate::domain::ohlcv::CLOSE;
use crate::domain::window::{rolling_mean, rolling_std};

pub const UPPER_BOLLINGER: &str = "UpperBollinger";
pub const LOWER_BOLLINGER: &str = "LowerBollinger";
pub const MIDDLE_BOLLINGER: &str = "MiddleBollinger";

pub fn bollinger_bands(
    frame: &Frame,
    window: usize,
    num_std_dev: f64,
    mode: OutputMode,
) -> Result<Frame, ReinvestorError> {
    let close = frame.require(CLOSE)?;
    let size = window_size("window", window)?;

    let middle = rolling_mean(close, size);
    let std = rolling_std(close, size);
    let band = |sign: f64| -> Vec<Option<f64>> {
        middle
            .iter()
            .zip(&std)
            .map(|(m, s)| Some(m.as_ref()? + sign * num_std_dev * s.as_ref()?))
            .collect()
    };
    let upper = band(1.0);
    let lower = band(-1.0);

    assemble(
        frame,
        vec![
            Column::new(UPPER_BOLLINGER, upper),
            Column::new(LOWER_BOLLINGER, lower),
            Column::new(MIDDLE_BOLLINGER, middle),
        ],
        MissingPolicy::DropRows,
        mode,
    )
}
