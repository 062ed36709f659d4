//! Donchian channel.
//!
//! Upper = HH(period) shifted by `offset`, Lower = LL(period) shifted by
//! `offset`, Middle = (Upper + Lower) / 2. Incomplete rows are dropped.

use crate::domain::error::ReinvestorError;
use crate::domain::frame::{Column, Frame, shift};
use crate::domain::indicator::{MissingPolicy, OutputMode, assemble, window_size};
use crate::domain::ohlcv::{HIGH, LOW};
use crate::domain::window::{rolling_max, rolling_min};

pub const UPPER: &str = "Upper";
pub const LOWER: &str = "Lower";
pub const MIDDLE: &str = "Middle";

pub fn donchian(
    frame: &Frame,
    period: usize,
    offset: isize,
    mode: OutputMode,
) -> Result<Frame, ReinvestorError> {
    let high = frame.require(HIGH)?;
    let low = frame.require(LOW)?;
    let window = window_size("period", period)?;

    let upper = shift(&rolling_max(high, window), offset);
    let lower = shift(&rolling_min(low, window), offset);
    let middle = upper
        .iter()
        .zip(&lower)
        .map(|(u, l)| Some((u.as_ref()? + l.as_ref()?) / 2.0))
        .collect();

    assemble(
        frame,
        vec![
            Column::new(UPPER, upper),
            Column::new(LOWER, lower),
            Column::new(MIDDLE, middle),
        ],
        MissingPolicy::DropRows,
        mode,
    )
}
