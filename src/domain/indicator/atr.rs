//! Average True Range.
//!
//! TR[i]  = max(H[i] − L[i], |H[i] − C[i−1]|, |L[i] − C[i−1]|), undefined at i = 0
//! ATR[i] = SMA(TR, period)
//!
//! With `relative` the output is ATR / Close × 100. Incomplete rows are
//! dropped, so the first `period` rows never appear.

use crate::domain::error::ReinvestorError;
use crate::domain::frame::{Column, Frame};
use crate::domain::indicator::{MissingPolicy, OutputMode, assemble, window_size};
use crate::domain::ohlcv::{CLOSE, HIGH, LOW, true_range};
use crate::domain::window::rolling_mean;

pub const ATR: &str = "ATR";

pub fn atr(
    frame: &Frame,
    period: usize,
    relative: bool,
    mode: OutputMode,
) -> Result<Frame, ReinvestorError> {
    let high = frame.require(HIGH)?;
    let low = frame.require(LOW)?;
    let close = frame.require(CLOSE)?;
    let window = window_size("period", period)?;

    let mut tr: Vec<Option<f64>> = Vec::with_capacity(frame.len());
    let mut prev_close: Option<f64> = None;
    for i in 0..frame.len() {
        tr.push(match (high[i], low[i], prev_close) {
            (Some(h), Some(l), Some(pc)) => Some(true_range(h, l, pc)),
            _ => None,
        });
        prev_close = close[i];
    }

    let mean_tr = rolling_mean(&tr, window);
    let values = if relative {
        mean_tr
            .iter()
            .zip(close)
            .map(|(a, c)| match (*a, *c) {
                (Some(a), Some(c)) if c != 0.0 => Some(a / c * 100.0),
                _ => None,
            })
            .collect()
    } else {
        mean_tr
    };

    assemble(
        frame,
        vec![Column::new(ATR, values)],
        MissingPolicy::DropRows,
        mode,
    )
}
