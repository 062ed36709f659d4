//! Stochastic oscillator.
//!
//! raw %K = 100 × (Close − LL(k)) / (HH(k) − LL(k))
//! %K     = SMA(raw %K, smooth_k)
//! %D     = SMA(%K, d_period)
//!
//! A flat window (HH == LL) has no defined %K. Missing values are
//! forward-filled afterwards, so the output always has one row per input row.

use crate::domain::error::ReinvestorError;
use crate::domain::frame::{Column, Frame};
use crate::domain::indicator::{MissingPolicy, OutputMode, assemble, window_size};
use crate::domain::ohlcv::{CLOSE, HIGH, LOW};
use crate::domain::window::{rolling_max, rolling_mean, rolling_min};

pub const K: &str = "K";
pub const D: &str = "D";

pub fn stochastic(
    frame: &Frame,
    k_period: usize,
    d_period: usize,
    smooth_k: usize,
    mode: OutputMode,
) -> Result<Frame, ReinvestorError> {
    let high = frame.require(HIGH)?;
    let low = frame.require(LOW)?;
    let close = frame.require(CLOSE)?;
    let k_window = window_size("k_period", k_period)?;
    let d_window = window_size("d_period", d_period)?;
    let smooth_window = window_size("smooth_k", smooth_k)?;

    let highest = rolling_max(high, k_window);
    let lowest = rolling_min(low, k_window);

    let raw_k: Vec<Option<f64>> = close
        .iter()
        .zip(highest.iter().zip(&lowest))
        .map(|(c, (hh, ll))| match (*c, *hh, *ll) {
            (Some(c), Some(hh), Some(ll)) if hh != ll => Some(100.0 * (c - ll) / (hh - ll)),
            _ => None,
        })
        .collect();

    let k = rolling_mean(&raw_k, smooth_window);
    let d = rolling_mean(&k, d_window);

    assemble(
        frame,
        vec![Column::new(K, k), Column::new(D, d)],
        MissingPolicy::ForwardFill,
        mode,
    )
}
