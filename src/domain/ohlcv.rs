//! OHLC bar representation and the column names indicators read.

use crate::domain::error::ReinvestorError;
use crate::domain::frame::Frame;
use chrono::NaiveDateTime;

pub const OPEN: &str = "Open";
pub const HIGH: &str = "High";
pub const LOW: &str = "Low";
pub const CLOSE: &str = "Close";

#[derive(Debug, Clone)]
pub struct OhlcBar {
    pub time: NaiveDateTime,
    pub open: Option<f64>,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl OhlcBar {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        true_range(self.high, self.low, prev_close)
    }
}

pub fn true_range(high: f64, low: f64, prev_close: f64) -> f64 {
    let hl = high - low;
    let hc = (high - prev_close).abs();
    let lc = (low - prev_close).abs();
    hl.max(hc).max(lc)
}

/// Lays bars out as `Open` (only if any bar has one), `High`, `Low`, `Close`.
pub fn bars_to_frame(bars: &[OhlcBar]) -> Result<Frame, ReinvestorError> {
    let mut frame = Frame::new(bars.iter().map(|b| b.time).collect())?;
    if bars.iter().any(|b| b.open.is_some()) {
        frame = frame.with_column(OPEN, bars.iter().map(|b| b.open).collect())?;
    }
    frame
        .with_column(HIGH, bars.iter().map(|b| Some(b.high)).collect())?
        .with_column(LOW, bars.iter().map(|b| Some(b.low)).collect())?
        .with_column(CLOSE, bars.iter().map(|b| Some(b.close)).collect())
}
