#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use reinvestor::domain::error::ReinvestorError;
use reinvestor::domain::frame::Frame;
pub use reinvestor::domain::ohlcv::{OhlcBar, bars_to_frame};
use reinvestor::ports::data_port::DataPort;
use reinvestor::ports::output_port::OutputPort;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub struct MockDataPort {
    pub frames: HashMap<String, Frame>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            frames: HashMap::new(),
        }
    }

    pub fn with_frame(mut self, source: &str, frame: Frame) -> Self {
        self.frames.insert(source.to_string(), frame);
        self
    }
}

impl DataPort for MockDataPort {
    fn read_frame(&self, source: &str, _time_column: &str) -> Result<Frame, ReinvestorError> {
        self.frames
            .get(source)
            .cloned()
            .ok_or_else(|| ReinvestorError::NotFound {
                path: source.to_string(),
            })
    }
}

/// Collects written frames in memory, keyed by destination.
#[derive(Default)]
pub struct MemoryOutputPort {
    pub written: RefCell<HashMap<String, Frame>>,
}

impl OutputPort for MemoryOutputPort {
    fn write_frame(&self, frame: &Frame, destination: &str) -> Result<(), ReinvestorError> {
        self.written
            .borrow_mut()
            .insert(destination.to_string(), frame.clone());
        Ok(())
    }
}

pub fn day(offset: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + Duration::days(offset)
}

pub fn make_bar(offset: i64, high: f64, low: f64, close: f64) -> OhlcBar {
    OhlcBar {
        time: day(offset),
        open: None,
        high,
        low,
        close,
    }
}

/// Deterministic zig-zag price path with a slow upward drift.
pub fn sample_bars(n: usize) -> Vec<OhlcBar> {
    (0..n)
        .map(|i| {
            let base = 100.0 + i as f64 * 0.5 + ((i % 7) as f64 - 3.0) * 1.5;
            make_bar(i as i64, base + 2.0, base - 2.0, base + ((i % 3) as f64 - 1.0))
        })
        .collect()
}

pub fn sample_frame(n: usize) -> Frame {
    bars_to_frame(&sample_bars(n)).unwrap()
}

/// Month-start equity frame from `values`, beginning in `start_month` of 2023.
pub fn monthly_equity_frame(start_month: u32, values: &[f64]) -> Frame {
    let index = (0..values.len())
        .map(|i| {
            let m = start_month as usize - 1 + i;
            NaiveDate::from_ymd_opt(2023 + (m / 12) as i32, (m % 12) as u32 + 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        })
        .collect();
    Frame::new(index)
        .unwrap()
        .with_values("equity", values)
        .unwrap()
}

pub fn write_file(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

pub fn ohlc_csv(bars: &[OhlcBar]) -> String {
    let mut out = String::from("time,High,Low,Close\n");
    for bar in bars {
        out.push_str(&format!(
            "{},{},{},{}\n",
            bar.time.format("%Y-%m-%d"),
            bar.high,
            bar.low,
            bar.close
        ));
    }
    out
}
