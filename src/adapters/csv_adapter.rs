//! Delimited file adapter.
//!
//! Reads a header-led table into a [`Frame`] and writes frames back out.
//! Columns whose cells all parse as numbers (empty cells become missing
//! values) enter the frame as numeric columns. Anything else is carried as
//! a text column. The raw timestamp strings and the header order are kept
//! too, so a written frame lists the source columns where they were.

use crate::domain::error::ReinvestorError;
use crate::domain::frame::{Cells, Column, Frame, TextColumn};
use crate::ports::data_port::DataPort;
use crate::ports::output_port::OutputPort;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use std::fs::File;
use std::io;
use std::path::PathBuf;

pub const DEFAULT_INPUT_DELIMITER: u8 = b',';
pub const OUTPUT_DELIMITER: u8 = b';';

pub struct CsvAdapter {
    base_path: PathBuf,
    input_delimiter: u8,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            base_path,
            input_delimiter: DEFAULT_INPUT_DELIMITER,
        }
    }

    pub fn with_input_delimiter(mut self, delimiter: u8) -> Self {
        self.input_delimiter = delimiter;
        self
    }

    fn resolve(&self, name: &str) -> PathBuf {
        self.base_path.join(name)
    }
}

/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD[T ]HH:MM[:SS[.f]]` and RFC 3339 with an
/// offset (kept as local wall-clock time).
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    for fmt in FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(ts);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.and_time(NaiveTime::MIN));
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.naive_local())
}

pub fn format_timestamp(ts: &NaiveDateTime, date_only: bool) -> String {
    if date_only {
        ts.format("%Y-%m-%d").to_string()
    } else {
        ts.format("%Y-%m-%d %H:%M:%S%.f").to_string()
    }
}

fn cell(record: &csv::StringRecord, idx: usize) -> &str {
    record.get(idx).unwrap_or_default()
}

fn parse_cell(raw: &str) -> Result<Option<f64>, ()> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<f64>()
        .map(|v| if v.is_nan() { None } else { Some(v) })
        .map_err(|_| ())
}

impl DataPort for CsvAdapter {
    fn read_frame(&self, source: &str, time_column: &str) -> Result<Frame, ReinvestorError> {
        let path = self.resolve(source);
        let file = File::open(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ReinvestorError::NotFound {
                path: path.display().to_string(),
            },
            _ => ReinvestorError::Io(e),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(self.input_delimiter)
            .from_reader(file);
        let headers = rdr.headers()?.clone();
        let time_idx = headers
            .iter()
            .position(|h| h.trim() == time_column)
            .ok_or_else(|| ReinvestorError::schema(time_column))?;

        let mut rows: Vec<(NaiveDateTime, csv::StringRecord)> = Vec::new();
        for (row, result) in rdr.records().enumerate() {
            let record = result?;
            let raw = cell(&record, time_idx);
            let ts = parse_timestamp(raw).ok_or_else(|| ReinvestorError::InvalidValue {
                field: time_column.to_string(),
                row,
                reason: format!("unrecognised timestamp {raw:?}"),
            })?;
            rows.push((ts, record));
        }

        if rows.windows(2).any(|w| w[1].0 < w[0].0) {
            log::debug!("{}: rows out of time order, sorting", path.display());
            rows.sort_by_key(|(ts, _)| *ts);
        }

        let layout: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();
        let labels = rows
            .iter()
            .map(|(_, record)| cell(record, time_idx).to_string())
            .collect();
        let mut frame = Frame::new(rows.iter().map(|(ts, _)| *ts).collect())?
            .with_index_name(time_column)
            .with_index_labels(labels)?
            .with_layout(layout);

        for (col_idx, name) in headers.iter().enumerate() {
            if col_idx == time_idx {
                continue;
            }
            let parsed: Result<Vec<Option<f64>>, ()> = rows
                .iter()
                .map(|(_, record)| parse_cell(cell(record, col_idx)))
                .collect();
            match parsed {
                Ok(values) => frame.insert_column(Column::new(name.trim(), values))?,
                Err(()) => {
                    log::debug!("{}: carrying {} as text", path.display(), name);
                    let values = rows
                        .iter()
                        .map(|(_, record)| cell(record, col_idx).to_string())
                        .collect();
                    frame.insert_text_column(TextColumn::new(name.trim(), values))?;
                }
            }
        }

        log::info!(
            "read {} rows, {} numeric and {} text columns from {}",
            frame.len(),
            frame.columns().len(),
            frame.text_columns().len(),
            path.display()
        );
        Ok(frame)
    }
}

impl OutputPort for CsvAdapter {
    fn write_frame(&self, frame: &Frame, destination: &str) -> Result<(), ReinvestorError> {
        let path = self.resolve(destination);
        let mut wtr = csv::WriterBuilder::new()
            .delimiter(OUTPUT_DELIMITER)
            .from_path(&path)?;

        let columns = frame.ordered_columns();
        wtr.write_record(columns.iter().map(|(name, _)| *name))?;

        let date_only = frame
            .index()
            .iter()
            .all(|ts| ts.num_seconds_from_midnight() == 0 && ts.nanosecond() == 0);

        for (row, ts) in frame.index().iter().enumerate() {
            let mut record = Vec::with_capacity(columns.len());
            for (_, cells) in &columns {
                record.push(match cells {
                    Cells::Index => match frame.index_labels() {
                        Some(labels) => labels[row].clone(),
                        None => format_timestamp(ts, date_only),
                    },
                    Cells::Numeric(values) => {
                        values[row].map(|v| v.to_string()).unwrap_or_default()
                    }
                    Cells::Text(values) => values[row].clone(),
                });
            }
            wtr.write_record(&record)?;
        }
        wtr.flush()?;

        log::info!("wrote {} rows to {}", frame.len(), path.display());
        Ok(())
    }
}
