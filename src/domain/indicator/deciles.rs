//! Equal-frequency decile buckets over a whole column.
//!
//! Edges are the 0%, 10%, …, 100% quantiles of every defined value in the
//! column (linear interpolation between order statistics). Repeated edges
//! collapse, which leaves fewer than ten buckets. Bucket `i` covers
//! `(edge[i], edge[i + 1]]`; bucket 0 also takes `edge[0]`.
//!
//! This looks at the entire series at once, future rows included. Using the
//! labels as a backtest feature leaks information from the future.

use crate::domain::error::ReinvestorError;
use crate::domain::frame::{Column, Frame};
use crate::domain::indicator::{MissingPolicy, OutputMode, assemble};

pub const DECILE: &str = "Decile";

const BUCKETS: usize = 10;

pub fn deciles(frame: &Frame, column: &str, mode: OutputMode) -> Result<Frame, ReinvestorError> {
    let values = frame.require(column)?;
    let labels = decile_labels(values)
        .into_iter()
        .map(|label| label.map(f64::from))
        .collect();

    assemble(
        frame,
        vec![Column::new(DECILE, labels)],
        MissingPolicy::Keep,
        mode,
    )
}

/// Distinct quantile edges, ascending. Fewer than two edges means no bucket
/// can be formed.
pub fn decile_edges(values: &[Option<f64>]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().flatten().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return Vec::new();
    }
    sorted.sort_by(f64::total_cmp);

    let mut edges: Vec<f64> = (0..=BUCKETS)
        .map(|i| quantile(&sorted, i as f64 / BUCKETS as f64))
        .collect();
    edges.dedup();
    edges
}

fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    if hi == lo {
        sorted[lo]
    } else {
        sorted[lo] + (sorted[hi] - sorted[lo]) * frac
    }
}

pub fn decile_labels(values: &[Option<f64>]) -> Vec<Option<u8>> {
    let edges = decile_edges(values);
    if edges.len() < 2 {
        log::debug!("decile edges collapsed to {}; no buckets", edges.len());
        return vec![None; values.len()];
    }
    if edges.len() < BUCKETS + 1 {
        log::debug!("decile edges collapsed: {} buckets", edges.len() - 1);
    }

    values
        .iter()
        .map(|v| {
            let v = (*v).filter(|x| !x.is_nan())?;
            if v == edges[0] {
                return Some(0);
            }
            // count of edges strictly below v; v <= last edge always holds
            let above = edges.partition_point(|e| *e < v);
            if above == 0 || above >= edges.len() {
                return None;
            }
            Some((above - 1) as u8)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn some(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    fn index(n: usize) -> Vec<NaiveDateTime> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        (0..n)
            .map(|i| start + chrono::Duration::days(i as i64))
            .collect()
    }

    #[test]
    fn one_value_per_bucket() {
        let values: Vec<f64> = (1..=10).map(f64::from).collect();
        let labels = decile_labels(&some(&values));
        let expected: Vec<Option<u8>> = (0..10).map(Some).collect();
        assert_eq!(labels, expected);
    }

    #[test]
    fn twenty_values_two_per_bucket() {
        let values: Vec<f64> = (0..20).map(f64::from).collect();
        let labels = decile_labels(&some(&values));
        for (i, label) in labels.iter().enumerate() {
            assert_eq!(*label, Some((i / 2) as u8), "row {i}");
        }
    }

    #[test]
    fn order_of_rows_does_not_matter() {
        let labels = decile_labels(&some(&[10.0, 1.0, 5.0, 3.0, 8.0]));
        // edges 1, 1.8, 2.6, 3.4, 4.2, 5, 6.2, 7.4, 8.4, 9.2, 10
        assert_eq!(labels, vec![Some(9), Some(0), Some(4), Some(2), Some(7)]);
    }

    #[test]
    fn repeated_values_collapse_buckets() {
        let values = some(&[1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 3.0]);
        let edges = decile_edges(&values);
        assert!(edges.len() < 11);
        let labels = decile_labels(&values);
        let max = labels.iter().flatten().max().copied().unwrap();
        assert!(max < 9);
        assert_eq!(labels[0], Some(0));
        assert!(labels[9] > labels[8]);
    }

    #[test]
    fn constant_column_has_no_buckets() {
        assert_eq!(decile_labels(&some(&[4.0, 4.0, 4.0])), vec![None, None, None]);
    }

    #[test]
    fn missing_input_keeps_missing_label() {
        let labels = decile_labels(&[Some(1.0), None, Some(2.0)]);
        assert_eq!(labels[1], None);
        assert_eq!(labels[0], Some(0));
        assert_eq!(labels[2], Some(9));
    }

    #[test]
    fn empty_column() {
        assert!(decile_labels(&[]).is_empty());
        assert!(decile_edges(&[None, None]).is_empty());
    }

    #[test]
    fn frame_output_keeps_every_row() {
        let frame = Frame::new(index(4))
            .unwrap()
            .with_column("Close", vec![Some(3.0), Some(1.0), None, Some(2.0)])
            .unwrap();
        let out = deciles(&frame, "Close", OutputMode::ColumnsOnly).unwrap();
        assert_eq!(out.len(), 4);
        assert_eq!(
            out.column(DECILE).unwrap(),
            &[Some(9.0), Some(0.0), None, Some(4.0)]
        );
    }

    #[test]
    fn unknown_column_is_schema_error() {
        let frame = Frame::new(index(1)).unwrap();
        let err = deciles(&frame, "Volume", OutputMode::Append).unwrap_err();
        assert!(matches!(err, ReinvestorError::Schema { field } if field == "Volume"));
    }
}
