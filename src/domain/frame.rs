//! Column-named time series.
//!
//! A [`Frame`] is a strictly increasing timestamp index plus any number of
//! named numeric columns. Every cell is an `Option<f64>`: `None` is the
//! missing-value sentinel ("not computable yet"), never a stand-in for zero.
//!
//! Besides the numeric columns a frame can carry text columns, the raw
//! timestamp strings it was read from and the source column order. None of
//! these take part in any computation. Row filters keep them aligned, and
//! writers use them to reproduce the input layout.
//!
//! Frames are values. Transforms borrow a frame and hand back a new one; the
//! caller's frame is never touched.

use crate::domain::error::ReinvestorError;
use chrono::NaiveDateTime;

pub const DEFAULT_INDEX_NAME: &str = "time";

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Non-numeric column, passed through verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct TextColumn {
    pub name: String,
    pub values: Vec<String>,
}

impl TextColumn {
    pub fn new(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Borrowed view of one output column's cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cells<'a> {
    /// The timestamp index.
    Index,
    Numeric(&'a [Option<f64>]),
    Text(&'a [String]),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    index_name: String,
    index: Vec<NaiveDateTime>,
    index_labels: Option<Vec<String>>,
    columns: Vec<Column>,
    text_columns: Vec<TextColumn>,
    layout: Vec<String>,
}

fn pick_rows<T: Clone>(values: &[T], keep: &[bool]) -> Vec<T> {
    values
        .iter()
        .enumerate()
        .filter(|(row, _)| keep.get(*row).copied().unwrap_or(false))
        .map(|(_, v)| v.clone())
        .collect()
}

impl Frame {
    /// Builds an empty-columned frame over `index`.
    ///
    /// Fails with [`ReinvestorError::UnorderedIndex`] at the first timestamp
    /// that is not strictly greater than its predecessor.
    pub fn new(index: Vec<NaiveDateTime>) -> Result<Self, ReinvestorError> {
        if let Some(pos) = index.windows(2).position(|w| w[1] <= w[0]) {
            return Err(ReinvestorError::UnorderedIndex { row: pos + 1 });
        }
        Ok(Self {
            index_name: DEFAULT_INDEX_NAME.to_string(),
            index,
            index_labels: None,
            columns: Vec::new(),
            text_columns: Vec::new(),
            layout: Vec::new(),
        })
    }

    pub fn with_index_name(mut self, name: impl Into<String>) -> Self {
        self.index_name = name.into();
        self
    }

    /// Attaches the timestamp strings as they appeared in the source, one per row.
    pub fn with_index_labels(mut self, labels: Vec<String>) -> Result<Self, ReinvestorError> {
        if labels.len() != self.index.len() {
            return Err(ReinvestorError::LengthMismatch {
                column: self.index_name,
                expected: self.index.len(),
                actual: labels.len(),
            });
        }
        self.index_labels = Some(labels);
        Ok(self)
    }

    /// Records the source column order, index column included.
    pub fn with_layout(mut self, names: Vec<String>) -> Self {
        self.layout = names;
        self
    }

    /// Adds a column, replacing any existing column with the same name in place.
    pub fn insert_column(&mut self, column: Column) -> Result<(), ReinvestorError> {
        if column.values.len() != self.index.len() {
            return Err(ReinvestorError::LengthMismatch {
                column: column.name,
                expected: self.index.len(),
                actual: column.values.len(),
            });
        }
        self.text_columns.retain(|c| c.name != column.name);
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
        Ok(())
    }

    /// Text counterpart of [`Frame::insert_column`]. A numeric column of the
    /// same name is removed.
    pub fn insert_text_column(&mut self, column: TextColumn) -> Result<(), ReinvestorError> {
        if column.values.len() != self.index.len() {
            return Err(ReinvestorError::LengthMismatch {
                column: column.name,
                expected: self.index.len(),
                actual: column.values.len(),
            });
        }
        self.columns.retain(|c| c.name != column.name);
        match self.text_columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => *existing = column,
            None => self.text_columns.push(column),
        }
        Ok(())
    }

    pub fn with_column(
        mut self,
        name: impl Into<String>,
        values: Vec<Option<f64>>,
    ) -> Result<Self, ReinvestorError> {
        self.insert_column(Column::new(name, values))?;
        Ok(self)
    }

    /// Convenience for columns with no missing cells.
    pub fn with_values(
        self,
        name: impl Into<String>,
        values: &[f64],
    ) -> Result<Self, ReinvestorError> {
        self.with_column(name, values.iter().copied().map(Some).collect())
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn index(&self) -> &[NaiveDateTime] {
        &self.index
    }

    pub fn index_labels(&self) -> Option<&[String]> {
        self.index_labels.as_deref()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn text_columns(&self) -> &[TextColumn] {
        &self.text_columns
    }

    /// Numeric column names, in insertion order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    pub fn text_column(&self, name: &str) -> Option<&[String]> {
        self.text_columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Like [`Frame::column`] but a missing column is a schema violation.
    pub fn require(&self, name: &str) -> Result<&[Option<f64>], ReinvestorError> {
        self.column(name)
            .ok_or_else(|| ReinvestorError::schema(name))
    }

    /// Every column in output order: source columns in their recorded
    /// positions first, then numeric columns added since, then any other
    /// text columns. The index leads unless the layout places it.
    pub fn ordered_columns(&self) -> Vec<(&str, Cells<'_>)> {
        let mut out: Vec<(&str, Cells<'_>)> = Vec::new();
        if !self.layout.contains(&self.index_name) {
            out.push((self.index_name.as_str(), Cells::Index));
        }
        for name in &self.layout {
            if *name == self.index_name {
                out.push((self.index_name.as_str(), Cells::Index));
            } else if let Some(c) = self.columns.iter().find(|c| &c.name == name) {
                out.push((c.name.as_str(), Cells::Numeric(&c.values)));
            } else if let Some(c) = self.text_columns.iter().find(|c| &c.name == name) {
                out.push((c.name.as_str(), Cells::Text(&c.values)));
            }
        }
        for c in &self.columns {
            if !self.layout.contains(&c.name) {
                out.push((c.name.as_str(), Cells::Numeric(&c.values)));
            }
        }
        for c in &self.text_columns {
            if !self.layout.contains(&c.name) {
                out.push((c.name.as_str(), Cells::Text(&c.values)));
            }
        }
        out
    }

    /// New frame holding only the numeric `names`, in that order, over the
    /// same index. Text columns and the source layout are not carried.
    pub fn select(&self, names: &[&str]) -> Result<Frame, ReinvestorError> {
        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            columns.push(Column::new(*name, self.require(name)?.to_vec()));
        }
        Ok(Frame {
            index_name: self.index_name.clone(),
            index: self.index.clone(),
            index_labels: self.index_labels.clone(),
            columns,
            text_columns: Vec::new(),
            layout: Vec::new(),
        })
    }

    /// Keeps rows whose `keep` flag is set. `keep` must cover every row.
    pub fn retain_rows(&self, keep: &[bool]) -> Frame {
        Frame {
            index_name: self.index_name.clone(),
            index: pick_rows(&self.index, keep),
            index_labels: self.index_labels.as_deref().map(|l| pick_rows(l, keep)),
            columns: self
                .columns
                .iter()
                .map(|c| Column::new(c.name.clone(), pick_rows(&c.values, keep)))
                .collect(),
            text_columns: self
                .text_columns
                .iter()
                .map(|c| TextColumn::new(c.name.clone(), pick_rows(&c.values, keep)))
                .collect(),
            layout: self.layout.clone(),
        }
    }

    /// Drops every row with a missing cell in any numeric column.
    pub fn drop_incomplete(&self) -> Frame {
        let keep: Vec<bool> = (0..self.len())
            .map(|row| self.columns.iter().all(|c| c.values[row].is_some()))
            .collect();
        self.retain_rows(&keep)
    }

    /// Replaces each missing cell with the last defined value above it in the
    /// same column. Leading gaps stay missing. Text columns are left as is.
    pub fn forward_fill(&self) -> Frame {
        let mut filled = self.clone();
        for column in &mut filled.columns {
            column.values = forward_fill(&column.values);
        }
        filled
    }
}

pub fn forward_fill(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut last = None;
    values
        .iter()
        .map(|v| {
            if v.is_some() {
                last = *v;
            }
            last
        })
        .collect()
}

/// Moves every value `offset` rows later (negative: earlier). Cells shifted
/// in from outside the series are missing.
pub fn shift(values: &[Option<f64>], offset: isize) -> Vec<Option<f64>> {
    let n = values.len() as isize;
    (0..n)
        .map(|i| {
            let src = i - offset;
            if (0..n).contains(&src) {
                values[src as usize]
            } else {
                None
            }
        })
        .collect()
}
