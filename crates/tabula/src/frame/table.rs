//! In-memory table with ordered columns and a (possibly composite) index.

use indexmap::IndexMap;

use crate::error::FrameError;

use super::series::Series;
use super::value::{DataType, Label, Value};

/// Row index of a table.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameIndex {
    /// A single index level.
    Single(Series),
    /// An ordered list of levels, all of the same length.
    Multi(Vec<Series>),
}

impl FrameIndex {
    /// Unnamed positional index `0..len`.
    pub fn range(len: usize) -> Self {
        FrameIndex::Single(Series::range(len))
    }

    pub fn single(series: Series) -> Self {
        FrameIndex::Single(series)
    }

    /// Build a composite index; every level must have the same length.
    pub fn multi(levels: Vec<Series>) -> Result<Self, FrameError> {
        let Some(first) = levels.first() else {
            return Err(FrameError::EmptyIndex);
        };
        let expected = first.len();
        if let Some(level) = levels.iter().find(|l| l.len() != expected) {
            return Err(FrameError::LengthMismatch {
                label: level
                    .name()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "index level".to_string()),
                expected,
                found: level.len(),
            });
        }
        Ok(FrameIndex::Multi(levels))
    }

    pub fn len(&self) -> usize {
        match self {
            FrameIndex::Single(s) => s.len(),
            FrameIndex::Multi(levels) => levels.first().map(Series::len).unwrap_or(0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_multi(&self) -> bool {
        matches!(self, FrameIndex::Multi(_))
    }

    /// All levels; a single index has exactly one.
    pub fn levels(&self) -> &[Series] {
        match self {
            FrameIndex::Single(s) => std::slice::from_ref(s),
            FrameIndex::Multi(levels) => levels,
        }
    }

    pub fn names(&self) -> Vec<Option<&Label>> {
        self.levels().iter().map(Series::name).collect()
    }

    /// Index entry at `row`, rendered as one value (tuples for composites).
    pub fn label_at(&self, row: usize) -> Value {
        match self {
            FrameIndex::Single(s) => s.get(row).cloned().unwrap_or(Value::Null),
            FrameIndex::Multi(levels) => {
                let parts: Vec<String> = levels
                    .iter()
                    .map(|l| l.get(row).map(ToString::to_string).unwrap_or_default())
                    .collect();
                Value::Str(format!("({})", parts.join(", ")))
            }
        }
    }

    pub(crate) fn replace_level(&mut self, position: usize, series: Series) {
        match self {
            FrameIndex::Single(s) if position == 0 => *s = series,
            FrameIndex::Multi(levels) => {
                if let Some(level) = levels.get_mut(position) {
                    *level = series;
                }
            }
            FrameIndex::Single(_) => {}
        }
    }
}

/// Column-major table keyed by [`Label`].
#[derive(Debug, Clone, PartialEq)]
pub struct DataFrame {
    columns: IndexMap<Label, Series>,
    index: FrameIndex,
}

impl DataFrame {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            columns: IndexMap::new(),
            index: FrameIndex::range(0),
        }
    }

    /// Create a table from `(label, series)` pairs with a positional index.
    pub fn from_columns<L, I>(columns: I) -> Result<Self, FrameError>
    where
        L: Into<Label>,
        I: IntoIterator<Item = (L, Series)>,
    {
        let mut columns = columns.into_iter().peekable();
        let rows = columns.peek().map(|(_, s)| s.len()).unwrap_or(0);
        let mut frame = Self {
            columns: IndexMap::new(),
            index: FrameIndex::range(rows),
        };
        for (label, series) in columns {
            frame = frame.with_column(label, series)?;
        }
        Ok(frame)
    }

    /// Create a table without columns.
    pub fn from_index(index: FrameIndex) -> Self {
        Self {
            columns: IndexMap::new(),
            index,
        }
    }

    /// Replace the index; its length must match the row count.
    pub fn with_index(mut self, index: FrameIndex) -> Result<Self, FrameError> {
        if !self.columns.is_empty() && index.len() != self.row_count() {
            return Err(FrameError::LengthMismatch {
                label: "index".to_string(),
                expected: self.row_count(),
                found: index.len(),
            });
        }
        self.index = index;
        Ok(self)
    }

    /// Add or replace a column.
    pub fn with_column(
        mut self,
        label: impl Into<Label>,
        series: Series,
    ) -> Result<Self, FrameError> {
        let label = label.into();
        if series.len() != self.row_count() {
            return Err(FrameError::LengthMismatch {
                label: label.to_string(),
                expected: self.row_count(),
                found: series.len(),
            });
        }
        let series = series.with_name(Some(label.clone()));
        self.columns.insert(label, series);
        Ok(self)
    }

    /// Remove a column, keeping the order of the others.
    pub fn drop_column(mut self, label: &Label) -> Self {
        self.columns.shift_remove(label);
        self
    }

    /// Keep only the given columns, in table order.
    pub fn select(mut self, keep: impl Fn(&Label) -> bool) -> Self {
        self.columns.retain(|label, _| keep(label));
        self
    }

    /// Replace the index with a positional range.
    pub fn reset_index(mut self) -> Self {
        self.index = FrameIndex::range(self.row_count());
        self
    }

    pub fn column(&self, label: &Label) -> Option<&Series> {
        self.columns.get(label)
    }

    pub fn has_column(&self, label: &Label) -> bool {
        self.columns.contains_key(label)
    }

    pub fn dtype(&self, label: &Label) -> Option<DataType> {
        self.columns.get(label).map(Series::dtype)
    }

    pub fn column_labels(&self) -> impl Iterator<Item = &Label> {
        self.columns.keys()
    }

    pub fn columns(&self) -> impl Iterator<Item = (&Label, &Series)> {
        self.columns.iter()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.index.len()
    }

    pub fn index(&self) -> &FrameIndex {
        &self.index
    }

    /// Evaluate a predicate on every cell, column by column.
    pub fn mask(&self, predicate: impl Fn(&Value) -> bool) -> Vec<(Label, Vec<bool>)> {
        self.columns
            .iter()
            .map(|(label, series)| (label.clone(), series.mask(&predicate)))
            .collect()
    }

    pub(crate) fn replace_column(&mut self, label: &Label, series: Series) {
        if let Some(slot) = self.columns.get_mut(label) {
            *slot = series.with_name(Some(label.clone()));
        }
    }

    pub(crate) fn replace_index_level(&mut self, position: usize, series: Series) {
        self.index.replace_level(position, series);
    }
}

impl Default for DataFrame {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_columns() {
        let df = DataFrame::from_columns([
            ("a", Series::from_values([1, 2, 3])),
            ("b", Series::from_values(["x", "y", "z"])),
        ])
        .unwrap();

        assert_eq!(df.row_count(), 3);
        assert_eq!(df.column_count(), 2);
        assert_eq!(df.dtype(&"b".into()), Some(DataType::Str));
        assert_eq!(df.column(&"a".into()).unwrap().name(), Some(&Label::from("a")));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let result = DataFrame::from_columns([
            ("a", Series::from_values([1, 2, 3])),
            ("b", Series::from_values([1])),
        ]);
        assert!(matches!(result, Err(FrameError::LengthMismatch { .. })));
    }

    #[test]
    fn test_multi_index() {
        let index = FrameIndex::multi(vec![
            Series::named("a", ["foo", "bar"]),
            Series::named("b", [0, 1]),
        ])
        .unwrap();
        let df = DataFrame::from_index(index);

        assert!(df.index().is_multi());
        assert_eq!(df.row_count(), 2);
        assert_eq!(df.index().label_at(1), Value::from("(bar, 1)"));
    }

    #[test]
    fn test_drop_and_reset() {
        let df = DataFrame::from_columns([
            ("a", Series::from_values([1])),
            ("b", Series::from_values([2])),
        ])
        .unwrap()
        .with_index(FrameIndex::single(Series::named("idx", ["r"])))
        .unwrap()
        .drop_column(&"a".into())
        .reset_index();

        assert_eq!(df.column_labels().collect::<Vec<_>>(), vec![&Label::from("b")]);
        assert_eq!(df.index().levels()[0].dtype(), DataType::Int64);
        assert!(df.index().levels()[0].name().is_none());
    }
}
