//! Table-level schema: the compiled, immutable result of a model.

use indexmap::IndexMap;

use crate::error::ValidationError;
use crate::frame::{DataFrame, Label};
use crate::model::Strictness;
use crate::validation::ValidationEngine;

use super::column::{ColumnSchema, SchemaIndex, TableCheck, same_elements};

/// Schema for an entire table.
///
/// Once compiled a schema is never mutated, so one instance can serve any
/// number of validation calls.
#[derive(Debug, Clone)]
pub struct DataFrameSchema {
    /// Column contracts keyed by resolved alias, in declaration order.
    pub columns: IndexMap<Label, ColumnSchema>,
    pub index: Option<SchemaIndex>,
    /// Whole-table checks.
    pub checks: Vec<TableCheck>,
    pub name: Option<String>,
    pub coerce: bool,
    pub strict: Strictness,
    pub ordered: bool,
}

impl DataFrameSchema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self {
            columns: IndexMap::new(),
            index: None,
            checks: Vec::new(),
            name: None,
            coerce: false,
            strict: Strictness::No,
            ordered: false,
        }
    }

    pub fn column(mut self, column: ColumnSchema) -> Self {
        self.columns.insert(column.name.clone(), column);
        self
    }

    pub fn index(mut self, index: impl Into<SchemaIndex>) -> Self {
        self.index = Some(index.into());
        self
    }

    pub fn check(mut self, check: TableCheck) -> Self {
        self.checks.push(check);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn coerce(mut self, coerce: bool) -> Self {
        self.coerce = coerce;
        self
    }

    pub fn strict(mut self, strict: impl Into<Strictness>) -> Self {
        self.strict = strict.into();
        self
    }

    pub fn ordered(mut self, ordered: bool) -> Self {
        self.ordered = ordered;
        self
    }

    /// Get a column contract by alias.
    pub fn get_column(&self, name: &Label) -> Option<&ColumnSchema> {
        self.columns.get(name)
    }

    pub fn column_names(&self) -> Vec<&Label> {
        self.columns.keys().collect()
    }

    /// Validate `df`, returning it (possibly coerced) when it conforms.
    ///
    /// With `lazy`, every failure is collected into one
    /// [`ValidationError::Errors`]; otherwise the first failure is returned.
    pub fn validate(&self, df: DataFrame, lazy: bool) -> Result<DataFrame, ValidationError> {
        ValidationEngine::new(self).run(df, lazy)
    }
}

impl Default for DataFrameSchema {
    fn default() -> Self {
        Self::new()
    }
}

/// Column order matters only when either side is ordered.
impl PartialEq for DataFrameSchema {
    fn eq(&self, other: &Self) -> bool {
        let columns_equal = if self.ordered || other.ordered {
            self.columns.len() == other.columns.len()
                && self
                    .columns
                    .iter()
                    .zip(other.columns.iter())
                    .all(|(a, b)| a == b)
        } else {
            self.columns == other.columns
        };

        columns_equal
            && self.index == other.index
            && same_elements(&self.checks, &other.checks)
            && self.name == other.name
            && self.coerce == other.coerce
            && self.strict == other.strict
            && self.ordered == other.ordered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::DataType;

    #[test]
    fn test_unordered_columns_compare_as_set() {
        let a = DataFrameSchema::new()
            .column(ColumnSchema::new("a", DataType::Int64))
            .column(ColumnSchema::new("b", DataType::Str));
        let b = DataFrameSchema::new()
            .column(ColumnSchema::new("b", DataType::Str))
            .column(ColumnSchema::new("a", DataType::Int64));
        assert_eq!(a, b);
        assert_ne!(a.clone().ordered(true), b.ordered(true));
    }

    #[test]
    fn test_options_matter() {
        let a = DataFrameSchema::new().column(ColumnSchema::new("a", DataType::Int64));
        assert_ne!(a.clone(), a.clone().coerce(true));
        assert_ne!(a.clone(), a.name("named"));
    }
}
