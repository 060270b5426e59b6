//! Error types for the Tabula library.
//!
//! Definition-time problems surface as [`SchemaInitError`] when a model is
//! compiled. Data that does not conform surfaces as [`ValidationError`]:
//! a single [`SchemaError`] in fail-fast mode, or one [`SchemaErrors`]
//! aggregate in lazy mode.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::frame::{Label, Value};
use crate::model::Role;

/// Main error type for Tabula operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The model could not be compiled.
    #[error(transparent)]
    Init(#[from] SchemaInitError),

    /// The data did not satisfy the schema.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A table could not be assembled.
    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// Result type alias for Tabula operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while resolving or compiling a model.
#[derive(Debug, Error)]
pub enum SchemaInitError {
    /// Attributes assigned a `Field` without a type annotation.
    #[error("Found missing annotations: [{}]", quoted(.0))]
    MissingAnnotations(Vec<String>),

    /// The annotation is not a column or index declaration.
    #[error("Invalid annotation '{annotation}' for field '{field}'")]
    InvalidAnnotation { field: String, annotation: String },

    /// Index fields must always be present.
    #[error("Index '{0}' cannot be Optional.")]
    OptionalIndex(String),

    /// An annotated attribute was assigned something other than a `Field`.
    #[error("'{0}' can only be assigned a 'Field'")]
    InvalidFieldValue(String),

    /// A check names a field the resolved model does not have.
    #[error("Check {check} is assigned to a non-existing field '{field}'")]
    NonExistingField { check: String, field: String },

    /// Two fields of the same role resolve to the same alias.
    #[error("{role:?} alias '{alias}' is used by both '{first}' and '{second}'")]
    DuplicateAlias {
        role: Role,
        alias: Label,
        first: String,
        second: String,
    },

    /// Columns are always matched by name.
    #[error("Column '{0}' cannot disable check_name: column names are mandatory")]
    ColumnNameRequired(String),

    /// A constraint keyword that has no built-in check.
    #[error("Unknown constraint '{keyword}' on field '{field}'")]
    UnknownConstraint { field: String, keyword: String },

    /// A known constraint keyword with an unusable argument.
    #[error("Invalid constraint '{keyword}' on field '{field}': {reason}")]
    InvalidConstraint {
        field: String,
        keyword: String,
        reason: String,
    },

    /// A declared data type that has no counterpart.
    #[error("Unsupported data type '{0}'")]
    UnsupportedDtype(String),

    /// A regex alias or selector that does not compile.
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

fn quoted(names: &[String]) -> String {
    names
        .iter()
        .map(|n| format!("'{n}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors raised while assembling a table.
#[derive(Debug, Error)]
pub enum FrameError {
    /// A column or index level does not match the table's row count.
    #[error("Length mismatch for '{label}': expected {expected} rows, found {found}")]
    LengthMismatch {
        label: String,
        expected: usize,
        found: usize,
    },

    /// A composite index needs at least one level.
    #[error("A composite index needs at least one level")]
    EmptyIndex,
}

/// Where in the table a failure was detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// A column, by its resolved alias.
    Column(Label),
    /// An index level, by name when it has one.
    Index(Option<Label>),
    /// The whole table, by schema name when it has one.
    Table(Option<String>),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Column(label) => write!(f, "Column {label}"),
            Location::Index(Some(name)) => write!(f, "Index {name}"),
            Location::Index(None) => f.write_str("Index <NA>"),
            Location::Table(Some(name)) => write!(f, "DataFrameSchema {name}"),
            Location::Table(None) => f.write_str("DataFrameSchema <NA>"),
        }
    }
}

/// A single validation failure.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct SchemaError {
    pub location: Location,
    /// Name of the failing check.
    pub check: String,
    /// Offending values.
    pub failure_cases: Vec<Value>,
    pub message: String,
}

impl SchemaError {
    pub fn new(
        location: Location,
        check: impl Into<String>,
        failure_cases: Vec<Value>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            location,
            check: check.into(),
            failure_cases,
            message: message.into(),
        }
    }

    /// Number of offending values.
    pub fn failure_count(&self) -> usize {
        self.failure_cases.len()
    }

    /// Failure cases rendered as `[a, b]`.
    pub fn rendered_cases(&self) -> String {
        render_values(&self.failure_cases)
    }
}

pub(crate) fn render_values(values: &[Value]) -> String {
    let parts: Vec<String> = values.iter().map(ToString::to_string).collect();
    format!("[{}]", parts.join(", "))
}

/// One row of an aggregate failure report.
#[derive(Debug, Clone, Serialize)]
pub struct FailureRow {
    pub location: String,
    pub check: String,
    pub failure_cases: Vec<Value>,
    pub n_failure_cases: usize,
}

/// All failures found by a lazy validation run.
#[derive(Debug, Clone)]
pub struct SchemaErrors {
    pub schema: Option<String>,
    pub errors: Vec<SchemaError>,
}

impl SchemaErrors {
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Report rows in detection order.
    pub fn rows(&self) -> Vec<FailureRow> {
        self.errors
            .iter()
            .map(|e| FailureRow {
                location: e.location.to_string(),
                check: e.check.clone(),
                failure_cases: e.failure_cases.clone(),
                n_failure_cases: e.failure_count(),
            })
            .collect()
    }

    /// Machine-readable report.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "schema": self.schema,
            "error_count": self.errors.len(),
            "failures": self.rows(),
        })
    }
}

impl fmt::Display for SchemaErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.schema {
            write!(f, "Schema {name}: ")?;
        }
        writeln!(f, "A total of {} schema errors were found.", self.errors.len())?;
        writeln!(f)?;

        let rows = self.rows();
        let location_width = rows.iter().map(|r| r.location.len()).max().unwrap_or(0);
        let check_width = rows.iter().map(|r| r.check.len()).max().unwrap_or(0);
        for (row, error) in rows.iter().zip(&self.errors) {
            writeln!(
                f,
                "{:<lw$}  {:<cw$}  {}  {}",
                row.location,
                row.check,
                error.rendered_cases(),
                row.n_failure_cases,
                lw = location_width,
                cw = check_width,
            )?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaErrors {}

/// Error returned by a user check function to signal a bug in the check
/// itself rather than a data failure.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct CheckFnError(pub String);

impl CheckFnError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Errors returned by `validate`.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// First failure in fail-fast mode.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Every failure in lazy mode.
    #[error(transparent)]
    Errors(#[from] SchemaErrors),

    /// A check function failed while running; never collected lazily.
    #[error("Check '{check}' on {location} raised an error: {source}")]
    CheckFunction {
        check: String,
        location: Location,
        #[source]
        source: CheckFnError,
    },
}

impl ValidationError {
    /// All data failures carried by this error; empty for check-function errors.
    pub fn failures(&self) -> Vec<&SchemaError> {
        match self {
            ValidationError::Schema(e) => vec![e],
            ValidationError::Errors(errors) => errors.errors.iter().collect(),
            ValidationError::CheckFunction { .. } => Vec::new(),
        }
    }
}
