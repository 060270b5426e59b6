//! Tabula: declarative, model-based validation for in-memory tables.
//!
//! A [`Model`] declares columns, index levels and checks. Models compose by
//! inheritance, are resolved into a flat set of fields, and compile to a
//! [`DataFrameSchema`] that validates a [`DataFrame`] either fail-fast or
//! lazily (collecting every failure).
//!
//! # Example
//!
//! ```
//! use tabula::{DataFrame, DataType, Field, Model, Series};
//!
//! let model = Model::builder("Schema")
//!     .column_with("a", DataType::Int64, Field::new().lt(100))
//!     .build();
//!
//! let df = DataFrame::from_columns([("a", Series::from_values([1, 101]))]).unwrap();
//! let err = model.validate(df, true).unwrap_err();
//! assert!(err.to_string().contains("1 schema errors were found"));
//! ```

pub mod error;
pub mod frame;
pub mod model;
pub mod schema;
pub mod typed;
pub mod validation;

pub use error::{
    CheckFnError, Error, FrameError, Location, Result, SchemaError, SchemaErrors,
    SchemaInitError, ValidationError,
};
pub use frame::{DataFrame, DataType, FrameIndex, Label, Series, Value};
pub use model::{
    Annotation, Check, CheckContext, CheckOutcome, Config, Field, FieldRef, Model, ModelBuilder,
    Role, Selector, Strictness,
};
pub use schema::{ColumnSchema, DataFrameSchema, IndexSchema, MultiIndexSchema, compile};
pub use typed::check_types;
