//! Compiled, validator-ready schemas.

mod column;
mod compiler;
mod table;

pub use column::{
    ColumnSchema, CustomCheck, IndexSchema, MultiIndexSchema, SchemaCheck, SchemaIndex,
    TableCheck,
};
pub use compiler::{compile, compile_resolved};
pub use table::DataFrameSchema;
