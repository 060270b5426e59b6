//! Host table abstraction consumed by the validation engine.

mod series;
mod table;
mod value;

pub use series::Series;
pub use table::{DataFrame, FrameIndex};
pub use value::{DataType, Label, Value};
