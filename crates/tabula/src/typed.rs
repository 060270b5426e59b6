//! Input/output checking for table transformations.

use crate::error::ValidationError;
use crate::frame::DataFrame;
use crate::schema::DataFrameSchema;

/// Wrap `f` so that its argument is validated against `input` and its
/// result against `output`, failing on the first mismatch.
///
/// ```
/// use tabula::{check_types, DataFrame, DataType, Model, Series};
///
/// let input = Model::builder("In").column("a", DataType::Int64).build();
/// let output = Model::builder("Out").column("b", DataType::Int64).build();
///
/// let add_b = check_types(
///     input.to_schema().unwrap().clone(),
///     output.to_schema().unwrap().clone(),
///     |df: DataFrame| df.with_column("b", Series::from_values([2])).unwrap(),
/// );
///
/// let df = DataFrame::from_columns([("a", Series::from_values([1]))]).unwrap();
/// assert!(add_b(df).is_ok());
/// ```
pub fn check_types<F>(
    input: DataFrameSchema,
    output: DataFrameSchema,
    f: F,
) -> impl Fn(DataFrame) -> Result<DataFrame, ValidationError>
where
    F: Fn(DataFrame) -> DataFrame,
{
    move |df| {
        let df = input.validate(df, false)?;
        output.validate(f(df), false)
    }
}
