//! A named, typed column of values.

use super::value::{DataType, Label, Value};

/// One column (or index level) of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    name: Option<Label>,
    dtype: DataType,
    values: Vec<Value>,
}

impl Series {
    /// Create an unnamed series, inferring the data type from the values.
    ///
    /// A mix of integers and floats is promoted to `Float64`; any other mix
    /// of types yields `Object`.
    pub fn from_values<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        let dtype = infer_dtype(&values);
        let values = if dtype == DataType::Float64 {
            values
                .into_iter()
                .map(|v| match v {
                    Value::Int(i) => Value::Float(i as f64),
                    other => other,
                })
                .collect()
        } else {
            values
        };
        Self {
            name: None,
            dtype,
            values,
        }
    }

    /// Create a named series, inferring the data type.
    pub fn named<I, V>(name: impl Into<Label>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::from_values(values).with_name(Some(name.into()))
    }

    /// Create a series with an explicit data type; values are not checked.
    pub fn with_dtype(dtype: DataType, values: Vec<Value>) -> Self {
        Self {
            name: None,
            dtype,
            values,
        }
    }

    /// Default positional index `0..len`.
    pub fn range(len: usize) -> Self {
        Self::with_dtype(
            DataType::Int64,
            (0..len as i64).map(Value::Int).collect(),
        )
    }

    pub fn with_name(mut self, name: Option<Label>) -> Self {
        self.name = name;
        self
    }

    pub fn name(&self) -> Option<&Label> {
        self.name.as_ref()
    }

    pub fn dtype(&self) -> DataType {
        self.dtype
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&Value> {
        self.values.get(position)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }

    /// Evaluate a predicate element-wise.
    pub fn mask(&self, predicate: impl Fn(&Value) -> bool) -> Vec<bool> {
        self.values.iter().map(predicate).collect()
    }

    /// Positions holding null values.
    pub fn null_positions(&self) -> Vec<usize> {
        self.values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_null())
            .map(|(i, _)| i)
            .collect()
    }

    /// Positions whose value already appeared earlier in the series.
    pub fn duplicate_positions(&self) -> Vec<usize> {
        let mut seen = std::collections::HashSet::new();
        self.values
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_null() && !seen.insert(v.hash_key()))
            .map(|(i, _)| i)
            .collect()
    }

    /// Convert every value to `dtype`.
    ///
    /// On failure, returns the values that could not be converted.
    pub fn coerce(&self, dtype: DataType) -> Result<Series, Vec<Value>> {
        let mut coerced = Vec::with_capacity(self.values.len());
        let mut failures = Vec::new();
        for value in &self.values {
            match value.coerce_to(dtype) {
                Some(v) => coerced.push(v),
                None => failures.push(value.clone()),
            }
        }
        if failures.is_empty() {
            Ok(Series {
                name: self.name.clone(),
                dtype,
                values: coerced,
            })
        } else {
            Err(failures)
        }
    }
}

fn infer_dtype(values: &[Value]) -> DataType {
    let mut inferred: Option<DataType> = None;
    for dtype in values.iter().filter_map(DataType::of) {
        inferred = Some(match inferred {
            None => dtype,
            Some(current) if current == dtype => current,
            Some(current) if current.is_numeric() && dtype.is_numeric() => DataType::Float64,
            Some(_) => return DataType::Object,
        });
    }
    inferred.unwrap_or(DataType::Object)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_dtype() {
        assert_eq!(Series::from_values([1, 2, 3]).dtype(), DataType::Int64);
        assert_eq!(Series::from_values(["a", "b"]).dtype(), DataType::Str);
        assert_eq!(
            Series::from_values([Value::Int(1), Value::Str("a".into())]).dtype(),
            DataType::Object
        );
        assert_eq!(
            Series::from_values([Value::Null, Value::Int(3)]).dtype(),
            DataType::Int64
        );
    }

    #[test]
    fn test_mixed_numeric_promotes_to_float() {
        let series = Series::from_values([Value::Int(1), Value::Float(2.5)]);
        assert_eq!(series.dtype(), DataType::Float64);
        assert_eq!(series.values()[0], Value::Float(1.0));
    }

    #[test]
    fn test_coerce_reports_failures() {
        let series = Series::from_values(["1", "two", "3"]);
        let failures = series.coerce(DataType::Int64).unwrap_err();
        assert_eq!(failures, vec![Value::from("two")]);

        let coerced = Series::from_values(["1", "3"]).coerce(DataType::Int64).unwrap();
        assert_eq!(coerced.dtype(), DataType::Int64);
    }

    #[test]
    fn test_duplicate_positions() {
        let series = Series::from_values([1, 2, 1, 3, 2]);
        assert_eq!(series.duplicate_positions(), vec![2, 4]);
    }
}
