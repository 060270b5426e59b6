//! Scalar values, labels and data types.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::SchemaInitError;

/// Formats accepted when coercing strings to datetimes.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Data type of a column or index level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// Whole numbers.
    Int64,
    /// Floating-point numbers.
    Float64,
    /// Text values.
    Str,
    /// Boolean values.
    Bool,
    /// Date and time values.
    DateTime,
    /// Mixed or unknown values.
    Object,
}

impl DataType {
    /// Returns true if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Int64 | DataType::Float64)
    }

    /// The data type a single non-null value naturally has.
    pub fn of(value: &Value) -> Option<DataType> {
        match value {
            Value::Null => None,
            Value::Int(_) => Some(DataType::Int64),
            Value::Float(_) => Some(DataType::Float64),
            Value::Str(_) => Some(DataType::Str),
            Value::Bool(_) => Some(DataType::Bool),
            Value::DateTime(_) => Some(DataType::DateTime),
        }
    }

    /// Name used in failure reports, e.g. `int64`.
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Int64 => "int64",
            DataType::Float64 => "float64",
            DataType::Str => "str",
            DataType::Bool => "bool",
            DataType::DateTime => "datetime64",
            DataType::Object => "object",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataType {
    type Err = SchemaInitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "int" | "int64" | "integer" => Ok(DataType::Int64),
            "float" | "float64" | "double" => Ok(DataType::Float64),
            "str" | "string" => Ok(DataType::Str),
            "bool" | "boolean" => Ok(DataType::Bool),
            "datetime" | "datetime64" | "timestamp" => Ok(DataType::DateTime),
            "object" | "any" => Ok(DataType::Object),
            _ => Err(SchemaInitError::UnsupportedDtype(s.to_string())),
        }
    }
}

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    DateTime(NaiveDateTime),
    Str(String),
}

impl Value {
    /// Returns true for `Null` and for floating-point NaN.
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// Borrow the string payload, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view used for cross-type comparisons.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Compare two values of compatible types.
    ///
    /// Integers and floats compare numerically; any other pairing of
    /// different variants is incomparable.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
            _ => {
                let (a, b) = (self.as_f64()?, other.as_f64()?);
                a.partial_cmp(&b)
            }
        }
    }

    /// Equality with numeric promotion (`1 == 1.0`).
    pub fn loosely_equals(&self, other: &Value) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }

    pub fn less_than(&self, other: impl Into<Value>) -> bool {
        self.compare(&other.into()) == Some(Ordering::Less)
    }

    pub fn greater_than(&self, other: impl Into<Value>) -> bool {
        self.compare(&other.into()) == Some(Ordering::Greater)
    }

    /// Key used to detect duplicates; `1` and `1.0` collide.
    pub(crate) fn hash_key(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => format!("b:{b}"),
            Value::Int(i) => format!("n:{i}"),
            Value::Float(f) => match whole_i64(*f) {
                Some(i) => format!("n:{i}"),
                None => format!("f:{f}"),
            },
            Value::DateTime(d) => format!("d:{d}"),
            Value::Str(s) => format!("s:{s}"),
        }
    }

    /// Convert this value to `dtype`, or `None` when it cannot be represented.
    pub fn coerce_to(&self, dtype: DataType) -> Option<Value> {
        if self.is_null() {
            return Some(Value::Null);
        }
        match dtype {
            DataType::Object => Some(self.clone()),
            DataType::Str => Some(Value::Str(self.to_string())),
            DataType::Int64 => match self {
                Value::Int(i) => Some(Value::Int(*i)),
                Value::Float(f) => whole_i64(*f).map(Value::Int),
                Value::Bool(b) => Some(Value::Int(i64::from(*b))),
                Value::Str(s) => s.trim().parse().ok().map(Value::Int),
                _ => None,
            },
            DataType::Float64 => match self {
                Value::Int(i) => Some(Value::Float(*i as f64)),
                Value::Float(f) => Some(Value::Float(*f)),
                Value::Bool(b) => Some(Value::Float(if *b { 1.0 } else { 0.0 })),
                Value::Str(s) => s.trim().parse().ok().map(Value::Float),
                _ => None,
            },
            DataType::Bool => match self {
                Value::Bool(b) => Some(Value::Bool(*b)),
                Value::Int(0) => Some(Value::Bool(false)),
                Value::Int(1) => Some(Value::Bool(true)),
                Value::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" => Some(Value::Bool(true)),
                    "false" => Some(Value::Bool(false)),
                    _ => None,
                },
                _ => None,
            },
            DataType::DateTime => match self {
                Value::DateTime(d) => Some(Value::DateTime(*d)),
                Value::Str(s) => parse_datetime(s.trim()).map(Value::DateTime),
                _ => None,
            },
        }
    }
}

/// `f` as an integer when it is whole and inside the `i64` range.
fn whole_i64(f: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
    let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
    (f.fract() == 0.0 && in_range).then_some(f as i64)
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NA"),
            Value::Bool(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::DateTime(d) => write!(f, "{d}"),
            Value::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<&Label> for Value {
    fn from(label: &Label) -> Self {
        match label {
            Label::Str(s) => Value::Str(s.clone()),
            Label::Int(i) => Value::Int(*i),
        }
    }
}

/// Key of a column or name of an index level.
///
/// Column keys are not restricted to strings: `2020` is a valid alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Int(i64),
    Str(String),
}

impl Label {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Label::Str(s) => Some(s),
            Label::Int(_) => None,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Str(s) => f.write_str(s),
            Label::Int(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for Label {
    fn from(s: &str) -> Self {
        Label::Str(s.to_string())
    }
}

impl From<String> for Label {
    fn from(s: String) -> Self {
        Label::Str(s)
    }
}

impl From<&String> for Label {
    fn from(s: &String) -> Self {
        Label::Str(s.clone())
    }
}

impl From<i64> for Label {
    fn from(i: i64) -> Self {
        Label::Int(i)
    }
}

impl From<i32> for Label {
    fn from(i: i32) -> Self {
        Label::Int(i64::from(i))
    }
}

impl PartialEq<str> for Label {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == Some(other)
    }
}

impl PartialEq<&str> for Label {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

impl PartialEq<i64> for Label {
    fn eq(&self, other: &i64) -> bool {
        matches!(self, Label::Int(i) if i == other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_comparison_promotes() {
        assert!(Value::Int(1).loosely_equals(&Value::Float(1.0)));
        assert!(Value::Int(99).less_than(100));
        assert!(Value::Float(100.5).greater_than(100));
        assert_eq!(Value::from("a").compare(&Value::Int(1)), None);
    }

    #[test]
    fn test_coerce_string_to_int() {
        assert_eq!(Value::from(" 42 ").coerce_to(DataType::Int64), Some(Value::Int(42)));
        assert_eq!(Value::from("x").coerce_to(DataType::Int64), None);
        assert_eq!(Value::Null.coerce_to(DataType::Int64), Some(Value::Null));
        assert_eq!(Value::Float(3.5).coerce_to(DataType::Int64), None);
    }

    #[test]
    fn test_coerce_out_of_range_float_to_int() {
        assert_eq!(Value::Float(1e20).coerce_to(DataType::Int64), None);
        assert_eq!(Value::Float(-1e20).coerce_to(DataType::Int64), None);
        assert_eq!(Value::Float(f64::INFINITY).coerce_to(DataType::Int64), None);
        assert_eq!(Value::Float(-3.0).coerce_to(DataType::Int64), Some(Value::Int(-3)));
    }

    #[test]
    fn test_hash_key_keeps_large_integers_apart() {
        let a = Value::Int(1 << 53);
        let b = Value::Int((1 << 53) + 1);
        assert_ne!(a.hash_key(), b.hash_key());
        assert_eq!(Value::Int(1).hash_key(), Value::Float(1.0).hash_key());
        assert_ne!(Value::Float(1.5).hash_key(), Value::Int(1).hash_key());
    }

    #[test]
    fn test_coerce_string_to_datetime() {
        let coerced = Value::from("2024-03-01").coerce_to(DataType::DateTime);
        assert!(matches!(coerced, Some(Value::DateTime(_))));
    }

    #[test]
    fn test_parse_dtype() {
        assert_eq!("int".parse::<DataType>().unwrap(), DataType::Int64);
        assert_eq!("String".parse::<DataType>().unwrap(), DataType::Str);
        assert!(matches!(
            "decimal".parse::<DataType>(),
            Err(SchemaInitError::UnsupportedDtype(_))
        ));
    }

    #[test]
    fn test_label_comparisons() {
        assert_eq!(Label::from("a"), "a");
        assert_eq!(Label::from(2020), 2020_i64);
        assert_eq!(Label::from(123).to_string(), "123");
    }
}
