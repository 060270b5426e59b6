//! Built-in constraint checks materialized from field keywords.

use std::cmp::Ordering;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::SchemaInitError;
use crate::frame::{Series, Value};

/// Argument supplied with a constraint keyword.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConstraintArg {
    /// A single comparison value.
    Value { value: Value },
    /// A set of allowed or forbidden values.
    Values { values: Vec<Value> },
    /// A numeric or lexical range.
    Range {
        min: Value,
        max: Value,
        include_min: bool,
        include_max: bool,
    },
    /// Bounds on string length.
    Length {
        min: Option<usize>,
        max: Option<usize>,
    },
    /// A regular expression or substring.
    Pattern { pattern: String },
}

/// A check generated from a field constraint.
///
/// Built-in checks compare equal when their parameters are equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum BuiltinCheck {
    EqualTo { value: Value },
    NotEqualTo { value: Value },
    GreaterThan { min: Value },
    GreaterThanOrEqualTo { min: Value },
    LessThan { max: Value },
    LessThanOrEqualTo { max: Value },
    InRange {
        min: Value,
        max: Value,
        include_min: bool,
        include_max: bool,
    },
    Isin { values: Vec<Value> },
    Notin { values: Vec<Value> },
    StrMatches { pattern: String },
    StrContains { pattern: String },
    StrStartswith { prefix: String },
    StrEndswith { suffix: String },
    StrLength { min: Option<usize>, max: Option<usize> },
}

impl BuiltinCheck {
    /// Translate a declaration keyword into its check.
    pub fn from_keyword(
        field: &str,
        keyword: &str,
        arg: &ConstraintArg,
    ) -> Result<Self, SchemaInitError> {
        let invalid = |reason: &str| SchemaInitError::InvalidConstraint {
            field: field.to_string(),
            keyword: keyword.to_string(),
            reason: reason.to_string(),
        };

        let check = match (keyword, arg) {
            ("eq", ConstraintArg::Value { value }) => BuiltinCheck::EqualTo {
                value: value.clone(),
            },
            ("ne", ConstraintArg::Value { value }) => BuiltinCheck::NotEqualTo {
                value: value.clone(),
            },
            ("gt", ConstraintArg::Value { value }) => BuiltinCheck::GreaterThan {
                min: value.clone(),
            },
            ("ge", ConstraintArg::Value { value }) => {
                BuiltinCheck::GreaterThanOrEqualTo { min: value.clone() }
            }
            ("lt", ConstraintArg::Value { value }) => BuiltinCheck::LessThan { max: value.clone() },
            ("le", ConstraintArg::Value { value }) => {
                BuiltinCheck::LessThanOrEqualTo { max: value.clone() }
            }
            (
                "in_range",
                ConstraintArg::Range {
                    min,
                    max,
                    include_min,
                    include_max,
                },
            ) => {
                if min.compare(max) == Some(Ordering::Greater) {
                    return Err(invalid("min is greater than max"));
                }
                BuiltinCheck::InRange {
                    min: min.clone(),
                    max: max.clone(),
                    include_min: *include_min,
                    include_max: *include_max,
                }
            }
            ("isin", ConstraintArg::Values { values }) => BuiltinCheck::Isin {
                values: values.clone(),
            },
            ("notin", ConstraintArg::Values { values }) => BuiltinCheck::Notin {
                values: values.clone(),
            },
            ("str_matches", ConstraintArg::Pattern { pattern }) => {
                Regex::new(pattern).map_err(|source| SchemaInitError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                })?;
                BuiltinCheck::StrMatches { pattern: pattern.clone() }
            }
            ("str_contains", ConstraintArg::Pattern { pattern }) => {
                BuiltinCheck::StrContains { pattern: pattern.clone() }
            }
            ("str_startswith", ConstraintArg::Pattern { pattern }) => {
                BuiltinCheck::StrStartswith { prefix: pattern.clone() }
            }
            ("str_endswith", ConstraintArg::Pattern { pattern }) => {
                BuiltinCheck::StrEndswith { suffix: pattern.clone() }
            }
            ("str_length", ConstraintArg::Length { min, max }) => {
                if min.is_none() && max.is_none() {
                    return Err(invalid("at least one of min and max is required"));
                }
                if let (Some(lo), Some(hi)) = (min, max) {
                    if lo > hi {
                        return Err(invalid("min is greater than max"));
                    }
                }
                BuiltinCheck::StrLength { min: *min, max: *max }
            }
            (
                "eq" | "ne" | "gt" | "ge" | "lt" | "le" | "in_range" | "isin" | "notin"
                | "str_matches" | "str_contains" | "str_startswith" | "str_endswith"
                | "str_length",
                _,
            ) => return Err(invalid("argument has the wrong shape")),
            _ => {
                return Err(SchemaInitError::UnknownConstraint {
                    field: field.to_string(),
                    keyword: keyword.to_string(),
                })
            }
        };
        Ok(check)
    }

    /// Name reported when the check fails.
    pub fn name(&self) -> &'static str {
        match self {
            BuiltinCheck::EqualTo { .. } => "equal_to",
            BuiltinCheck::NotEqualTo { .. } => "not_equal_to",
            BuiltinCheck::GreaterThan { .. } => "greater_than",
            BuiltinCheck::GreaterThanOrEqualTo { .. } => "greater_than_or_equal_to",
            BuiltinCheck::LessThan { .. } => "less_than",
            BuiltinCheck::LessThanOrEqualTo { .. } => "less_than_or_equal_to",
            BuiltinCheck::InRange { .. } => "in_range",
            BuiltinCheck::Isin { .. } => "isin",
            BuiltinCheck::Notin { .. } => "notin",
            BuiltinCheck::StrMatches { .. } => "str_matches",
            BuiltinCheck::StrContains { .. } => "str_contains",
            BuiltinCheck::StrStartswith { .. } => "str_startswith",
            BuiltinCheck::StrEndswith { .. } => "str_endswith",
            BuiltinCheck::StrLength { .. } => "str_length",
        }
    }

    /// Evaluate element-wise. Values of an incomparable type fail.
    pub fn evaluate(&self, series: &Series) -> Vec<bool> {
        match self {
            BuiltinCheck::EqualTo { value } => series.mask(|v| v.loosely_equals(value)),
            BuiltinCheck::NotEqualTo { value } => series.mask(|v| {
                v.compare(value).is_some_and(|o| o != Ordering::Equal)
            }),
            BuiltinCheck::GreaterThan { min } => {
                series.mask(|v| v.compare(min) == Some(Ordering::Greater))
            }
            BuiltinCheck::GreaterThanOrEqualTo { min } => series.mask(|v| {
                matches!(v.compare(min), Some(Ordering::Greater | Ordering::Equal))
            }),
            BuiltinCheck::LessThan { max } => {
                series.mask(|v| v.compare(max) == Some(Ordering::Less))
            }
            BuiltinCheck::LessThanOrEqualTo { max } => series.mask(|v| {
                matches!(v.compare(max), Some(Ordering::Less | Ordering::Equal))
            }),
            BuiltinCheck::InRange {
                min,
                max,
                include_min,
                include_max,
            } => series.mask(|v| {
                let above = match v.compare(min) {
                    Some(Ordering::Greater) => true,
                    Some(Ordering::Equal) => *include_min,
                    _ => false,
                };
                let below = match v.compare(max) {
                    Some(Ordering::Less) => true,
                    Some(Ordering::Equal) => *include_max,
                    _ => false,
                };
                above && below
            }),
            BuiltinCheck::Isin { values } => {
                series.mask(|v| values.iter().any(|allowed| v.loosely_equals(allowed)))
            }
            BuiltinCheck::Notin { values } => {
                series.mask(|v| !values.iter().any(|forbidden| v.loosely_equals(forbidden)))
            }
            BuiltinCheck::StrMatches { pattern } => match Regex::new(pattern) {
                Ok(re) => series.mask(|v| {
                    v.as_str()
                        .and_then(|s| re.find(s))
                        .is_some_and(|m| m.start() == 0)
                }),
                Err(_) => vec![false; series.len()],
            },
            BuiltinCheck::StrContains { pattern } => {
                series.mask(|v| v.as_str().is_some_and(|s| s.contains(pattern.as_str())))
            }
            BuiltinCheck::StrStartswith { prefix } => {
                series.mask(|v| v.as_str().is_some_and(|s| s.starts_with(prefix.as_str())))
            }
            BuiltinCheck::StrEndswith { suffix } => {
                series.mask(|v| v.as_str().is_some_and(|s| s.ends_with(suffix.as_str())))
            }
            BuiltinCheck::StrLength { min, max } => series.mask(|v| {
                v.as_str().is_some_and(|s| {
                    let len = s.chars().count();
                    min.is_none_or(|lo| len >= lo) && max.is_none_or(|hi| len <= hi)
                })
            }),
        }
    }
}
