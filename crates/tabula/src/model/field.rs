//! Field declarations and their translation into [`FieldSpec`]s.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::SchemaInitError;
use crate::frame::{DataType, Label, Value};

use super::builtin::{BuiltinCheck, ConstraintArg};

/// Whether a field describes a column or an index level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Column,
    Index,
}

/// Declared type of an attribute, as delivered by the declaration surface.
#[derive(Debug, Clone, PartialEq)]
pub enum Annotation {
    /// `Series[dtype]`.
    Column(DataType),
    /// `Index[dtype]`.
    Index(DataType),
    /// `Optional[...]`.
    Optional(Box<Annotation>),
    /// Anything else, e.g. a bare `int`.
    Other(String),
}

impl Annotation {
    pub fn optional(self) -> Self {
        Annotation::Optional(Box::new(self))
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Annotation::Column(dtype) => write!(f, "Series[{dtype}]"),
            Annotation::Index(dtype) => write!(f, "Index[{dtype}]"),
            Annotation::Optional(inner) => write!(f, "Optional[{inner}]"),
            Annotation::Other(other) => f.write_str(other),
        }
    }
}

/// Value assigned to an attribute.
#[derive(Debug, Clone)]
pub enum Assigned {
    /// Output of the [`Field`] builder.
    Field(Field),
    /// Any other value, e.g. a class constant.
    Literal(Value),
}

/// Declaration-time options for a field.
#[derive(Debug, Clone)]
pub struct Field {
    pub(crate) alias: Option<Label>,
    pub(crate) check_name: Option<bool>,
    pub(crate) regex: bool,
    pub(crate) nullable: bool,
    pub(crate) unique: bool,
    pub(crate) coerce: Option<bool>,
    pub(crate) ignore_na: bool,
    pub(crate) constraints: Vec<(String, ConstraintArg)>,
}

impl Default for Field {
    fn default() -> Self {
        Self {
            alias: None,
            check_name: None,
            regex: false,
            nullable: false,
            unique: false,
            coerce: None,
            ignore_na: true,
            constraints: Vec::new(),
        }
    }
}

impl Field {
    pub fn new() -> Self {
        Self::default()
    }

    /// Externally visible name; a pattern when combined with [`Field::regex`].
    pub fn alias(mut self, alias: impl Into<Label>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn check_name(mut self, check_name: bool) -> Self {
        self.check_name = Some(check_name);
        self
    }

    /// Treat the alias as a pattern matched against actual column names.
    pub fn regex(mut self, regex: bool) -> Self {
        self.regex = regex;
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    pub fn coerce(mut self, coerce: bool) -> Self {
        self.coerce = Some(coerce);
        self
    }

    pub fn ignore_na(mut self, ignore_na: bool) -> Self {
        self.ignore_na = ignore_na;
        self
    }

    /// Attach a constraint by keyword. Unknown keywords are rejected when
    /// the model is compiled.
    pub fn constraint(mut self, keyword: impl Into<String>, arg: ConstraintArg) -> Self {
        self.constraints.push((keyword.into(), arg));
        self
    }

    fn value_constraint(self, keyword: &str, value: impl Into<Value>) -> Self {
        self.constraint(keyword, ConstraintArg::Value { value: value.into() })
    }

    pub fn eq(self, value: impl Into<Value>) -> Self {
        self.value_constraint("eq", value)
    }

    pub fn ne(self, value: impl Into<Value>) -> Self {
        self.value_constraint("ne", value)
    }

    pub fn gt(self, value: impl Into<Value>) -> Self {
        self.value_constraint("gt", value)
    }

    pub fn ge(self, value: impl Into<Value>) -> Self {
        self.value_constraint("ge", value)
    }

    pub fn lt(self, value: impl Into<Value>) -> Self {
        self.value_constraint("lt", value)
    }

    pub fn le(self, value: impl Into<Value>) -> Self {
        self.value_constraint("le", value)
    }

    /// Closed range `[min, max]`.
    pub fn in_range(self, min: impl Into<Value>, max: impl Into<Value>) -> Self {
        self.constraint(
            "in_range",
            ConstraintArg::Range {
                min: min.into(),
                max: max.into(),
                include_min: true,
                include_max: true,
            },
        )
    }

    pub fn isin<I, V>(self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.constraint("isin", ConstraintArg::Values { values })
    }

    pub fn notin<I, V>(self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.constraint("notin", ConstraintArg::Values { values })
    }

    pub fn str_matches(self, pattern: impl Into<String>) -> Self {
        self.constraint("str_matches", ConstraintArg::Pattern { pattern: pattern.into() })
    }

    pub fn str_contains(self, pattern: impl Into<String>) -> Self {
        self.constraint("str_contains", ConstraintArg::Pattern { pattern: pattern.into() })
    }

    pub fn str_startswith(self, prefix: impl Into<String>) -> Self {
        self.constraint("str_startswith", ConstraintArg::Pattern { pattern: prefix.into() })
    }

    pub fn str_endswith(self, suffix: impl Into<String>) -> Self {
        self.constraint("str_endswith", ConstraintArg::Pattern { pattern: suffix.into() })
    }

    pub fn str_length(self, min: Option<usize>, max: Option<usize>) -> Self {
        self.constraint("str_length", ConstraintArg::Length { min, max })
    }
}

/// A single resolved field: a column or an index level with its contract.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub declared_name: String,
    /// Resolved external name; the declared name unless aliased.
    pub alias: Label,
    pub role: Role,
    pub dtype: DataType,
    pub required: bool,
    pub check_name: Option<bool>,
    pub regex: bool,
    pub nullable: bool,
    pub unique: bool,
    pub coerce: Option<bool>,
    pub ignore_na: bool,
    pub checks: Vec<BuiltinCheck>,
}

impl FieldSpec {
    /// Build a spec from an annotated attribute.
    pub fn from_declaration(
        name: &str,
        annotation: &Annotation,
        field: Option<&Field>,
    ) -> Result<Self, SchemaInitError> {
        let (role, dtype, required) = match annotation {
            Annotation::Column(dtype) => (Role::Column, *dtype, true),
            Annotation::Index(dtype) => (Role::Index, *dtype, true),
            Annotation::Optional(inner) => match inner.as_ref() {
                Annotation::Column(dtype) => (Role::Column, *dtype, false),
                Annotation::Index(_) => {
                    return Err(SchemaInitError::OptionalIndex(name.to_string()));
                }
                _ => return Err(invalid_annotation(name, annotation)),
            },
            Annotation::Other(_) => return Err(invalid_annotation(name, annotation)),
        };

        let default_field = Field::default();
        let field = field.unwrap_or(&default_field);

        if role == Role::Column && field.check_name == Some(false) {
            return Err(SchemaInitError::ColumnNameRequired(name.to_string()));
        }

        let alias = field
            .alias
            .clone()
            .unwrap_or_else(|| Label::from(name));
        if field.regex {
            let pattern = alias.to_string();
            Regex::new(&pattern)
                .map_err(|source| SchemaInitError::InvalidPattern { pattern, source })?;
        }

        let checks = field
            .constraints
            .iter()
            .map(|(keyword, arg)| BuiltinCheck::from_keyword(name, keyword, arg))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            declared_name: name.to_string(),
            alias,
            role,
            dtype,
            required,
            check_name: field.check_name,
            regex: field.regex,
            nullable: field.nullable,
            unique: field.unique,
            coerce: field.coerce,
            ignore_na: field.ignore_na,
            checks,
        })
    }
}

fn invalid_annotation(name: &str, annotation: &Annotation) -> SchemaInitError {
    SchemaInitError::InvalidAnnotation {
        field: name.to_string(),
        annotation: annotation.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_column_is_required() {
        let spec = FieldSpec::from_declaration("a", &Annotation::Column(DataType::Int64), None)
            .unwrap();
        assert_eq!(spec.role, Role::Column);
        assert_eq!(spec.alias, "a");
        assert!(spec.required);
        assert!(spec.checks.is_empty());
    }

    #[test]
    fn test_optional_column_not_required() {
        let annotation = Annotation::Column(DataType::Str).optional();
        let field = Field::new().eq("b");
        let spec = FieldSpec::from_declaration("b", &annotation, Some(&field)).unwrap();
        assert!(!spec.required);
        assert_eq!(spec.checks.len(), 1);
    }

    #[test]
    fn test_optional_index_rejected() {
        let annotation = Annotation::Index(DataType::Str).optional();
        let err = FieldSpec::from_declaration("idx", &annotation, None).unwrap_err();
        assert_eq!(err.to_string(), "Index 'idx' cannot be Optional.");
    }

    #[test]
    fn test_invalid_annotation() {
        let err = FieldSpec::from_declaration("a", &Annotation::Other("int".into()), None)
            .unwrap_err();
        assert!(err.to_string().contains("Invalid annotation"));
    }

    #[test]
    fn test_constraints_in_declaration_order() {
        let field = Field::new().eq(9).ne(0);
        let annotation = Annotation::Column(DataType::Int64);
        let spec = FieldSpec::from_declaration("a", &annotation, Some(&field)).unwrap();
        let names: Vec<_> = spec.checks.iter().map(BuiltinCheck::name).collect();
        assert_eq!(names, vec!["equal_to", "not_equal_to"]);
    }

    #[test]
    fn test_column_check_name_false_rejected() {
        let field = Field::new().check_name(false);
        let annotation = Annotation::Column(DataType::Int64);
        let err = FieldSpec::from_declaration("a", &annotation, Some(&field)).unwrap_err();
        assert!(matches!(err, SchemaInitError::ColumnNameRequired(_)));
    }

    #[test]
    fn test_invalid_regex_alias() {
        let field = Field::new().alias("column_(").regex(true);
        let err = FieldSpec::from_declaration("c", &Annotation::Column(DataType::Str), Some(&field))
            .unwrap_err();
        assert!(matches!(err, SchemaInitError::InvalidPattern { .. }));
    }
}
