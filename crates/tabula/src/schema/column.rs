//! Compiled column and index contracts.

use std::fmt;

use crate::frame::{DataType, Label};
use crate::model::{BuiltinCheck, FrameCheckFn, SeriesCheckFn};

/// A check attached to a column or index level.
#[derive(Clone)]
pub enum SchemaCheck {
    /// Generated from a field constraint.
    Builtin(BuiltinCheck),
    /// A user function.
    Custom(CustomCheck),
}

/// A user check bound to one column or index level.
#[derive(Clone)]
pub struct CustomCheck {
    pub name: String,
    /// Model that declared or inherited the check.
    pub model: String,
    pub func: SeriesCheckFn,
}

impl SchemaCheck {
    pub fn name(&self) -> &str {
        match self {
            SchemaCheck::Builtin(check) => check.name(),
            SchemaCheck::Custom(check) => &check.name,
        }
    }
}

impl From<BuiltinCheck> for SchemaCheck {
    fn from(check: BuiltinCheck) -> Self {
        SchemaCheck::Builtin(check)
    }
}

/// Built-in checks compare by parameters, user checks by name.
///
/// Functions cannot be compared, so two user checks sharing a name are equal
/// even when their closures capture different thresholds. Schemas compiled
/// from a model and from a child that overrides a check under the same name
/// therefore compare equal while validating differently.
impl PartialEq for SchemaCheck {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (SchemaCheck::Builtin(a), SchemaCheck::Builtin(b)) => a == b,
            (SchemaCheck::Custom(a), SchemaCheck::Custom(b)) => a.name == b.name,
            _ => false,
        }
    }
}

impl fmt::Debug for SchemaCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaCheck::Builtin(check) => write!(f, "{check:?}"),
            SchemaCheck::Custom(check) => write!(f, "Custom({})", check.name),
        }
    }
}

/// A user check run against the whole table.
#[derive(Clone)]
pub struct TableCheck {
    pub name: String,
    pub model: String,
    pub func: FrameCheckFn,
}

/// By name only; see [`SchemaCheck`]'s equality.
impl PartialEq for TableCheck {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl fmt::Debug for TableCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TableCheck({})", self.name)
    }
}

/// Contract for one column.
#[derive(Debug, Clone)]
pub struct ColumnSchema {
    /// Column key, or a pattern when `regex` is set.
    pub name: Label,
    /// Expected type; `Object` accepts any type.
    pub dtype: DataType,
    pub required: bool,
    pub regex: bool,
    pub nullable: bool,
    pub unique: bool,
    pub coerce: bool,
    pub ignore_na: bool,
    pub checks: Vec<SchemaCheck>,
}

impl ColumnSchema {
    pub fn new(name: impl Into<Label>, dtype: DataType) -> Self {
        Self {
            name: name.into(),
            dtype,
            required: true,
            regex: false,
            nullable: false,
            unique: false,
            coerce: false,
            ignore_na: true,
            checks: Vec::new(),
        }
    }

    pub fn with_checks(mut self, checks: Vec<SchemaCheck>) -> Self {
        self.checks = checks;
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn regex(mut self, regex: bool) -> Self {
        self.regex = regex;
        self
    }
}

/// Checks compare as multisets.
impl PartialEq for ColumnSchema {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.dtype == other.dtype
            && self.required == other.required
            && self.regex == other.regex
            && self.nullable == other.nullable
            && self.unique == other.unique
            && self.coerce == other.coerce
            && self.ignore_na == other.ignore_na
            && same_elements(&self.checks, &other.checks)
    }
}

/// Contract for one index level.
#[derive(Debug, Clone)]
pub struct IndexSchema {
    /// Asserted name; `None` leaves the name unchecked.
    pub name: Option<Label>,
    pub dtype: DataType,
    pub nullable: bool,
    pub unique: bool,
    pub coerce: bool,
    pub ignore_na: bool,
    pub checks: Vec<SchemaCheck>,
}

impl IndexSchema {
    pub fn new(dtype: DataType) -> Self {
        Self {
            name: None,
            dtype,
            nullable: false,
            unique: false,
            coerce: false,
            ignore_na: true,
            checks: Vec::new(),
        }
    }

    pub fn named(mut self, name: impl Into<Label>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_checks(mut self, checks: Vec<SchemaCheck>) -> Self {
        self.checks = checks;
        self
    }
}

impl PartialEq for IndexSchema {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.dtype == other.dtype
            && self.nullable == other.nullable
            && self.unique == other.unique
            && self.coerce == other.coerce
            && self.ignore_na == other.ignore_na
            && same_elements(&self.checks, &other.checks)
    }
}

/// Contract for a composite index; options apply to the levels jointly.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiIndexSchema {
    pub indexes: Vec<IndexSchema>,
    pub name: Option<String>,
    pub coerce: bool,
    /// Reject tables with more levels than declared.
    pub strict: bool,
    /// Match levels by position rather than by name.
    pub ordered: bool,
}

impl MultiIndexSchema {
    pub fn new(indexes: Vec<IndexSchema>) -> Self {
        Self {
            indexes,
            name: None,
            coerce: false,
            strict: false,
            ordered: true,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn coerce(mut self, coerce: bool) -> Self {
        self.coerce = coerce;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

/// Index contract of a schema.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaIndex {
    Single(IndexSchema),
    Multi(MultiIndexSchema),
}

impl SchemaIndex {
    /// Every level contract, in order.
    pub fn indexes(&self) -> &[IndexSchema] {
        match self {
            SchemaIndex::Single(index) => std::slice::from_ref(index),
            SchemaIndex::Multi(multi) => &multi.indexes,
        }
    }

    pub fn is_multi(&self) -> bool {
        matches!(self, SchemaIndex::Multi(_))
    }
}

impl From<IndexSchema> for SchemaIndex {
    fn from(index: IndexSchema) -> Self {
        SchemaIndex::Single(index)
    }
}

impl From<MultiIndexSchema> for SchemaIndex {
    fn from(multi: MultiIndexSchema) -> Self {
        SchemaIndex::Multi(multi)
    }
}

/// Order-independent comparison of two lists.
pub(crate) fn same_elements<T: PartialEq>(a: &[T], b: &[T]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut used = vec![false; b.len()];
    a.iter().all(|item| {
        let slot = (0..b.len()).find(|&i| !used[i] && b[i] == *item);
        match slot {
            Some(i) => {
                used[i] = true;
                true
            }
            None => false,
        }
    })
}
