//! User-supplied checks and the fields they select.

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::error::CheckFnError;
use crate::frame::{DataFrame, Label, Series};

/// Information handed to a check function.
#[derive(Debug, Clone, Copy)]
pub struct CheckContext<'a> {
    /// Name of the model whose schema is running the check.
    pub model: &'a str,
}

/// What a check function produced.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    /// One verdict for every row.
    Scalar(bool),
    /// One verdict per row.
    Rows(Vec<bool>),
    /// One verdict per cell, per column.
    Cells(Vec<(Label, Vec<bool>)>),
}

impl From<bool> for CheckOutcome {
    fn from(v: bool) -> Self {
        CheckOutcome::Scalar(v)
    }
}

impl From<Vec<bool>> for CheckOutcome {
    fn from(v: Vec<bool>) -> Self {
        CheckOutcome::Rows(v)
    }
}

impl From<Vec<(Label, Vec<bool>)>> for CheckOutcome {
    fn from(v: Vec<(Label, Vec<bool>)>) -> Self {
        CheckOutcome::Cells(v)
    }
}

pub type SeriesCheckFn =
    Arc<dyn Fn(&CheckContext<'_>, &Series) -> Result<CheckOutcome, CheckFnError> + Send + Sync>;

pub type FrameCheckFn =
    Arc<dyn Fn(&CheckContext<'_>, &DataFrame) -> Result<CheckOutcome, CheckFnError> + Send + Sync>;

/// Reference to a field from a check selector.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldRef {
    /// A field by declared name; binds to whatever alias it resolves to.
    Attr(String),
    /// A field by its external name.
    Label(Label),
}

impl FieldRef {
    pub fn attr(name: impl Into<String>) -> Self {
        FieldRef::Attr(name.into())
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldRef::Attr(name) => f.write_str(name),
            FieldRef::Label(label) => write!(f, "{label}"),
        }
    }
}

impl From<&str> for FieldRef {
    fn from(s: &str) -> Self {
        FieldRef::Label(s.into())
    }
}

impl From<String> for FieldRef {
    fn from(s: String) -> Self {
        FieldRef::Label(s.into())
    }
}

impl From<i64> for FieldRef {
    fn from(i: i64) -> Self {
        FieldRef::Label(i.into())
    }
}

impl From<i32> for FieldRef {
    fn from(i: i32) -> Self {
        FieldRef::Label(i.into())
    }
}

impl From<Label> for FieldRef {
    fn from(label: Label) -> Self {
        FieldRef::Label(label)
    }
}

/// Which fields a field check applies to.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// Explicit fields.
    Fields(Vec<FieldRef>),
    /// Every field whose alias matches the pattern from its start.
    Regex(String),
}

impl Selector {
    pub fn fields<I, F>(fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<FieldRef>,
    {
        Selector::Fields(fields.into_iter().map(Into::into).collect())
    }

    pub fn regex(pattern: impl Into<String>) -> Self {
        Selector::Regex(pattern.into())
    }
}

/// Regex match anchored at the start of `text`, like a prefix match.
pub(crate) fn matches_from_start(re: &Regex, text: &str) -> bool {
    re.find(text).is_some_and(|m| m.start() == 0)
}

#[derive(Clone)]
pub(crate) enum CheckKind {
    Field { selector: Selector, func: SeriesCheckFn },
    Table { func: FrameCheckFn },
}

/// A named predicate bound to fields or to the whole table.
///
/// Within one model, checks are keyed by name: a derived model declaring a
/// check with an inherited name replaces the inherited check.
#[derive(Clone)]
pub struct Check {
    name: String,
    kind: CheckKind,
}

impl Check {
    /// A check run against each selected field.
    pub fn new<F>(name: impl Into<String>, selector: Selector, func: F) -> Self
    where
        F: Fn(&CheckContext<'_>, &Series) -> Result<CheckOutcome, CheckFnError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            kind: CheckKind::Field {
                selector,
                func: Arc::new(func),
            },
        }
    }

    /// A check run against the whole table.
    pub fn dataframe<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&CheckContext<'_>, &DataFrame) -> Result<CheckOutcome, CheckFnError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            kind: CheckKind::Table { func: Arc::new(func) },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The field selector, or `None` for table checks.
    pub fn selector(&self) -> Option<&Selector> {
        match &self.kind {
            CheckKind::Field { selector, .. } => Some(selector),
            CheckKind::Table { .. } => None,
        }
    }

    pub fn is_table_check(&self) -> bool {
        matches!(self.kind, CheckKind::Table { .. })
    }

    pub(crate) fn kind(&self) -> &CheckKind {
        &self.kind
    }
}

impl fmt::Debug for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Check")
            .field("name", &self.name)
            .field("selector", &self.selector())
            .finish()
    }
}
