//! Declarative schema models.
//!
//! A [`Model`] is built through an explicit registration API: fields with a
//! role, data type and constraints, named checks, and option overrides.
//! Models compose by extending other models; [`resolver::resolve`] flattens
//! the chain and [`Model::to_schema`] compiles it.

mod builtin;
mod check;
mod config;
mod field;
mod resolver;

use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::OnceCell;

use crate::error::{Result, SchemaInitError};
use crate::frame::{DataFrame, DataType, Label};
use crate::schema::{self, DataFrameSchema};

pub use builtin::{BuiltinCheck, ConstraintArg};
pub use check::{Check, CheckContext, CheckOutcome, FieldRef, FrameCheckFn, Selector, SeriesCheckFn};
pub use config::{Config, ResolvedConfig, Strictness};
pub use field::{Annotation, Assigned, Field, FieldSpec, Role};
pub use resolver::{CheckTargets, ResolvedCheck, ResolvedModel, resolve};

pub(crate) use check::{CheckKind, matches_from_start};

/// One attribute as written in a model level.
#[derive(Debug, Clone)]
pub struct Declaration {
    pub annotation: Option<Annotation>,
    pub value: Option<Assigned>,
}

/// A declarative schema definition and its ancestors.
///
/// Resolution and compilation happen once; later calls reuse the cached
/// results.
#[derive(Debug)]
pub struct Model {
    name: String,
    parents: Vec<Arc<Model>>,
    declarations: IndexMap<String, Declaration>,
    checks: Vec<Check>,
    config: Option<Config>,
    resolved: OnceCell<ResolvedModel>,
    schema: OnceCell<DataFrameSchema>,
}

impl Model {
    pub fn builder(name: impl Into<String>) -> ModelBuilder {
        ModelBuilder {
            name: name.into(),
            parents: Vec::new(),
            declarations: IndexMap::new(),
            checks: Vec::new(),
            config: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parents(&self) -> &[Arc<Model>] {
        &self.parents
    }

    /// The flattened fields, checks and options.
    pub fn resolve(&self) -> std::result::Result<&ResolvedModel, SchemaInitError> {
        self.resolved.get_or_try_init(|| resolver::resolve(self))
    }

    /// External name of a declared field after inheritance and aliasing.
    pub fn alias_of(
        &self,
        declared_name: &str,
    ) -> std::result::Result<Option<&Label>, SchemaInitError> {
        Ok(self.resolve()?.alias_of(declared_name))
    }

    /// The compiled schema, built on first use.
    pub fn to_schema(&self) -> std::result::Result<&DataFrameSchema, SchemaInitError> {
        self.schema
            .get_or_try_init(|| Ok(schema::compile_resolved(self.resolve()?)))
    }

    /// Compile if needed, then validate `df`.
    pub fn validate(&self, df: DataFrame, lazy: bool) -> Result<DataFrame> {
        Ok(self.to_schema()?.validate(df, lazy)?)
    }
}

/// Builder for [`Model`].
#[derive(Debug)]
pub struct ModelBuilder {
    name: String,
    parents: Vec<Arc<Model>>,
    declarations: IndexMap<String, Declaration>,
    checks: Vec<Check>,
    config: Option<Config>,
}

impl ModelBuilder {
    /// Add a parent. Earlier parents take precedence over later ones.
    pub fn extends(mut self, parent: Arc<Model>) -> Self {
        self.parents.push(parent);
        self
    }

    /// Declare an attribute through the raw declaration surface.
    ///
    /// Re-declaring a name within the same level replaces the earlier
    /// declaration.
    pub fn declare(
        mut self,
        name: impl Into<String>,
        annotation: Option<Annotation>,
        value: Option<Assigned>,
    ) -> Self {
        self.declarations
            .insert(name.into(), Declaration { annotation, value });
        self
    }

    pub fn column(self, name: impl Into<String>, dtype: DataType) -> Self {
        self.declare(name, Some(Annotation::Column(dtype)), None)
    }

    pub fn column_with(self, name: impl Into<String>, dtype: DataType, field: Field) -> Self {
        self.declare(name, Some(Annotation::Column(dtype)), Some(Assigned::Field(field)))
    }

    pub fn optional_column(self, name: impl Into<String>, dtype: DataType) -> Self {
        self.declare(name, Some(Annotation::Column(dtype).optional()), None)
    }

    pub fn optional_column_with(
        self,
        name: impl Into<String>,
        dtype: DataType,
        field: Field,
    ) -> Self {
        self.declare(
            name,
            Some(Annotation::Column(dtype).optional()),
            Some(Assigned::Field(field)),
        )
    }

    pub fn index(self, name: impl Into<String>, dtype: DataType) -> Self {
        self.declare(name, Some(Annotation::Index(dtype)), None)
    }

    pub fn index_with(self, name: impl Into<String>, dtype: DataType, field: Field) -> Self {
        self.declare(name, Some(Annotation::Index(dtype)), Some(Assigned::Field(field)))
    }

    pub fn check(mut self, check: Check) -> Self {
        self.checks.push(check);
        self
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> Arc<Model> {
        Arc::new(Model {
            name: self.name,
            parents: self.parents,
            declarations: self.declarations,
            checks: self.checks,
            config: self.config,
            resolved: OnceCell::new(),
            schema: OnceCell::new(),
        })
    }
}
