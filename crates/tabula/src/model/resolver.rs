//! Flattening of a model and its ancestors into one set of fields,
//! checks and options.

use indexmap::IndexMap;
use log::debug;
use regex::Regex;

use crate::error::SchemaInitError;
use crate::frame::Label;

use super::check::{Check, CheckKind, FieldRef, Selector, matches_from_start};
use super::config::{Config, ResolvedConfig};
use super::field::{Assigned, FieldSpec, Role};
use super::Model;

/// Fields a check was bound to during resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckTargets {
    /// Resolved aliases, in binding order.
    Fields(Vec<Label>),
    /// The whole table.
    Table,
}

/// A check together with the fields it binds to.
#[derive(Debug, Clone)]
pub struct ResolvedCheck {
    pub check: Check,
    pub targets: CheckTargets,
}

/// A model with its inheritance chain flattened.
#[derive(Debug, Clone)]
pub struct ResolvedModel {
    name: String,
    fields: IndexMap<String, FieldSpec>,
    checks: Vec<ResolvedCheck>,
    config: ResolvedConfig,
}

impl ResolvedModel {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields keyed by declared name, in first-appearance order.
    pub fn fields(&self) -> &IndexMap<String, FieldSpec> {
        &self.fields
    }

    pub fn fields_with_role(&self, role: Role) -> impl Iterator<Item = &FieldSpec> {
        self.fields.values().filter(move |f| f.role == role)
    }

    pub fn checks(&self) -> &[ResolvedCheck] {
        &self.checks
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// External name a declared field resolved to.
    pub fn alias_of(&self, declared_name: &str) -> Option<&Label> {
        self.fields.get(declared_name).map(|f| &f.alias)
    }
}

/// Resolve `model` against its ancestors.
///
/// Ancestors are applied base-first so that derived declarations replace
/// inherited ones. A replaced field or check keeps the position where its
/// name first appeared.
pub fn resolve(model: &Model) -> Result<ResolvedModel, SchemaInitError> {
    let mut chain = linearize(model);
    chain.reverse();

    let missing = missing_annotations(&chain);
    if !missing.is_empty() {
        return Err(SchemaInitError::MissingAnnotations(missing));
    }

    let mut fields: IndexMap<String, FieldSpec> = IndexMap::new();
    let mut checks: IndexMap<String, Check> = IndexMap::new();
    let mut config = Config::default();

    for level in &chain {
        for (name, declaration) in &level.declarations {
            if is_private(name) {
                continue;
            }
            let Some(annotation) = &declaration.annotation else {
                continue;
            };
            let field = match &declaration.value {
                None => None,
                Some(Assigned::Field(field)) => Some(field),
                Some(Assigned::Literal(_)) => {
                    return Err(SchemaInitError::InvalidFieldValue(name.clone()));
                }
            };
            let spec = FieldSpec::from_declaration(name, annotation, field)?;
            fields.insert(name.clone(), spec);
        }
        for check in &level.checks {
            checks.insert(check.name().to_string(), check.clone());
        }
        if let Some(level_config) = &level.config {
            config = level_config.merge(&config);
        }
    }

    ensure_unique_aliases(&fields, Role::Column)?;
    ensure_unique_aliases(&fields, Role::Index)?;

    let checks = checks
        .into_values()
        .map(|check| {
            let targets = bind(&check, &fields)?;
            Ok(ResolvedCheck { check, targets })
        })
        .collect::<Result<Vec<_>, SchemaInitError>>()?;

    debug!(
        "Resolved model '{}' over {} level(s): {} fields, {} checks",
        model.name(),
        chain.len(),
        fields.len(),
        checks.len()
    );

    Ok(ResolvedModel {
        name: model.name().to_string(),
        fields,
        checks,
        config: config.resolve(),
    })
}

/// Method resolution order: the model first, then ancestors depth-first,
/// left to right. An ancestor reachable through several parents is placed
/// after the last parent that reaches it.
fn linearize(model: &Model) -> Vec<&Model> {
    let mut order = vec![model];
    for parent in &model.parents {
        order.extend(linearize(parent));
    }

    let mut deduped: Vec<&Model> = Vec::with_capacity(order.len());
    for candidate in order.into_iter().rev() {
        if !deduped.iter().any(|m| std::ptr::eq(*m, candidate)) {
            deduped.push(candidate);
        }
    }
    deduped.reverse();
    deduped
}

fn is_private(name: &str) -> bool {
    name.starts_with('_')
}

fn missing_annotations(chain: &[&Model]) -> Vec<String> {
    let mut missing: Vec<String> = Vec::new();
    for level in chain {
        for (name, declaration) in &level.declarations {
            let unannotated_field = declaration.annotation.is_none()
                && matches!(declaration.value, Some(Assigned::Field(_)));
            if unannotated_field && !is_private(name) && !missing.contains(name) {
                missing.push(name.clone());
            }
        }
    }
    missing
}

fn ensure_unique_aliases(
    fields: &IndexMap<String, FieldSpec>,
    role: Role,
) -> Result<(), SchemaInitError> {
    let mut seen: IndexMap<&Label, &str> = IndexMap::new();
    for spec in fields.values().filter(|f| f.role == role) {
        if let Some(first) = seen.insert(&spec.alias, &spec.declared_name) {
            return Err(SchemaInitError::DuplicateAlias {
                role,
                alias: spec.alias.clone(),
                first: first.to_string(),
                second: spec.declared_name.clone(),
            });
        }
    }
    Ok(())
}

fn bind(
    check: &Check,
    fields: &IndexMap<String, FieldSpec>,
) -> Result<CheckTargets, SchemaInitError> {
    let selector = match check.kind() {
        CheckKind::Table { .. } => return Ok(CheckTargets::Table),
        CheckKind::Field { selector, .. } => selector,
    };

    let non_existing = |field: String| SchemaInitError::NonExistingField {
        check: check.name().to_string(),
        field,
    };

    let mut targets: Vec<Label> = Vec::new();
    match selector {
        Selector::Fields(refs) => {
            for field_ref in refs {
                let alias = match field_ref {
                    FieldRef::Attr(name) => fields
                        .get(name)
                        .map(|f| f.alias.clone())
                        .ok_or_else(|| non_existing(name.clone()))?,
                    FieldRef::Label(label) => fields
                        .values()
                        .find(|f| &f.alias == label)
                        .map(|f| f.alias.clone())
                        .ok_or_else(|| non_existing(label.to_string()))?,
                };
                if !targets.contains(&alias) {
                    targets.push(alias);
                }
            }
        }
        Selector::Regex(pattern) => {
            let re = Regex::new(pattern).map_err(|source| SchemaInitError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
            for spec in fields.values() {
                if matches_from_start(&re, &spec.alias.to_string())
                    && !targets.contains(&spec.alias)
                {
                    targets.push(spec.alias.clone());
                }
            }
        }
    }
    Ok(CheckTargets::Fields(targets))
}
