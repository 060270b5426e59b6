//! Compilation of resolved models into [`DataFrameSchema`]s.

use log::debug;

use crate::error::SchemaInitError;
use crate::frame::Label;
use crate::model::{CheckKind, CheckTargets, FieldSpec, Model, ResolvedModel, Role, resolve};

use super::column::{
    ColumnSchema, CustomCheck, IndexSchema, MultiIndexSchema, SchemaCheck, SchemaIndex,
    TableCheck,
};
use super::table::DataFrameSchema;

/// Resolve and compile `model` without touching its cache.
pub fn compile(model: &Model) -> Result<DataFrameSchema, SchemaInitError> {
    let resolved = resolve(model)?;
    Ok(compile_resolved(&resolved))
}

/// Build the schema for an already resolved model.
pub fn compile_resolved(resolved: &ResolvedModel) -> DataFrameSchema {
    let config = resolved.config();

    let mut schema = DataFrameSchema::new();
    schema.name = config.name.clone();
    schema.coerce = config.coerce;
    schema.strict = config.strict;
    schema.ordered = config.ordered;

    for spec in resolved.fields_with_role(Role::Column) {
        schema = schema.column(ColumnSchema {
            name: spec.alias.clone(),
            dtype: spec.dtype,
            required: spec.required,
            regex: spec.regex,
            nullable: spec.nullable,
            unique: spec.unique,
            coerce: spec.coerce.unwrap_or(false),
            ignore_na: spec.ignore_na,
            checks: field_checks(resolved, spec),
        });
    }

    let index_specs: Vec<&FieldSpec> = resolved.fields_with_role(Role::Index).collect();
    schema.index = match index_specs.as_slice() {
        [] => None,
        [single] => {
            let name = (single.check_name == Some(true)).then(|| single.alias.clone());
            Some(SchemaIndex::Single(index_schema(resolved, single, name)))
        }
        levels => {
            let indexes = levels
                .iter()
                .map(|spec| {
                    let name = (spec.check_name != Some(false)).then(|| spec.alias.clone());
                    index_schema(resolved, spec, name)
                })
                .collect();
            Some(SchemaIndex::Multi(MultiIndexSchema {
                indexes,
                name: config.multiindex_name.clone(),
                coerce: config.multiindex_coerce,
                strict: config.multiindex_strict,
                ordered: config.multiindex_ordered,
            }))
        }
    };

    for resolved_check in resolved.checks() {
        if let (CheckKind::Table { func }, CheckTargets::Table) =
            (resolved_check.check.kind(), &resolved_check.targets)
        {
            schema.checks.push(TableCheck {
                name: resolved_check.check.name().to_string(),
                model: resolved.name().to_string(),
                func: func.clone(),
            });
        }
    }

    debug!(
        "Compiled schema for model '{}': {} columns, {} index level(s), {} table checks",
        resolved.name(),
        schema.columns.len(),
        schema.index.as_ref().map(|i| i.indexes().len()).unwrap_or(0),
        schema.checks.len()
    );

    schema
}

fn index_schema(resolved: &ResolvedModel, spec: &FieldSpec, name: Option<Label>) -> IndexSchema {
    IndexSchema {
        name,
        dtype: spec.dtype,
        nullable: spec.nullable,
        unique: spec.unique,
        coerce: spec.coerce.unwrap_or(false),
        ignore_na: spec.ignore_na,
        checks: field_checks(resolved, spec),
    }
}

/// Field-local built-in checks followed by every user check bound to the
/// field's alias, in resolved check order.
fn field_checks(resolved: &ResolvedModel, spec: &FieldSpec) -> Vec<SchemaCheck> {
    let mut checks: Vec<SchemaCheck> =
        spec.checks.iter().cloned().map(SchemaCheck::Builtin).collect();

    for resolved_check in resolved.checks() {
        let (CheckKind::Field { func, .. }, CheckTargets::Fields(targets)) =
            (resolved_check.check.kind(), &resolved_check.targets)
        else {
            continue;
        };
        if targets.contains(&spec.alias) {
            checks.push(SchemaCheck::Custom(CustomCheck {
                name: resolved_check.check.name().to_string(),
                model: resolved.name().to_string(),
                func: func.clone(),
            }));
        }
    }
    checks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{DataType, Value};
    use crate::model::{BuiltinCheck, Check, Config, Field, Selector};

    #[test]
    fn test_single_index_unnamed_by_default() {
        let model = Model::builder("Schema")
            .column("a", DataType::Int64)
            .index("idx", DataType::Str)
            .build();

        let expected = DataFrameSchema::new()
            .column(ColumnSchema::new("a", DataType::Int64))
            .index(IndexSchema::new(DataType::Str));
        assert_eq!(compile(&model).unwrap(), expected);
    }

    #[test]
    fn test_composite_index_levels_named() {
        let model = Model::builder("Schema")
            .index_with("a", DataType::Int64, Field::new().gt(0))
            .index("b", DataType::Str)
            .build();

        let expected = DataFrameSchema::new().index(MultiIndexSchema::new(vec![
            IndexSchema::new(DataType::Int64)
                .named("a")
                .with_checks(vec![BuiltinCheck::GreaterThan { min: Value::Int(0) }.into()]),
            IndexSchema::new(DataType::Str).named("b"),
        ]));
        assert_eq!(compile(&model).unwrap(), expected);
    }

    #[test]
    fn test_regex_check_binds_matching_aliases() {
        let model = Model::builder("Schema")
            .column("a", DataType::Int64)
            .column("abc", DataType::Int64)
            .column("cba", DataType::Int64)
            .check(Check::new("lt_100", Selector::regex("^a"), |_, s| {
                Ok(s.mask(|v| v.less_than(100)).into())
            }))
            .build();

        let schema = compile(&model).unwrap();
        let counts: Vec<usize> = schema.columns.values().map(|c| c.checks.len()).collect();
        assert_eq!(counts, vec![1, 1, 0]);
    }

    #[test]
    fn test_config_applied() {
        let model = Model::builder("Schema")
            .index("i1", DataType::Str)
            .index("i2", DataType::Str)
            .config(Config::new().multiindex_coerce(true).multiindex_name("mi").strict(true))
            .build();

        let schema = compile(&model).unwrap();
        let Some(SchemaIndex::Multi(multi)) = &schema.index else {
            panic!("expected a composite index");
        };
        assert!(multi.coerce);
        assert_eq!(multi.name.as_deref(), Some("mi"));
        assert_eq!(schema.strict, crate::model::Strictness::Yes);
    }
}
