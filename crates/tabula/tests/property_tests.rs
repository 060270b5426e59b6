//! Property-based tests for model compilation and validation.
//!
//! Properties checked:
//! 1. **Idempotence**: compiling a model twice gives equal schemas
//! 2. **Alias uniqueness**: a compiled schema never repeats a column alias
//! 3. **Exhaustiveness**: lazy runs report every violated check, fail-fast the first
//! 4. **Round-trip**: conforming tables come back unchanged
//!
//! ```bash
//! PROPTEST_CASES=10000 cargo test -p tabula --test property_tests
//! ```

use std::collections::HashSet;

use proptest::prelude::*;

use tabula::{
    DataFrame, DataType, Field, Label, Location, Model, SchemaInitError, Series, ValidationError,
    compile,
};

// =============================================================================
// Test Strategies
// =============================================================================

fn dtype() -> impl Strategy<Value = DataType> {
    prop_oneof![
        Just(DataType::Int64),
        Just(DataType::Float64),
        Just(DataType::Str),
        Just(DataType::Bool),
        Just(DataType::DateTime),
    ]
}

/// Distinct public field names.
fn field_names(max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::hash_set("[a-z][a-z0-9]{0,5}", 1..max)
        .prop_map(|names| names.into_iter().collect())
}

/// Field names paired with an alias drawn from a small pool, so collisions
/// happen regularly.
fn aliased_fields() -> impl Strategy<Value = Vec<(String, Option<String>)>> {
    field_names(8).prop_flat_map(|names| {
        let n = names.len();
        (
            Just(names),
            prop::collection::vec(prop::option::of("[xyz]"), n),
        )
            .prop_map(|(names, aliases)| names.into_iter().zip(aliases).collect())
    })
}

/// One column per entry; `true` marks a column holding a value >= 100.
fn violations() -> impl Strategy<Value = Vec<bool>> {
    prop::collection::vec(any::<bool>(), 1..10)
}

fn bounded_model(columns: usize) -> std::sync::Arc<Model> {
    (0..columns)
        .fold(Model::builder("Bounded"), |builder, i| {
            builder.column_with(format!("c{i}"), DataType::Int64, Field::new().lt(100))
        })
        .build()
}

fn bounded_table(violations: &[bool]) -> DataFrame {
    DataFrame::from_columns(violations.iter().enumerate().map(|(i, violated)| {
        let value = if *violated { 100 + i as i64 } else { i as i64 };
        (format!("c{i}"), Series::from_values([value]))
    }))
    .unwrap()
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn compile_is_idempotent(
        fields in prop::collection::vec(dtype(), 1..8),
        names in field_names(8),
    ) {
        let model = names
            .iter()
            .zip(&fields)
            .fold(Model::builder("Schema"), |builder, (name, dtype)| {
                builder.column(name.clone(), *dtype)
            })
            .build();

        prop_assert_eq!(compile(&model).unwrap(), compile(&model).unwrap());
        prop_assert_eq!(model.to_schema().unwrap(), &compile(&model).unwrap());
    }

    #[test]
    fn aliases_are_unique(fields in aliased_fields()) {
        let model = fields
            .iter()
            .fold(Model::builder("Schema"), |builder, (name, alias)| {
                let field = match alias {
                    Some(alias) => Field::new().alias(alias.as_str()),
                    None => Field::new(),
                };
                builder.column_with(name.clone(), DataType::Int64, field)
            })
            .build();

        let resolved: Vec<String> = fields
            .iter()
            .map(|(name, alias)| alias.clone().unwrap_or_else(|| name.clone()))
            .collect();
        let distinct: HashSet<&String> = resolved.iter().collect();

        match compile(&model) {
            Ok(schema) => {
                prop_assert_eq!(distinct.len(), resolved.len());
                let labels: HashSet<&Label> = schema.columns.keys().collect();
                prop_assert_eq!(labels.len(), schema.columns.len());
            }
            Err(err) => {
                prop_assert!(distinct.len() < resolved.len());
                let is_duplicate = matches!(err, SchemaInitError::DuplicateAlias { .. });
                prop_assert!(is_duplicate);
            }
        }
    }

    #[test]
    fn lazy_reports_every_violation(violations in violations()) {
        let model = bounded_model(violations.len());
        let expected = violations.iter().filter(|v| **v).count();

        match model.to_schema().unwrap().validate(bounded_table(&violations), true) {
            Ok(_) => prop_assert_eq!(expected, 0),
            Err(err) => prop_assert_eq!(err.failures().len(), expected),
        }
    }

    #[test]
    fn fail_fast_reports_first_violation(violations in violations()) {
        let model = bounded_model(violations.len());
        let first = violations.iter().position(|v| *v);

        let result = model.to_schema().unwrap().validate(bounded_table(&violations), false);
        match (first, result) {
            (None, Ok(_)) => {}
            (Some(i), Err(ValidationError::Schema(error))) => {
                prop_assert_eq!(error.location, Location::Column(format!("c{i}").into()));
            }
            (first, result) => {
                prop_assert!(false, "first violation {:?}, got {:?}", first, result.err());
            }
        }
    }

    #[test]
    fn conforming_tables_round_trip(values in prop::collection::vec(-1000i64..100, 0..50)) {
        let model = Model::builder("Schema")
            .column_with("a", DataType::Int64, Field::new().lt(100))
            .build();
        let df = DataFrame::from_columns([("a", Series::with_dtype(
            DataType::Int64,
            values.into_iter().map(Into::into).collect(),
        ))])
        .unwrap();

        prop_assert_eq!(model.to_schema().unwrap().validate(df.clone(), true).unwrap(), df);
    }
}
