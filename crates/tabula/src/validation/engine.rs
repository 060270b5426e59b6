//! Execution of a compiled schema against a table.
//!
//! Order of evaluation: the column set (strictness, ordering), then each
//! column in schema order, then the index, then table checks. Within a
//! column or index level: coercion or dtype, nullability, uniqueness, then
//! every bound check in order.

use log::trace;
use regex::Regex;

use crate::error::{CheckFnError, Location, SchemaError, ValidationError, render_values};
use crate::frame::{DataFrame, DataType, Label, Series, Value};
use crate::model::{CheckContext, CheckOutcome, Strictness, matches_from_start};
use crate::schema::{
    ColumnSchema, DataFrameSchema, IndexSchema, MultiIndexSchema, SchemaCheck, SchemaIndex,
    TableCheck,
};

use super::collector::FailureCollector;

/// Contract shared by columns and index levels.
struct ValueContract<'a> {
    dtype: DataType,
    coerce: bool,
    nullable: bool,
    unique: bool,
    ignore_na: bool,
    checks: &'a [SchemaCheck],
}

impl<'a> ValueContract<'a> {
    fn for_column(column: &'a ColumnSchema, coerce: bool) -> Self {
        Self {
            dtype: column.dtype,
            coerce: column.coerce || coerce,
            nullable: column.nullable,
            unique: column.unique,
            ignore_na: column.ignore_na,
            checks: &column.checks,
        }
    }

    fn for_index(index: &'a IndexSchema, coerce: bool) -> Self {
        Self {
            dtype: index.dtype,
            coerce: index.coerce || coerce,
            nullable: index.nullable,
            unique: index.unique,
            ignore_na: index.ignore_na,
            checks: &index.checks,
        }
    }
}

/// Applies one schema to tables.
pub struct ValidationEngine<'s> {
    schema: &'s DataFrameSchema,
}

impl<'s> ValidationEngine<'s> {
    pub fn new(schema: &'s DataFrameSchema) -> Self {
        Self { schema }
    }

    /// Validate `df`; see [`DataFrameSchema::validate`].
    pub fn run(&self, df: DataFrame, lazy: bool) -> Result<DataFrame, ValidationError> {
        let mut failures = FailureCollector::new(lazy);

        let mut df = self.check_column_set(df, &mut failures)?;

        for column in self.schema.columns.values() {
            let labels = self.matching_columns(&df, column);
            if labels.is_empty() {
                if column.required {
                    failures.record(SchemaError::new(
                        Location::Column(column.name.clone()),
                        "column_in_dataframe",
                        vec![Value::from(&column.name)],
                        format!("column '{}' not in dataframe", column.name),
                    ))?;
                }
                continue;
            }
            for label in labels {
                self.validate_column(&mut df, column, &label, &mut failures)?;
            }
        }

        self.validate_index(&mut df, &mut failures)?;

        for check in &self.schema.checks {
            self.run_table_check(&df, check, &mut failures)?;
        }

        failures.finish(self.schema.name.clone(), df)
    }

    /// Labels of `df` covered by `column`: the exact alias, or every match
    /// of a regex alias.
    fn matching_columns(&self, df: &DataFrame, column: &ColumnSchema) -> Vec<Label> {
        if column.regex {
            // Patterns are validated at compile time; a hand-built schema
            // with a broken pattern matches nothing.
            let Ok(re) = Regex::new(&column.name.to_string()) else {
                return Vec::new();
            };
            df.column_labels()
                .filter(|label| matches_from_start(&re, &label.to_string()))
                .cloned()
                .collect()
        } else if df.has_column(&column.name) {
            vec![column.name.clone()]
        } else {
            Vec::new()
        }
    }

    /// Position of the first schema column covering `label`.
    fn schema_position(&self, label: &Label) -> Option<usize> {
        self.schema.columns.values().position(|column| {
            if column.regex {
                Regex::new(&column.name.to_string())
                    .is_ok_and(|re| matches_from_start(&re, &label.to_string()))
            } else {
                &column.name == label
            }
        })
    }

    fn check_column_set(
        &self,
        df: DataFrame,
        failures: &mut FailureCollector,
    ) -> Result<DataFrame, ValidationError> {
        let df = match self.schema.strict {
            Strictness::No => df,
            Strictness::Filter => df.select(|label| self.schema_position(label).is_some()),
            Strictness::Yes => {
                let unknown: Vec<Label> = df
                    .column_labels()
                    .filter(|label| self.schema_position(label).is_none())
                    .cloned()
                    .collect();
                for label in unknown {
                    failures.record(SchemaError::new(
                        Location::Column(label.clone()),
                        "column_in_schema",
                        vec![Value::from(&label)],
                        format!("column '{label}' not in schema"),
                    ))?;
                }
                df
            }
        };

        if self.schema.ordered {
            let mut highest = 0;
            let mut out_of_order = Vec::new();
            for label in df.column_labels() {
                let Some(position) = self.schema_position(label) else {
                    continue;
                };
                if position < highest {
                    out_of_order.push(label.clone());
                } else {
                    highest = position;
                }
            }
            for label in out_of_order {
                failures.record(SchemaError::new(
                    Location::Column(label.clone()),
                    "column_ordered",
                    vec![Value::from(&label)],
                    format!("column '{label}' out-of-order"),
                ))?;
            }
        }

        Ok(df)
    }

    fn validate_column(
        &self,
        df: &mut DataFrame,
        column: &ColumnSchema,
        label: &Label,
        failures: &mut FailureCollector,
    ) -> Result<(), ValidationError> {
        let Some(series) = df.column(label).cloned() else {
            return Ok(());
        };
        let location = Location::Column(label.clone());
        let contract = ValueContract::for_column(column, self.schema.coerce);
        if let Some(coerced) = self.validate_values(series, &contract, &location, failures)? {
            df.replace_column(label, coerced);
        }
        Ok(())
    }

    fn validate_index(
        &self,
        df: &mut DataFrame,
        failures: &mut FailureCollector,
    ) -> Result<(), ValidationError> {
        match &self.schema.index {
            None => Ok(()),
            Some(SchemaIndex::Single(contract)) => {
                self.validate_single_index(df, contract, failures)
            }
            Some(SchemaIndex::Multi(multi)) => self.validate_multi_index(df, multi, failures),
        }
    }

    fn validate_single_index(
        &self,
        df: &mut DataFrame,
        contract: &IndexSchema,
        failures: &mut FailureCollector,
    ) -> Result<(), ValidationError> {
        let location = Location::Index(contract.name.clone());
        if df.index().is_multi() {
            let levels = df.index().levels().len();
            return failures.record(SchemaError::new(
                location,
                "index_structure",
                vec![Value::from("MultiIndex")],
                format!("expected a single index, found a MultiIndex with {levels} levels"),
            ));
        }

        let level = df.index().levels()[0].clone();
        self.check_index_name(contract, &level, &location, failures)?;
        let contract_view = ValueContract::for_index(contract, self.schema.coerce);
        if let Some(coerced) = self.validate_values(level, &contract_view, &location, failures)? {
            df.replace_index_level(0, coerced);
        }
        Ok(())
    }

    fn validate_multi_index(
        &self,
        df: &mut DataFrame,
        multi: &MultiIndexSchema,
        failures: &mut FailureCollector,
    ) -> Result<(), ValidationError> {
        let multi_location = Location::Index(multi.name.clone().map(Label::from));
        if !df.index().is_multi() {
            return failures.record(SchemaError::new(
                multi_location,
                "index_structure",
                vec![Value::from("Index")],
                format!(
                    "expected a MultiIndex with {} levels, found a single index",
                    multi.indexes.len()
                ),
            ));
        }

        let levels: Vec<Series> = df.index().levels().to_vec();
        if multi.strict && levels.len() != multi.indexes.len() {
            failures.record(SchemaError::new(
                multi_location.clone(),
                "multiindex_strict",
                levels.iter().map(|l| Value::from(l.name().map(Value::from))).collect(),
                format!(
                    "expected {} index levels, found {}",
                    multi.indexes.len(),
                    levels.len()
                ),
            ))?;
        }

        for (i, contract) in multi.indexes.iter().enumerate() {
            let location = Location::Index(contract.name.clone());
            let position = match (&contract.name, multi.ordered) {
                (Some(name), false) => levels.iter().position(|l| l.name() == Some(name)),
                _ => (i < levels.len()).then_some(i),
            };
            let Some(position) = position else {
                failures.record(SchemaError::new(
                    location,
                    "index_structure",
                    vec![Value::from(contract.name.as_ref().map(Value::from))],
                    format!("index level {i} not found in MultiIndex"),
                ))?;
                continue;
            };

            let level = levels[position].clone();
            if multi.ordered {
                self.check_index_name(contract, &level, &location, failures)?;
            }
            let contract_view = ValueContract::for_index(contract, multi.coerce);
            let coerced = self.validate_values(level, &contract_view, &location, failures)?;
            if let Some(coerced) = coerced {
                df.replace_index_level(position, coerced);
            }
        }
        Ok(())
    }

    fn check_index_name(
        &self,
        contract: &IndexSchema,
        level: &Series,
        location: &Location,
        failures: &mut FailureCollector,
    ) -> Result<(), ValidationError> {
        let Some(expected) = &contract.name else {
            return Ok(());
        };
        if level.name() == Some(expected) {
            return Ok(());
        }
        let found = level
            .name()
            .map(ToString::to_string)
            .unwrap_or_else(|| "None".to_string());
        failures.record(SchemaError::new(
            location.clone(),
            "index_name",
            vec![Value::from(level.name().map(Value::from))],
            format!("Expected index to have name '{expected}', found '{found}'"),
        ))
    }

    /// Run the value-level contract; returns the coerced series when
    /// coercion changed it.
    fn validate_values(
        &self,
        series: Series,
        contract: &ValueContract<'_>,
        location: &Location,
        failures: &mut FailureCollector,
    ) -> Result<Option<Series>, ValidationError> {
        let dtype_checked = contract.dtype != DataType::Object;
        let mut series = series;
        let mut coerced = false;

        if contract.coerce && dtype_checked && series.dtype() != contract.dtype {
            match series.coerce(contract.dtype) {
                Ok(converted) => {
                    series = converted;
                    coerced = true;
                }
                Err(failing) => {
                    failures.record(SchemaError::new(
                        location.clone(),
                        format!("coerce_dtype('{}')", contract.dtype),
                        failing,
                        format!("{location} could not be coerced to type {}", contract.dtype),
                    ))?;
                    return Ok(None);
                }
            }
        }

        if dtype_checked && series.dtype() != contract.dtype {
            failures.record(SchemaError::new(
                location.clone(),
                format!("dtype('{}')", contract.dtype),
                vec![Value::from(series.dtype().name())],
                format!(
                    "expected {location} to have type {}, got {}",
                    contract.dtype,
                    series.dtype()
                ),
            ))?;
        }

        if !contract.nullable {
            let nulls = series.null_positions();
            if !nulls.is_empty() {
                failures.record(SchemaError::new(
                    location.clone(),
                    "not_nullable",
                    nulls.iter().map(|_| Value::Null).collect(),
                    format!("non-nullable {location} contains {} null values", nulls.len()),
                ))?;
            }
        }

        if contract.unique {
            let duplicates: Vec<Value> = series
                .duplicate_positions()
                .into_iter()
                .filter_map(|i| series.get(i).cloned())
                .collect();
            if !duplicates.is_empty() {
                let message = format!(
                    "{location} contains duplicate values: {}",
                    render_values(&duplicates)
                );
                failures.record(SchemaError::new(
                    location.clone(),
                    "field_uniqueness",
                    duplicates,
                    message,
                ))?;
            }
        }

        for check in contract.checks {
            trace!("Running check '{}' on {location}", check.name());
            let outcome = match check {
                SchemaCheck::Builtin(builtin) => CheckOutcome::Rows(builtin.evaluate(&series)),
                SchemaCheck::Custom(custom) => {
                    let ctx = CheckContext { model: &custom.model };
                    (custom.func)(&ctx, &series).map_err(|source| {
                        ValidationError::CheckFunction {
                            check: custom.name.clone(),
                            location: location.clone(),
                            source,
                        }
                    })?
                }
            };
            let scalar_false = outcome == CheckOutcome::Scalar(false);
            let mask = row_mask(outcome, series.len()).map_err(|source| {
                ValidationError::CheckFunction {
                    check: check.name().to_string(),
                    location: location.clone(),
                    source,
                }
            })?;

            let mut failing: Vec<Value> = series
                .iter()
                .zip(&mask)
                .filter(|(value, passed)| !**passed && !(contract.ignore_na && value.is_null()))
                .map(|(value, _)| value.clone())
                .collect();
            if scalar_false && failing.is_empty() {
                failing.push(Value::Bool(false));
            }
            if !failing.is_empty() {
                let message = format!(
                    "{location} failed validator '{}': failure cases: {}",
                    check.name(),
                    render_values(&failing)
                );
                let error = SchemaError::new(location.clone(), check.name(), failing, message);
                failures.record(error)?;
            }
        }

        Ok(coerced.then_some(series))
    }

    fn run_table_check(
        &self,
        df: &DataFrame,
        check: &TableCheck,
        failures: &mut FailureCollector,
    ) -> Result<(), ValidationError> {
        let location = Location::Table(self.schema.name.clone());
        trace!("Running table check '{}'", check.name);

        let check_error = |source: CheckFnError| ValidationError::CheckFunction {
            check: check.name.clone(),
            location: location.clone(),
            source,
        };

        let ctx = CheckContext { model: &check.model };
        let outcome = (check.func)(&ctx, df).map_err(check_error)?;

        let failing: Vec<Value> = match outcome {
            CheckOutcome::Scalar(true) => Vec::new(),
            CheckOutcome::Scalar(false) => vec![Value::Bool(false)],
            CheckOutcome::Rows(mask) => {
                if mask.len() != df.row_count() {
                    return Err(check_error(length_error(mask.len(), df.row_count())));
                }
                mask.iter()
                    .enumerate()
                    .filter(|(_, passed)| !**passed)
                    .map(|(row, _)| df.index().label_at(row))
                    .collect()
            }
            CheckOutcome::Cells(columns) => {
                let mut failing = Vec::new();
                for (label, mask) in columns {
                    let series = df.column(&label).ok_or_else(|| {
                        check_error(CheckFnError::new(format!(
                            "result refers to unknown column '{label}'"
                        )))
                    })?;
                    if mask.len() != series.len() {
                        return Err(check_error(length_error(mask.len(), series.len())));
                    }
                    failing.extend(
                        series
                            .iter()
                            .zip(&mask)
                            .filter(|(_, passed)| !**passed)
                            .map(|(value, _)| value.clone()),
                    );
                }
                failing
            }
        };

        if failing.is_empty() {
            return Ok(());
        }
        let message = format!(
            "{location} failed table check '{}': failure cases: {}",
            check.name,
            render_values(&failing)
        );
        failures.record(SchemaError::new(location, check.name.clone(), failing, message))
    }
}

/// Expand a field-check outcome to one verdict per row.
fn row_mask(outcome: CheckOutcome, rows: usize) -> Result<Vec<bool>, CheckFnError> {
    match outcome {
        CheckOutcome::Scalar(verdict) => Ok(vec![verdict; rows]),
        CheckOutcome::Rows(mask) if mask.len() == rows => Ok(mask),
        CheckOutcome::Rows(mask) => Err(length_error(mask.len(), rows)),
        CheckOutcome::Cells(_) => Err(CheckFnError::new(
            "field check returned a per-cell result",
        )),
    }
}

fn length_error(found: usize, expected: usize) -> CheckFnError {
    CheckFnError::new(format!(
        "check returned {found} results for {expected} rows"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameIndex;
    use crate::schema::CustomCheck;
    use std::sync::Arc;

    fn table(columns: Vec<(&str, Series)>) -> DataFrame {
        DataFrame::from_columns(columns).unwrap()
    }

    fn custom(
        name: &str,
        f: impl Fn(&CheckContext, &Series) -> Result<CheckOutcome, CheckFnError>
            + Send
            + Sync
            + 'static,
    ) -> SchemaCheck {
        SchemaCheck::Custom(CustomCheck {
            name: name.into(),
            model: "Schema".into(),
            func: Arc::new(f),
        })
    }

    fn failures_of(err: ValidationError) -> Vec<(String, String, usize)> {
        err.failures()
            .into_iter()
            .map(|e| (e.location.to_string(), e.check.clone(), e.failure_count()))
            .collect()
    }

    #[test]
    fn test_strict_rejects_unknown_columns() {
        let schema = DataFrameSchema::new()
            .column(ColumnSchema::new("a", DataType::Int64))
            .strict(true);
        let df = table(vec![("a", Series::from_values([1])), ("b", Series::from_values([2]))]);

        let err = schema.validate(df, true).unwrap_err();
        assert_eq!(failures_of(err), vec![("Column b".into(), "column_in_schema".into(), 1)]);
    }

    #[test]
    fn test_filter_drops_unknown_columns() {
        let schema = DataFrameSchema::new()
            .column(ColumnSchema::new("a", DataType::Int64))
            .strict(Strictness::Filter);
        let df = table(vec![("a", Series::from_values([1])), ("b", Series::from_values([2]))]);

        let validated = schema.validate(df, false).unwrap();
        assert_eq!(validated.column_count(), 1);
        assert!(validated.has_column(&"a".into()));
    }

    #[test]
    fn test_ordered_columns() {
        let schema = DataFrameSchema::new()
            .column(ColumnSchema::new("a", DataType::Int64))
            .column(ColumnSchema::new("b", DataType::Int64))
            .ordered(true);
        let df = table(vec![("b", Series::from_values([1])), ("a", Series::from_values([2]))]);

        let err = schema.validate(df, true).unwrap_err();
        assert_eq!(failures_of(err), vec![("Column a".into(), "column_ordered".into(), 1)]);
    }

    #[test]
    fn test_coercion_rewrites_column() {
        let schema = DataFrameSchema::new()
            .column(ColumnSchema::new("a", DataType::Int64))
            .coerce(true);
        let df = table(vec![("a", Series::from_values(["1", "2"]))]);

        let validated = schema.validate(df, false).unwrap();
        assert_eq!(validated.dtype(&"a".into()), Some(DataType::Int64));
    }

    #[test]
    fn test_coercion_failure_reports_values() {
        let schema = DataFrameSchema::new()
            .column(ColumnSchema::new("a", DataType::Int64))
            .coerce(true);
        let df = table(vec![("a", Series::from_values(["1", "x"]))]);

        let err = schema.validate(df, false).unwrap_err();
        let ValidationError::Schema(error) = err else {
            panic!("expected a single failure");
        };
        assert_eq!(error.check, "coerce_dtype('int64')");
        assert_eq!(error.failure_cases, vec![Value::from("x")]);
    }

    #[test]
    fn test_nullable_and_unique() {
        let mut column = ColumnSchema::new("a", DataType::Int64);
        column.unique = true;
        let schema = DataFrameSchema::new().column(column);
        let values = Series::from_values([Value::Int(1), Value::Null, Value::Int(1)]);
        let df = table(vec![("a", values)]);

        let err = schema.validate(df, true).unwrap_err();
        assert_eq!(
            failures_of(err),
            vec![
                ("Column a".into(), "not_nullable".into(), 1),
                ("Column a".into(), "field_uniqueness".into(), 1),
            ]
        );
    }

    #[test]
    fn test_regex_column_validates_every_match() {
        let schema = DataFrameSchema::new()
            .column(ColumnSchema::new("num_.*", DataType::Int64).regex(true));
        let df = table(vec![
            ("num_a", Series::from_values([1])),
            ("num_b", Series::from_values(["x"])),
            ("other", Series::from_values(["y"])),
        ]);

        let err = schema.validate(df, true).unwrap_err();
        assert_eq!(failures_of(err), vec![("Column num_b".into(), "dtype('int64')".into(), 1)]);
    }

    #[test]
    fn test_check_function_error_is_not_a_data_failure() {
        let check = custom("broken", |_, _| Err(CheckFnError::new("boom")));
        let schema = DataFrameSchema::new()
            .column(ColumnSchema::new("a", DataType::Int64).with_checks(vec![check]));
        let df = table(vec![("a", Series::from_values([1]))]);

        let err = schema.validate(df, true).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::CheckFunction { ref check, .. } if check == "broken"
        ));
    }

    #[test]
    fn test_wrong_length_result_is_check_function_error() {
        let check = custom("short", |_, _| Ok(CheckOutcome::Rows(vec![true])));
        let schema = DataFrameSchema::new()
            .column(ColumnSchema::new("a", DataType::Int64).with_checks(vec![check]));
        let df = table(vec![("a", Series::from_values([1, 2]))]);

        let err = schema.validate(df, false).unwrap_err();
        assert!(matches!(err, ValidationError::CheckFunction { .. }));
    }

    #[test]
    fn test_scalar_verdict_applies_to_every_row() {
        let check = custom("never", |_, _| Ok(CheckOutcome::Scalar(false)));
        let schema = DataFrameSchema::new()
            .column(ColumnSchema::new("a", DataType::Int64).with_checks(vec![check]));
        let df = table(vec![("a", Series::from_values([1, 2, 3]))]);

        let err = schema.validate(df, true).unwrap_err();
        assert_eq!(failures_of(err), vec![("Column a".into(), "never".into(), 3)]);
    }

    #[test]
    fn test_scalar_false_fails_all_null_column() {
        let check = custom("never", |_, _| Ok(CheckOutcome::Scalar(false)));
        let schema = DataFrameSchema::new().column(
            ColumnSchema::new("a", DataType::Int64)
                .nullable(true)
                .with_checks(vec![check]),
        );
        let df = table(vec![("a", Series::with_dtype(DataType::Int64, vec![Value::Null; 2]))]);

        let err = schema.validate(df, true).unwrap_err();
        let failures = err.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].check, "never");
        assert_eq!(failures[0].failure_cases, vec![Value::Bool(false)]);
    }

    #[test]
    fn test_coercion_rejects_float_outside_int_range() {
        let schema = DataFrameSchema::new()
            .column(ColumnSchema::new("a", DataType::Int64))
            .coerce(true);
        let df = table(vec![("a", Series::from_values([1e20]))]);

        let err = schema.validate(df, true).unwrap_err();
        assert_eq!(
            failures_of(err),
            vec![("Column a".into(), "coerce_dtype('int64')".into(), 1)]
        );
    }

    #[test]
    fn test_unique_large_integers_are_distinct() {
        let mut column = ColumnSchema::new("a", DataType::Int64);
        column.unique = true;
        let schema = DataFrameSchema::new().column(column);
        let df = table(vec![("a", Series::from_values([1_i64 << 53, (1_i64 << 53) + 1]))]);

        assert!(schema.validate(df, true).is_ok());
    }

    #[test]
    fn test_unordered_multiindex_matches_by_name() {
        let mut multi = MultiIndexSchema::new(vec![
            IndexSchema::new(DataType::Int64).named("b"),
            IndexSchema::new(DataType::Str).named("a"),
        ]);
        multi.ordered = false;
        let schema = DataFrameSchema::new().index(multi);
        let index = FrameIndex::multi(vec![
            Series::named("a", ["foo", "bar"]),
            Series::named("b", [0, 1]),
        ])
        .unwrap();

        assert!(schema.validate(DataFrame::from_index(index), false).is_ok());
    }

    #[test]
    fn test_multiindex_strict_rejects_extra_levels() {
        let schema = DataFrameSchema::new().index(
            MultiIndexSchema::new(vec![
                IndexSchema::new(DataType::Str),
                IndexSchema::new(DataType::Int64),
            ])
            .strict(true),
        );
        let index = FrameIndex::multi(vec![
            Series::from_values(["foo"]),
            Series::from_values([0]),
            Series::from_values([1.5]),
        ])
        .unwrap();

        let err = schema.validate(DataFrame::from_index(index), true).unwrap_err();
        assert_eq!(failures_of(err), vec![("Index <NA>".into(), "multiindex_strict".into(), 3)]);
    }
}
