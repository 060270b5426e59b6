//! Failure collection for fail-fast and lazy runs.

use log::debug;

use crate::error::{SchemaError, SchemaErrors, ValidationError};
use crate::frame::DataFrame;

/// Collects failures; in fail-fast mode the first one aborts the run.
#[derive(Debug)]
pub(crate) struct FailureCollector {
    lazy: bool,
    errors: Vec<SchemaError>,
}

impl FailureCollector {
    pub(crate) fn new(lazy: bool) -> Self {
        Self {
            lazy,
            errors: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, error: SchemaError) -> Result<(), ValidationError> {
        if !self.lazy {
            return Err(ValidationError::Schema(error));
        }
        debug!(
            "Collected failure: {} {} ({} cases)",
            error.location,
            error.check,
            error.failure_count()
        );
        self.errors.push(error);
        Ok(())
    }

    pub(crate) fn finish(
        self,
        schema: Option<String>,
        df: DataFrame,
    ) -> Result<DataFrame, ValidationError> {
        if self.errors.is_empty() {
            Ok(df)
        } else {
            Err(ValidationError::Errors(SchemaErrors {
                schema,
                errors: self.errors,
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Location;

    fn failure() -> SchemaError {
        SchemaError::new(Location::Column("a".into()), "check", Vec::new(), "failed")
    }

    #[test]
    fn test_fail_fast_returns_first() {
        let mut collector = FailureCollector::new(false);
        let err = collector.record(failure()).unwrap_err();
        assert!(matches!(err, ValidationError::Schema(_)));
    }

    #[test]
    fn test_lazy_collects_all() {
        let mut collector = FailureCollector::new(true);
        collector.record(failure()).unwrap();
        collector.record(failure()).unwrap();

        let err = collector.finish(None, DataFrame::new()).unwrap_err();
        let ValidationError::Errors(errors) = err else {
            panic!("expected aggregate errors");
        };
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_no_failures_returns_table() {
        let collector = FailureCollector::new(true);
        assert!(collector.finish(None, DataFrame::new()).is_ok());
    }
}
