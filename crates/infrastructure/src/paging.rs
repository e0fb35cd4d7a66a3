//! Conversion of page bounds into SQL `BIGINT` parameters.

use herbarium_core::{AppError, AppResult};

/// Converts a `LIMIT`/`OFFSET` value, rejecting values Postgres cannot hold.
pub(crate) fn bigint(value: usize, name: &str) -> AppResult<i64> {
    i64::try_from(value).map_err(|_| AppError::Validation(format!("{name} {value} is out of range")))
}
