//! Mapping of storage errors onto `LedgerError`.

use cuentas_core::LedgerError;
use sea_orm::{DbErr, RuntimeErr};

/// Postgres `lock_not_available`, raised when `lock_timeout` expires.
const LOCK_NOT_AVAILABLE: &str = "55P03";
/// Postgres `deadlock_detected`.
const DEADLOCK_DETECTED: &str = "40P01";
/// Postgres `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// Returns the SQLSTATE and constraint name of a database error, if any.
fn database_error(err: &DbErr) -> Option<(String, Option<String>)> {
    let runtime = match err {
        DbErr::Query(runtime) | DbErr::Exec(runtime) | DbErr::Conn(runtime) => runtime,
        _ => return None,
    };
    match runtime {
        RuntimeErr::SqlxError(sqlx::Error::Database(db)) => Some((
            db.code().map(|c| c.into_owned()).unwrap_or_default(),
            db.constraint().map(str::to_owned),
        )),
        _ => None,
    }
}

/// Returns true if `err` is a unique violation on `constraint`.
pub(crate) fn is_unique_violation(err: &DbErr, constraint: &str) -> bool {
    matches!(
        database_error(err),
        Some((code, Some(name))) if code == UNIQUE_VIOLATION && name == constraint
    )
}

/// Converts a storage error, surfacing lock waits as retryable `Busy`.
pub(crate) fn db_err(err: DbErr) -> LedgerError {
    match database_error(&err) {
        Some((code, _)) if code == LOCK_NOT_AVAILABLE || code == DEADLOCK_DETECTED => {
            tracing::warn!(sqlstate = %code, "row lock wait exhausted");
            LedgerError::Busy("another operation holds the lock, retry shortly".to_string())
        }
        _ => {
            tracing::error!(error = %err, "database error");
            LedgerError::Database(err.to_string())
        }
    }
}

/// Shorthand for mapping `DbErr` results.
pub(crate) trait DbResultExt<T> {
    /// Maps the error through [`db_err`].
    fn map_db(self) -> Result<T, LedgerError>;
}

impl<T> DbResultExt<T> for Result<T, DbErr> {
    fn map_db(self) -> Result<T, LedgerError> {
        self.map_err(db_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_errors_map_to_database() {
        let err = db_err(DbErr::Custom("boom".into()));
        assert!(matches!(err, LedgerError::Database(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_record_not_found_is_not_a_unique_violation() {
        assert!(!is_unique_violation(
            &DbErr::RecordNotFound("x".into()),
            "uq_ledger_sale_debt"
        ));
    }
}
