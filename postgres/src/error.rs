//! Translation of driver errors into [`InventoryError`].
//!
//! Driver text never leaves this crate inside a domain error: connectivity
//! and unexpected failures are logged here and classified.

use boxoffice_core::InventoryError;
use std::fmt;

/// `lock_not_available`, raised when `lock_timeout` expires.
const LOCK_NOT_AVAILABLE: &str = "55P03";
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";
const UNIQUE_VIOLATION: &str = "23505";
const TOO_MANY_CONNECTIONS: &str = "53300";
const ADMIN_SHUTDOWN: &str = "57P01";

/// Classify a driver error raised while working on `target`.
pub(crate) fn map_sqlx_error(err: sqlx::Error, target: impl fmt::Display) -> InventoryError {
    match &err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => {
            tracing::warn!(%target, error = %err, "Database unreachable");
            InventoryError::Unavailable(format!("database unreachable while accessing {target}"))
        },
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            Some(LOCK_NOT_AVAILABLE) => InventoryError::Timeout(target.to_string()),
            Some(SERIALIZATION_FAILURE | DEADLOCK_DETECTED) => {
                InventoryError::Conflict(format!("concurrent update of {target}"))
            },
            Some(UNIQUE_VIOLATION) => InventoryError::Conflict(format!("{target} already exists")),
            Some(code)
                if code.starts_with("08") || code == TOO_MANY_CONNECTIONS || code == ADMIN_SHUTDOWN =>
            {
                tracing::warn!(%target, code, error = %err, "Database connection failure");
                InventoryError::Unavailable(format!("database connection lost while accessing {target}"))
            },
            code => {
                tracing::error!(%target, code = ?code, error = %err, "Unexpected database error");
                InventoryError::Database(format!("statement on {target} failed"))
            },
        },
        _ => {
            tracing::error!(%target, error = %err, "Unexpected database error");
            InventoryError::Database(format!("statement on {target} failed"))
        },
    }
}

/// Error for a stored value that does not fit the domain type.
pub(crate) fn corrupt_row(what: &str, err: impl fmt::Display) -> InventoryError {
    tracing::error!(column = what, error = %err, "Stored value is out of range");
    InventoryError::Database(format!("stored {what} is invalid"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;

    #[test]
    fn pool_exhaustion_is_retryable() {
        let err = map_sqlx_error(sqlx::Error::PoolTimedOut, "ticket");
        assert!(matches!(err, InventoryError::Unavailable(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn missing_rows_are_not_leaked_as_driver_text() {
        let err = map_sqlx_error(sqlx::Error::RowNotFound, "ticket");
        assert_eq!(err, InventoryError::Database("statement on ticket failed".to_string()));
    }
}
