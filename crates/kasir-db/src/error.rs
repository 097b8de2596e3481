//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ServiceError (service module) ← CoreError | DbError                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError (kasir-core envelope) ← kind + cashier-safe message          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use kasir_core::{ApiError, ErrorKind};
use thiserror::Error;
use tracing::error;

/// Database operation errors.
///
/// These errors wrap sqlx errors and provide additional context
/// for debugging and user feedback.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - `fetch_one` returns no rows
    /// - ID doesn't exist
    /// - Soft-deleted record
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Duplicate transaction code (a sequence bug, never expected)
    /// - Second live cart for the same user (lost a race)
    /// - Any other UNIQUE index violation
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Line item referencing a product id that does not exist
    /// - Transaction referencing a user id that does not exist
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// CHECK constraint violation (e.g. `stock >= 0`).
    ///
    /// The services guard every such column before writing, so reaching
    /// this is a bug rather than bad input.
    #[error("Check constraint violation: {message}")]
    CheckViolation { message: String },

    /// The write lock could not be obtained within `busy_timeout`.
    ///
    /// ## When This Occurs
    /// - Many concurrent checkouts against one database file
    /// - A long-running writer holding the lock
    ///
    /// The whole operation rolled back; the caller may retry it.
    #[error("Database is busy: {0}")]
    Busy(String),

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file doesn't exist and can't be created
    /// - File permissions issue
    /// - Disk full
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Transaction begin/commit failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Classifies this error for the response envelope.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DbError::NotFound { .. } => ErrorKind::NotFound,
            DbError::UniqueViolation { .. } => ErrorKind::Conflict,
            DbError::ForeignKeyViolation { .. } => ErrorKind::BadRequest,
            DbError::CheckViolation { .. }
            | DbError::Busy(_)
            | DbError::ConnectionFailed(_)
            | DbError::MigrationFailed(_)
            | DbError::QueryFailed(_)
            | DbError::TransactionFailed(_)
            | DbError::PoolExhausted
            | DbError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// True when the failed operation can be retried unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DbError::Busy(_) | DbError::PoolExhausted)
    }

    /// True for a UNIQUE violation on the given `table.column` list.
    pub fn is_unique_violation_on(&self, target: &str) -> bool {
        matches!(self, DbError::UniqueViolation { field, .. } if field == target)
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze code/message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();
                // SQLITE_BUSY = 5, SQLITE_LOCKED = 6 plus their extended codes
                let primary_code = db_err
                    .code()
                    .and_then(|c| c.parse::<i32>().ok())
                    .map(|c| c & 0xff);

                if matches!(primary_code, Some(5) | Some(6)) || msg.contains("database is locked") {
                    DbError::Busy(msg.to_string())
                } else if let Some(target) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    // "UNIQUE constraint failed: transactions.user_id"
                    DbError::UniqueViolation {
                        field: target.to_string(),
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else if msg.contains("CHECK constraint failed") {
                    DbError::CheckViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Converts database errors to envelope errors.
///
/// Internal failures are logged here with full detail and reach the caller
/// only as a generic message.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => {
                ApiError::not_found(format!("{} not found: {}", entity, id))
            }
            DbError::UniqueViolation { field, .. } => {
                ApiError::conflict(format!("Conflicting write on {}, please retry", field))
            }
            DbError::ForeignKeyViolation { message } => {
                error!(%message, "Foreign key violation");
                ApiError::bad_request("Invalid reference")
            }
            DbError::Busy(message) => {
                error!(%message, "Database busy, operation rolled back");
                ApiError::internal("Database is busy, please retry")
            }
            other => {
                error!(error = %other, "Database operation failed");
                ApiError::internal("Database operation failed")
            }
        }
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(DbError::not_found("Product", "p-1").kind(), ErrorKind::NotFound);
        assert_eq!(
            DbError::duplicate("transactions.user_id", "u-1").kind(),
            ErrorKind::Conflict
        );
        assert_eq!(DbError::Busy("locked".into()).kind(), ErrorKind::Internal);
        assert!(DbError::Busy("locked".into()).is_retryable());
        assert!(!DbError::QueryFailed("syntax".into()).is_retryable());
    }

    #[test]
    fn test_internal_errors_get_generic_message() {
        let api: ApiError = DbError::QueryFailed("no such column: foo".into()).into();
        assert_eq!(api.kind, ErrorKind::Internal);
        assert_eq!(api.message, "Database operation failed");
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[test]
    fn test_unique_target_match() {
        let err = DbError::duplicate("transactions.user_id", "unknown");
        assert!(err.is_unique_violation_on("transactions.user_id"));
        assert!(!err.is_unique_violation_on("transactions.code"));
    }
}
