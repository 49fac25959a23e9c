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
//! │  ServiceError → ApiError ← NotFound stays visible, the rest is         │
//! │                            reported as a generic internal failure      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - Editing an expenditure identifier that does not exist
    /// - Deleting a session or expenditure twice
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Adding the same member to a session twice
    /// - Reusing a session identifier
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Writing an expenditure for a session that was deleted meanwhile
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed, including CHECK constraints and trigger aborts.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Begin or commit failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

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

    /// Wraps a failure to begin or commit a transaction.
    pub fn transaction(err: sqlx::Error) -> Self {
        DbError::TransactionFailed(err.to_string())
    }

    /// Returns true for `NotFound`.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::NotFound { .. })
    }
}

/// Sorts sqlx failures into the cases the repositories report.
///
/// ```text
/// RowNotFound                      → NotFound
/// "UNIQUE constraint failed: t.c"  → UniqueViolation { field: "t.c" }
/// "FOREIGN KEY constraint failed"  → ForeignKeyViolation
/// other database message           → QueryFailed (CHECK, trigger abort, ...)
/// PoolClosed / PoolTimedOut        → ConnectionFailed
/// anything else                    → Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),
            sqlx::Error::Database(db_err) => classify_constraint(db_err.message()),
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("store is closed".to_string()),
            sqlx::Error::PoolTimedOut => {
                DbError::ConnectionFailed("timed out waiting for a connection".to_string())
            }
            other => DbError::Internal(other.to_string()),
        }
    }
}

fn classify_constraint(message: &str) -> DbError {
    if let Some(field) = message.strip_prefix("UNIQUE constraint failed: ") {
        DbError::UniqueViolation {
            field: field.to_string(),
            value: "unknown".to_string(),
        }
    } else if message.starts_with("FOREIGN KEY constraint failed") {
        DbError::ForeignKeyViolation {
            message: message.to_string(),
        }
    } else {
        DbError::QueryFailed(message.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = DbError::not_found("Expenditure", "e-1");
        assert_eq!(err.to_string(), "Expenditure not found: e-1");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_pool_failures_are_connection_failures() {
        let err: DbError = sqlx::Error::PoolClosed.into();
        assert!(matches!(err, DbError::ConnectionFailed(_)));

        let err: DbError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, DbError::ConnectionFailed(_)));
    }

    #[test]
    fn test_constraint_messages_classified() {
        assert!(matches!(
            classify_constraint("UNIQUE constraint failed: session_members.session_id, session_members.member_id"),
            DbError::UniqueViolation { ref field, .. } if field.starts_with("session_members.session_id")
        ));
        assert!(matches!(
            classify_constraint("FOREIGN KEY constraint failed"),
            DbError::ForeignKeyViolation { .. }
        ));
        assert!(matches!(
            classify_constraint("injected failure"),
            DbError::QueryFailed(ref m) if m == "injected failure"
        ));
    }
}
