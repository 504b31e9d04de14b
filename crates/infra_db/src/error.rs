//! Database error types
//!
//! Failures from SQLx are classified by PostgreSQL error code and then
//! translated into the `PortError` the domain sees.

use thiserror::Error;

use core_kernel::PortError;

/// Errors that can occur during database operations
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to establish a database connection
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Entity not found in database
    #[error("{entity} with id '{id}' not found")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation
    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Transaction error
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Migration error
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Settings could not be loaded
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Pool exhaustion - no available connections
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Generic SQL error
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Creates a not found error for a specific entity type and identifier
    ///
    /// ```rust
    /// use infra_db::DatabaseError;
    ///
    /// let error = DatabaseError::not_found("Customer", "CUS-123");
    /// assert!(error.to_string().contains("Customer"));
    /// ```
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        DatabaseError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    /// Checks if this error indicates a record was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatabaseError::NotFound { .. })
    }

    /// Checks if this error is a constraint violation
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            DatabaseError::DuplicateEntry(_)
                | DatabaseError::ForeignKeyViolation(_)
                | DatabaseError::ConstraintViolation(_)
        )
    }

    /// Checks if this error is a connection-related issue
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            DatabaseError::ConnectionFailed(_) | DatabaseError::PoolExhausted
        )
    }

    /// Classifies a failure to begin, commit or roll back a transaction
    ///
    /// Connection failures keep their own variant so callers can still tell
    /// a lost connection from a rejected transaction.
    pub fn transaction(stage: &str, error: sqlx::Error) -> Self {
        let classified = DatabaseError::from(&error);
        if classified.is_connection_error() {
            classified
        } else {
            DatabaseError::TransactionFailed(format!("{stage}: {error}"))
        }
    }

    /// Replaces a raw SQLx error by its classified variant
    fn classified(self) -> Self {
        match self {
            DatabaseError::SqlError(error) => DatabaseError::from(&error),
            other => other,
        }
    }
}

/// Converts SQLx errors to more specific DatabaseError variants
impl From<&sqlx::Error> for DatabaseError {
    fn from(error: &sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => DatabaseError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },
            sqlx::Error::PoolTimedOut => DatabaseError::PoolExhausted,
            sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
                DatabaseError::ConnectionFailed(error.to_string())
            }
            sqlx::Error::Database(db_err) => {
                // https://www.postgresql.org/docs/current/errcodes-appendix.html
                match db_err.code().as_deref() {
                    Some("23505") => DatabaseError::DuplicateEntry(db_err.message().to_string()),
                    Some("23503") => DatabaseError::ForeignKeyViolation(db_err.message().to_string()),
                    Some("23514") => DatabaseError::ConstraintViolation(db_err.message().to_string()),
                    _ => DatabaseError::QueryFailed(db_err.message().to_string()),
                }
            }
            _ => DatabaseError::QueryFailed(error.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DatabaseError {
    fn from(error: sqlx::migrate::MigrateError) -> Self {
        DatabaseError::MigrationFailed(error.to_string())
    }
}

impl From<config::ConfigError> for DatabaseError {
    fn from(error: config::ConfigError) -> Self {
        DatabaseError::Configuration(error.to_string())
    }
}

/// Translates database failures into the port error the domain handles
impl From<DatabaseError> for PortError {
    fn from(error: DatabaseError) -> Self {
        match error.classified() {
            DatabaseError::NotFound { entity, id } => PortError::not_found(entity, id),
            error @ (DatabaseError::DuplicateEntry(_)
            | DatabaseError::ForeignKeyViolation(_)
            | DatabaseError::ConstraintViolation(_)) => PortError::conflict(error.to_string()),
            error @ (DatabaseError::ConnectionFailed(_) | DatabaseError::PoolExhausted) => {
                PortError::connection(error.to_string())
            }
            error => PortError::internal(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_port_not_found() {
        let port: PortError = DatabaseError::not_found("CustomerGroup", "GRP-1").into();
        assert!(port.is_not_found());
    }

    #[test]
    fn test_pool_timeout_is_transient() {
        let port: PortError = DatabaseError::SqlError(sqlx::Error::PoolTimedOut).into();
        assert!(matches!(port, PortError::Connection { .. }));
        assert!(port.is_transient());
    }

    #[test]
    fn test_row_not_found_is_classified() {
        let error = DatabaseError::from(&sqlx::Error::RowNotFound);
        assert!(error.is_not_found());
        assert!(!error.is_constraint_violation());
    }

    #[test]
    fn test_transaction_failures_keep_connection_errors() {
        let rejected = DatabaseError::transaction("commit", sqlx::Error::Protocol("unexpected message".to_string()));
        assert!(matches!(rejected, DatabaseError::TransactionFailed(ref m) if m.starts_with("commit")));
        assert!(!rejected.is_connection_error());
        let port: PortError = rejected.into();
        assert!(matches!(port, PortError::Internal { .. }));

        let lost = DatabaseError::transaction("begin", sqlx::Error::PoolTimedOut);
        assert!(lost.is_connection_error());
        let port: PortError = lost.into();
        assert!(port.is_transient());
    }

    #[test]
    fn test_constraint_violations_become_conflicts() {
        let port: PortError = DatabaseError::DuplicateEntry("customers_name_key".to_string()).into();
        assert!(matches!(port, PortError::Conflict { .. }));
    }
}
