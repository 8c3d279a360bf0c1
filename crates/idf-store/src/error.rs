//! Error types for the storage layer
//!
//! Constraint violations are classified so handlers can turn them into field
//! errors; everything else is an infrastructure failure.

/// Storage result alias
pub type Result<T, E = StoreError> = std::result::Result<T, E>;

/// Main storage error type
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Driver or connection failure
    #[error("database error: {0}")]
    Sqlx(sqlx::Error),

    /// A unique constraint rejected the write
    #[error("unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    /// A referenced row does not exist
    #[error("foreign key constraint violated: {constraint}")]
    ForeignKeyViolation { constraint: String },

    /// A row expected by a write vanished underneath it
    #[error("row not found: {0}")]
    NotFound(String),

    /// A dynamic table name could not be quoted
    #[error("invalid identifier: '{0}'")]
    InvalidIdentifier(String),

    /// A dynamic row lacked a typed column
    #[error("malformed row: {0}")]
    MalformedRow(String),

    /// Schema migration failed
    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    /// Constraint violations are caused by the request, not the store
    #[inline]
    #[must_use]
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            Self::UniqueViolation { .. } | Self::ForeignKeyViolation { .. }
        )
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db) = err.as_database_error() {
            let constraint = db.constraint().unwrap_or_default().to_string();
            if db.is_unique_violation() {
                return Self::UniqueViolation { constraint };
            }
            if db.is_foreign_key_violation() {
                return Self::ForeignKeyViolation { constraint };
            }
        }
        Self::Sqlx(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_constraint_violations() {
        let unique = StoreError::UniqueViolation {
            constraint: "workspace_owner_name_unique".to_string(),
        };
        assert!(unique.is_constraint_violation());
        assert!(unique.to_string().contains("workspace_owner_name_unique"));

        assert!(!StoreError::NotFound("workspace 1".to_string()).is_constraint_violation());
    }

    #[test]
    fn driver_errors_stay_infrastructure() {
        let err = StoreError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, StoreError::Sqlx(_)));
        assert!(!err.is_constraint_violation());
    }
}
