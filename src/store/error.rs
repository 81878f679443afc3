//! Store Errors
//!
//! Error types for persistence operations.

/// Errors that can occur in an account store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected a write
    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    /// A row could not be mapped onto a domain record
    #[error("Invalid stored data: {0}")]
    Decode(String),

    /// The store is unreachable or refused the operation
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl StoreError {
    /// Name of the violated unique constraint, if this is one
    pub fn violated_constraint(&self) -> Option<&str> {
        match self {
            StoreError::UniqueViolation { constraint } => Some(constraint),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return StoreError::UniqueViolation {
                    constraint: db_err.constraint().unwrap_or_default().to_string(),
                };
            }
        }
        StoreError::Database(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violated_constraint() {
        let err = StoreError::UniqueViolation {
            constraint: "accounts_phone_number_key".to_string(),
        };
        assert_eq!(err.violated_constraint(), Some("accounts_phone_number_key"));
        assert_eq!(StoreError::Unavailable("down".into()).violated_constraint(), None);
    }

    #[test]
    fn test_row_not_found_is_database_error() {
        let err = StoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Database(_)));
    }
}
