//! Error taxonomy shared by the domain operations, the stores and the HTTP layer.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Debug, Error)]
pub enum DomainError {
    /// A referenced entity does not exist.
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    /// Malformed or duplicate input, rejected before anything is written.
    #[error("validation error: {0}")]
    Validation(String),

    /// The request's role may not perform the operation.
    #[error("role '{role}' may not {operation}")]
    Forbidden {
        role: &'static str,
        operation: &'static str,
    },

    /// A freshly minted identifier collided on insert.
    #[error("identifier '{id}' was taken by a concurrent writer")]
    AllocationConflict { id: String },

    /// Transient infrastructure fault. Nothing was committed.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// A constraint rejected a write that validation should have caught.
    #[error("integrity violation: {0}")]
    IntegrityViolation(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        DomainError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Stable machine-readable code used in API responses.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::NotFound { .. } => "NOT_FOUND",
            DomainError::Validation(_) => "VALIDATION_ERROR",
            DomainError::Forbidden { .. } => "FORBIDDEN",
            DomainError::AllocationConflict { .. } => "ALLOCATION_CONFLICT",
            DomainError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            DomainError::IntegrityViolation(_) => "INTEGRITY_VIOLATION",
        }
    }

    /// True when the caller may retry the whole operation later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DomainError::StoreUnavailable(_) | DomainError::AllocationConflict { .. }
        )
    }
}

/// Classifies a database error by its SQLSTATE.
///
/// Class 22 (data exception: value too long, numeric overflow, ...) is bad
/// input and never succeeds on retry. Class 23 is an integrity constraint
/// violation. Everything else is treated as transient.
pub fn from_sqlstate(code: Option<&str>, message: &str) -> DomainError {
    match code.map(|c| c.get(..2).unwrap_or(c)) {
        Some("22") => DomainError::Validation(message.to_string()),
        Some("23") => DomainError::IntegrityViolation(message.to_string()),
        _ => DomainError::StoreUnavailable(message.to_string()),
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                from_sqlstate(db_err.code().as_deref(), db_err.message())
            }
            sqlx::Error::RowNotFound => DomainError::IntegrityViolation(
                "statement expected a row but none was returned".to_string(),
            ),
            sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::Decode(_)
            | sqlx::Error::TypeNotFound { .. } => DomainError::IntegrityViolation(err.to_string()),
            other => DomainError::StoreUnavailable(other.to_string()),
        }
    }
}
