//! Service-layer error types.

use thiserror::Error;

use crate::db::RepositoryError;
use crate::models::ValidationError;

/// Errors returned by the customer services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Input rejected before any state change.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The owner has no such item.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A uniqueness backstop fired.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Storage failed; nothing was committed.
    #[error("storage error: {0}")]
    Repository(RepositoryError),

    /// The operation did not finish in time; nothing was committed.
    #[error("operation timed out")]
    Timeout,
}

impl From<RepositoryError> for ServiceError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => Self::NotFound("item"),
            RepositoryError::Conflict(what) => Self::Conflict(what),
            other => Self::Repository(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_errors_are_classified() {
        assert!(matches!(
            ServiceError::from(RepositoryError::NotFound),
            ServiceError::NotFound(_)
        ));
        assert!(matches!(
            ServiceError::from(RepositoryError::Conflict("addresses".to_owned())),
            ServiceError::Conflict(_)
        ));
        assert!(matches!(
            ServiceError::from(RepositoryError::DataCorruption("bad".to_owned())),
            ServiceError::Repository(_)
        ));
    }
}
