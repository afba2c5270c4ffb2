// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// True for errors caused by caller input rather than the engine
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AppError::Domain(crate::domain::DomainError::ReservedMetadataKey(_))
                | AppError::Domain(crate::domain::DomainError::ValidationError(_))
        )
    }
}
