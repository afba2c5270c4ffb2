// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Item {index} not found in job {job_id}")]
    ItemNotFound { job_id: String, index: usize },

    #[error("Metadata key '{0}' collides with a job record field")]
    ReservedMetadataKey(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
