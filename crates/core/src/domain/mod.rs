// Domain Layer - Job and item records, pure state transitions

pub mod error;
pub mod job;
pub mod metadata;

// Re-exports
pub use error::DomainError;
pub use job::{format_duration_minutes, ItemId, ItemRecord, JobId, JobRecord, JobStatus};
pub use metadata::{JobMetadata, RESERVED_KEYS};
