// Port Layer - Interfaces for external collaborators

pub mod hooks;
pub mod id_provider; // For deterministic testing
pub mod item_processor;
pub mod job_store;
pub mod time_provider;

// Re-exports
pub use hooks::{JobHooks, JobOutcome, NoopHooks};
pub use id_provider::IdProvider;
pub use item_processor::{ItemContext, ItemError, ItemProcessor};
pub use job_store::{JobStore, StoreMaintenance};
pub use time_provider::TimeProvider;
