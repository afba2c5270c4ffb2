// Batchline Infrastructure - In-Memory Adapter
// Implements: JobStore, StoreMaintenance

mod config;
mod job_store;
mod maintenance_impl;

pub use config::StoreConfig;
pub use job_store::MemoryJobStore;
