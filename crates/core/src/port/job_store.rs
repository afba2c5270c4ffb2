// Transient Job Store Port

use crate::domain::JobRecord;
use crate::error::Result;
use async_trait::async_trait;

/// Key-value store holding job records while they are active.
///
/// Contract:
/// - `set` inserts or replaces the whole record (last write wins)
/// - `get` returns `None` for unknown or expired ids
/// - `delete` removes eagerly; deleting an unknown id is not an error
///
/// Implementations expire entries on their own after a fixed TTL.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn get(&self, job_id: &str) -> Result<Option<JobRecord>>;

    async fn set(&self, job_id: &str, record: JobRecord) -> Result<()>;

    async fn delete(&self, job_id: &str) -> Result<()>;
}

/// Housekeeping side of a store, driven by `ExpirySweeper`
#[async_trait]
pub trait StoreMaintenance: Send + Sync {
    /// Drop expired entries, returning how many were removed
    async fn purge_expired(&self) -> Result<usize>;

    /// Number of live (possibly not yet purged) entries
    async fn entry_count(&self) -> Result<usize>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// HashMap store without expiry, with switches for failure injection
    #[derive(Default)]
    pub struct MockJobStore {
        records: Mutex<HashMap<String, JobRecord>>,
        fail_reads: AtomicBool,
        fail_writes: AtomicBool,
        writes: AtomicUsize,
    }

    impl MockJobStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_fail_reads(&self, fail: bool) {
            self.fail_reads.store(fail, Ordering::SeqCst);
        }

        pub fn set_fail_writes(&self, fail: bool) {
            self.fail_writes.store(fail, Ordering::SeqCst);
        }

        /// Number of successful `set` calls
        pub fn write_count(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }

        pub fn contains(&self, job_id: &str) -> bool {
            self.records.lock().unwrap().contains_key(job_id)
        }

        /// Drop a record behind the owner's back (simulates TTL expiry)
        pub fn evict(&self, job_id: &str) {
            self.records.lock().unwrap().remove(job_id);
        }
    }

    #[async_trait]
    impl JobStore for MockJobStore {
        async fn get(&self, job_id: &str) -> Result<Option<JobRecord>> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(AppError::Store("mock read failure".to_string()));
            }
            Ok(self.records.lock().unwrap().get(job_id).cloned())
        }

        async fn set(&self, job_id: &str, record: JobRecord) -> Result<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(AppError::Store("mock write failure".to_string()));
            }
            self.records
                .lock()
                .unwrap()
                .insert(job_id.to_string(), record);
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn delete(&self, job_id: &str) -> Result<()> {
            self.records.lock().unwrap().remove(job_id);
            Ok(())
        }
    }
}
