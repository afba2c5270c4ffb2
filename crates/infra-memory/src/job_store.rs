// In-memory JobStore with per-entry expiry

use crate::config::StoreConfig;
use async_trait::async_trait;
use batchline_core::domain::JobRecord;
use batchline_core::error::{AppError, Result};
use batchline_core::port::JobStore;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::time::Instant;
use tracing::debug;

pub(crate) struct Entry {
    pub record: JobRecord,
    pub expires_at: Instant,
}

/// Transient key-value store for active job records.
///
/// Each `set` replaces the whole record and restarts its TTL. Expired entries are
/// invisible to `get` right away and physically removed by `purge_expired`.
pub struct MemoryJobStore {
    pub(crate) entries: RwLock<HashMap<String, Entry>>,
    pub(crate) config: StoreConfig,
}

impl MemoryJobStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub(crate) fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, Entry>>> {
        self.entries
            .read()
            .map_err(|_| AppError::Store("job store lock poisoned".to_string()))
    }

    pub(crate) fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, Entry>>> {
        self.entries
            .write()
            .map_err(|_| AppError::Store("job store lock poisoned".to_string()))
    }
}

impl Default for MemoryJobStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn get(&self, job_id: &str) -> Result<Option<JobRecord>> {
        let now = Instant::now();
        let entries = self.read()?;
        Ok(entries
            .get(job_id)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.record.clone()))
    }

    async fn set(&self, job_id: &str, record: JobRecord) -> Result<()> {
        let expires_at = Instant::now() + self.config.ttl;
        self.write()?
            .insert(job_id.to_string(), Entry { record, expires_at });
        Ok(())
    }

    async fn delete(&self, job_id: &str) -> Result<()> {
        if self.write()?.remove(job_id).is_some() {
            debug!(job_id, "Job record deleted");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use batchline_core::domain::{JobMetadata, JobStatus};
    use std::time::Duration;

    fn record(job_id: &str) -> JobRecord {
        JobRecord::new(job_id, vec!["item-1".to_string()], 0, JobMetadata::default())
    }

    fn ten_minute_ttl() -> MemoryJobStore {
        MemoryJobStore::new(StoreConfig {
            ttl: Duration::from_secs(600),
            sweep_interval: Duration::from_secs(60),
        })
    }

    #[tokio::test]
    async fn test_set_get_delete() {
        let store = MemoryJobStore::default();
        store.set("job-1", record("job-1")).await.unwrap();

        let loaded = store.get("job-1").await.unwrap().unwrap();
        assert_eq!(loaded.job_id, "job-1");

        store.delete("job-1").await.unwrap();
        assert!(store.get("job-1").await.unwrap().is_none());

        // Deleting twice is fine
        tokio_test::assert_ok!(store.delete("job-1").await);
    }

    #[test]
    fn test_unknown_id_reads_none() {
        let store = MemoryJobStore::default();
        let loaded = tokio_test::block_on(store.get("never-set"));
        assert!(tokio_test::assert_ok!(loaded).is_none());
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let store = MemoryJobStore::default();
        store.set("job-1", record("job-1")).await.unwrap();

        let mut updated = record("job-1");
        updated.finalize(500, JobStatus::Completed).unwrap();
        store.set("job-1", updated).await.unwrap();

        let loaded = store.get("job-1").await.unwrap().unwrap();
        assert_eq!(loaded.status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn test_returned_record_is_a_copy() {
        let store = MemoryJobStore::default();
        store.set("job-1", record("job-1")).await.unwrap();

        let mut copy = store.get("job-1").await.unwrap().unwrap();
        copy.finalize(10, JobStatus::Failed).unwrap();

        let stored = store.get("job-1").await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Processing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let store = ten_minute_ttl();
        store.set("job-1", record("job-1")).await.unwrap();

        tokio::time::advance(Duration::from_secs(599)).await;
        assert!(store.get("job-1").await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(store.get("job-1").await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_restarts_ttl() {
        let store = ten_minute_ttl();
        store.set("job-1", record("job-1")).await.unwrap();

        tokio::time::advance(Duration::from_secs(500)).await;
        store.set("job-1", record("job-1")).await.unwrap();

        tokio::time::advance(Duration::from_secs(500)).await;
        assert!(store.get("job-1").await.unwrap().is_some());
    }
}
