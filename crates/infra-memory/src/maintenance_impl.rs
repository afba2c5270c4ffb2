// In-memory store housekeeping
use crate::job_store::MemoryJobStore;
use async_trait::async_trait;
use batchline_core::error::Result;
use batchline_core::port::StoreMaintenance;
use tokio::time::Instant;
use tracing::debug;

#[async_trait]
impl StoreMaintenance for MemoryJobStore {
    async fn purge_expired(&self) -> Result<usize> {
        let now = Instant::now();
        let mut entries = self.write()?;
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        let purged = before - entries.len();

        if purged > 0 {
            debug!(purged, ttl_secs = self.config.ttl.as_secs(), "Expired entries removed");
        }
        Ok(purged)
    }

    async fn entry_count(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StoreConfig;
    use batchline_core::application::{shutdown_channel, ExpirySweeper};
    use batchline_core::domain::{JobMetadata, JobRecord};
    use batchline_core::port::JobStore;
    use std::sync::Arc;
    use std::time::Duration;

    fn record(job_id: &str) -> JobRecord {
        JobRecord::new(job_id, Vec::new(), 0, JobMetadata::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_removes_only_expired() {
        let store = MemoryJobStore::default();
        store.set("old", record("old")).await.unwrap();
        tokio::time::advance(Duration::from_secs(400)).await;
        store.set("fresh", record("fresh")).await.unwrap();
        tokio::time::advance(Duration::from_secs(300)).await;

        assert_eq!(store.entry_count().await.unwrap(), 2);
        assert_eq!(store.purge_expired().await.unwrap(), 1);
        assert_eq!(store.entry_count().await.unwrap(), 1);
        assert!(store.get("fresh").await.unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_drives_purge() {
        let store = Arc::new(MemoryJobStore::new(StoreConfig {
            ttl: Duration::from_secs(120),
            sweep_interval: Duration::from_secs(60),
        }));
        store.set("orphan", record("orphan")).await.unwrap();

        let (sender, token) = shutdown_channel();
        let sweeper = ExpirySweeper::new(store.clone(), store.config().sweep_interval);
        let task = tokio::spawn(sweeper.run(token));

        tokio::time::sleep(Duration::from_secs(190)).await;
        assert_eq!(store.entry_count().await.unwrap(), 0);

        sender.shutdown();
        task.await.unwrap();
    }
}
