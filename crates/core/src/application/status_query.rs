// Live Status Query
//
// Read-only view of a job. `watch` streams snapshots to one observer until the record
// disappears or the observer goes away. The poll timer lives inside `watch`, so it is
// dropped on every return path.

use super::constants::{DEFAULT_POLL_INTERVAL, MIN_TIMER_PERIOD};
use super::emitter::{Observer, StreamPayload};
use crate::domain::JobRecord;
use crate::error::Result;
use crate::port::JobStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct QueryConfig {
    /// How often a watched job is re-read
    pub poll_interval: Duration,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Why a watch stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEnd {
    /// Unknown id, one empty final event sent
    NotFound,
    /// Record disappeared while watching, empty final event sent
    Finished,
    /// Observer went away, nothing more sent
    Disconnected,
    /// Store read failed, error final event sent
    Failed,
}

#[derive(Clone)]
pub struct StatusQuery {
    store: Arc<dyn JobStore>,
    config: QueryConfig,
}

impl StatusQuery {
    pub fn new(store: Arc<dyn JobStore>, config: QueryConfig) -> Self {
        Self { store, config }
    }

    /// Current record, `None` if unknown or expired
    pub async fn get(&self, job_id: &str) -> Result<Option<JobRecord>> {
        self.store.get(job_id).await
    }

    /// Stream a job's snapshots to `observer`
    pub async fn watch(&self, job_id: &str, mut observer: Observer) -> WatchEnd {
        observer.bind(job_id);

        match self.store.get(job_id).await {
            Ok(Some(job)) => {
                if !observer.push_update(&StreamPayload::from(job)) {
                    return WatchEnd::Disconnected;
                }
            }
            Ok(None) => {
                debug!(job_id, "Watch requested for unknown job");
                observer.push_final(&StreamPayload::empty());
                return WatchEnd::NotFound;
            }
            Err(e) => {
                warn!(job_id, error = %e, "Status query failed");
                observer.push_final(&StreamPayload::error(e.to_string()));
                return WatchEnd::Failed;
            }
        }

        let period = self.config.poll_interval.max(MIN_TIMER_PERIOD);
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = observer.closed() => {
                    debug!(job_id, "Watcher disconnected, polling stopped");
                    return WatchEnd::Disconnected;
                }
                _ = ticker.tick() => {}
            }

            match self.store.get(job_id).await {
                Ok(Some(job)) => {
                    if !observer.push_update(&StreamPayload::from(job)) {
                        return WatchEnd::Disconnected;
                    }
                }
                Ok(None) => {
                    debug!(job_id, "Watched job is gone, closing stream");
                    observer.push_final(&StreamPayload::empty());
                    return WatchEnd::Finished;
                }
                Err(e) => {
                    warn!(job_id, error = %e, "Status poll failed");
                    observer.push_final(&StreamPayload::error(e.to_string()));
                    return WatchEnd::Failed;
                }
            }
        }
    }
}
