// Expiry Sweeper
// Periodically drops expired records from the transient store

use crate::application::constants::MIN_TIMER_PERIOD;
use crate::application::shutdown::ShutdownToken;
use crate::error::Result;
use crate::port::StoreMaintenance;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{debug, error, info};

/// Expiry sweeper
///
/// Runs `purge_expired` on a fixed interval until shutdown
pub struct ExpirySweeper {
    maintenance: Arc<dyn StoreMaintenance>,
    interval: Duration,
}

impl ExpirySweeper {
    /// Create a new sweeper
    ///
    /// # Arguments
    /// * `maintenance` - Store housekeeping implementation
    /// * `interval` - How often to sweep
    pub fn new(maintenance: Arc<dyn StoreMaintenance>, interval: Duration) -> Self {
        Self {
            maintenance,
            interval,
        }
    }

    /// Run sweep loop (background task)
    ///
    /// Should be spawned in tokio::spawn
    pub async fn run(self, mut shutdown: ShutdownToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Expiry sweeper started"
        );

        let mut tick = interval(self.interval.max(MIN_TIMER_PERIOD));

        loop {
            tokio::select! {
                _ = shutdown.wait() => {
                    info!("Expiry sweeper stopped");
                    break;
                }
                _ = tick.tick() => {
                    if let Err(e) = self.run_now().await {
                        error!(error = ?e, "Scheduled expiry sweep failed");
                    }
                }
            }
        }
    }

    /// Sweep immediately, returning the number of purged records
    pub async fn run_now(&self) -> Result<usize> {
        let purged = self.maintenance.purge_expired().await?;

        if purged > 0 {
            let remaining = self.maintenance.entry_count().await?;
            info!(purged, remaining, "Expired job records purged");
        } else {
            debug!("Expiry sweep found nothing to purge");
        }

        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::shutdown::shutdown_channel;
    use crate::error::AppError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingMaintenance {
        sweeps: AtomicUsize,
        fail: AtomicBool,
    }

    #[async_trait]
    impl StoreMaintenance for CountingMaintenance {
        async fn purge_expired(&self) -> Result<usize> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(AppError::Store("sweep failure".to_string()));
            }
            self.sweeps.fetch_add(1, Ordering::SeqCst);
            Ok(2)
        }

        async fn entry_count(&self) -> Result<usize> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn test_run_now_reports_purged() {
        let maintenance = Arc::new(CountingMaintenance::default());
        let sweeper = ExpirySweeper::new(maintenance.clone(), Duration::from_secs(60));

        assert_eq!(sweeper.run_now().await.unwrap(), 2);
        assert_eq!(maintenance.sweeps.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_run_now_propagates_failure() {
        let maintenance = Arc::new(CountingMaintenance::default());
        maintenance.fail.store(true, Ordering::SeqCst);
        let sweeper = ExpirySweeper::new(maintenance, Duration::from_secs(60));

        assert!(sweeper.run_now().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_sweeps_until_shutdown() {
        let maintenance = Arc::new(CountingMaintenance::default());
        let sweeper = ExpirySweeper::new(maintenance.clone(), Duration::from_secs(60));
        let (sender, token) = shutdown_channel();

        let task = tokio::spawn(sweeper.run(token));

        // First tick fires immediately, then every 60s
        tokio::time::sleep(Duration::from_secs(125)).await;
        assert_eq!(maintenance.sweeps.load(Ordering::SeqCst), 3);

        sender.shutdown();
        task.await.unwrap();

        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(maintenance.sweeps.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_does_not_panic() {
        let maintenance = Arc::new(CountingMaintenance::default());
        let sweeper = ExpirySweeper::new(maintenance.clone(), Duration::ZERO);
        let (sender, token) = shutdown_channel();

        let task = tokio::spawn(sweeper.run(token));
        tokio::time::sleep(Duration::from_millis(10)).await;

        sender.shutdown();
        task.await.unwrap();
        assert!(maintenance.sweeps.load(Ordering::SeqCst) >= 2);
    }
}
