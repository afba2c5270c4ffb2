// Job run: the sequential item loop and the single finalization

use super::panic_guard::{catch_panic, panic_message};
use super::EngineConfig;
use crate::application::constants::MIN_TIMER_PERIOD;
use crate::application::emitter::{Observer, StreamPayload};
use crate::domain::{JobId, JobRecord, JobStatus};
use crate::error::{AppError, Result};
use crate::port::{
    ItemContext, ItemError, ItemProcessor, JobHooks, JobOutcome, JobStore, TimeProvider,
};
use serde_json::Value;
use std::sync::Arc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

pub(super) struct JobRun {
    pub job_id: JobId,
    pub items: Vec<Value>,
    /// Last record this run wrote; used when the store copy is gone
    pub working: JobRecord,
    pub store: Arc<dyn JobStore>,
    pub time_provider: Arc<dyn TimeProvider>,
    pub processor: Arc<dyn ItemProcessor>,
    pub hooks: Arc<dyn JobHooks>,
    pub observer: Option<Observer>,
    pub config: EngineConfig,
    /// Set when setup already failed after the record was created
    pub setup_fault: Option<String>,
}

impl JobRun {
    pub async fn run(mut self) -> JobOutcome {
        let fault = match self.setup_fault.take() {
            Some(fault) => Some(fault),
            None => match self.process_items().await {
                Ok(()) => None,
                Err(e) => {
                    error!(job_id = %self.job_id, error = %e, "Job aborted by engine fault");
                    Some(e.to_string())
                }
            },
        };
        self.finish(fault).await
    }

    async fn process_items(&mut self) -> Result<()> {
        let items = std::mem::take(&mut self.items);
        for (index, item) in items.into_iter().enumerate() {
            self.process_item(index, item).await?;
        }
        Ok(())
    }

    async fn process_item(&mut self, index: usize, item: Value) -> Result<()> {
        let mut job = self.load().await?;

        job.item_mut(index)?
            .begin(self.time_provider.now_millis())?;
        self.persist(&job).await?;

        let result = self
            .invoke(ItemContext {
                item,
                index,
                job: job.clone(),
            })
            .await;

        let outcome = match &result {
            Ok(()) => JobStatus::Completed,
            Err(_) => JobStatus::Failed,
        };
        let settled = job.item_mut(index)?;
        settled.settle(self.time_provider.now_millis(), outcome)?;
        let duration_ms = settled.duration;
        self.persist(&job).await?;

        match &result {
            Ok(()) => debug!(job_id = %self.job_id, index, duration_ms, "Item completed"),
            Err(e) => warn!(job_id = %self.job_id, index, error = %e, "Item failed"),
        }

        self.push_update(&job);
        catch_panic(self.hooks.on_item_settled(result.as_ref().map(|_| &job)))
            .await
            .map_err(|msg| AppError::Internal(format!("on_item_settled hook panicked: {}", msg)))?;
        Ok(())
    }

    /// Run the processor on its own task so a panic only fails this item.
    ///
    /// While it runs, the working copy is re-stored every `record_refresh` so the
    /// store TTL only ever reclaims records of jobs nobody is driving.
    async fn invoke(&self, ctx: ItemContext) -> std::result::Result<(), ItemError> {
        let processor = Arc::clone(&self.processor);
        let mut task = tokio::spawn(async move { processor.process(ctx).await });

        let period = self.config.record_refresh.max(MIN_TIMER_PERIOD);
        let mut refresh = interval_at(Instant::now() + period, period);
        refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let joined = loop {
            tokio::select! {
                joined = &mut task => break joined,
                _ = refresh.tick() => {
                    if let Err(e) = self.store.set(&self.job_id, self.working.clone()).await {
                        warn!(job_id = %self.job_id, error = %e, "Failed to refresh running job record");
                    }
                }
            }
        };

        match joined {
            Ok(result) => result,
            Err(e) if e.is_panic() => {
                let msg = panic_message(e.into_panic());
                error!(job_id = %self.job_id, panic_msg = %msg, "Item processor panicked");
                Err(ItemError::Panicked(msg))
            }
            Err(e) => Err(ItemError::Failed(format!("item task cancelled: {}", e))),
        }
    }

    async fn finish(mut self, mut fault: Option<String>) -> JobOutcome {
        let mut job = match self.load().await {
            Ok(job) => job,
            Err(e) => {
                fault.get_or_insert_with(|| e.to_string());
                self.working.clone()
            }
        };

        let status = if fault.is_some()
            || (self.config.escalate_item_failures && job.failed_count() > 0)
        {
            JobStatus::Failed
        } else {
            JobStatus::Completed
        };

        if let Err(e) = job.finalize(self.time_provider.now_millis(), status) {
            error!(job_id = %self.job_id, error = %e, "Job could not be finalized");
            fault.get_or_insert_with(|| e.to_string());
        }
        if let Err(e) = self.store.set(&self.job_id, job.clone()).await {
            warn!(job_id = %self.job_id, error = %e, "Failed to persist final job record");
        }

        info!(
            job_id = %self.job_id,
            status = %job.status,
            items = job.items.len(),
            failed_items = job.failed_count(),
            duration_ms = job.duration,
            "Job finished"
        );

        if let Some(observer) = self.observer.take() {
            observer.push_final(&StreamPayload::from(job.clone()));
        }

        let outcome = match fault {
            Some(error) => JobOutcome::Faulted {
                job_id: self.job_id.clone(),
                error,
            },
            None => JobOutcome::Finished {
                job_id: self.job_id.clone(),
                job,
            },
        };
        if let Err(msg) = catch_panic(self.hooks.on_finished(&outcome)).await {
            error!(job_id = %self.job_id, panic_msg = %msg, "on_finished hook panicked");
        }

        if let Err(e) = self.store.delete(&self.job_id).await {
            warn!(job_id = %self.job_id, error = %e, "Failed to delete finished job record");
        }
        outcome
    }

    async fn load(&self) -> Result<JobRecord> {
        self.store.get(&self.job_id).await?.ok_or_else(|| {
            AppError::NotFound(format!("job {} is no longer in the store", self.job_id))
        })
    }

    async fn persist(&mut self, job: &JobRecord) -> Result<()> {
        self.store.set(&self.job_id, job.clone()).await?;
        self.working = job.clone();
        Ok(())
    }

    /// Push a snapshot; a disconnected observer is dropped for the rest of the run
    fn push_update(&mut self, job: &JobRecord) {
        let delivered = self
            .observer
            .as_ref()
            .map(|observer| observer.push_update(&StreamPayload::from(job.clone())));
        if delivered == Some(false) {
            self.observer = None;
        }
    }
}
