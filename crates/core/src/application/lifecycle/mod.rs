// Job Lifecycle Engine
//
// `submit` runs setup inline (validate, create, store, first push, on_started) and
// returns once the record exists. The item loop then runs on its own task; the
// returned `JobHandle` resolves to the outcome.

mod panic_guard;
mod run;
pub mod submit;


pub use submit::SubmitRequest;

use crate::application::constants::DEFAULT_RECORD_REFRESH;
use crate::application::emitter::Observer;
use crate::domain::JobId;
use crate::error::{AppError, Result};
use crate::port::{IdProvider, ItemProcessor, JobHooks, JobOutcome, JobStore, TimeProvider};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Engine behavior switches
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Finalize a job `failed` when any of its items failed
    pub escalate_item_failures: bool,
    /// Re-store the record this often while an item runs. Keep it below the store TTL.
    pub record_refresh: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            escalate_item_failures: false,
            record_refresh: DEFAULT_RECORD_REFRESH,
        }
    }
}

/// Handle to a running job
pub struct JobHandle {
    job_id: JobId,
    join: JoinHandle<JobOutcome>,
}

impl JobHandle {
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Wait for the job to finish
    pub async fn wait(self) -> Result<JobOutcome> {
        self.join
            .await
            .map_err(|e| AppError::Internal(format!("job task for {} failed: {}", self.job_id, e)))
    }

    /// Let the job run in the background, keeping only its id
    pub fn detach(self) -> JobId {
        self.job_id
    }
}

/// Job Lifecycle Engine
#[derive(Clone)]
pub struct JobEngine {
    store: Arc<dyn JobStore>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
    config: EngineConfig,
}

impl JobEngine {
    pub fn new(
        store: Arc<dyn JobStore>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            id_provider,
            time_provider,
            config,
        }
    }

    /// Submit a job.
    ///
    /// Setup failures return `Err` before any hook fires or any event is written;
    /// the observer is dropped, which closes its stream empty.
    pub async fn submit(
        &self,
        request: SubmitRequest,
        processor: Arc<dyn ItemProcessor>,
        hooks: Arc<dyn JobHooks>,
        observer: Option<Observer>,
    ) -> Result<JobHandle> {
        submit::execute(self, request, processor, hooks, observer).await
    }
}
