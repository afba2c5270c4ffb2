// Hooks that turn lifecycle callbacks into structured log lines
use async_trait::async_trait;
use batchline_core::domain::JobRecord;
use batchline_core::port::{ItemError, JobHooks, JobOutcome};
use tracing::{info, warn};

/// Default hooks for jobs submitted over HTTP
pub struct TracingHooks;

#[async_trait]
impl JobHooks for TracingHooks {
    async fn on_started(&self, job: &JobRecord) {
        info!(job_id = %job.job_id, items = job.items.len(), "Job started");
    }

    async fn on_item_settled(&self, result: Result<&JobRecord, &ItemError>) {
        match result {
            Ok(job) => info!(
                job_id = %job.job_id,
                settled = job.settled_count(),
                total = job.items.len(),
                "Item settled"
            ),
            Err(e) => warn!(error = %e, "Item settled with error"),
        }
    }

    async fn on_finished(&self, outcome: &JobOutcome) {
        match outcome {
            JobOutcome::Finished { job_id, job } => info!(
                job_id = %job_id,
                status = %job.status,
                duration = job.duration_minutes.as_deref().unwrap_or_default(),
                "Job finalized"
            ),
            JobOutcome::Faulted { job_id, error } => {
                warn!(job_id = %job_id, error = %error, "Job finalized after engine fault")
            }
        }
    }
}
