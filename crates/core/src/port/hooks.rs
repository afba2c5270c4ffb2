// Lifecycle Hooks Port
// Typed replacement for the started / item-settled / finished callbacks

use crate::domain::{JobId, JobRecord};
use crate::port::ItemError;
use async_trait::async_trait;

/// How a job run ended
#[derive(Debug, Clone)]
pub enum JobOutcome {
    /// The item loop ran to the end; `job` is the final snapshot
    Finished { job_id: JobId, job: JobRecord },
    /// An engine-level fault escaped the item loop
    Faulted { job_id: JobId, error: String },
}

impl JobOutcome {
    pub fn job_id(&self) -> &str {
        match self {
            JobOutcome::Finished { job_id, .. } | JobOutcome::Faulted { job_id, .. } => job_id,
        }
    }

    pub fn job(&self) -> Option<&JobRecord> {
        match self {
            JobOutcome::Finished { job, .. } => Some(job),
            JobOutcome::Faulted { .. } => None,
        }
    }

    pub fn is_faulted(&self) -> bool {
        matches!(self, JobOutcome::Faulted { .. })
    }
}

/// Observer hooks for one job run. All methods default to no-ops.
///
/// Call order per job: `on_started` once, `on_item_settled` once per item in
/// item order, `on_finished` once.
#[async_trait]
pub trait JobHooks: Send + Sync {
    /// The record was created and stored
    async fn on_started(&self, _job: &JobRecord) {}

    /// An item settled: `Ok(snapshot)` on success, `Err(error)` on failure
    async fn on_item_settled(&self, _result: Result<&JobRecord, &ItemError>) {}

    /// The run was finalized (after the final event was pushed)
    async fn on_finished(&self, _outcome: &JobOutcome) {}
}

/// Hooks that do nothing (purely streamed or fire-and-forget jobs)
pub struct NoopHooks;

impl JobHooks for NoopHooks {}

pub mod mocks {
    use super::*;
    use crate::domain::JobStatus;
    use std::sync::Mutex;

    /// One recorded hook invocation
    #[derive(Debug, Clone, PartialEq)]
    pub enum HookCall {
        Started { items: usize },
        ItemSucceeded { settled: usize },
        ItemFailed(String),
        Finished(JobStatus),
        Faulted(String),
    }

    /// Records every hook call in order
    #[derive(Default)]
    pub struct RecordingHooks {
        calls: Mutex<Vec<HookCall>>,
    }

    impl RecordingHooks {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn calls(&self) -> Vec<HookCall> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: HookCall) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl JobHooks for RecordingHooks {
        async fn on_started(&self, job: &JobRecord) {
            self.record(HookCall::Started {
                items: job.items.len(),
            });
        }

        async fn on_item_settled(&self, result: Result<&JobRecord, &ItemError>) {
            match result {
                Ok(job) => self.record(HookCall::ItemSucceeded {
                    settled: job.settled_count(),
                }),
                Err(e) => self.record(HookCall::ItemFailed(e.to_string())),
            }
        }

        async fn on_finished(&self, outcome: &JobOutcome) {
            match outcome {
                JobOutcome::Finished { job, .. } => self.record(HookCall::Finished(job.status)),
                JobOutcome::Faulted { error, .. } => self.record(HookCall::Faulted(error.clone())),
            }
        }
    }
}
