// Job submission: setup phase of the lifecycle

use super::panic_guard::catch_panic;
use super::run::JobRun;
use super::{JobEngine, JobHandle};
use crate::application::emitter::{Observer, StreamPayload};
use crate::domain::JobMetadata;
use crate::error::Result;
use crate::port::{ItemProcessor, JobHooks};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, info_span, Instrument};

/// What the caller hands in
#[derive(Debug, Clone, Default)]
pub struct SubmitRequest {
    /// Opaque items, processed in this order
    pub items: Vec<Value>,
    pub metadata: JobMetadata,
}

impl SubmitRequest {
    pub fn new(items: Vec<Value>) -> Self {
        Self {
            items,
            metadata: JobMetadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: JobMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

pub(super) async fn execute(
    engine: &JobEngine,
    request: SubmitRequest,
    processor: Arc<dyn ItemProcessor>,
    hooks: Arc<dyn JobHooks>,
    observer: Option<Observer>,
) -> Result<JobHandle> {
    let SubmitRequest { items, metadata } = request;
    metadata.validate()?;

    let job_id = engine.id_provider.generate_id();
    let item_ids = items.iter().map(|_| engine.id_provider.generate_id()).collect();
    let started_at = engine.time_provider.now_millis();
    let job = crate::domain::JobRecord::new(job_id.clone(), item_ids, started_at, metadata);

    engine.store.set(&job_id, job.clone()).await?;

    info!(
        job_id = %job_id,
        items = job.items.len(),
        observed = observer.is_some(),
        "Job submitted"
    );

    // Setup is done: from here on nothing is surfaced to the caller as an error
    let observer = observer.and_then(|mut observer| {
        observer.bind(&job_id);
        observer
            .push_update(&StreamPayload::from(job.clone()))
            .then_some(observer)
    });
    let setup_fault = catch_panic(hooks.on_started(&job)).await.err().map(|msg| {
        error!(job_id = %job_id, panic_msg = %msg, "on_started hook panicked");
        format!("on_started hook panicked: {}", msg)
    });

    let run = JobRun {
        job_id: job_id.clone(),
        items,
        working: job,
        store: Arc::clone(&engine.store),
        time_provider: Arc::clone(&engine.time_provider),
        processor,
        hooks,
        observer,
        config: engine.config.clone(),
        setup_fault,
    };

    let span = info_span!("job", job_id = %job_id);
    let join = tokio::spawn(run.run().instrument(span));

    Ok(JobHandle { job_id, join })
}
