// Shared handler state

use batchline_core::application::{JobEngine, StatusQuery};
use batchline_core::port::{ItemProcessor, JobHooks};
use std::sync::Arc;
use std::time::Duration;

/// SSE keep-alive comment interval
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(15);

pub struct AppState {
    pub engine: JobEngine,
    pub query: StatusQuery,
    /// Processor applied to every submitted item
    pub processor: Arc<dyn ItemProcessor>,
    pub hooks: Arc<dyn JobHooks>,
    pub keep_alive: Duration,
}

impl AppState {
    pub fn new(
        engine: JobEngine,
        query: StatusQuery,
        processor: Arc<dyn ItemProcessor>,
        hooks: Arc<dyn JobHooks>,
    ) -> Self {
        Self {
            engine,
            query,
            processor,
            hooks,
            keep_alive: DEFAULT_KEEP_ALIVE,
        }
    }

    pub fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }
}
