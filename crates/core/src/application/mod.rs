// Application Layer - Use Cases and Business Logic

pub mod constants;
pub mod emitter;
pub mod lifecycle;
pub mod maintenance;
pub mod shutdown;
pub mod status_query;

// Re-exports
pub use emitter::{observer_channel, Observer, ObserverStream, StreamPayload};
pub use lifecycle::{EngineConfig, JobEngine, JobHandle, SubmitRequest};
pub use maintenance::ExpirySweeper;
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
pub use status_query::{QueryConfig, StatusQuery, WatchEnd};
