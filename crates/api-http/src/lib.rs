//! HTTP API Layer
//!
//! Streams job progress to clients as Server-Sent Events. Each SSE `data:` frame
//! carries one JSON payload: a job snapshot, `{}` or `{"error": ..}`.

pub mod error;
pub mod hooks;
pub mod routes;
pub mod server;
pub mod sse;
pub mod state;
pub mod types;

pub use hooks::TracingHooks;
pub use routes::build_router;
pub use server::{ApiServer, ApiServerConfig};
pub use state::AppState;
