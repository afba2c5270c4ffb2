// Batchline Core - Domain, Ports & Job Lifecycle
// NO infrastructure dependencies (stores, transports and processors are injected)

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{AppError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
