// Store configuration

use batchline_core::application::constants::{DEFAULT_STORE_TTL, DEFAULT_SWEEP_INTERVAL};
use std::time::Duration;

/// TTL settings for `MemoryJobStore`
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Lifetime of an entry since its last `set`
    pub ttl: Duration,
    /// Period of the background expiry sweep
    pub sweep_interval: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_STORE_TTL,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}
