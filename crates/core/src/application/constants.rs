// Lifecycle constants (no magic values)
use std::time::Duration;

/// Re-read interval for live status watchers (10s)
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Safety-net expiry for stored job records (10 minutes)
pub const DEFAULT_STORE_TTL: Duration = Duration::from_secs(10 * 60);

/// How often expired records are swept out of the store (1 minute)
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Observer label used before a job id is known
pub const UNBOUND_OBSERVER: &str = "unbound";

/// How often a running item's record is re-stored so the TTL cannot expire it
/// (half the default TTL)
pub const DEFAULT_RECORD_REFRESH: Duration = Duration::from_secs(5 * 60);

/// Floor for every timer period; `tokio::time::interval` rejects zero
pub const MIN_TIMER_PERIOD: Duration = Duration::from_millis(1);
