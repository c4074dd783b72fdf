/// Configures HTTP timeout, retry and heartbeat behavior.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientOptions {
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Total attempts per call, including the first one.
    pub max_attempts: u32,
    /// Base backoff in milliseconds. The wait after attempt `n` is
    /// `backoff_base_ms * n` (linear strategy, no jitter).
    pub backoff_base_ms: u64,
    /// Interval between heartbeat probes in milliseconds.
    pub heartbeat_period_ms: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            max_attempts: 3,
            backoff_base_ms: 1_000,
            heartbeat_period_ms: 30_000,
        }
    }
}
