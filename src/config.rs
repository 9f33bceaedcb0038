use std::time::Duration;

/// Configuration for the waiting-list service
///
/// Explicitly constructed and passed in by the process assembly; there is no
/// global state.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Cooldown between successful enqueues by one caller in one channel
    pub enqueue_cooldown: Duration,
    /// How many entries `queue take` removes when no count is given
    pub default_take: usize,
    /// Attempt cap for optimistic redis transactions
    pub txn_retries: u32,
    /// Pause between conflicting transaction attempts
    pub txn_backoff: Duration,
    /// Upper bound for one redis operation, retries included
    pub redis_timeout: Duration,
    /// Redis key prefix; one list per channel lives under it
    pub redis_prefix: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            enqueue_cooldown: Duration::from_secs(5 * 60),
            default_take: 12,
            txn_retries: 5,
            txn_backoff: Duration::from_millis(10),
            redis_timeout: Duration::from_secs(5),
            redis_prefix: "scrimq".to_string(),
        }
    }
}
