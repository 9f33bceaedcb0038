use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::types::{CallerKey, ChannelKey};

/// Tracks the last successful enqueue per (channel, caller) pair
///
/// A caller inside the cooldown window may not enqueue again in that channel;
/// other channels are unaffected. State lives behind its own lock, never
/// acquired together with a queue or manager lock.
pub struct EnqueueRateLimiter {
    cooldown: chrono::Duration,
    last_enqueued: Mutex<HashMap<(ChannelKey, CallerKey), DateTime<Utc>>>,
}

impl EnqueueRateLimiter {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown: chrono::Duration::from_std(cooldown).unwrap_or(chrono::Duration::MAX),
            last_enqueued: Mutex::new(HashMap::new()),
        }
    }

    /// True iff the caller enqueued in this channel within the cooldown window
    pub fn triggered(&self, channel: &ChannelKey, caller: &CallerKey) -> bool {
        self.triggered_at(channel, caller, Utc::now())
    }

    fn triggered_at(&self, channel: &ChannelKey, caller: &CallerKey, now: DateTime<Utc>) -> bool {
        let last_enqueued = self.last_enqueued.lock();
        match last_enqueued.get(&(channel.clone(), caller.clone())) {
            Some(at) => now.signed_duration_since(*at) < self.cooldown,
            None => false,
        }
    }

    /// Store or overwrite the caller's last-enqueue timestamp
    pub fn record_enqueue(&self, channel: &ChannelKey, caller: &CallerKey, at: DateTime<Utc>) {
        self.last_enqueued
            .lock()
            .insert((channel.clone(), caller.clone()), at);
    }

    /// Drop every timestamp recorded for one channel
    ///
    /// Invoked alongside a queue clear so the limit doesn't outlive the queue
    /// it was protecting.
    pub fn clear_channel(&self, channel: &ChannelKey) {
        self.last_enqueued
            .lock()
            .retain(|(chan, _), _| chan != channel);
    }

    /// Wipe all tracked timestamps
    pub fn clear(&self) {
        self.last_enqueued.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter() -> EnqueueRateLimiter {
        EnqueueRateLimiter::new(Duration::from_secs(5 * 60))
    }

    #[test]
    fn test_untracked_caller_is_not_limited() {
        let limiter = limiter();
        assert!(!limiter.triggered(&"guild".into(), &"caller".into()));
    }

    #[test]
    fn test_recent_enqueue_triggers() {
        let limiter = limiter();
        limiter.record_enqueue(&"guild".into(), &"caller".into(), Utc::now());
        assert!(limiter.triggered(&"guild".into(), &"caller".into()));
    }

    #[test]
    fn test_window_expires() {
        let limiter = limiter();
        let stale = Utc::now() - chrono::Duration::minutes(6);
        limiter.record_enqueue(&"guild".into(), &"caller".into(), stale);
        assert!(!limiter.triggered(&"guild".into(), &"caller".into()));
    }

    #[test]
    fn test_window_boundary() {
        let limiter = limiter();
        let now = Utc::now();
        limiter.record_enqueue(&"guild".into(), &"caller".into(), now);

        assert!(limiter.triggered_at(
            &"guild".into(),
            &"caller".into(),
            now + chrono::Duration::minutes(4)
        ));
        // now == at + cooldown is no longer inside the window
        assert!(!limiter.triggered_at(
            &"guild".into(),
            &"caller".into(),
            now + chrono::Duration::minutes(5)
        ));
    }

    #[test]
    fn test_limit_is_scoped_per_channel() {
        let limiter = limiter();
        limiter.record_enqueue(&"guild-1".into(), &"caller".into(), Utc::now());

        assert!(limiter.triggered(&"guild-1".into(), &"caller".into()));
        assert!(!limiter.triggered(&"guild-2".into(), &"caller".into()));
    }

    #[test]
    fn test_clear_channel_leaves_others() {
        let limiter = limiter();
        let now = Utc::now();
        limiter.record_enqueue(&"guild-1".into(), &"caller".into(), now);
        limiter.record_enqueue(&"guild-2".into(), &"caller".into(), now);

        limiter.clear_channel(&"guild-1".into());
        assert!(!limiter.triggered(&"guild-1".into(), &"caller".into()));
        assert!(limiter.triggered(&"guild-2".into(), &"caller".into()));
    }

    #[test]
    fn test_clear_wipes_everything() {
        let limiter = limiter();
        limiter.record_enqueue(&"guild-1".into(), &"caller".into(), Utc::now());
        limiter.clear();
        assert!(!limiter.triggered(&"guild-1".into(), &"caller".into()));
    }
}
