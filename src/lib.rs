//! # scrim-queue: per-channel waiting-list service
//!
//! Embeddable scrimmage-queue core for chat bots: each channel owns an
//! ordered FIFO of participants that members join, leave, list, and that
//! moderators clear or take from in batches.
//!
//! Guarantees:
//!
//! - **Channel isolation**: one queue per channel key, created atomically on
//!   first reference; no channel's state leaks into another's.
//! - **Linearizable FIFO**: concurrent enqueue/remove/take never corrupt
//!   ordering, duplicate entries, or lose them; a caller key is present at
//!   most once per queue.
//! - **Enqueue cooldown**: a caller may rejoin a channel's queue at most once
//!   per cooldown window (5 minutes by default).
//! - **Interchangeable backends**: the in-memory queue and the redis-list
//!   queue are observably identical for every operation, so deployments can
//!   swap durability in without changing caller semantics.
//!
//! The chat-protocol layer stays outside: it supplies a caller identity key,
//! a display tag and a permission verdict, and gets a reply string back.
//!
//! ```
//! use scrim_queue::prelude::*;
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let manager = Arc::new(QueueManager::in_memory());
//! let router = CommandRouter::new(manager, ServiceConfig::default());
//!
//! let request = CommandRequest {
//!     channel: "guild-1".into(),
//!     caller: "user-1".into(),
//!     args: "example#1234".to_string(),
//!     can_moderate: false,
//! };
//! let reply = router.enqueue(&request).await;
//! assert_eq!(
//!     reply,
//!     "Successfully added example#1234 to the scrimmages queue in position 1."
//! );
//! # }
//! ```

pub mod backend;
pub mod command;
pub mod config;
pub mod error;
pub mod limiter;
pub mod manager;
pub mod types;

pub use backend::QueueBackend;
pub use command::{CommandRequest, CommandRouter};
pub use config::ServiceConfig;
pub use error::{QueueError, QueueResult};
pub use limiter::EnqueueRateLimiter;
pub use manager::QueueManager;
pub use types::{CallerKey, ChannelKey, Entry};

#[cfg(feature = "memory")]
pub use backend::memory::MemoryQueue;

#[cfg(feature = "redis")]
pub use backend::redis::RedisQueue;

/// Everything an embedding bot needs in one import
pub mod prelude {
    pub use crate::{
        CallerKey, ChannelKey, CommandRequest, CommandRouter, Entry, QueueBackend, QueueError,
        QueueManager, QueueResult, ServiceConfig,
    };

    #[cfg(feature = "memory")]
    pub use crate::MemoryQueue;

    #[cfg(feature = "redis")]
    pub use crate::RedisQueue;

    pub use async_trait::async_trait;
}
