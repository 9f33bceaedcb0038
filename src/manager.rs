use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::{backend::QueueBackend, types::ChannelKey};

#[cfg(feature = "memory")]
use crate::backend::memory::MemoryQueue;

#[cfg(feature = "redis")]
use crate::{backend::redis::RedisQueue, config::ServiceConfig};
#[cfg(feature = "redis")]
use redis::aio::ConnectionManager;

type BackendFactory = dyn Fn(&ChannelKey) -> Arc<dyn QueueBackend> + Send + Sync;

/// Owner of every channel's queue
///
/// Maps a channel key to its queue, creating one lazily through the injected
/// factory on first lookup. The map lock covers only the read-then-insert, so
/// two callers can never race a channel into two queues and unrelated
/// channels never contend beyond that brief window; actual queue mutations
/// serialize per instance.
pub struct QueueManager {
    queues: Mutex<HashMap<ChannelKey, Arc<dyn QueueBackend>>>,
    factory: Box<BackendFactory>,
}

impl QueueManager {
    /// Create a manager that builds backends with the given factory
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn(&ChannelKey) -> Arc<dyn QueueBackend> + Send + Sync + 'static,
    {
        Self {
            queues: Mutex::new(HashMap::new()),
            factory: Box::new(factory),
        }
    }

    /// Manager backed by in-process memory queues
    #[cfg(feature = "memory")]
    pub fn in_memory() -> Self {
        Self::new(|_| Arc::new(MemoryQueue::new()))
    }

    /// Manager backed by redis-list queues, one list per channel
    ///
    /// The assembly connects once; each channel's queue clones the shared
    /// reader, so the factory stays synchronous and cheap under the map lock.
    /// Dedicated transaction connections are opened per mutation.
    #[cfg(feature = "redis")]
    pub fn redis(client: redis::Client, reader: ConnectionManager, config: &ServiceConfig) -> Self {
        let config = config.clone();
        Self::new(move |channel| {
            Arc::new(RedisQueue::new(
                client.clone(),
                reader.clone(),
                channel,
                &config,
            ))
        })
    }

    /// Return the channel's queue, creating it on first reference
    pub fn lookup(&self, channel: &ChannelKey) -> Arc<dyn QueueBackend> {
        let mut queues = self.queues.lock();
        if let Some(queue) = queues.get(channel) {
            return Arc::clone(queue);
        }

        debug!(%channel, "creating queue for channel");
        let queue = (self.factory)(channel);
        queues.insert(channel.clone(), Arc::clone(&queue));
        queue
    }

    /// Number of channels seen so far
    pub fn channel_count(&self) -> usize {
        self.queues.lock().len()
    }
}
