pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;

use async_trait::async_trait;

use crate::{
    types::{CallerKey, Entry},
    QueueResult,
};

/// Backend contract for one channel's FIFO queue
///
/// Every implementation must be safe under concurrent invocation on the same
/// instance and observably identical to the others for each operation:
/// same results, same ordering, same error kinds. Callers can tell backends
/// apart only by latency and durability.
#[async_trait]
pub trait QueueBackend: Send + Sync {
    /// Append an entry to the back of the queue
    ///
    /// Fails with [`QueueError::AlreadyQueued`](crate::QueueError::AlreadyQueued)
    /// if an entry with the same key is currently present; no side effect on
    /// failure. Keys are unique only among present entries, so a previously
    /// removed key may enqueue again.
    async fn enqueue(&self, entry: Entry) -> QueueResult<()>;

    /// Remove and return the entry with the given key
    ///
    /// Fails with [`QueueError::NotFound`](crate::QueueError::NotFound) if the
    /// key is absent. Relative order of the remaining entries is preserved.
    async fn remove(&self, key: &CallerKey) -> QueueResult<Entry>;

    /// Remove and return up to `n` entries from the front, oldest first
    ///
    /// Returns fewer than `n` when the queue holds fewer; `n == 0` yields an
    /// empty result. Never errors solely because the queue is short.
    async fn dequeue(&self, n: usize) -> QueueResult<Vec<Entry>>;

    /// Snapshot of all entries, front to back
    async fn list(&self) -> QueueResult<Vec<Entry>>;

    /// 1-indexed position of the key from the front, `None` if absent
    async fn position(&self, key: &CallerKey) -> QueueResult<Option<u64>>;

    /// Empty the queue; clearing an already-empty queue succeeds
    async fn clear(&self) -> QueueResult<()>;

    /// Current entry count
    async fn len(&self) -> QueueResult<usize>;
}
