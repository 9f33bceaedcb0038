use async_trait::async_trait;
use parking_lot::Mutex;

use crate::{
    backend::QueueBackend,
    types::{CallerKey, Entry},
    QueueError, QueueResult,
};

/// In-process backend: a mutex-guarded ordered list
///
/// Each operation holds the instance lock for its full duration, which gives
/// single-writer-at-a-time semantics. Operations are O(queue length) and
/// short, so readers serialize through the same lock. No durability.
pub struct MemoryQueue {
    entries: Mutex<Vec<Entry>>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }
}

impl Default for MemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueueBackend for MemoryQueue {
    async fn enqueue(&self, entry: Entry) -> QueueResult<()> {
        let mut entries = self.entries.lock();
        if entries.iter().any(|e| e.key == entry.key) {
            return Err(QueueError::AlreadyQueued(entry.key.to_string()));
        }
        entries.push(entry);
        Ok(())
    }

    async fn remove(&self, key: &CallerKey) -> QueueResult<Entry> {
        let mut entries = self.entries.lock();
        match entries.iter().position(|e| &e.key == key) {
            Some(index) => Ok(entries.remove(index)),
            None => Err(QueueError::NotFound(key.to_string())),
        }
    }

    async fn dequeue(&self, n: usize) -> QueueResult<Vec<Entry>> {
        let mut entries = self.entries.lock();
        let taken = n.min(entries.len());
        Ok(entries.drain(..taken).collect())
    }

    async fn list(&self) -> QueueResult<Vec<Entry>> {
        Ok(self.entries.lock().clone())
    }

    async fn position(&self, key: &CallerKey) -> QueueResult<Option<u64>> {
        let entries = self.entries.lock();
        Ok(entries
            .iter()
            .position(|e| &e.key == key)
            .map(|index| index as u64 + 1))
    }

    async fn clear(&self) -> QueueResult<()> {
        self.entries.lock().clear();
        Ok(())
    }

    async fn len(&self) -> QueueResult<usize> {
        Ok(self.entries.lock().len())
    }
}
