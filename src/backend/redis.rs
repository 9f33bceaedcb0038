use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::{ConnectionManager, MultiplexedConnection};
use redis::AsyncCommands;
use tracing::debug;

use crate::{
    backend::QueueBackend,
    config::ServiceConfig,
    types::{CallerKey, ChannelKey, Entry},
    QueueError, QueueResult,
};

/// Remote backend: one redis list per channel, JSON-encoded entries
///
/// Reads go through a shared [`ConnectionManager`]. Mutations that must first
/// check an invariant (key absent on enqueue, present on remove) run as
/// WATCH -> read -> MULTI/EXEC on a dedicated connection; a nil EXEC reply
/// means a concurrent writer touched the list, and the whole operation
/// retries from scratch up to a bounded attempt cap. Every operation is
/// bounded by the configured timeout and fails as
/// [`QueueError::Backend`](crate::QueueError::Backend) when it elapses.
/// Durable across process restarts and shared between bot instances.
pub struct RedisQueue {
    client: redis::Client,
    reader: ConnectionManager,
    list_key: String,
    txn_retries: u32,
    txn_backoff: Duration,
    op_timeout: Duration,
}

impl RedisQueue {
    /// Build the backend for one channel from an established connection
    ///
    /// Synchronous so a [`QueueManager`](crate::QueueManager) factory can call
    /// it under the map lock: the assembly connects once, the factory clones
    /// the reader per channel. Dedicated transaction connections are opened
    /// lazily per mutation.
    pub fn new(
        client: redis::Client,
        reader: ConnectionManager,
        channel: &ChannelKey,
        config: &ServiceConfig,
    ) -> Self {
        Self {
            client,
            reader,
            list_key: format!("{}:{}", config.redis_prefix, channel),
            txn_retries: config.txn_retries,
            txn_backoff: config.txn_backoff,
            op_timeout: config.redis_timeout,
        }
    }

    /// Connect and build the backend for one channel (standalone convenience)
    pub async fn connect(
        client: redis::Client,
        channel: &ChannelKey,
        config: &ServiceConfig,
    ) -> QueueResult<Self> {
        let reader = ConnectionManager::new(client.clone()).await?;
        Ok(Self::new(client, reader, channel, config))
    }

    /// Dedicated connection for a watched transaction
    ///
    /// WATCH is connection-scoped, so transactions must not share the
    /// multiplexed reader.
    async fn txn_connection(&self) -> QueueResult<MultiplexedConnection> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    /// Run one operation under the configured deadline
    async fn bounded<T>(
        &self,
        op: &str,
        fut: impl Future<Output = QueueResult<T>> + Send,
    ) -> QueueResult<T> {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(QueueError::Backend(format!(
                "{op} timed out after {:?} on {}",
                self.op_timeout, self.list_key
            ))),
        }
    }

    fn decode_all(raw: &[String]) -> QueueResult<Vec<Entry>> {
        raw.iter()
            .map(|element| Ok(serde_json::from_str(element)?))
            .collect()
    }

    /// Index into `raw` of the element holding `key`, with its decoded entry
    fn find(key: &CallerKey, raw: &[String]) -> QueueResult<Option<(usize, Entry)>> {
        for (index, element) in raw.iter().enumerate() {
            let entry: Entry = serde_json::from_str(element)?;
            if &entry.key == key {
                return Ok(Some((index, entry)));
            }
        }
        Ok(None)
    }

    async fn watch(&self, con: &mut MultiplexedConnection) -> QueueResult<()> {
        let _: () = redis::cmd("WATCH")
            .arg(&self.list_key)
            .query_async(con)
            .await?;
        Ok(())
    }

    async fn unwatch(&self, con: &mut MultiplexedConnection) -> QueueResult<()> {
        let _: () = redis::cmd("UNWATCH").query_async(con).await?;
        Ok(())
    }

    fn retries_exhausted(&self, op: &str) -> QueueError {
        QueueError::Backend(format!(
            "optimistic transaction retries exhausted during {op} on {}",
            self.list_key
        ))
    }

    async fn enqueue_inner(&self, entry: Entry) -> QueueResult<()> {
        let payload = serde_json::to_string(&entry)?;
        let mut con = self.txn_connection().await?;

        for attempt in 0..self.txn_retries {
            self.watch(&mut con).await?;
            let raw: Vec<String> = con.lrange(&self.list_key, 0, -1).await?;
            if Self::find(&entry.key, &raw)?.is_some() {
                self.unwatch(&mut con).await?;
                return Err(QueueError::AlreadyQueued(entry.key.to_string()));
            }

            let committed: Option<redis::Value> = redis::pipe()
                .atomic()
                .rpush(&self.list_key, &payload)
                .query_async(&mut con)
                .await?;
            if committed.is_some() {
                return Ok(());
            }

            debug!(attempt, list = %self.list_key, "enqueue conflicted, retrying");
            tokio::time::sleep(self.txn_backoff).await;
        }

        Err(self.retries_exhausted("enqueue"))
    }

    async fn remove_inner(&self, key: &CallerKey) -> QueueResult<Entry> {
        let mut con = self.txn_connection().await?;

        for attempt in 0..self.txn_retries {
            self.watch(&mut con).await?;
            let raw: Vec<String> = con.lrange(&self.list_key, 0, -1).await?;
            let (index, entry) = match Self::find(key, &raw)? {
                Some(found) => found,
                None => {
                    self.unwatch(&mut con).await?;
                    return Err(QueueError::NotFound(key.to_string()));
                }
            };

            // Entries encode their key, so the payload is unique in the list
            let committed: Option<redis::Value> = redis::pipe()
                .atomic()
                .lrem(&self.list_key, 0, &raw[index])
                .query_async(&mut con)
                .await?;
            if committed.is_some() {
                return Ok(entry);
            }

            debug!(attempt, list = %self.list_key, "remove conflicted, retrying");
            tokio::time::sleep(self.txn_backoff).await;
        }

        Err(self.retries_exhausted("remove"))
    }

    async fn dequeue_inner(&self, n: usize) -> QueueResult<Vec<Entry>> {
        let mut con = self.txn_connection().await?;

        for attempt in 0..self.txn_retries {
            self.watch(&mut con).await?;
            let stop = isize::try_from(n).map_or(isize::MAX, |v| v - 1);
            let raw: Vec<String> = con.lrange(&self.list_key, 0, stop).await?;
            if raw.is_empty() {
                self.unwatch(&mut con).await?;
                return Ok(Vec::new());
            }
            let entries = Self::decode_all(&raw)?;

            // Drop the whole batch in one EXEC so a conflicting writer aborts
            // the take entirely; no partial application.
            let committed: Option<redis::Value> = redis::pipe()
                .atomic()
                .ltrim(&self.list_key, raw.len() as isize, -1)
                .query_async(&mut con)
                .await?;
            if committed.is_some() {
                return Ok(entries);
            }

            debug!(attempt, list = %self.list_key, "dequeue conflicted, retrying");
            tokio::time::sleep(self.txn_backoff).await;
        }

        Err(self.retries_exhausted("dequeue"))
    }

    async fn list_inner(&self) -> QueueResult<Vec<Entry>> {
        let mut con = self.reader.clone();
        let raw: Vec<String> = con.lrange(&self.list_key, 0, -1).await?;
        Self::decode_all(&raw)
    }

    async fn position_inner(&self, key: &CallerKey) -> QueueResult<Option<u64>> {
        let mut con = self.reader.clone();
        let raw: Vec<String> = con.lrange(&self.list_key, 0, -1).await?;
        Ok(Self::find(key, &raw)?.map(|(index, _)| index as u64 + 1))
    }

    async fn clear_inner(&self) -> QueueResult<()> {
        let mut con = self.reader.clone();
        let _: i64 = con.del(&self.list_key).await?;
        Ok(())
    }

    async fn len_inner(&self) -> QueueResult<usize> {
        let mut con = self.reader.clone();
        let count: i64 = con.llen(&self.list_key).await?;
        Ok(count as usize)
    }
}

#[async_trait]
impl QueueBackend for RedisQueue {
    async fn enqueue(&self, entry: Entry) -> QueueResult<()> {
        self.bounded("enqueue", self.enqueue_inner(entry)).await
    }

    async fn remove(&self, key: &CallerKey) -> QueueResult<Entry> {
        self.bounded("remove", self.remove_inner(key)).await
    }

    async fn dequeue(&self, n: usize) -> QueueResult<Vec<Entry>> {
        if n == 0 {
            return Ok(Vec::new());
        }
        self.bounded("dequeue", self.dequeue_inner(n)).await
    }

    async fn list(&self) -> QueueResult<Vec<Entry>> {
        self.bounded("list", self.list_inner()).await
    }

    async fn position(&self, key: &CallerKey) -> QueueResult<Option<u64>> {
        self.bounded("position", self.position_inner(key)).await
    }

    async fn clear(&self) -> QueueResult<()> {
        self.bounded("clear", self.clear_inner()).await
    }

    async fn len(&self) -> QueueResult<usize> {
        self.bounded("len", self.len_inner()).await
    }
}
