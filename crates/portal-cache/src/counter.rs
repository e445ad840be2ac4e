use crate::redis::map_redis_error;
use async_trait::async_trait;
use portal_core::cache::Result;
use portal_core::Counter;
use redis::AsyncCommands;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace, warn};

pub(crate) const DEFAULT_COUNTER_KEY: &str = "pt:id:counter";

/// An in-process counter backed by an [`AtomicU64`].
///
/// Clones share the same underlying counter. Like Redis `INCR`, the first
/// value handed out is `start + 1`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCounter {
    value: Arc<AtomicU64>,
}

impl InMemoryCounter {
    /// Creates a counter whose first value is 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a counter whose first value is `start + 1`.
    pub fn starting_at(start: u64) -> Self {
        Self {
            value: Arc::new(AtomicU64::new(start)),
        }
    }

    /// The last value handed out (or the start value if none was).
    pub fn current(&self) -> u64 {
        self.value.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Counter for InMemoryCounter {
    async fn next(&self) -> Result<u64> {
        Ok(self.value.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

/// A counter kept in Redis and advanced with a single `INCR` round trip.
#[derive(Debug, Clone)]
pub struct RedisCounter {
    conn: redis::aio::MultiplexedConnection,
    key: String,
}

impl RedisCounter {
    /// Creates a counter stored under the default key.
    pub fn new(conn: redis::aio::MultiplexedConnection) -> Self {
        Self::with_key(conn, DEFAULT_COUNTER_KEY)
    }

    /// Creates a counter stored under a custom key.
    pub fn with_key(conn: redis::aio::MultiplexedConnection, key: impl Into<String>) -> Self {
        Self {
            conn,
            key: key.into(),
        }
    }

    /// Sets the counter to `start` unless it already exists.
    ///
    /// Returns `true` if the value was written. An existing counter is never
    /// moved, so this is safe to call on every startup.
    pub async fn seed(&self, start: u64) -> Result<bool> {
        let mut conn = self.conn.clone();
        let written: bool = conn
            .set_nx(&self.key, start)
            .await
            .map_err(|e| map_redis_error("failed to seed counter in Redis", e))?;
        debug!(key = %self.key, start, written, "Seeded Redis counter");
        Ok(written)
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

#[async_trait]
impl Counter for RedisCounter {
    async fn next(&self) -> Result<u64> {
        trace!(key = %self.key, "Incrementing Redis counter");

        let mut conn = self.conn.clone();
        conn.incr::<_, _, u64>(&self.key, 1u64).await.map_err(|e| {
            warn!(key = %self.key, error = %e, "Redis error on INCR");
            map_redis_error("failed to increment counter in Redis", e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[tokio::test]
    async fn first_value_is_one() {
        let counter = InMemoryCounter::new();
        assert_eq!(counter.next().await.unwrap(), 1);
        assert_eq!(counter.next().await.unwrap(), 2);
        assert_eq!(counter.current(), 2);
    }

    #[tokio::test]
    async fn starting_at_offsets_the_sequence() {
        let counter = InMemoryCounter::starting_at(1000);
        assert_eq!(counter.next().await.unwrap(), 1001);
    }

    #[tokio::test]
    async fn clones_share_state() {
        let counter = InMemoryCounter::new();
        let clone = counter.clone();

        counter.next().await.unwrap();
        assert_eq!(clone.next().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn concurrent_increments_never_repeat() {
        let counter = InMemoryCounter::new();

        let mut handles = vec![];
        for _ in 0..8 {
            let counter = counter.clone();
            handles.push(tokio::spawn(async move {
                let mut values = Vec::with_capacity(100);
                for _ in 0..100 {
                    values.push(counter.next().await.unwrap());
                }
                values
            }));
        }

        let mut seen = HashSet::new();
        for handle in handles {
            for value in handle.await.unwrap() {
                assert!(seen.insert(value), "value {value} handed out twice");
            }
        }

        assert_eq!(seen.len(), 800);
        assert_eq!(counter.current(), 800);
    }
}
