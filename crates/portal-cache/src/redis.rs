use async_trait::async_trait;
use portal_core::cache::Result;
use portal_core::{CacheError, ShortCode, UrlCache, UrlRecord};
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::time::Duration;
use tracing::{debug, trace, warn};

pub(crate) const DEFAULT_KEY_PREFIX: &str = "pt:url:";

/// Shared cache of short code mappings kept in Redis.
///
/// Each record is one JSON string under `<prefix><code>`. Writes with a TTL
/// go out as `SET key value EX secs` and Redis evicts them itself.
#[derive(Debug, Clone)]
pub struct RedisUrlCache {
    conn: MultiplexedConnection,
    key_prefix: String,
}

/// Sorts a Redis client failure into timeout, outage, or command error.
pub(crate) fn map_redis_error(operation: &str, err: redis::RedisError) -> CacheError {
    let message = format!("{operation}: {err}");
    if err.is_timeout() {
        return CacheError::Timeout(message);
    }
    if err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal() {
        return CacheError::Unavailable(message);
    }
    CacheError::Operation(message)
}

fn expiry_secs(ttl: Duration) -> u64 {
    // Redis rejects `EX 0`.
    ttl.as_secs().max(1)
}

impl RedisUrlCache {
    /// Keys records under `pt:url:`.
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self::with_prefix(conn, DEFAULT_KEY_PREFIX)
    }

    pub fn with_prefix(conn: MultiplexedConnection, key_prefix: impl Into<String>) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.into(),
        }
    }

    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    fn key_for(&self, code: &ShortCode) -> String {
        let mut key = String::with_capacity(self.key_prefix.len() + code.len());
        key.push_str(&self.key_prefix);
        key.push_str(code.as_str());
        key
    }
}

#[async_trait]
impl UrlCache for RedisUrlCache {
    async fn get_url(&self, code: &ShortCode) -> Result<Option<UrlRecord>> {
        let key = self.key_for(code);
        let mut conn = self.conn.clone();

        let raw: Option<String> = conn.get(&key).await.map_err(|e| {
            warn!(key = %key, error = %e, "redis GET failed");
            map_redis_error("GET", e)
        })?;

        let Some(raw) = raw else {
            trace!(key = %key, "redis miss");
            return Ok(None);
        };

        let record = serde_json::from_str::<UrlRecord>(&raw).map_err(|e| {
            warn!(key = %key, error = %e, "undecodable record in redis");
            CacheError::InvalidData(format!("{key}: {e}"))
        })?;
        debug!(key = %key, "redis hit");
        Ok(Some(record))
    }

    async fn set_url(
        &self,
        code: &ShortCode,
        record: &UrlRecord,
        ttl: Option<Duration>,
    ) -> Result<()> {
        let key = self.key_for(code);
        let payload = serde_json::to_string(record)
            .map_err(|e| CacheError::Serialization(format!("{key}: {e}")))?;

        let mut conn = self.conn.clone();
        let written = match ttl {
            Some(ttl) => conn.set_ex::<_, _, ()>(&key, payload, expiry_secs(ttl)).await,
            None => conn.set::<_, _, ()>(&key, payload).await,
        };
        written.map_err(|e| {
            warn!(key = %key, error = %e, "redis SET failed");
            map_redis_error("SET", e)
        })?;

        trace!(key = %key, ttl = ?ttl, "record written to redis");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_second_ttls_round_up() {
        assert_eq!(expiry_secs(Duration::from_millis(10)), 1);
        assert_eq!(expiry_secs(Duration::from_secs(3600)), 3600);
    }
}
