//! Connection setup for the backing stores.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use anyhow::{bail, Context};
use portal_storage::MySqlRepository;
use redis::aio::MultiplexedConnection;
use tracing::{info, warn};
use typed_builder::TypedBuilder;

/// Bounded exponential backoff for connecting to stores at startup.
#[derive(Debug, Clone, TypedBuilder)]
pub struct RetryPolicy {
    #[builder(default = 10)]
    max_attempts: u32,
    #[builder(default = Duration::from_millis(500))]
    initial_backoff: Duration,
    #[builder(default = Duration::from_secs(10))]
    max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl RetryPolicy {
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay after the `attempt`-th failure (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    /// Runs `op` until it succeeds or the attempts are used up.
    pub async fn retry<T, E, F, Fut>(&self, target: &str, mut op: F) -> anyhow::Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let attempts = self.max_attempts.max(1);

        for attempt in 1..=attempts {
            match op().await {
                Ok(value) => {
                    info!(target_store = target, attempt, "connected");
                    return Ok(value);
                }
                Err(e) if attempt < attempts => {
                    let delay = self.backoff(attempt);
                    warn!(
                        target_store = target,
                        attempt,
                        error = %e,
                        retry_in_ms = delay.as_millis() as u64,
                        "connection failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => bail!("{target} unreachable after {attempts} attempts: {e}"),
            }
        }

        bail!("{target} unreachable after {attempts} attempts")
    }
}

/// Opens a multiplexed Redis connection and checks it with `PING`.
pub async fn connect_redis(url: &str, policy: &RetryPolicy) -> anyhow::Result<MultiplexedConnection> {
    let client = redis::Client::open(url).context("invalid redis url")?;

    policy
        .retry("redis", || {
            let client = client.clone();
            async move {
                let mut conn = client.get_multiplexed_async_connection().await?;
                redis::cmd("PING").query_async::<String>(&mut conn).await?;
                Ok::<_, redis::RedisError>(conn)
            }
        })
        .await
}

/// Connects to MySQL and makes sure the schema exists.
pub async fn connect_mysql(dsn: &str, policy: &RetryPolicy) -> anyhow::Result<MySqlRepository> {
    policy
        .retry("mysql", || async move {
            let repository = MySqlRepository::connect(dsn).await?;
            repository.ensure_schema().await?;
            Ok::<_, portal_storage::StorageError>(repository)
        })
        .await
}
