use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use portal_cache::{InMemoryCounter, LayeredCache, MokaUrlCache, RedisCounter, RedisUrlCache};
use portal_core::{Counter, Repository, Shortener, UrlCache};
use portal_gateway::cli::{CacheBackendArg, Cli, StorageBackendArg, StrategyArg};
use portal_gateway::startup::{connect_mysql, connect_redis, RetryPolicy};
use portal_gateway::{telemetry, App, AppState};
use portal_generator::{CounterStrategy, HashStrategy, Obfuscator};
use portal_shortener::ShortenerService;
use portal_storage::{CacheAsideStore, InMemoryRepository};
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Cli::parse();
    telemetry::init(config.log_format)?;
    config.validate()?;

    info!(
        listen_addr = %config.listen_addr,
        base_url = %config.base_url,
        strategy = %config.strategy,
        storage_backend = %config.storage,
        cache_backend = %config.cache,
        "starting portal"
    );

    let shortener = build_shortener(&config).await?;
    let state = AppState::new(shortener, config.base_url.clone());

    let listener = TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    info!(listen_addr = %listener.local_addr()?, "listening");

    axum::serve(listener, App::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("portal stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

async fn build_shortener(config: &Cli) -> anyhow::Result<Arc<dyn Shortener>> {
    let retry = config.retry_policy();

    match config.storage {
        StorageBackendArg::InMemory => {
            warn!("in-memory storage loses every mapping on restart");
            with_cache(config, &retry, InMemoryRepository::new()).await
        }
        StorageBackendArg::Mysql => {
            let dsn = config
                .mysql_dsn
                .as_deref()
                .context("mysql dsn is required when storage backend is mysql")?;
            let repository = connect_mysql(dsn, &retry).await?;
            with_cache(config, &retry, repository).await
        }
    }
}

async fn with_cache<R: Repository>(
    config: &Cli,
    retry: &RetryPolicy,
    repository: R,
) -> anyhow::Result<Arc<dyn Shortener>> {
    let ttl = config.cache_ttl();

    match config.cache {
        CacheBackendArg::InMemory => {
            let cache = MokaUrlCache::with_capacity(config.cache_capacity);
            let counter = InMemoryCounter::starting_at(config.counter_start);
            with_strategy(
                config,
                CacheAsideStore::with_ttl(repository, cache, ttl),
                counter,
            )
        }
        CacheBackendArg::Redis => {
            let conn = connect_redis(redis_url(config)?, retry).await?;
            let counter = redis_counter(config, conn.clone()).await?;
            let cache = RedisUrlCache::new(conn);
            with_strategy(
                config,
                CacheAsideStore::with_ttl(repository, cache, ttl),
                counter,
            )
        }
        CacheBackendArg::Layered => {
            let conn = connect_redis(redis_url(config)?, retry).await?;
            let counter = redis_counter(config, conn.clone()).await?;
            let cache = LayeredCache::new(
                MokaUrlCache::with_capacity(config.cache_capacity),
                RedisUrlCache::new(conn),
            )
            .with_l1_ttl(config.l1_ttl());
            with_strategy(
                config,
                CacheAsideStore::with_ttl(repository, cache, ttl),
                counter,
            )
        }
    }
}

fn with_strategy<R: Repository, C: UrlCache, K: Counter>(
    config: &Cli,
    store: CacheAsideStore<R, C>,
    counter: K,
) -> anyhow::Result<Arc<dyn Shortener>> {
    let policy = config.collision_policy();

    let shortener: Arc<dyn Shortener> = match config.strategy {
        StrategyArg::Counter => {
            let strategy = match config.obfuscation_settings() {
                Some(settings) => {
                    let obfuscator =
                        Obfuscator::new(&settings).context("invalid counter obfuscation")?;
                    info!(min_length = obfuscator.min_length(), "counter codes are hashids");
                    CounterStrategy::with_obfuscator(counter, obfuscator)
                }
                None => CounterStrategy::new(counter),
            };
            Arc::new(ShortenerService::with_policy(store, strategy, policy))
        }
        StrategyArg::Hash => Arc::new(ShortenerService::with_policy(
            store,
            HashStrategy::new(config.hash_settings()),
            policy,
        )),
    };
    Ok(shortener)
}

fn redis_url(config: &Cli) -> anyhow::Result<&str> {
    config
        .redis_url
        .as_deref()
        .context("redis url is required for the redis and layered caches")
}

async fn redis_counter(
    config: &Cli,
    conn: redis::aio::MultiplexedConnection,
) -> anyhow::Result<RedisCounter> {
    let counter = RedisCounter::new(conn);
    if config.counter_start > 0 && counter.seed(config.counter_start).await? {
        info!(start = config.counter_start, key = counter.key(), "seeded id counter");
    }
    Ok(counter)
}
