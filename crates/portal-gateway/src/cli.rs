use anyhow::bail;
use clap::{Parser, ValueEnum};
use portal_generator::{HashSettings, ObfuscationSettings};
use portal_shortener::CollisionPolicy;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::time::Duration;

use crate::startup::RetryPolicy;

pub const LISTEN_ADDR_ENV: &str = "PORTAL_LISTEN_ADDR";
pub const BASE_URL_ENV: &str = "PORTAL_BASE_URL";
pub const STRATEGY_ENV: &str = "PORTAL_STRATEGY";
pub const HASH_LENGTH_ENV: &str = "PORTAL_HASH_LENGTH";
pub const COLLISION_ENV: &str = "PORTAL_COLLISION";
pub const MAX_CODE_LENGTH_ENV: &str = "PORTAL_MAX_CODE_LENGTH";
pub const COUNTER_START_ENV: &str = "PORTAL_COUNTER_START";
pub const COUNTER_SALT_ENV: &str = "PORTAL_COUNTER_SALT";
pub const COUNTER_MIN_LENGTH_ENV: &str = "PORTAL_COUNTER_MIN_LENGTH";
pub const STORAGE_BACKEND_ENV: &str = "PORTAL_STORAGE_BACKEND";
pub const MYSQL_DSN_ENV: &str = "PORTAL_MYSQL_DSN";
pub const CACHE_BACKEND_ENV: &str = "PORTAL_CACHE_BACKEND";
pub const REDIS_URL_ENV: &str = "PORTAL_REDIS_URL";
pub const CACHE_TTL_ENV: &str = "PORTAL_CACHE_TTL_SECS";
pub const CACHE_CAPACITY_ENV: &str = "PORTAL_CACHE_CAPACITY";
pub const L1_TTL_ENV: &str = "PORTAL_L1_TTL_SECS";
pub const CONNECT_ATTEMPTS_ENV: &str = "PORTAL_CONNECT_ATTEMPTS";
pub const CONNECT_BACKOFF_ENV: &str = "PORTAL_CONNECT_BACKOFF_MS";
pub const LOG_FORMAT_ENV: &str = "PORTAL_LOG_FORMAT";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    #[value(name = "counter")]
    Counter,
    #[value(name = "hash")]
    Hash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CollisionArg {
    #[value(name = "reject")]
    Reject,
    #[value(name = "extend")]
    Extend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "mysql")]
    Mysql,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CacheBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "redis")]
    Redis,
    /// Moka in front of Redis.
    #[value(name = "layered")]
    Layered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[value(name = "text")]
    Text,
    #[value(name = "json")]
    Json,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Mysql => write!(f, "mysql"),
        }
    }
}

impl Display for CacheBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheBackendArg::InMemory => write!(f, "in-memory"),
            CacheBackendArg::Redis => write!(f, "redis"),
            CacheBackendArg::Layered => write!(f, "layered"),
        }
    }
}

impl Display for StrategyArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyArg::Counter => write!(f, "counter"),
            StrategyArg::Hash => write!(f, "hash"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "portal", about = "URL shortener HTTP server")]
pub struct Cli {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    /// Prefix of every returned short URL.
    #[arg(long, env = BASE_URL_ENV, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[arg(long, env = STRATEGY_ENV, value_enum, default_value_t = StrategyArg::Counter)]
    pub strategy: StrategyArg,

    /// Default length of hash-derived codes.
    #[arg(long, env = HASH_LENGTH_ENV, default_value_t = 7, value_parser = clap::value_parser!(u16).range(1..=32))]
    pub hash_length: u16,

    #[arg(long, env = COLLISION_ENV, value_enum, default_value_t = CollisionArg::Reject)]
    pub collision: CollisionArg,

    /// Longest code the `extend` collision policy may produce.
    #[arg(long, env = MAX_CODE_LENGTH_ENV, default_value_t = 10)]
    pub max_code_length: usize,

    /// Counter value the first generated id follows.
    #[arg(long, env = COUNTER_START_ENV, default_value_t = 0)]
    pub counter_start: u64,

    /// Salt for hashids-encoded counter codes. Plain base62 when unset.
    #[arg(long, env = COUNTER_SALT_ENV, hide_env_values = true)]
    pub counter_salt: Option<String>,

    /// Minimum length of hashids-encoded counter codes.
    #[arg(long, env = COUNTER_MIN_LENGTH_ENV, default_value_t = 6, value_parser = clap::value_parser!(u16).range(0..=32))]
    pub counter_min_length: u16,

    #[arg(long, env = STORAGE_BACKEND_ENV, value_enum, default_value_t = StorageBackendArg::InMemory)]
    pub storage: StorageBackendArg,

    #[arg(long, env = MYSQL_DSN_ENV, required_if_eq("storage", "mysql"))]
    pub mysql_dsn: Option<String>,

    #[arg(long, env = CACHE_BACKEND_ENV, value_enum, default_value_t = CacheBackendArg::InMemory)]
    pub cache: CacheBackendArg,

    #[arg(
        long,
        env = REDIS_URL_ENV,
        required_if_eq_any([("cache", "redis"), ("cache", "layered")])
    )]
    pub redis_url: Option<String>,

    #[arg(long, env = CACHE_TTL_ENV, default_value_t = 3600)]
    pub cache_ttl_secs: u64,

    /// Maximum entries in the in-process cache.
    #[arg(long, env = CACHE_CAPACITY_ENV, default_value_t = 10_000)]
    pub cache_capacity: u64,

    /// Upper bound on how long the in-process layer keeps an entry when
    /// the cache is layered.
    #[arg(long, env = L1_TTL_ENV, default_value_t = 60)]
    pub l1_ttl_secs: u64,

    #[arg(long, env = CONNECT_ATTEMPTS_ENV, default_value_t = 10)]
    pub connect_attempts: u32,

    #[arg(long, env = CONNECT_BACKOFF_ENV, default_value_t = 500)]
    pub connect_backoff_ms: u64,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Cli {
    /// Rejects backend combinations that cannot create codes safely.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.strategy == StrategyArg::Counter
            && self.storage == StorageBackendArg::Mysql
            && self.cache == CacheBackendArg::InMemory
        {
            bail!(
                "the counter strategy with mysql storage needs a redis or layered cache; \
                 an in-memory counter restarts below ids already stored"
            );
        }
        Ok(())
    }

    pub fn collision_policy(&self) -> CollisionPolicy {
        match self.collision {
            CollisionArg::Reject => CollisionPolicy::Reject,
            CollisionArg::Extend => CollisionPolicy::ExtendLength {
                max_length: self.max_code_length,
            },
        }
    }

    pub fn hash_settings(&self) -> HashSettings {
        HashSettings::builder()
            .length(usize::from(self.hash_length))
            .build()
    }

    pub fn obfuscation_settings(&self) -> Option<ObfuscationSettings> {
        self.counter_salt.as_ref().map(|salt| {
            ObfuscationSettings::builder()
                .salt(salt.as_str())
                .min_length(usize::from(self.counter_min_length))
                .build()
        })
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn l1_ttl(&self) -> Duration {
        Duration::from_secs(self.l1_ttl_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::builder()
            .max_attempts(self.connect_attempts)
            .initial_backoff(Duration::from_millis(self.connect_backoff_ms))
            .build()
    }
}
