//! Fast-store implementations for Portal: URL caches and id counters.

pub mod counter;
pub mod layered;
pub mod moka;
pub mod redis;

pub use self::moka::{CacheConfig, MokaUrlCache};
pub use self::redis::RedisUrlCache;
pub use counter::{InMemoryCounter, RedisCounter};
pub use layered::{LayeredCache, DEFAULT_L1_TTL};
