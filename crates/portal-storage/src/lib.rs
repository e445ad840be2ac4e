//! Durable storage for Portal and the cache-aside adapter that fronts it.

pub mod cache_aside;
pub mod memory;
pub mod mysql;

pub use cache_aside::{CacheAsideStore, DEFAULT_CACHE_TTL};
pub use memory::InMemoryRepository;
pub use mysql::MySqlRepository;
pub use portal_core::repository::{ReadRepository, Repository, UrlRecord};
pub use portal_core::StorageError;
