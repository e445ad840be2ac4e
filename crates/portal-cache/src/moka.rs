use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;
use portal_core::cache::Result;
use portal_core::{ShortCode, UrlCache, UrlRecord};
use std::time::{Duration, Instant};
use tracing::trace;
use typed_builder::TypedBuilder;

const DEFAULT_CAPACITY: u64 = 10_000;

#[derive(Debug, Clone)]
struct Slot {
    record: UrlRecord,
    expires_in: Option<Duration>,
}

/// Gives each slot the lifetime it was written with; rewrites restart it.
struct SlotExpiry;

impl Expiry<String, Slot> for SlotExpiry {
    fn expire_after_create(&self, _: &String, slot: &Slot, _: Instant) -> Option<Duration> {
        slot.expires_in
    }

    fn expire_after_update(
        &self,
        _: &String,
        slot: &Slot,
        _: Instant,
        _: Option<Duration>,
    ) -> Option<Duration> {
        slot.expires_in
    }
}

/// Settings for a [`MokaUrlCache`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct CacheConfig {
    /// Entry bound; the least useful entries are evicted past it.
    #[builder(default = DEFAULT_CAPACITY)]
    max_capacity: u64,
    /// Lifetime for writes that do not name one. `None` keeps them until evicted.
    #[builder(default, setter(strip_option))]
    default_ttl: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Process-local URL cache backed by moka.
///
/// Suited to single-node deployments and to the first layer of a
/// [`LayeredCache`](crate::LayeredCache). Every write may carry its own TTL.
#[derive(Debug, Clone)]
pub struct MokaUrlCache {
    inner: Cache<String, Slot>,
    default_ttl: Option<Duration>,
}

impl MokaUrlCache {
    /// Holds up to 10,000 entries with no default TTL.
    pub fn new() -> Self {
        CacheConfig::default().into()
    }

    pub fn with_capacity(max_capacity: u64) -> Self {
        CacheConfig::builder()
            .max_capacity(max_capacity)
            .build()
            .into()
    }

    pub fn builder() -> CacheConfigBuilder {
        CacheConfig::builder()
    }

    /// Approximate number of live entries.
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

impl Default for MokaUrlCache {
    fn default() -> Self {
        Self::new()
    }
}

impl From<CacheConfig> for MokaUrlCache {
    fn from(config: CacheConfig) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(config.max_capacity)
                .expire_after(SlotExpiry)
                .build(),
            default_ttl: config.default_ttl,
        }
    }
}

#[async_trait]
impl UrlCache for MokaUrlCache {
    async fn get_url(&self, code: &ShortCode) -> Result<Option<UrlRecord>> {
        let found = self.inner.get(code.as_str()).await.map(|slot| slot.record);
        trace!(code = %code, hit = found.is_some(), "moka lookup");
        Ok(found)
    }

    async fn set_url(
        &self,
        code: &ShortCode,
        record: &UrlRecord,
        ttl: Option<Duration>,
    ) -> Result<()> {
        let slot = Slot {
            record: record.clone(),
            expires_in: ttl.or(self.default_ttl),
        };
        trace!(code = %code, expires_in = ?slot.expires_in, "moka insert");
        self.inner.insert(code.as_str().to_owned(), slot).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> ShortCode {
        ShortCode::new_unchecked(s)
    }

    #[tokio::test]
    async fn stores_and_overwrites_records() {
        let cache = MokaUrlCache::new();
        let key = code("k1");
        let first = UrlRecord::new("https://example.com");
        let second = UrlRecord::new("https://example.org");

        assert_eq!(cache.get_url(&key).await.unwrap(), None);
        cache.set_url(&key, &first, None).await.unwrap();
        assert_eq!(cache.get_url(&key).await.unwrap(), Some(first));

        cache.set_url(&key, &second, None).await.unwrap();
        assert_eq!(cache.get_url(&key).await.unwrap(), Some(second));
        assert_eq!(cache.get_url(&code("k2")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn each_write_keeps_its_own_ttl() {
        let cache = MokaUrlCache::new();
        let brief = code("brief");
        let lasting = code("lasting");
        let record = UrlRecord::new("https://example.com");

        cache
            .set_url(&brief, &record, Some(Duration::from_millis(50)))
            .await
            .unwrap();
        cache
            .set_url(&lasting, &record, Some(Duration::from_secs(3600)))
            .await
            .unwrap();
        assert!(cache.get_url(&brief).await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(120)).await;

        assert!(cache.get_url(&brief).await.unwrap().is_none());
        assert!(cache.get_url(&lasting).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn rewrite_restarts_the_clock() {
        let cache = MokaUrlCache::new();
        let key = code("k1");
        let record = UrlRecord::new("https://example.com");

        cache
            .set_url(&key, &record, Some(Duration::from_millis(50)))
            .await
            .unwrap();
        cache
            .set_url(&key, &record, Some(Duration::from_secs(60)))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(cache.get_url(&key).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn configured_default_ttl_covers_untimed_writes() {
        let cache: MokaUrlCache = MokaUrlCache::builder()
            .max_capacity(100)
            .default_ttl(Duration::from_millis(50))
            .build()
            .into();
        let key = code("k1");

        cache
            .set_url(&key, &UrlRecord::new("https://example.com"), None)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(120)).await;

        assert!(cache.get_url(&key).await.unwrap().is_none());
    }
}
