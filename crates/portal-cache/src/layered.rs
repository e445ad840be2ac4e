use async_trait::async_trait;
use portal_core::cache::Result;
use portal_core::{ShortCode, UrlCache, UrlRecord};
use std::time::Duration;
use tracing::trace;

/// Longest an L1 copy lives unless [`LayeredCache::with_l1_ttl`] says otherwise.
pub const DEFAULT_L1_TTL: Duration = Duration::from_secs(60);

/// Two caches stacked: a near one (`L1`) in front of a shared one (`L2`).
///
/// Reads stop at the first layer that has the record; an L2 hit is copied
/// into L1. Writes go to L2 before L1 so that a failed shared write never
/// leaves a record only this process can see. L1 copies never outlive
/// `l1_ttl`.
#[derive(Debug, Clone)]
pub struct LayeredCache<L1, L2> {
    near: L1,
    shared: L2,
    l1_ttl: Duration,
}

impl<L1, L2> LayeredCache<L1, L2> {
    pub fn new(l1: L1, l2: L2) -> Self {
        Self {
            near: l1,
            shared: l2,
            l1_ttl: DEFAULT_L1_TTL,
        }
    }

    /// Caps how long L1 keeps a copy.
    pub fn with_l1_ttl(mut self, ttl: Duration) -> Self {
        self.l1_ttl = ttl;
        self
    }

    pub fn l1(&self) -> &L1 {
        &self.near
    }

    pub fn l2(&self) -> &L2 {
        &self.shared
    }

    pub fn l1_ttl(&self) -> Duration {
        self.l1_ttl
    }

    /// TTL for an L1 copy of a write that lives `ttl` in L2.
    fn near_ttl(&self, ttl: Option<Duration>) -> Duration {
        ttl.map_or(self.l1_ttl, |ttl| ttl.min(self.l1_ttl))
    }
}

#[async_trait]
impl<L1: UrlCache, L2: UrlCache> UrlCache for LayeredCache<L1, L2> {
    async fn get_url(&self, code: &ShortCode) -> Result<Option<UrlRecord>> {
        if let Some(record) = self.near.get_url(code).await? {
            trace!(code = %code, layer = "l1", "layered hit");
            return Ok(Some(record));
        }

        let Some(record) = self.shared.get_url(code).await? else {
            trace!(code = %code, "layered miss");
            return Ok(None);
        };

        trace!(code = %code, layer = "l2", "layered hit, copying to l1");
        self.near.set_url(code, &record, Some(self.l1_ttl)).await?;
        Ok(Some(record))
    }

    async fn set_url(
        &self,
        code: &ShortCode,
        record: &UrlRecord,
        ttl: Option<Duration>,
    ) -> Result<()> {
        self.shared.set_url(code, record, ttl).await?;
        self.near.set_url(code, record, Some(self.near_ttl(ttl))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MokaUrlCache;

    type Stack = LayeredCache<MokaUrlCache, MokaUrlCache>;

    fn stack() -> Stack {
        LayeredCache::new(MokaUrlCache::with_capacity(64), MokaUrlCache::with_capacity(64))
    }

    fn fixture() -> (Stack, ShortCode, UrlRecord) {
        (
            stack(),
            ShortCode::new_unchecked("k1"),
            UrlRecord::new("https://example.com"),
        )
    }

    #[tokio::test]
    async fn l1_answers_without_l2() {
        let (cache, key, record) = fixture();

        cache.l1().set_url(&key, &record, None).await.unwrap();

        assert_eq!(cache.get_url(&key).await.unwrap(), Some(record));
        assert!(cache.l2().get_url(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn l2_hit_is_copied_into_l1() {
        let (cache, key, record) = fixture();

        cache.l2().set_url(&key, &record, None).await.unwrap();

        assert_eq!(cache.get_url(&key).await.unwrap(), Some(record.clone()));
        assert_eq!(cache.l1().get_url(&key).await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn writes_reach_both_layers() {
        let (cache, key, record) = fixture();

        cache
            .set_url(&key, &record, Some(Duration::from_secs(3600)))
            .await
            .unwrap();
        assert!(cache.l1().get_url(&key).await.unwrap().is_some());
        assert!(cache.l2().get_url(&key).await.unwrap().is_some());
        assert!(cache.get_url(&ShortCode::new_unchecked("k2")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn backfilled_l1_copy_expires() {
        let (cache, key, record) = fixture();
        assert_eq!(cache.l1_ttl(), DEFAULT_L1_TTL);
        let cache = cache.with_l1_ttl(Duration::from_millis(50));

        cache.l2().set_url(&key, &record, None).await.unwrap();
        assert_eq!(cache.get_url(&key).await.unwrap(), Some(record.clone()));
        assert!(cache.l1().get_url(&key).await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(cache.l1().get_url(&key).await.unwrap().is_none());
        assert_eq!(cache.l2().get_url(&key).await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn l1_copy_expires_before_l2() {
        let (cache, key, record) = fixture();
        let cache = cache.with_l1_ttl(Duration::from_millis(50));

        cache
            .set_url(&key, &record, Some(Duration::from_secs(3600)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(120)).await;

        assert!(cache.l1().get_url(&key).await.unwrap().is_none());
        assert_eq!(cache.l2().get_url(&key).await.unwrap(), Some(record));
    }

    #[test]
    fn l1_ttl_is_the_shorter_of_cap_and_write() {
        let capped = stack().with_l1_ttl(Duration::from_secs(60));

        assert_eq!(
            capped.near_ttl(Some(Duration::from_secs(10))),
            Duration::from_secs(10)
        );
        assert_eq!(
            capped.near_ttl(Some(Duration::from_secs(3600))),
            Duration::from_secs(60)
        );
        assert_eq!(capped.near_ttl(None), Duration::from_secs(60));
        assert_eq!(stack().near_ttl(None), DEFAULT_L1_TTL);
    }
}
