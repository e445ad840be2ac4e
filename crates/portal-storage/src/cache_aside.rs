use std::time::Duration;

use portal_core::repository::{Repository, Result, UrlRecord};
use portal_core::{ShortCode, UrlCache};
use tracing::{debug, trace, warn};

/// How long a mapping stays in the fast store after a write or a read-through.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Fronts a durable [`Repository`] with a [`UrlCache`].
///
/// The repository is the source of truth. The cache only ever holds copies
/// of durable records, so any cache failure degrades to a repository read
/// instead of failing the request.
///
/// - **Put**: insert into the repository, then cache with the configured TTL.
/// - **Get**: cache first; on a miss read the repository and repopulate the
///   cache. Absent codes are not cached.
#[derive(Debug, Clone)]
pub struct CacheAsideStore<R, C> {
    repository: R,
    cache: C,
    ttl: Duration,
}

impl<R: Repository, C: UrlCache> CacheAsideStore<R, C> {
    /// Creates a store using [`DEFAULT_CACHE_TTL`].
    pub fn new(repository: R, cache: C) -> Self {
        Self::with_ttl(repository, cache, DEFAULT_CACHE_TTL)
    }

    pub fn with_ttl(repository: R, cache: C, ttl: Duration) -> Self {
        Self {
            repository,
            cache,
            ttl,
        }
    }

    /// Returns a reference to the durable repository.
    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Returns a reference to the cache.
    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Persists a new mapping and warms the cache.
    ///
    /// Fails with `Conflict` if the code is already taken; the existing
    /// record is left untouched. A failed cache write is logged and ignored.
    pub async fn put(&self, code: &ShortCode, record: UrlRecord) -> Result<()> {
        trace!(code = %code, "persisting mapping");
        self.repository.insert(code, record.clone()).await?;

        if let Err(e) = self.cache.set_url(code, &record, Some(self.ttl)).await {
            warn!(code = %code, error = %e, "failed to cache new mapping");
        } else {
            debug!(code = %code, ttl_secs = self.ttl.as_secs(), "cached new mapping");
        }

        Ok(())
    }

    /// Looks a code up, preferring the cache.
    pub async fn get(&self, code: &ShortCode) -> Result<Option<UrlRecord>> {
        match self.cache.get_url(code).await {
            Ok(Some(record)) => {
                debug!(code = %code, "cache hit");
                return Ok(Some(record));
            }
            Ok(None) => {
                trace!(code = %code, "cache miss, reading repository");
            }
            Err(e) => {
                warn!(code = %code, error = %e, "cache read failed, falling back to repository");
            }
        }

        let Some(record) = self.repository.get(code).await? else {
            trace!(code = %code, "code not found");
            return Ok(None);
        };

        if let Err(e) = self.cache.set_url(code, &record, Some(self.ttl)).await {
            warn!(code = %code, error = %e, "failed to repopulate cache");
        }

        Ok(Some(record))
    }

    /// Reads the repository directly, bypassing the cache.
    ///
    /// Write-path decisions such as collision checks go through here so they
    /// never act on a cached copy.
    pub async fn find_durable(&self, code: &ShortCode) -> Result<Option<UrlRecord>> {
        self.repository.get(code).await
    }
}
