use std::sync::Arc;

use async_trait::async_trait;
use portal_core::{
    Repository, ShortCode, Shortener, ShortenerError, StorageError, UrlCache, UrlRecord,
};
use portal_generator::{DerivedCode, GeneratedCode, IdStrategy};
use portal_storage::CacheAsideStore;
use tracing::{debug, trace, warn};

use crate::policy::CollisionPolicy;

type Result<T> = std::result::Result<T, ShortenerError>;

/// Outcome of trying to claim one derived code.
enum Claim {
    /// The code now maps to our URL, either freshly or from an earlier call.
    Owned,
    /// The code maps to a different URL.
    Taken { existing_url: String },
}

/// A concrete implementation of the `Shortener` trait.
///
/// This service wraps an [`IdStrategy`] and a [`CacheAsideStore`] to handle:
/// - Short code generation
/// - Collision checks for content-derived codes
/// - Resolution through the cache
///
/// Collision checks always read the durable store, never the cache.
#[derive(Debug, Clone)]
pub struct ShortenerService<R, C, S> {
    store: Arc<CacheAsideStore<R, C>>,
    strategy: Arc<S>,
    policy: CollisionPolicy,
}

impl<R: Repository, C: UrlCache, S: IdStrategy> ShortenerService<R, C, S> {
    /// Creates a service that rejects collisions.
    pub fn new(store: CacheAsideStore<R, C>, strategy: S) -> Self {
        Self::with_policy(store, strategy, CollisionPolicy::default())
    }

    pub fn with_policy(store: CacheAsideStore<R, C>, strategy: S, policy: CollisionPolicy) -> Self {
        Self {
            store: Arc::new(store),
            strategy: Arc::new(strategy),
            policy,
        }
    }

    pub fn store(&self) -> &CacheAsideStore<R, C> {
        &self.store
    }

    pub fn policy(&self) -> CollisionPolicy {
        self.policy
    }

    async fn place_derived(&self, long_url: &str, derived: &DerivedCode) -> Result<ShortCode> {
        let mut collision = None;

        for length in self.policy.candidate_lengths(derived.length()) {
            let code = derived.with_length(length);

            match self.claim(&code, long_url).await? {
                Claim::Owned => return Ok(code),
                Claim::Taken { existing_url } => {
                    warn!(
                        code = %code,
                        existing_url = %existing_url,
                        requested_url = %long_url,
                        "hash collision on derived code"
                    );
                    collision = Some((code, existing_url));
                }
            }
        }

        match collision {
            Some((code, existing_url)) => Err(ShortenerError::HashCollision {
                code: code.to_string(),
                existing_url,
            }),
            None => Err(ShortenerError::InvalidShortCode(format!(
                "no candidate lengths for derived code {}",
                derived.encoded()
            ))),
        }
    }

    async fn claim(&self, code: &ShortCode, long_url: &str) -> Result<Claim> {
        if let Some(existing) = self.store.find_durable(code).await? {
            return Ok(Self::compare(code, existing, long_url));
        }

        match self.store.put(code, UrlRecord::new(long_url)).await {
            Ok(()) => {
                debug!(code = %code, "stored derived code");
                Ok(Claim::Owned)
            }
            Err(StorageError::Conflict(_)) => {
                // Another writer inserted the code between our read and insert.
                trace!(code = %code, "lost insert race, re-reading");
                match self.store.find_durable(code).await? {
                    Some(existing) => Ok(Self::compare(code, existing, long_url)),
                    None => Err(StorageError::Conflict(code.to_string()).into()),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    fn compare(code: &ShortCode, existing: UrlRecord, long_url: &str) -> Claim {
        if existing.original_url == long_url {
            debug!(code = %code, "url already shortened");
            Claim::Owned
        } else {
            Claim::Taken {
                existing_url: existing.original_url,
            }
        }
    }
}

#[async_trait]
impl<R, C, S> Shortener for ShortenerService<R, C, S>
where
    R: Repository,
    C: UrlCache,
    S: IdStrategy,
{
    async fn shorten(&self, long_url: &str) -> Result<ShortCode> {
        if long_url.is_empty() {
            return Err(ShortenerError::InvalidUrl(
                "URL cannot be empty".to_string(),
            ));
        }

        match self.strategy.generate(long_url).await? {
            GeneratedCode::Unique(code) => {
                self.store.put(&code, UrlRecord::new(long_url)).await?;
                debug!(code = %code, "stored generated code");
                Ok(code)
            }
            GeneratedCode::Derived(derived) => self.place_derived(long_url, &derived).await,
        }
    }

    async fn resolve(&self, code: &ShortCode) -> Result<Option<String>> {
        trace!(code = %code, "resolving short code");
        let record = self.store.get(code).await?;
        Ok(record.map(|record| record.original_url))
    }
}
