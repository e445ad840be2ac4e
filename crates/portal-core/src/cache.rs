use crate::error::CacheError;
use crate::repository::UrlRecord;
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use std::time::Duration;

pub type Result<T> = std::result::Result<T, CacheError>;

/// Fast, non-authoritative copies of URL records keyed by short code.
///
/// An empty answer only means "ask the repository".
#[async_trait]
pub trait UrlCache: Send + Sync + 'static {
    async fn get_url(&self, code: &ShortCode) -> Result<Option<UrlRecord>>;

    /// Writes `record` under `code`, replacing any previous copy.
    ///
    /// With `ttl` set the entry disappears after that long; without it the
    /// backend's own default applies.
    async fn set_url(
        &self,
        code: &ShortCode,
        record: &UrlRecord,
        ttl: Option<Duration>,
    ) -> Result<()>;
}

/// A shared id counter that only moves up.
///
/// Each [`Counter::next`] is a single atomic increment in the backing store,
/// so no value is handed out twice.
#[async_trait]
pub trait Counter: Send + Sync + 'static {
    /// Increments and returns the new value.
    async fn next(&self) -> Result<u64>;
}
