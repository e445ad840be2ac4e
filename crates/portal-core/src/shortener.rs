use crate::shortcode::ShortCode;
use async_trait::async_trait;

type Result<T> = std::result::Result<T, crate::error::ShortenerError>;

/// The two operations the HTTP layer needs from the shortener.
#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Creates a shortened URL and returns its short code.
    ///
    /// `long_url` is expected to be an already validated absolute URL.
    async fn shorten(&self, long_url: &str) -> Result<ShortCode>;

    /// Resolves a short code to the URL it points at.
    /// Returns `None` if the code does not exist.
    async fn resolve(&self, code: &ShortCode) -> Result<Option<String>>;
}
