use crate::error::StorageError;
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

pub type Result<T> = std::result::Result<T, StorageError>;

/// What a short code points at. Never changes after the first insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlRecord {
    pub original_url: String,
    pub created_at: Timestamp,
}

impl UrlRecord {
    /// A record for `original_url` created now.
    pub fn new(original_url: impl Into<String>) -> Self {
        Self {
            original_url: original_url.into(),
            created_at: Timestamp::now(),
        }
    }
}

/// Lookups against the durable store.
#[async_trait]
pub trait ReadRepository: Send + Sync + 'static {
    /// `Ok(None)` when nothing was ever stored under `code`.
    async fn get(&self, code: &ShortCode) -> Result<Option<UrlRecord>>;
}

/// The durable store: the one place a mapping counts as created.
#[async_trait]
pub trait Repository: ReadRepository {
    /// Stores `record` under a code that has never been used.
    ///
    /// A taken code yields [`StorageError::Conflict`] and the stored record
    /// stays as it was.
    async fn insert(&self, code: &ShortCode, record: UrlRecord) -> Result<()>;
}
