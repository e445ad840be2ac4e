use thiserror::Error;

/// Why a string is not a base62 number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("cannot decode an empty string")]
    Empty,
    #[error("invalid base62 character '{character}' at position {position}")]
    InvalidCharacter { character: char, position: usize },
    #[error("base62 value overflows u64: {0}")]
    Overflow(String),
}

/// Failures of a cache or counter backend.
///
/// Cache reads and writes treat these as a miss; only the counter lets them
/// reach the caller.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache operation timed out: {0}")]
    Timeout(String),
    #[error("cache serialization failed: {0}")]
    Serialization(String),
    #[error("cache value is invalid: {0}")]
    InvalidData(String),
    #[error("cache operation failed: {0}")]
    Operation(String),
}

/// Failures of the durable store.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("short code already exists: {0}")]
    Conflict(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
}

impl StorageError {
    /// The store was unreachable or too slow, as opposed to refusing the request.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StorageError::Unavailable(_) | StorageError::Timeout(_))
    }
}

/// Errors surfaced by the shortener to its callers.
#[derive(Debug, Clone, Error)]
pub enum ShortenerError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("invalid short code: {0}")]
    InvalidShortCode(String),
    #[error("short code {code} already maps to a different url: {existing_url}")]
    HashCollision { code: String, existing_url: String },
    #[error("id counter failed: {0}")]
    Counter(#[source] CacheError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<DecodeError> for ShortenerError {
    fn from(value: DecodeError) -> Self {
        Self::InvalidShortCode(value.to_string())
    }
}
