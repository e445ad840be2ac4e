//! Short code generation strategies.
//!
//! Every strategy implements [`IdStrategy`]. A counter-based strategy hands
//! out codes that are unique by construction, while a hash-based strategy
//! derives the code from the URL itself and leaves the collision check to the
//! caller.

pub mod counter;
pub mod hash;
pub mod obfuscated;

pub use counter::CounterStrategy;
pub use hash::{HashSettings, HashStrategy, Sha256Hasher, UrlDigest, UrlHasher};
pub use obfuscated::{ObfuscationError, ObfuscationSettings, Obfuscator};

use async_trait::async_trait;
use portal_core::base62;
use portal_core::{ShortCode, ShortenerError};

/// Digest bytes a derived code is computed from.
pub const PREFIX_BYTES: usize = 8;

/// A content-derived code that may collide with an existing one.
///
/// Holds the digest prefix so callers can render the code at other lengths
/// when the default one is taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedCode {
    prefix: [u8; PREFIX_BYTES],
    length: usize,
}

impl DerivedCode {
    pub fn new(prefix: [u8; PREFIX_BYTES], length: usize) -> Self {
        Self { prefix, length }
    }

    /// The code at its default length.
    pub fn code(&self) -> ShortCode {
        self.with_length(self.length)
    }

    /// The code truncated or zero-padded to `length` characters.
    pub fn with_length(&self, length: usize) -> ShortCode {
        ShortCode::new_unchecked(base62::encode_hash_prefix(self.prefix, length))
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// The untruncated encoding the code is cut from.
    pub fn encoded(&self) -> String {
        base62::encode_bytes(self.prefix)
    }

    pub fn prefix(&self) -> [u8; PREFIX_BYTES] {
        self.prefix
    }
}

/// The output of an [`IdStrategy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedCode {
    /// Collision-free by construction; safe to persist directly.
    Unique(ShortCode),
    /// Derived from the URL; must be checked against the durable store.
    Derived(DerivedCode),
}

impl GeneratedCode {
    /// The code a caller would try first.
    pub fn code(&self) -> ShortCode {
        match self {
            GeneratedCode::Unique(code) => code.clone(),
            GeneratedCode::Derived(derived) => derived.code(),
        }
    }
}

/// Trait for generating short codes.
///
/// Implementations never touch the durable store; deciding whether a derived
/// code is free is up to the caller.
#[async_trait]
pub trait IdStrategy: Send + Sync + 'static {
    /// Produces a candidate short code for `long_url`.
    async fn generate(&self, long_url: &str) -> Result<GeneratedCode, ShortenerError>;
}
