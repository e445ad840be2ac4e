use async_trait::async_trait;
use portal_core::ShortenerError;
use sha2::{Digest, Sha256};
use tracing::trace;
use typed_builder::TypedBuilder;

use crate::{DerivedCode, GeneratedCode, IdStrategy, PREFIX_BYTES};

/// A 256-bit digest of a long URL.
pub type UrlDigest = [u8; 32];

/// A digest function applied to the long URL.
pub trait UrlHasher: Send + Sync + 'static {
    fn digest(&self, input: &[u8]) -> UrlDigest;
}

/// SHA-256, the default [`UrlHasher`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl UrlHasher for Sha256Hasher {
    fn digest(&self, input: &[u8]) -> UrlDigest {
        Sha256::digest(input).into()
    }
}

#[derive(Debug, Clone, TypedBuilder)]
pub struct HashSettings {
    /// Characters in the default code.
    #[builder(default = 7)]
    length: usize,
}

impl Default for HashSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl HashSettings {
    pub fn length(&self) -> usize {
        self.length
    }
}

/// Derives the code from a digest of the URL.
///
/// The first 8 bytes of the digest are read as a big-endian `u64`,
/// base62-encoded, and cut to the configured length. The same URL always
/// yields the same code, which also means two URLs can yield the same code.
#[derive(Debug, Clone)]
pub struct HashStrategy<H = Sha256Hasher> {
    hasher: H,
    settings: HashSettings,
}

impl HashStrategy<Sha256Hasher> {
    pub fn new(settings: HashSettings) -> Self {
        Self::with_hasher(Sha256Hasher, settings)
    }
}

impl Default for HashStrategy<Sha256Hasher> {
    fn default() -> Self {
        Self::new(HashSettings::default())
    }
}

impl<H: UrlHasher> HashStrategy<H> {
    pub fn with_hasher(hasher: H, settings: HashSettings) -> Self {
        Self { hasher, settings }
    }

    pub fn settings(&self) -> &HashSettings {
        &self.settings
    }

    /// Computes the derived code for `long_url` without going through the trait.
    pub fn derive(&self, long_url: &str) -> DerivedCode {
        let digest = self.hasher.digest(long_url.as_bytes());
        let prefix: [u8; PREFIX_BYTES] = std::array::from_fn(|i| digest[i]);
        DerivedCode::new(prefix, self.settings.length)
    }
}

#[async_trait]
impl<H: UrlHasher> IdStrategy for HashStrategy<H> {
    async fn generate(&self, long_url: &str) -> Result<GeneratedCode, ShortenerError> {
        let derived = self.derive(long_url);
        trace!(code = %derived.code(), "derived code from url digest");
        Ok(GeneratedCode::Derived(derived))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Returns the same digest for every input.
    struct FixedHasher(UrlDigest);

    impl UrlHasher for FixedHasher {
        fn digest(&self, _input: &[u8]) -> UrlDigest {
            self.0
        }
    }

    fn derived(generated: GeneratedCode) -> DerivedCode {
        match generated {
            GeneratedCode::Derived(derived) => derived,
            other => panic!("expected a derived code, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn sha256_codes_are_known_values() {
        let strategy = HashStrategy::default();

        let code = derived(strategy.generate("https://example.com").await.unwrap());
        assert_eq!(code.encoded(), "1niM5DUDjE1");
        assert_eq!(code.code().as_str(), "1niM5DU");

        let code = derived(strategy.generate("https://www.google.com").await.unwrap());
        assert_eq!(code.code().as_str(), "eNN4YI4");
    }

    #[tokio::test]
    async fn same_url_same_code() {
        let strategy = HashStrategy::default();

        let first = strategy.generate("https://example.com/a").await.unwrap();
        let second = strategy.generate("https://example.com/a").await.unwrap();
        let other = strategy.generate("https://example.com/b").await.unwrap();

        assert_eq!(first, second);
        assert_ne!(first, other);
    }

    #[tokio::test]
    async fn length_is_configurable() {
        let strategy = HashStrategy::new(HashSettings::builder().length(10).build());

        let code = derived(strategy.generate("https://example.com").await.unwrap());
        assert_eq!(code.code().as_str(), "1niM5DUDjE");
        assert_eq!(code.length(), 10);
    }

    #[tokio::test]
    async fn only_leading_eight_bytes_matter() {
        let a = HashStrategy::with_hasher(FixedHasher([0xff; 32]), HashSettings::default());
        let mut tail_differs = [0u8; 32];
        tail_differs[..8].fill(0xff);
        let b = HashStrategy::with_hasher(FixedHasher(tail_differs), HashSettings::default());

        assert_eq!(a.derive("x"), b.derive("y"));
        assert_eq!(a.derive("x").encoded(), "lYGhA16ahyf");
    }

    #[test]
    fn small_prefix_is_zero_padded_to_length() {
        let mut digest = [0u8; 32];
        digest[7] = 1;
        digest[8] = 0xff;
        let strategy = HashStrategy::with_hasher(FixedHasher(digest), HashSettings::default());

        let code = strategy.derive("anything");
        assert_eq!(code.encoded(), "1");
        assert_eq!(code.code().as_str(), "0000001");
    }
}
