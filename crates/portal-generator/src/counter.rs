use async_trait::async_trait;
use portal_core::{base62, Counter, ShortCode, ShortenerError};
use tracing::trace;

use crate::obfuscated::Obfuscator;
use crate::{GeneratedCode, IdStrategy};

/// Generates codes from the next value of a shared counter.
///
/// Uniqueness rests on the counter: every call is one atomic increment, so
/// two calls never see the same value. The same URL shortened twice gets two
/// different codes. Values are base62-encoded unless an [`Obfuscator`] is
/// set, in which case they become salted hashids.
#[derive(Debug, Clone)]
pub struct CounterStrategy<C> {
    counter: C,
    obfuscator: Option<Obfuscator>,
}

impl<C: Counter> CounterStrategy<C> {
    pub fn new(counter: C) -> Self {
        Self {
            counter,
            obfuscator: None,
        }
    }

    pub fn with_obfuscator(counter: C, obfuscator: Obfuscator) -> Self {
        Self {
            counter,
            obfuscator: Some(obfuscator),
        }
    }

    pub fn counter(&self) -> &C {
        &self.counter
    }

    pub fn encode(&self, id: u64) -> String {
        match &self.obfuscator {
            Some(obfuscator) => obfuscator.encode(id),
            None => base62::encode(id),
        }
    }

    /// The counter value `code` was generated from.
    pub fn id_of(&self, code: &ShortCode) -> Option<u64> {
        match &self.obfuscator {
            Some(obfuscator) => obfuscator.decode(code.as_str()),
            None => base62::decode(code.as_str()).ok(),
        }
    }
}

#[async_trait]
impl<C: Counter> IdStrategy for CounterStrategy<C> {
    async fn generate(&self, _long_url: &str) -> Result<GeneratedCode, ShortenerError> {
        let id = self.counter.next().await.map_err(ShortenerError::Counter)?;
        let code = self.encode(id);
        trace!(id, code = %code, "allocated counter id");
        Ok(GeneratedCode::Unique(ShortCode::new_unchecked(code)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_cache::InMemoryCounter;
    use crate::obfuscated::ObfuscationSettings;
    use portal_core::CacheError;
    use std::collections::HashSet;

    struct BrokenCounter;

    #[async_trait]
    impl Counter for BrokenCounter {
        async fn next(&self) -> portal_core::cache::Result<u64> {
            Err(CacheError::Unavailable("redis is down".into()))
        }
    }

    fn unique(generated: GeneratedCode) -> ShortCode {
        match generated {
            GeneratedCode::Unique(code) => code,
            other => panic!("expected a unique code, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn codes_follow_counter_values() {
        let strategy = CounterStrategy::new(InMemoryCounter::new());

        let first = unique(strategy.generate("https://example.com").await.unwrap());
        let second = unique(strategy.generate("https://example.com").await.unwrap());

        assert_eq!(first.as_str(), "1");
        assert_eq!(second.as_str(), "2");
    }

    #[tokio::test]
    async fn starting_offset_shifts_codes() {
        let strategy = CounterStrategy::new(InMemoryCounter::starting_at(61));

        let code = unique(strategy.generate("https://example.com").await.unwrap());
        assert_eq!(code.as_str(), "10");
    }

    #[tokio::test]
    async fn underlying_ids_strictly_increase() {
        let strategy = CounterStrategy::new(InMemoryCounter::new());
        let mut previous = 0;
        let mut seen = HashSet::new();

        for _ in 0..500 {
            let code = unique(strategy.generate("https://example.com").await.unwrap());
            let id = strategy.id_of(&code).unwrap();
            assert!(id > previous);
            previous = id;
            assert!(seen.insert(code));
        }
    }

    #[tokio::test]
    async fn obfuscated_codes_map_back_to_counter_values() {
        let settings = ObfuscationSettings::builder()
            .salt("portal")
            .min_length(8)
            .build();
        let strategy =
            CounterStrategy::with_obfuscator(InMemoryCounter::new(), Obfuscator::new(&settings).unwrap());

        let mut seen = HashSet::new();
        for expected in 1..=300 {
            let code = unique(strategy.generate("https://example.com").await.unwrap());
            assert!(code.as_str().len() >= 8);
            assert!(ShortCode::new(code.as_str()).is_ok());
            assert_eq!(strategy.id_of(&code), Some(expected));
            assert!(seen.insert(code));
        }
    }

    #[tokio::test]
    async fn obfuscated_codes_hide_the_sequence() {
        let settings = ObfuscationSettings::builder().salt("portal").build();
        let strategy =
            CounterStrategy::with_obfuscator(InMemoryCounter::new(), Obfuscator::new(&settings).unwrap());

        let first = unique(strategy.generate("https://example.com").await.unwrap());
        assert_ne!(first.as_str(), "1");
        assert_eq!(first.as_str(), strategy.encode(1));
    }

    #[tokio::test]
    async fn counter_failure_surfaces_as_counter_error() {
        let strategy = CounterStrategy::new(BrokenCounter);

        let err = strategy.generate("https://example.com").await.unwrap_err();
        assert!(matches!(err, ShortenerError::Counter(CacheError::Unavailable(_))));
    }
}
