use std::fmt;
use std::sync::Arc;

use harsh::Harsh;
use portal_core::shortcode::MAX_LENGTH;
use thiserror::Error;
use typed_builder::TypedBuilder;

#[derive(Debug, Clone, TypedBuilder)]
/// Settings for hiding sequential counter values behind salted codes.
pub struct ObfuscationSettings {
    #[builder(setter(into))]
    salt: String,
    /// Codes shorter than this are padded with extra symbols.
    #[builder(default = 6)]
    min_length: usize,
}

impl ObfuscationSettings {
    pub fn min_length(&self) -> usize {
        self.min_length
    }
}

#[derive(Debug, Error)]
pub enum ObfuscationError {
    #[error("minimum length {0} exceeds the longest allowed code")]
    TooLong(usize),
    #[error("invalid hashids settings: {0}")]
    Build(String),
}

/// Hashids encoding of counter values.
///
/// Consecutive ids produce unrelated looking codes, and each code decodes
/// back to the id it came from. All symbols are ASCII alphanumerics.
#[derive(Clone)]
pub struct Obfuscator {
    harsh: Arc<Harsh>,
    min_length: usize,
}

impl Obfuscator {
    pub fn new(settings: &ObfuscationSettings) -> Result<Self, ObfuscationError> {
        if settings.min_length > MAX_LENGTH {
            return Err(ObfuscationError::TooLong(settings.min_length));
        }

        let harsh = Harsh::builder()
            .salt(settings.salt.as_bytes())
            .length(settings.min_length)
            .build()
            .map_err(|e| ObfuscationError::Build(e.to_string()))?;

        Ok(Self {
            harsh: Arc::new(harsh),
            min_length: settings.min_length,
        })
    }

    pub fn encode(&self, id: u64) -> String {
        self.harsh.encode(&[id])
    }

    /// Recovers the id behind `code`, or `None` if this obfuscator did not
    /// produce it.
    pub fn decode(&self, code: &str) -> Option<u64> {
        match self.harsh.decode(code).ok()?.as_slice() {
            [id] => Some(*id),
            _ => None,
        }
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }
}

// The salt stays out of logs.
impl fmt::Debug for Obfuscator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Obfuscator")
            .field("min_length", &self.min_length)
            .finish_non_exhaustive()
    }
}
