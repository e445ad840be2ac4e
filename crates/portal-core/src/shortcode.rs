use crate::base62;
use crate::error::ShortenerError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest code accepted by [`ShortCode::new`].
pub const MAX_LENGTH: usize = 32;

/// The public identifier of one shortened URL.
///
/// A string of base62 digits. Comparison is case-sensitive: `aB` and `Ab`
/// name different URLs.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShortCode(String);

impl ShortCode {
    /// Parses a code that came from outside, e.g. a request path.
    ///
    /// Accepts 1 to [`MAX_LENGTH`] characters from `[0-9a-zA-Z]`.
    pub fn new(code: impl Into<String>) -> Result<Self, ShortenerError> {
        let code = code.into();
        check(&code)?;
        Ok(Self(code))
    }

    /// Wraps a code produced by an id strategy, skipping the checks.
    pub fn new_unchecked(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// `base_url` joined with the code by exactly one `/`.
    pub fn to_url(&self, base_url: &str) -> String {
        let base = base_url.trim_end_matches('/');
        let mut url = String::with_capacity(base.len() + 1 + self.0.len());
        url.push_str(base);
        url.push('/');
        url.push_str(&self.0);
        url
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn check(code: &str) -> Result<(), ShortenerError> {
    if code.is_empty() || code.len() > MAX_LENGTH {
        return Err(ShortenerError::InvalidShortCode(format!(
            "expected 1..={MAX_LENGTH} characters, got {}",
            code.len()
        )));
    }
    if !base62::is_base62(code) {
        return Err(ShortenerError::InvalidShortCode(format!(
            "'{code}' is not base62"
        )));
    }
    Ok(())
}

impl fmt::Display for ShortCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ShortCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_base62_within_bounds() {
        for ok in ["0", "Abc123xyz", "ZZZZZZZ"] {
            assert!(ShortCode::new(ok).is_ok(), "{ok}");
        }
        assert!(ShortCode::new("z".repeat(MAX_LENGTH)).is_ok());
    }

    #[test]
    fn rejects_bad_lengths_and_symbols() {
        let long = "z".repeat(MAX_LENGTH + 1);
        for bad in ["", long.as_str(), "a b", "a/b", "a-b", "a_b", "é"] {
            assert!(
                matches!(ShortCode::new(bad), Err(ShortenerError::InvalidShortCode(_))),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn case_matters() {
        assert_ne!(ShortCode::new("aB").unwrap(), ShortCode::new("Ab").unwrap());
    }

    #[test]
    fn joins_base_url_with_one_slash() {
        let code = ShortCode::new("1c").unwrap();
        assert_eq!(code.to_url("http://localhost:8080"), "http://localhost:8080/1c");
        assert_eq!(code.to_url("http://localhost:8080//"), "http://localhost:8080/1c");
        assert_eq!(code.to_string(), "1c");
    }

    #[test]
    fn serializes_as_plain_string() {
        let code = ShortCode::new("q0Z").unwrap();
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"q0Z\"");
    }
}
