use std::sync::Arc;

use portal_core::Shortener;

/// Shared by every handler; cloning only bumps the `Arc`.
#[derive(Clone)]
pub struct AppState {
    shortener: Arc<dyn Shortener>,
    base_url: Arc<str>,
}

impl AppState {
    pub fn new(shortener: Arc<dyn Shortener>, base_url: impl Into<String>) -> Self {
        Self {
            shortener,
            base_url: Arc::from(base_url.into()),
        }
    }

    pub fn shortener(&self) -> &dyn Shortener {
        &*self.shortener
    }

    /// Prefix the short code is appended to, e.g. `https://pt.example`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
