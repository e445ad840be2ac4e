//! URL shortener service implementation.
//!
//! [`ShortenerService`] ties an [`IdStrategy`](portal_generator::IdStrategy)
//! to a [`CacheAsideStore`](portal_storage::CacheAsideStore) and implements
//! the [`Shortener`](portal_core::Shortener) trait on top of them.

pub mod policy;
pub mod service;

pub use policy::CollisionPolicy;
pub use service::ShortenerService;
