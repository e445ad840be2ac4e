//! Core types and traits for the Portal URL shortener.
//!
//! This crate provides the base62 encoder, the short code and record types,
//! and the store traits shared by the ID strategies, the storage layer and
//! the shortener service.

pub mod base62;
pub mod cache;
pub mod error;
pub mod repository;
pub mod shortcode;
pub mod shortener;

pub use cache::{Counter, UrlCache};
pub use error::{CacheError, DecodeError, ShortenerError, StorageError};
pub use repository::{ReadRepository, Repository, UrlRecord};
pub use shortcode::ShortCode;
pub use shortener::Shortener;
