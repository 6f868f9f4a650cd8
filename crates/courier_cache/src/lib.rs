//! Response caching with category-dependent TTLs.
//!
//! This crate caches successful upstream payloads under their canonical
//! request URL. Each entry's lifetime depends on the [`ResourceCategory`] of
//! the URL: metadata changes rarely, feeds are time-sensitive.

#![warn(missing_docs)]

mod cache;
mod category;

pub use cache::{
    CachedResponse, ResponseCache, ResponseCacheConfig, ResponseCacheConfigBuilder,
};
pub use category::{CategoryTtls, ResourceCategory};
