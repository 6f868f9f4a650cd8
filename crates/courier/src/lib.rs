//! Courier - resilient relayed access to a content platform's JSON API.
//!
//! Every upstream call is relayed through one of several unreliable public
//! relays. Courier turns "fetch this listing" into a reliably completed
//! operation despite relay failures, rate limiting and slow networks, and
//! avoids redundant traffic with a category-aware response cache.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use courier::{CourierClient, CourierConfig, ListingQuery};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = CourierClient::new(&CourierConfig::load()?)?;
//!     let page = client.listing(&ListingQuery::new("rust")).await?;
//!     println!("{} posts, next page: {:?}", page.entries().len(), page.after());
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `courier_error` - Error types
//! - `courier_cache` - Response cache with per-category TTLs
//! - `courier_fetch` - Relay rotation, admission control and retry
//! - `courier` - Resource façade, typed model, configuration and CLI
//!
//! This crate re-exports the lower crates for convenience.
//!
//! # Cargo Features
//!
//! - `observability` - Export spans through OpenTelemetry

#![warn(missing_docs)]

mod classify;
mod client;
mod config;
mod model;
mod urls;

pub mod observability;

pub use classify::{ClassifierClient, ContentScore, ScoreItem};
pub use client::CourierClient;
pub use config::{
    ApiConfig, ApiConfigBuilder, ClassifierConfig, ClassifierConfigBuilder, CourierConfig,
};
pub use model::{
    Comment, CommentThread, Entry, Listing, MoreChildren, Post, ResourceMetadata,
    expansion_entries,
};
pub use urls::{ApiUrls, CommentsQuery, ListingQuery, SearchQuery, SearchSort, Sort, TimeWindow};

pub use courier_cache::*;
pub use courier_error::*;
pub use courier_fetch::*;
