//! Test utilities for fetcher tests.
//!
//! This module provides a scripted relay transport and fixture helpers.

#![allow(dead_code)]

use courier_cache::ResponseCache;
use courier_fetch::{FetchConfig, RelayBuilder, RelayDirectory, RelayOrdering, ResilientFetcher};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;

pub mod mock_relay;

#[allow(unused_imports)]
pub use mock_relay::{MockBehavior, MockRelay, MockReply, RecordedCall};

/// Relays in fixed order: one body-forwarding primary, two read-only mirrors.
pub fn test_relays() -> Vec<RelayBuilder> {
    vec![
        RelayBuilder::new("primary", "https://primary.test/{raw}").with_body_forwarding(true),
        RelayBuilder::new("mirror", "https://mirror.test/get?url={raw}"),
        RelayBuilder::new("fallback", "https://fallback.test/fetch/"),
    ]
}

/// Fetcher over the test relays with fixed ordering and seeded jitter.
pub fn create_test_fetcher(relay: &Arc<MockRelay>, config: FetchConfig) -> ResilientFetcher {
    let directory =
        RelayDirectory::with_rng(test_relays(), RelayOrdering::Fixed, StdRng::seed_from_u64(7))
            .expect("Test relays are valid");
    ResilientFetcher::new(config, directory, ResponseCache::default(), relay.clone())
        .with_jitter_rng(StdRng::seed_from_u64(42))
}

/// Canonical URL of a listing page.
pub fn listing_url(category: &str) -> String {
    format!("https://www.reddit.com/r/{}/hot.json?limit=25&raw_json=1", category)
}

/// Minimal listing body.
pub fn listing_body() -> &'static str {
    r#"{"kind":"Listing","data":{"after":"t3_next","before":null,"children":[]}}"#
}
