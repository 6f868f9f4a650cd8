//! Test utilities for façade tests.
//!
//! This module provides a routing relay transport and JSON fixtures.

#![allow(dead_code)]

use courier::{
    ApiConfig, ClassifierConfig, CourierClient, CourierConfig, FetchConfig, RelayBuilder,
    RelayOrdering, ResponseCacheConfig,
};
use serde_json::{Value, json};
use std::sync::Arc;

pub mod routed_relay;

#[allow(unused_imports)]
pub use routed_relay::{Routed, RoutedRelay};

/// Prefix the test relay puts in front of every target URL.
pub const RELAY_PREFIX: &str = "https://relay.test/";

/// Configuration with a single pass-through relay in fixed order.
pub fn test_config() -> CourierConfig {
    CourierConfig::new(
        FetchConfig::default().with_relay_ordering(RelayOrdering::Fixed),
        ResponseCacheConfig::default(),
        vec![
            RelayBuilder::new("relay", format!("{}{{raw}}", RELAY_PREFIX))
                .with_body_forwarding(true),
        ],
        ApiConfig::default(),
        ClassifierConfig::default(),
    )
}

/// Client over a routed relay.
pub fn create_test_client(relay: &Arc<RoutedRelay>) -> CourierClient {
    CourierClient::with_transport(&test_config(), relay.clone()).expect("Test config is valid")
}

/// Listing envelope around the given children.
pub fn listing(children: Vec<Value>, after: Option<&str>) -> Value {
    json!({
        "kind": "Listing",
        "data": {"after": after, "before": null, "children": children}
    })
}

/// A `t3` thing.
pub fn post(id: &str, title: &str) -> Value {
    json!({
        "kind": "t3",
        "data": {
            "id": id,
            "name": format!("t3_{}", id),
            "title": title,
            "author": "ferris",
            "subreddit": "rust",
            "selftext": "",
            "permalink": format!("/r/rust/comments/{}/post/", id),
            "score": 42,
            "num_comments": 3,
            "created_utc": 1_700_000_000.0
        }
    })
}

/// A `t1` thing with optional replies.
pub fn comment(id: &str, parent: &str, replies: Value) -> Value {
    json!({
        "kind": "t1",
        "data": {
            "id": id,
            "name": format!("t1_{}", id),
            "parent_id": parent,
            "link_id": "t3_post",
            "author": "crab",
            "body": format!("comment {}", id),
            "score": 1,
            "replies": replies
        }
    })
}

/// A `more` thing.
pub fn more(id: &str, parent: &str, children: &[&str]) -> Value {
    json!({
        "kind": "more",
        "data": {
            "id": id,
            "name": format!("t1_{}", id),
            "parent_id": parent,
            "count": children.len(),
            "depth": 0,
            "children": children
        }
    })
}
