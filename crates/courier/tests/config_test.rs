//! Tests for configuration loading.

use courier::{CourierConfig, CourierErrorKind, RelayOrdering};
use std::io::Write;
use std::time::Duration;

#[test]
fn test_load_bundled_defaults() {
    let config = CourierConfig::load().unwrap();

    assert_eq!(*config.fetch().max_concurrent(), 3);
    assert_eq!(*config.fetch().max_retries(), 3);
    assert_eq!(config.fetch().base_backoff(), Duration::from_millis(500));
    assert_eq!(*config.api().more_children_chunk(), 20);
    assert!(config.relays().len() >= 2);
    assert!(config.relays().iter().any(|r| *r.supports_body_forwarding()));
    assert!(config.relay_directory().is_ok());
}

#[test]
fn test_from_file_with_partial_sections() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        r#"
[fetch]
max_concurrent = 5
relay_ordering = "fixed"

[cache.ttl]
listing_secs = 60

[[relays]]
name = "only"
template = "https://only.test/?u={{url}}"
supports_body_forwarding = true
"#
    )
    .unwrap();

    let config = CourierConfig::from_file(file.path()).unwrap();

    assert_eq!(*config.fetch().max_concurrent(), 5);
    assert_eq!(*config.fetch().max_retries(), 3);
    assert_eq!(*config.fetch().relay_ordering(), RelayOrdering::Fixed);
    assert_eq!(*config.cache().ttl().listing_secs(), 60);
    assert_eq!(*config.cache().ttl().about_secs(), 86_400);
    assert_eq!(config.relays().len(), 1);
    assert_eq!(config.api().base_url(), "https://www.reddit.com");
    assert_eq!(*config.classifier().endpoint(), None);
}

#[test]
fn test_relays_without_body_forwarding_are_rejected() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        r#"
[[relays]]
name = "reader"
template = "https://reader.test/{{raw}}"
"#
    )
    .unwrap();

    let config = CourierConfig::from_file(file.path()).unwrap();

    assert!(config.relay_directory().is_err());
}

#[test]
fn test_missing_file_is_a_config_error() {
    let err = CourierConfig::from_file("/definitely/not/here/courier.toml").unwrap_err();
    assert!(matches!(err.kind(), CourierErrorKind::Config(_)));
}
