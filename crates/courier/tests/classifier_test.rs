//! Tests for the scoring service client.

mod test_utils;

use courier::{
    ClassifierClient, ClassifierConfig, CourierErrorKind, FetchErrorKind, RequestBody, ScoreItem,
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use test_utils::{Routed, RoutedRelay};
use tokio_util::sync::CancellationToken;

fn classifier(relay: &Arc<RoutedRelay>) -> ClassifierClient {
    let config = ClassifierConfig::default()
        .with_endpoint(Some("https://scores.test/score".to_string()))
        .with_max_text_chars(5);
    ClassifierClient::new(&config, Duration::from_secs(10), relay.clone()).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_scores_are_returned_unchanged() {
    let relay = Arc::new(RoutedRelay::new(|_| {
        Routed::json(json!([
            {"id": "t3_a", "score": 0.9, "reason": "spam", "flagged": true},
            {"id": "t3_b", "score": 0.1}
        ]))
    }));
    let items = vec![
        ScoreItem::new("t3_a", "Buy now", "cheap watches for everyone"),
        ScoreItem::new("t3_b", "Question", "how do lifetimes work"),
    ];

    let scores = classifier(&relay)
        .score(&items, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(scores.len(), 2);
    assert!(*scores[0].flagged());
    assert_eq!(scores[0].reason().as_deref(), Some("spam"));
    assert!(!*scores[1].flagged());

    let calls = relay.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].url, "https://scores.test/score");
    let Some(RequestBody::Json(body)) = &calls[0].body else {
        panic!("expected a JSON body");
    };
    let sent: Value = serde_json::from_str(body).unwrap();
    assert_eq!(sent[0]["text"], "cheap");
    assert_eq!(sent[1]["title"], "Question");
}

#[tokio::test(start_paused = true)]
async fn test_failure_is_not_retried() {
    let relay = Arc::new(RoutedRelay::new(|_| Routed::status(503)));
    let items = vec![ScoreItem::new("t3_a", "Title", "text")];

    let err = classifier(&relay)
        .score(&items, &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(relay.call_count(), 1);
    assert!(err.as_fetch().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_unexpected_shape_is_a_json_error() {
    let relay = Arc::new(RoutedRelay::new(|_| Routed::json(json!({"scores": []}))));
    let items = vec![ScoreItem::new("t3_a", "Title", "text")];

    let err = classifier(&relay)
        .score(&items, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err.kind(), CourierErrorKind::Json(_)));
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_scoring() {
    let relay = Arc::new(RoutedRelay::new(|_| {
        Routed::json(json!([])).after(Duration::from_secs(5))
    }));
    let token = CancellationToken::new();
    token.cancel();

    let err = classifier(&relay)
        .score(&[ScoreItem::new("t3_a", "Title", "text")], &token)
        .await
        .unwrap_err();

    assert_eq!(err.as_fetch().unwrap().kind, FetchErrorKind::Cancelled);
}

#[test]
fn test_missing_endpoint_is_rejected() {
    let relay = Arc::new(RoutedRelay::new(|_| Routed::status(200)));
    assert!(
        ClassifierClient::new(&ClassifierConfig::default(), Duration::from_secs(1), relay).is_err()
    );
}
