//! Tests for shaping upstream envelopes.

mod test_utils;

use courier::{CommentThread, Entry, Listing, ResourceMetadata, expansion_entries};
use serde_json::json;
use test_utils::{comment, listing, more, post};

#[test]
fn test_unknown_kinds_are_skipped() {
    let value = listing(
        vec![
            post("a", "First"),
            json!({"kind": "t5", "data": {"display_name": "rust"}}),
            json!({"kind": "t2", "data": {"name": "someone"}}),
            post("b", "Second"),
        ],
        Some("t3_b"),
    );

    let page = Listing::from_value(value).unwrap();

    assert_eq!(page.entries().len(), 2);
    assert!(page.entries().iter().all(|e| matches!(e, Entry::Post(_))));
}

#[test]
fn test_empty_cursor_is_none() {
    let page = Listing::from_value(listing(vec![], Some(""))).unwrap();
    assert_eq!(*page.after(), None);
}

#[test]
fn test_malformed_known_kind_is_an_error() {
    let value = listing(vec![json!({"kind": "t3", "data": {"title": "no id"}})], None);
    assert!(Listing::from_value(value).is_err());
}

#[test]
fn test_replies_accept_empty_string_and_listing() {
    let leaf = comment("c2", "t1_c1", json!(""));
    let parent = comment("c1", "t3_post", listing(vec![leaf, more("m", "t1_c1", &["c9"])], None));

    let Some(Entry::Comment(parent)) = Entry::from_thing("t1", parent["data"].clone()).unwrap()
    else {
        panic!("expected a comment");
    };

    assert_eq!(parent.replies().len(), 2);
    let Entry::Comment(leaf) = &parent.replies()[0] else {
        panic!("expected a comment");
    };
    assert!(leaf.replies().is_empty());
    assert!(matches!(parent.replies()[1], Entry::More(_)));
}

#[test]
fn test_thread_requires_two_listings() {
    assert!(CommentThread::from_value(json!([listing(vec![post("a", "A")], None)])).is_err());
    assert!(CommentThread::from_value(json!({"kind": "Listing"})).is_err());
    assert!(CommentThread::from_value(json!([listing(vec![], None), listing(vec![], None)])).is_err());
}

#[test]
fn test_merge_removes_nested_placeholder() {
    let value = json!([
        listing(vec![post("post", "A post")], None),
        listing(
            vec![comment(
                "c1",
                "t3_post",
                listing(vec![more("m1", "t1_c1", &["c2"])], None),
            )],
            None,
        ),
    ]);
    let mut thread = CommentThread::from_value(value).unwrap();
    assert_eq!(thread.more_placeholders().len(), 1);

    let expanded = expansion_entries(json!({"json": {"errors": [], "data": {"things": [
        comment("c2", "t1_c1", json!("")),
    ]}}}))
    .unwrap();
    thread.merge_expanded("m1", expanded);

    assert!(thread.more_placeholders().is_empty());
    let Entry::Comment(c1) = &thread.comments()[0] else {
        panic!("expected a comment");
    };
    let names: Vec<_> = c1.replies().iter().map(Entry::name).collect();
    assert_eq!(names, ["t1_c2"]);
}

#[test]
fn test_expansion_without_things_is_an_error() {
    assert!(expansion_entries(json!({"json": {"errors": []}})).is_err());
}

#[test]
fn test_metadata_requires_t5() {
    assert!(ResourceMetadata::from_value(json!({"kind": "Listing", "data": {}})).is_err());
    let about = ResourceMetadata::from_value(json!({
        "kind": "t5",
        "data": {"display_name": "rust", "over18": true}
    }))
    .unwrap();
    assert!(*about.over_18());
    assert_eq!(*about.subscribers(), None);
}
