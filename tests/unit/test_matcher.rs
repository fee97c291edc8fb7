//! Matching rules exercised through the public API

use pactsmith::matcher::{self, Mismatch};
use pactsmith::{ObservedRequest, Request};
use serde_json::json;

#[test]
fn test_query_and_headers_are_partial() {
    let expected = Request::get("/users")
        .with_query("page", "2")
        .with_header("Accept", "application/json");
    let observed = ObservedRequest::from_target("get", "/users?page=2&limit=10")
        .with_header("accept", "APPLICATION/JSON")
        .with_header("User-Agent", "reqwest");

    assert!(matcher::matches(&expected, &observed));
}

#[test]
fn test_each_dimension_reports_its_mismatch() {
    let expected = Request::post("/users")
        .with_query("dry_run", "true")
        .with_header("X-Api-Key", "secret")
        .with_body(json!({"name": "Jane"}));
    let good = ObservedRequest::from_target("POST", "/users?dry_run=true")
        .with_header("x-api-key", "secret")
        .with_body(r#"{"name":"Jane","age":30}"#);
    assert!(matcher::check(&expected, &good).is_ok());

    let wrong_method = ObservedRequest { method: "PUT".into(), ..good.clone() };
    assert!(matches!(
        matcher::check(&expected, &wrong_method),
        Err(Mismatch::Method { .. })
    ));

    let wrong_path = ObservedRequest { path: "/users/".into(), ..good.clone() };
    assert!(matches!(
        matcher::check(&expected, &wrong_path),
        Err(Mismatch::Path { .. })
    ));

    let no_query = ObservedRequest { query: vec![], ..good.clone() };
    assert!(matches!(
        matcher::check(&expected, &no_query),
        Err(Mismatch::Query { .. })
    ));

    let no_header = ObservedRequest { headers: vec![], ..good.clone() };
    assert!(matches!(
        matcher::check(&expected, &no_header),
        Err(Mismatch::Header { .. })
    ));

    let other_body = good.clone().with_body(r#"{"name":"John"}"#);
    assert_eq!(matcher::check(&expected, &other_body), Err(Mismatch::Body));
}

#[test]
fn test_nested_subset_and_arrays() {
    let expected = Some(json!({"user": {"name": "Jane"}, "tags": ["a", "b"]}));
    assert!(matcher::body_matches(
        expected.as_ref(),
        br#"{"user":{"name":"Jane","id":7},"tags":["a","b"],"x":1}"#
    ));
    assert!(!matcher::body_matches(
        expected.as_ref(),
        br#"{"user":{"name":"Jane"},"tags":["a","b","c"]}"#
    ));
}

#[test]
fn test_declared_body_requires_observed_body() {
    assert!(!matcher::body_matches(Some(&json!({})), b""));
    assert!(matcher::body_matches(None, b""));
    assert!(matcher::body_matches(None, b"anything at all"));
}
