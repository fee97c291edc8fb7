//! Request matching
//!
//! Decides whether an observed request satisfies one expected [`Request`].
//! Expectations are strict about what they declare and blind to everything
//! else: extra query parameters, extra headers and extra body keys on the
//! observed side are ignored.

use serde_json::{Map, Value};
use std::fmt;

use crate::interaction::Request;

/// A request as it arrived at the mock server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservedRequest {
    pub method: String,
    pub path: String,
    /// Decoded query pairs in wire order; repeated keys are kept.
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl ObservedRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    /// Build from a request target such as `/users?status=active`.
    pub fn from_target(method: impl Into<String>, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, query),
            None => (target, ""),
        };
        Self::new(method, path).with_query_string(query)
    }

    pub fn with_query_string(mut self, raw: &str) -> Self {
        self.query.extend(
            url::form_urlencoded::parse(raw.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned())),
        );
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// First value for `name`.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// The first rule an observed request broke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    Method { expected: String, actual: String },
    Path { expected: String, actual: String },
    Query { key: String },
    Header { name: String },
    Body,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::Method { expected, actual } => {
                write!(f, "method: expected {}, got {}", expected, actual)
            }
            Mismatch::Path { expected, actual } => {
                write!(f, "path: expected {}, got {}", expected, actual)
            }
            Mismatch::Query { key } => write!(f, "query parameter '{}' missing or different", key),
            Mismatch::Header { name } => write!(f, "header '{}' missing or different", name),
            Mismatch::Body => write!(f, "body does not match"),
        }
    }
}

/// Check method, path, query, headers and body in that order.
pub fn check(expected: &Request, observed: &ObservedRequest) -> Result<(), Mismatch> {
    if !expected.method.eq_ignore_ascii_case(&observed.method) {
        return Err(Mismatch::Method {
            expected: expected.method.clone(),
            actual: observed.method.clone(),
        });
    }

    if expected.path != observed.path {
        return Err(Mismatch::Path {
            expected: expected.path.clone(),
            actual: observed.path.clone(),
        });
    }

    if let Some(query) = &expected.query {
        for (key, value) in query {
            if observed.query_param(key) != Some(value.as_str()) {
                return Err(Mismatch::Query { key: key.clone() });
            }
        }
    }

    if let Some(headers) = &expected.headers {
        for (name, value) in headers {
            let found = observed
                .header(name)
                .map(|actual| actual.to_lowercase() == value.to_lowercase())
                .unwrap_or(false);
            if !found {
                return Err(Mismatch::Header { name: name.clone() });
            }
        }
    }

    if !body_matches(expected.body.as_ref(), &observed.body) {
        return Err(Mismatch::Body);
    }

    Ok(())
}

pub fn matches(expected: &Request, observed: &ObservedRequest) -> bool {
    check(expected, observed).is_ok()
}

/// Body rule. An unset expectation accepts anything; otherwise the observed
/// body must be non-empty JSON. Unparsable input is a plain non-match.
pub fn body_matches(expected: Option<&Value>, observed: &[u8]) -> bool {
    let Some(expected) = expected else {
        return true;
    };
    if observed.is_empty() {
        return false;
    }

    match serde_json::from_slice::<Value>(observed) {
        Ok(actual) => match expected {
            Value::Object(map) => subset_matches(map, &actual),
            other => values_equal(other, &actual),
        },
        // A raw text expectation can still match a non-JSON body verbatim.
        Err(_) => match expected {
            Value::String(text) => text.as_bytes() == observed,
            _ => false,
        },
    }
}

/// Structural subset: every expected key must be present in `actual` with an
/// equal value, recursing into nested objects. Extra keys are ignored.
pub fn subset_matches(expected: &Map<String, Value>, actual: &Value) -> bool {
    let Value::Object(actual) = actual else {
        return false;
    };

    expected.iter().all(|(key, want)| match actual.get(key) {
        None => false,
        Some(got) => match want {
            Value::Object(nested) => subset_matches(nested, got),
            _ => values_equal(want, got),
        },
    })
}

/// Deep equality where numbers compare by value, so `1` equals `1.0`.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            x == y
                || match (x.as_f64(), y.as_f64()) {
                    (Some(x), Some(y)) => x == y,
                    _ => false,
                }
        }
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).map(|y| values_equal(x, y)).unwrap_or(false))
        }
        _ => a == b,
    }
}
