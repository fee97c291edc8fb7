//! Unit tests for pactsmith modules
//!
//! These tests drive the public API the way a consumer test suite would,
//! with real HTTP calls against the mock server on loopback.

mod test_contract;
mod test_matcher;
mod test_pact;
