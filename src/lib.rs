//! pactsmith - consumer-driven contract testing
//!
//! A consumer records the HTTP interactions it expects from a provider,
//! exercises its real client code against a short-lived local mock server,
//! and, when every interaction was exercised, writes a pact file that the
//! provider side can replay later.
//!
//! - **Interactions**: typed [`Request`]/[`Response`] values or JSON literals
//! - **Matching**: exact method/path, partial query/headers, structural
//!   subset for JSON bodies
//! - **Mock server**: OS-assigned port, first-match-wins replay, 500 with a
//!   diagnostic body for anything unexpected
//! - **Contracts**: pretty-printed, stable JSON named `<consumer>-<provider>.json`
//!
//! # Quick Start
//!
//! ```ignore
//! use pactsmith::{Pact, Request, Response};
//! use serde_json::json;
//!
//! let mut pact = Pact::new("Order Service", "User Service");
//! pact.given("user 1 exists")
//!     .upon_receiving("a request for user 1")
//!     .with_request(Request::get("/users/1"))?
//!     .will_respond_with(Response::new(200).with_body(json!({"id": 1, "name": "John Doe"})))?;
//!
//! pact.verify(|url| async move {
//!     let user: serde_json::Value = reqwest::get(format!("{url}/users/1")).await?.json().await?;
//!     assert_eq!(user["name"], "John Doe");
//!     Ok(())
//! })
//! .await?;
//! ```

pub mod cli;
pub mod config;
pub mod contract;
pub mod errors;
pub mod interaction;
pub mod matcher;
pub mod mock_server;
pub mod observability;
pub mod pact;

pub use config::{MockServerConfig, PactConfig};
pub use contract::{Contract, ContractWriter};
pub use errors::{PactError, Result};
pub use interaction::{Interaction, IntoRequest, IntoResponse, Request, Response};
pub use matcher::ObservedRequest;
pub use mock_server::{MockResponse, MockServer};
pub use pact::Pact;
