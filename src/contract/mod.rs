//! Contract artifact
//!
//! The JSON file shared with the provider side: consumer, provider, the
//! interactions in declaration order, and metadata. Absent optional fields
//! are omitted, never written as `null`.

mod validate;
mod writer;

pub use validate::ValidationIssue;
pub use writer::{normalize_name, ContractWriter};

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::{PactError, Result};
use crate::interaction::Interaction;

pub const PACT_SPECIFICATION_VERSION: &str = "3.0.0";
pub const CLIENT_NAME: &str = "pactsmith";
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub consumer: Pacticipant,
    pub provider: Pacticipant,
    #[serde(default)]
    pub interactions: Vec<Interaction>,
    #[serde(default)]
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pacticipant {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub pact_specification: PactSpecification,
    /// Always written by this crate; files from other tools may omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<ClientInfo>,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            pact_specification: PactSpecification {
                version: PACT_SPECIFICATION_VERSION.to_string(),
            },
            client: Some(ClientInfo {
                name: CLIENT_NAME.to_string(),
                version: CLIENT_VERSION.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PactSpecification {
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

impl Contract {
    pub fn new(
        consumer: impl Into<String>,
        provider: impl Into<String>,
        interactions: Vec<Interaction>,
    ) -> Self {
        Self {
            consumer: Pacticipant {
                name: consumer.into(),
            },
            provider: Pacticipant {
                name: provider.into(),
            },
            interactions,
            metadata: Metadata::default(),
        }
    }

    /// Pretty-printed canonical JSON: consumer, provider, interactions,
    /// metadata, in that order.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| PactError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_slice(&bytes)
    }

    /// Every structural problem in the contract; empty when valid.
    pub fn validation_issues(&self) -> Vec<ValidationIssue> {
        validate::issues(self)
    }

    pub fn validate(&self) -> Result<()> {
        let issues = self.validation_issues();
        if issues.is_empty() {
            Ok(())
        } else {
            Err(PactError::InvalidContract { issues })
        }
    }
}

impl std::str::FromStr for Contract {
    type Err = PactError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}
