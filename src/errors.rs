use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

use crate::contract::ValidationIssue;

/// The central error type for pactsmith.
///
/// Startup, coverage, exercise and write failures are fatal to
/// [`Pact::verify`](crate::Pact::verify). A request that matches no
/// interaction is never an error: the mock server answers it with a 500 and
/// the miss surfaces later as [`PactError::Verification`].
#[derive(Error, Debug)]
pub enum PactError {
    #[error("Failed to bind mock server on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Mock server on {addr} not accepting connections after {attempts} attempts")]
    ReadinessTimeout { addr: SocketAddr, attempts: u32 },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Unmatched interactions: {}", unmatched.join(", "))]
    Verification { unmatched: Vec<String> },

    #[error("Exercise failed: {0}")]
    Exercise(#[source] anyhow::Error),

    #[error("Failed to write contract file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read contract file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse contract JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid contract: {}", format_issues(issues))]
    InvalidContract { issues: Vec<ValidationIssue> },

    #[error("Configuration error: {0}")]
    Config(String),
}

fn format_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, PactError>;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_CONFIG_ERROR: u8 = 2;
pub const EXIT_INVALID_CONTRACT: u8 = 3;
pub const EXIT_IO_ERROR: u8 = 4;

/// Determine the appropriate process exit code for an error.
pub fn get_exit_code(e: &anyhow::Error) -> u8 {
    match e.downcast_ref::<PactError>() {
        Some(PactError::Config(_)) => EXIT_CONFIG_ERROR,
        Some(PactError::InvalidContract { .. }) | Some(PactError::Parse(_)) => {
            EXIT_INVALID_CONTRACT
        }
        Some(PactError::Read { .. }) | Some(PactError::Write { .. }) => EXIT_IO_ERROR,
        _ => EXIT_ERROR,
    }
}
