use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::Contract;
use crate::errors::{PactError, Result};
use crate::interaction::Interaction;

static NON_ALPHANUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("static regex is valid"));

/// Lowercase, collapse each run of non-alphanumerics into `_`, trim `_`.
pub fn normalize_name(name: &str) -> String {
    let lower = name.to_lowercase();
    NON_ALPHANUMERIC
        .replace_all(&lower, "_")
        .trim_matches('_')
        .to_string()
}

/// Writes `<consumer>-<provider>.json` for one consumer/provider pair.
#[derive(Debug, Clone)]
pub struct ContractWriter {
    contract: Contract,
}

impl ContractWriter {
    pub fn new(
        consumer: impl Into<String>,
        provider: impl Into<String>,
        interactions: Vec<Interaction>,
    ) -> Self {
        Self {
            contract: Contract::new(consumer, provider, interactions),
        }
    }

    pub fn contract(&self) -> &Contract {
        &self.contract
    }

    pub fn file_name(&self) -> String {
        format!(
            "{}-{}.json",
            normalize_name(&self.contract.consumer.name),
            normalize_name(&self.contract.provider.name)
        )
    }

    /// Create `dir` if needed and write the contract there, replacing any
    /// earlier file for the same pair. Structural problems are logged, not
    /// enforced.
    pub fn write(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        for issue in self.contract.validation_issues() {
            warn!(%issue, "writing degraded contract");
        }

        std::fs::create_dir_all(dir).map_err(|source| PactError::Write {
            path: dir.to_path_buf(),
            source,
        })?;

        let path = dir.join(self.file_name());
        let json = self.contract.to_json()?;
        std::fs::write(&path, json).map_err(|source| PactError::Write {
            path: path.clone(),
            source,
        })?;

        info!(
            path = %path.display(),
            interactions = self.contract.interactions.len(),
            "contract written"
        );
        Ok(path)
    }
}
