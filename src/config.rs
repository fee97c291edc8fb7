use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{PactError, Result};

/// Settings for one consumer/provider pact session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PactConfig {
    pub consumer: String,
    pub provider: String,
    #[serde(default = "default_pact_dir")]
    pub pact_dir: PathBuf,

    #[serde(default)]
    pub server: MockServerConfig,
}

/// How the mock server binds, probes readiness and shuts down.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MockServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    /// Connect probes made before startup is declared failed.
    #[serde(default = "default_ready_attempts")]
    pub ready_attempts: u32,
    #[serde(default = "default_ready_interval_ms")]
    pub ready_interval_ms: u64,
    #[serde(default = "default_shutdown_timeout_ms")]
    pub shutdown_timeout_ms: u64,
}

impl Default for MockServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            ready_attempts: default_ready_attempts(),
            ready_interval_ms: default_ready_interval_ms(),
            shutdown_timeout_ms: default_shutdown_timeout_ms(),
        }
    }
}

impl MockServerConfig {
    pub fn ready_interval(&self) -> Duration {
        Duration::from_millis(self.ready_interval_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

fn default_pact_dir() -> PathBuf {
    PathBuf::from("./pacts")
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_ready_attempts() -> u32 {
    50
}
fn default_ready_interval_ms() -> u64 {
    20
}
fn default_shutdown_timeout_ms() -> u64 {
    1000
}

impl PactConfig {
    pub fn new(consumer: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            consumer: consumer.into(),
            provider: provider.into(),
            pact_dir: default_pact_dir(),
            server: MockServerConfig::default(),
        }
    }

    /// Load a TOML config file, then apply `PACTSMITH_*` environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PactError::Config(format!("Failed to read config from {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| PactError::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config.with_env_overrides())
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(dir) = std::env::var("PACTSMITH_PACT_DIR") {
            if !dir.is_empty() {
                self.pact_dir = PathBuf::from(dir);
            }
        }
        if let Ok(host) = std::env::var("PACTSMITH_HOST") {
            if !host.is_empty() {
                self.server.host = host;
            }
        }
        if let Ok(attempts) = std::env::var("PACTSMITH_READY_ATTEMPTS") {
            if let Ok(n) = attempts.parse::<u32>() {
                self.server.ready_attempts = n;
            }
        }
        self
    }
}
