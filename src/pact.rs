//! Consumer-side contract builder
//!
//! A [`Pact`] records interactions through a fluent DSL, replays them from a
//! [`MockServer`] while the consumer's own client code runs, and writes the
//! contract file only when every declared interaction was exercised.
//!
//! # Example
//! ```ignore
//! let mut pact = Pact::new("Order Service", "User Service");
//! pact.given("user 1 exists")
//!     .upon_receiving("a request for user 1")
//!     .with_request(Request::get("/users/1"))?
//!     .will_respond_with(json!({"status": 200, "body": {"id": 1}}))?;
//!
//! let path = pact
//!     .verify(|url| async move {
//!         let user = my_client::fetch_user(&url, 1).await?;
//!         assert_eq!(user.id, 1);
//!         Ok(())
//!     })
//!     .await?;
//! ```

use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::{MockServerConfig, PactConfig};
use crate::contract::ContractWriter;
use crate::errors::{PactError, Result};
use crate::interaction::{Interaction, IntoRequest, IntoResponse};
use crate::mock_server::MockServer;

/// Recorder for one consumer/provider pair, typically one per test case.
pub struct Pact {
    consumer: String,
    provider: String,
    pact_dir: PathBuf,
    server_config: MockServerConfig,
    interactions: Vec<Interaction>,
    /// Interaction being staged by chained calls; closed by `will_respond_with`.
    current: Option<Interaction>,
    mock_server: Option<MockServer>,
}

impl Pact {
    pub fn new(consumer: impl Into<String>, provider: impl Into<String>) -> Self {
        Self::from_config(PactConfig::new(consumer, provider))
    }

    pub fn from_config(config: PactConfig) -> Self {
        Self {
            consumer: config.consumer,
            provider: config.provider,
            pact_dir: config.pact_dir,
            server_config: config.server,
            interactions: Vec::new(),
            current: None,
            mock_server: None,
        }
    }

    pub fn with_pact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.pact_dir = dir.into();
        self
    }

    pub fn with_server_config(mut self, config: MockServerConfig) -> Self {
        self.server_config = config;
        self
    }

    pub fn consumer(&self) -> &str {
        &self.consumer
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn pact_dir(&self) -> &Path {
        &self.pact_dir
    }

    /// Finalized interactions, in declaration order.
    pub fn interactions(&self) -> &[Interaction] {
        &self.interactions
    }

    pub fn has_interactions(&self) -> bool {
        !self.interactions.is_empty()
    }

    /// Set the provider state of the interaction being staged.
    pub fn given(&mut self, state: impl Into<String>) -> &mut Self {
        self.current_mut().provider_state = Some(state.into());
        self
    }

    pub fn upon_receiving(&mut self, description: impl Into<String>) -> &mut Self {
        self.current_mut().description = description.into();
        self
    }

    /// Set the expected request. Fails on a JSON literal of the wrong shape,
    /// leaving the staged interaction untouched.
    pub fn with_request(&mut self, request: impl IntoRequest) -> Result<&mut Self> {
        let request = request.into_request()?;
        self.current_mut().request = request;
        Ok(self)
    }

    /// Set the canned response and finalize the staged interaction.
    pub fn will_respond_with(&mut self, response: impl IntoResponse) -> Result<&mut Self> {
        let response = response.into_response()?;
        let mut interaction = self.current.take().unwrap_or_default();
        interaction.response = response;
        self.interactions.push(interaction);
        Ok(self)
    }

    /// Base URL of the mock server while a verification is running.
    pub fn server_url(&self) -> Option<&str> {
        self.mock_server.as_ref().and_then(|s| s.url())
    }

    /// Start a fresh mock server, run `exercise` against its base URL, and
    /// write the contract if every interaction was matched.
    ///
    /// The server is stopped on every path out of this call, including an
    /// error or panic from `exercise`; panics are resumed after teardown.
    /// Returns the path of the written contract file.
    pub async fn verify<F, Fut>(&mut self, exercise: F) -> Result<PathBuf>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
    {
        if let Some(staged) = self.current.take() {
            warn!(
                description = %staged.description,
                "discarding interaction without will_respond_with"
            );
        }

        // A server left over from an interrupted run is not reused.
        self.teardown().await;

        let mut server =
            MockServer::with_config(self.interactions.clone(), self.server_config.clone());
        server.start().await?;
        let url = server.url().unwrap_or_default().to_string();
        self.mock_server = Some(server);

        let outcome = AssertUnwindSafe(async move { exercise(url).await })
            .catch_unwind()
            .await;

        let unmatched: Vec<String> = self
            .mock_server
            .as_ref()
            .map(|s| {
                s.unmatched_interactions()
                    .into_iter()
                    .map(|i| i.description)
                    .collect()
            })
            .unwrap_or_default();
        self.teardown().await;

        match outcome {
            Err(panic) => std::panic::resume_unwind(panic),
            Ok(Err(e)) => return Err(PactError::Exercise(e)),
            Ok(Ok(())) => {}
        }

        if !unmatched.is_empty() {
            return Err(PactError::Verification { unmatched });
        }

        let path = self.writer().write(&self.pact_dir)?;
        info!(path = %path.display(), "contract verified");
        Ok(path)
    }

    /// Best-effort stop of a still-running mock server. A no-op when none
    /// was ever started.
    pub async fn teardown(&mut self) {
        if let Some(mut server) = self.mock_server.take() {
            server.stop().await;
        }
    }

    pub fn writer(&self) -> ContractWriter {
        ContractWriter::new(&self.consumer, &self.provider, self.interactions.clone())
    }

    fn current_mut(&mut self) -> &mut Interaction {
        self.current.get_or_insert_with(Interaction::new)
    }
}
