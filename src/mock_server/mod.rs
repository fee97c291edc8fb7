//! Mock provider server
//!
//! Provides a [`MockServer`] that replays the canned responses of a fixed set
//! of [`Interaction`]s. Each inbound request is matched against the
//! interactions in declaration order and the first match wins; requests
//! nothing matches get a 500 with a diagnostic body.
//!
//! # Example
//! ```ignore
//! let mut server = MockServer::new(interactions);
//! server.start().await?;
//! let url = server.url().unwrap_or_default(); // e.g. "http://127.0.0.1:54321"
//! // ... point your client at `url` ...
//! server.stop().await;
//! assert!(server.unmatched_interactions().is_empty());
//! ```

mod http;

pub use http::MockResponse;

use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::MockServerConfig;
use crate::errors::{PactError, Result};
use crate::interaction::{Interaction, Response};
use crate::matcher::{self, ObservedRequest};

/// A local HTTP server standing in for the provider.
///
/// One instance serves one verification run; the matched set is never reset.
pub struct MockServer {
    state: Arc<ServerState>,
    config: MockServerConfig,
    running: Option<RunningServer>,
}

struct RunningServer {
    url: String,
    addr: SocketAddr,
    /// Sender half of a shutdown signal.
    shutdown_tx: watch::Sender<bool>,
    /// Join handle for the background accept loop.
    handle: tokio::task::JoinHandle<()>,
}

/// State shared between the handle and every connection task.
struct ServerState {
    interactions: Vec<Interaction>,
    /// Indices into `interactions`, so repeat hits count once.
    matched: Mutex<BTreeSet<usize>>,
}

impl MockServer {
    pub fn new(interactions: Vec<Interaction>) -> Self {
        Self::with_config(interactions, MockServerConfig::default())
    }

    pub fn with_config(interactions: Vec<Interaction>, config: MockServerConfig) -> Self {
        Self {
            state: Arc::new(ServerState {
                interactions,
                matched: Mutex::new(BTreeSet::new()),
            }),
            config,
            running: None,
        }
    }

    /// Bind an OS-assigned port, spawn the accept loop, and return once a
    /// connect probe succeeds. Calling it on a running server is a no-op.
    pub async fn start(&mut self) -> Result<()> {
        if self.running.is_some() {
            return Ok(());
        }

        let host = self.config.host.as_str();
        let bind_err = |source| PactError::Bind {
            addr: format!("{}:0", host),
            source,
        };
        let listener = TcpListener::bind((host, 0)).await.map_err(bind_err)?;
        let addr = listener.local_addr().map_err(bind_err)?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(accept_loop(listener, Arc::clone(&self.state), shutdown_rx));
        let running = RunningServer {
            url: format!("http://{}", addr),
            addr,
            shutdown_tx,
            handle,
        };

        if let Err(e) = wait_until_ready(addr, &self.config).await {
            running.shutdown(self.config.shutdown_timeout()).await;
            return Err(e);
        }

        info!(
            url = %running.url,
            interactions = self.state.interactions.len(),
            "mock server started"
        );
        self.running = Some(running);
        Ok(())
    }

    /// Stop accepting connections and wait, bounded by the configured
    /// shutdown timeout, for the accept loop to finish. Safe to call at any
    /// time, any number of times.
    pub async fn stop(&mut self) {
        if let Some(running) = self.running.take() {
            running.shutdown(self.config.shutdown_timeout()).await;
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// The base URL (e.g. `"http://127.0.0.1:54321"`) while running.
    pub fn url(&self) -> Option<&str> {
        self.running.as_ref().map(|r| r.url.as_str())
    }

    pub fn addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|r| r.addr)
    }

    pub fn port(&self) -> Option<u16> {
        self.addr().map(|a| a.port())
    }

    pub fn interactions(&self) -> &[Interaction] {
        &self.state.interactions
    }

    /// Match one request and produce the response to send back.
    pub fn handle(&self, request: &ObservedRequest) -> MockResponse {
        self.state.handle(request)
    }

    /// Declared interactions never matched, in declaration order.
    pub fn unmatched_interactions(&self) -> Vec<Interaction> {
        let matched = self.state.matched.lock();
        self.state
            .interactions
            .iter()
            .enumerate()
            .filter(|(i, _)| !matched.contains(i))
            .map(|(_, interaction)| interaction.clone())
            .collect()
    }

    /// Interactions matched at least once, in declaration order.
    pub fn matched_interactions(&self) -> Vec<Interaction> {
        let matched = self.state.matched.lock();
        matched
            .iter()
            .filter_map(|&i| self.state.interactions.get(i).cloned())
            .collect()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        if let Some(running) = &self.running {
            let _ = running.shutdown_tx.send(true);
            running.handle.abort();
        }
    }
}

impl RunningServer {
    async fn shutdown(self, timeout: std::time::Duration) {
        let _ = self.shutdown_tx.send(true);
        let abort = self.handle.abort_handle();
        match tokio::time::timeout(timeout, self.handle).await {
            Ok(_) => info!(url = %self.url, "mock server stopped"),
            Err(_) => {
                warn!(url = %self.url, ?timeout, "mock server did not stop in time, aborting");
                abort.abort();
            }
        }
    }
}

impl ServerState {
    fn handle(&self, request: &ObservedRequest) -> MockResponse {
        for (index, interaction) in self.interactions.iter().enumerate() {
            match matcher::check(&interaction.request, request) {
                Ok(()) => {
                    self.matched.lock().insert(index);
                    debug!(
                        method = %request.method,
                        path = %request.path,
                        interaction = %interaction.description,
                        "request matched"
                    );
                    return replay(&interaction.response);
                }
                Err(mismatch) => debug!(
                    interaction = %interaction.description,
                    %mismatch,
                    "candidate rejected"
                ),
            }
        }

        debug!(method = %request.method, path = %request.path, "no matching interaction");
        unmatched_response(request)
    }
}

/// Canned response: JSON content type by default when there is a body,
/// declared headers layered on top.
fn replay(response: &Response) -> MockResponse {
    let mut out = MockResponse::new(response.status);

    if let Some(body) = &response.body {
        out.set_header("Content-Type", "application/json");
        out.body = match body {
            Value::String(text) => text.clone().into_bytes(),
            other => serde_json::to_vec(other).unwrap_or_default(),
        };
    }
    for (name, value) in response.headers.iter().flatten() {
        out.set_header(name.as_str(), value.as_str());
    }
    out
}

fn unmatched_response(request: &ObservedRequest) -> MockResponse {
    let mut query = Map::new();
    for (key, value) in &request.query {
        query
            .entry(key.clone())
            .or_insert_with(|| Value::String(value.clone()));
    }

    let body = json!({
        "error": "No matching interaction found",
        "request": {
            "method": request.method,
            "path": request.path,
            "query": query,
        }
    });

    let mut out = MockResponse::new(500);
    out.set_header("Content-Type", "application/json");
    out.body = serde_json::to_vec(&body).unwrap_or_default();
    out
}

async fn wait_until_ready(addr: SocketAddr, config: &MockServerConfig) -> Result<()> {
    let attempts = config.ready_attempts.max(1);
    for attempt in 1..=attempts {
        match TcpStream::connect(addr).await {
            Ok(_) => return Ok(()),
            Err(e) => {
                debug!(%addr, attempt, "mock server not ready yet: {}", e);
                tokio::time::sleep(config.ready_interval()).await;
            }
        }
    }
    Err(PactError::ReadinessTimeout { addr, attempts })
}

// ---------------------------------------------------------------------------
// Internal: accept loop & request handling
// ---------------------------------------------------------------------------

/// Background accept loop. Runs until `shutdown_rx` signals true.
async fn accept_loop(
    listener: TcpListener,
    state: Arc<ServerState>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, _addr)) => {
                        let state = Arc::clone(&state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, state).await {
                                debug!("mock server connection error: {}", e);
                            }
                        });
                    }
                    Err(e) => {
                        debug!("mock server accept error: {}", e);
                    }
                }
            }
        }
    }
}

/// Serve a single request on one connection.
async fn handle_connection(mut stream: TcpStream, state: Arc<ServerState>) -> std::io::Result<()> {
    let request = match http::read_request(&mut stream).await {
        Ok(Some(request)) => request,
        Ok(None) => return Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
            let mut bad = MockResponse::new(400);
            bad.set_header("Content-Type", "text/plain");
            bad.body = e.to_string().into_bytes();
            return http::write_response(&mut stream, "", &bad).await;
        }
        Err(e) => return Err(e),
    };

    let response = state.handle(&request);
    http::write_response(&mut stream, &request.method, &response).await
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
