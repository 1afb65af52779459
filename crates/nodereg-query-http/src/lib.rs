// # HTTP Node Query
//
// This crate provides an HTTP RPC implementation of the NodeQuery trait.
//
// ## Wire Contract
//
// Every node exposes two read-only endpoints on a well-known RPC port
// (26657 by default):
//
// - `GET /net_info`: the peers this node currently sees:
//   `{"result": {"peers": [{"remote_ip": "203.0.113.7"}, ...]}}`
// - `GET /status`: whether the node is caught up with the chain head:
//   `{"result": {"sync_info": {"catching_up": false}}}`
//
// `synced = !catching_up`. Both wrapped (`{"result": ...}`) and bare
// payloads are accepted, since nodes behind proxies sometimes unwrap the
// envelope.
//
// ## Ownership
//
// One bounded-timeout request per call, no retries, no caching. The refresh
// pipeline decides what a failure means, and the scheduler owns re-running
// the cycle.

use std::time::Duration;

use async_trait::async_trait;
use nodereg_core::config::QueryConfig;
use nodereg_core::traits::{AddressSet, NodeAddr, NodeQuery, NodeQueryFactory, SyncStatus};
use nodereg_core::{ComponentRegistry, Error, Result};
use serde::Deserialize;

/// Default RPC port queried on every node
const DEFAULT_RPC_PORT: u16 = 26657;

/// Default per-request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP RPC node query client
///
/// Stateless and safe for concurrent use; the underlying reqwest client
/// pools connections internally.
#[derive(Debug, Clone)]
pub struct HttpNodeQuery {
    /// RPC port on every queried node
    port: u16,

    /// HTTP client with a bounded per-request timeout
    client: reqwest::Client,
}

impl HttpNodeQuery {
    /// Create a query client with the default port and timeout
    pub fn new() -> Result<Self> {
        Self::with_options(DEFAULT_RPC_PORT, DEFAULT_TIMEOUT)
    }

    /// Create a query client with an explicit port and timeout
    pub fn with_options(port: u16, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("failed to build http client: {}", e)))?;

        Ok(Self { port, client })
    }

    /// Fetch a path from a node's RPC endpoint and return the body
    async fn fetch(&self, addr: &NodeAddr, path: &str) -> Result<String> {
        let url = format!("http://{}:{}/{}", addr, self.port, path);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::node_query(format!("request to {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(Error::node_query(format!(
                "{} returned {}",
                url,
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| Error::node_query(format!("failed to read body from {}: {}", url, e)))
    }
}

#[async_trait]
impl NodeQuery for HttpNodeQuery {
    async fn peer_addresses(&self, addr: &NodeAddr) -> Result<AddressSet> {
        let body = self.fetch(addr, "net_info").await?;
        let peers = parse_net_info(&body)?;
        tracing::debug!("{} reported {} peer(s)", addr, peers.len());
        Ok(peers)
    }

    async fn sync_status(&self, addr: &NodeAddr) -> Result<SyncStatus> {
        let body = self.fetch(addr, "status").await?;
        parse_status(&body)
    }

    fn query_name(&self) -> &'static str {
        "http"
    }
}

#[derive(Debug, Deserialize)]
struct NetInfo {
    #[serde(default)]
    peers: Vec<PeerEntry>,
}

#[derive(Debug, Deserialize)]
struct PeerEntry {
    remote_ip: String,
}

#[derive(Debug, Deserialize)]
struct StatusInfo {
    sync_info: SyncInfo,
}

#[derive(Debug, Deserialize)]
struct SyncInfo {
    catching_up: bool,
}

/// Unwrap an optional `{"result": ...}` RPC envelope
fn unwrap_result(body: &str) -> Result<serde_json::Value> {
    let mut value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| Error::node_query(format!("malformed response: {}", e)))?;

    if let Some(result) = value.get_mut("result") {
        return Ok(result.take());
    }
    Ok(value)
}

/// Parse a `/net_info` body into the set of reported peer addresses
fn parse_net_info(body: &str) -> Result<AddressSet> {
    let info: NetInfo = serde_json::from_value(unwrap_result(body)?)
        .map_err(|e| Error::node_query(format!("malformed net_info: {}", e)))?;

    Ok(info
        .peers
        .into_iter()
        .map(|peer| NodeAddr::new(peer.remote_ip))
        .collect())
}

/// Parse a `/status` body into a sync status
fn parse_status(body: &str) -> Result<SyncStatus> {
    let info: StatusInfo = serde_json::from_value(unwrap_result(body)?)
        .map_err(|e| Error::node_query(format!("malformed status: {}", e)))?;

    if info.sync_info.catching_up {
        Ok(SyncStatus::NotSynced)
    } else {
        Ok(SyncStatus::Synced)
    }
}

/// Factory for creating HTTP node query clients
pub struct HttpQueryFactory;

impl NodeQueryFactory for HttpQueryFactory {
    fn create(&self, config: &QueryConfig) -> Result<Box<dyn NodeQuery>> {
        match config {
            QueryConfig::Http { port, timeout_secs } => Ok(Box::new(HttpNodeQuery::with_options(
                *port,
                Duration::from_secs(*timeout_secs),
            )?)),
            _ => Err(Error::config("invalid config for http query client")),
        }
    }
}

/// Register the HTTP query client with a registry
pub fn register(registry: &ComponentRegistry) {
    registry.register_query("http", Box::new(HttpQueryFactory));
}
