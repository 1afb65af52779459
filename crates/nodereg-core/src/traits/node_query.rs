// # Node Query Trait
//
// Defines the interface for read-only status queries against a node's
// network endpoint.
//
// ## Implementations
//
// - HTTP RPC: `nodereg-query-http` crate
// - Future: gRPC, direct p2p handshake
//
// ## Usage
//
// ```rust,ignore
// use nodereg_core::{NodeQuery, NodeAddr, SyncStatus};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let query = /* NodeQuery implementation */;
//
//     let seed: NodeAddr = "203.0.113.7".parse()?;
//     let peers = query.peer_addresses(&seed).await?;
//     let status = query.sync_status(&seed).await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// A node's network endpoint identifier.
///
/// The address is an opaque host string; the RPC port is a well-known
/// convention owned by the `NodeQuery` implementation. Equality is exact
/// string equality; no DNS resolution or case-folding is performed here,
/// because the registry's contract is "whatever the peers reported",
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeAddr(String);

impl NodeAddr {
    /// Create an address from a host string
    pub fn new(host: impl Into<String>) -> Self {
        Self(host.into())
    }

    /// The host string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for NodeAddr {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<&str> for NodeAddr {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A deduplicated set of node addresses.
///
/// The fundamental currency of the refresh pipeline. A `BTreeSet` keeps
/// serialization deterministic; iteration order is never semantically
/// meaningful.
pub type AddressSet = BTreeSet<NodeAddr>;

/// Self-reported chain synchronization state of a queried node.
///
/// `NotSynced` subsumes "unreachable", "timed out", and "reports catching
/// up". The filter does not distinguish these, only the logs do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// Local chain height matches the network head (self-reported)
    Synced,
    /// Catching up, unreachable, or unknown
    NotSynced,
}

/// Trait for node query implementations
///
/// This trait defines two read-only capabilities:
/// 1. **peer_addresses()**: The set of peers a node currently sees
/// 2. **sync_status()**: Whether a node is caught up with the chain head
///
/// # Thread Safety
///
/// Implementations must be stateless, thread-safe, and usable concurrently
/// across async tasks; the engine fans queries out in parallel.
///
/// # Ownership Rules
///
/// Implementations perform exactly one bounded-timeout request per call and
/// return errors as-is:
/// - No retry or backoff logic (owned by the scheduler re-invoking the cycle)
/// - No caching of results (liveness is re-validated every cycle)
/// - No interpretation of failures (the discovery pipeline decides that an
///   error means "no peers learned" / not synced)
///
/// An unbounded hang in one query must not block the others, so every
/// request carries a timeout.
#[async_trait]
pub trait NodeQuery: Send + Sync {
    /// Query a node for the peers it currently sees
    ///
    /// # Parameters
    ///
    /// - `addr`: The node to query
    ///
    /// # Returns
    ///
    /// - `Ok(AddressSet)`: The reported peer addresses (possibly empty)
    /// - `Err(Error)`: The node was unreachable or returned a malformed
    ///   response
    async fn peer_addresses(&self, addr: &NodeAddr) -> Result<AddressSet, crate::Error>;

    /// Query a node's chain synchronization status
    ///
    /// # Parameters
    ///
    /// - `addr`: The node to query
    ///
    /// # Returns
    ///
    /// - `Ok(SyncStatus)`: The self-reported status
    /// - `Err(Error)`: The node was unreachable or returned a malformed
    ///   response (callers treat this as `NotSynced`)
    async fn sync_status(&self, addr: &NodeAddr) -> Result<SyncStatus, crate::Error>;

    /// Get the query client name (for logging/debugging)
    fn query_name(&self) -> &'static str;
}

/// Helper trait for constructing node query clients from configuration
pub trait NodeQueryFactory: Send + Sync {
    /// Create a NodeQuery instance from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Configuration specific to this query client
    ///
    /// # Returns
    ///
    /// A boxed NodeQuery trait object
    fn create(
        &self,
        config: &crate::config::QueryConfig,
    ) -> Result<Box<dyn NodeQuery>, crate::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_equality_is_exact() {
        let a = NodeAddr::new("198.51.100.4");
        let b: NodeAddr = "198.51.100.4".parse().unwrap();
        assert_eq!(a, b);
        // No normalization: hostnames with differing case are distinct
        assert_ne!(NodeAddr::new("Seed.Example"), NodeAddr::new("seed.example"));
    }

    #[test]
    fn address_set_deduplicates() {
        let set: AddressSet = ["1.2.3.4", "5.6.7.8", "1.2.3.4"]
            .iter()
            .map(|s| NodeAddr::new(*s))
            .collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn address_serializes_as_bare_string() {
        let addr = NodeAddr::new("203.0.113.7");
        assert_eq!(serde_json::to_string(&addr).unwrap(), "\"203.0.113.7\"");
    }
}
