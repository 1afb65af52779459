// # List Store Trait
//
// Defines the interface for durable, per-key address list storage.
//
// ## Purpose
//
// The list store holds the registry's published output: one address list per
// key, serialized as a JSON array of address strings and readable by
// external bootstrap clients. The engine reads each tracked list at the
// start of a cycle and conditionally writes back the refreshed version.
//
// ## Implementations
//
// - Memory: `MemoryListStore` (tests, embedding)
// - File: `FileListStore` (one JSON file per key)
// - S3-compatible object store: `nodereg-store-s3` crate
//
// ## Usage
//
// ```rust,ignore
// use nodereg_core::{ListStore, ListKey};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let store = /* ListStore implementation */;
//
//     for key in store.list_keys().await? {
//         let seeds = store.read(&key).await?;
//         println!("{}: {} addresses", key, seeds.len());
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::node_query::AddressSet;

/// Opaque storage key for a named, independently-tracked address list.
///
/// Tracked keys share a recognizable prefix; the engine refreshes only keys
/// matching its configured prefix and leaves everything else untouched.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListKey(String);

impl ListKey {
    /// Create a key from its storage name
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The storage name
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this key belongs to the tracked naming convention
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

impl fmt::Display for ListKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ListKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Trait for list store implementations
///
/// This trait defines the interface for the durable object store holding
/// per-key address collections.
///
/// # Thread Safety
///
/// All methods must be safe to call concurrently from multiple tasks; the
/// engine processes independent keys in parallel.
///
/// # Semantics
///
/// - `read` of a missing key yields an empty set, not an error; only actual
///   storage faults are errors
/// - `write` replaces the stored list wholesale; the engine has already
///   decided that a write is warranted
/// - No cross-key or cross-invocation transactional guarantee is required;
///   at most one refresh cycle runs at a time (enforced by the external
///   scheduler, not by implementations)
#[async_trait]
pub trait ListStore: Send + Sync {
    /// Enumerate every key present in the store
    ///
    /// Returns all keys, not just tracked ones; prefix filtering is the
    /// engine's job.
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<ListKey>)`: All keys
    /// - `Err(Error)`: Storage error
    async fn list_keys(&self) -> Result<Vec<ListKey>, crate::Error>;

    /// Read the address list stored under a key
    ///
    /// # Parameters
    ///
    /// - `key`: The list key
    ///
    /// # Returns
    ///
    /// - `Ok(AddressSet)`: The stored addresses (empty if the key is absent)
    /// - `Err(Error)`: Storage error
    async fn read(&self, key: &ListKey) -> Result<AddressSet, crate::Error>;

    /// Replace the address list stored under a key
    ///
    /// # Parameters
    ///
    /// - `key`: The list key
    /// - `addrs`: The new list contents
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Successfully persisted
    /// - `Err(Error)`: Storage error
    async fn write(&self, key: &ListKey, addrs: &AddressSet) -> Result<(), crate::Error>;

    /// Get the store backend name (for logging/debugging)
    fn store_name(&self) -> &'static str;
}

/// Helper trait for constructing list stores from configuration
pub trait ListStoreFactory: Send + Sync {
    /// Create a ListStore instance from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Configuration specific to this store backend
    ///
    /// # Returns
    ///
    /// A boxed ListStore trait object
    fn create(
        &self,
        config: &crate::config::StoreConfig,
    ) -> Result<Box<dyn ListStore>, crate::Error>;
}
