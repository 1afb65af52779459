// # Memory List Store
//
// In-memory implementation of ListStore.
//
// ## Purpose
//
// Provides a simple, fast store that doesn't persist across restarts.
// Useful for tests and for embedding the engine where the caller owns
// persistence.
//
// ## Crash Behavior
//
// - All lists are lost on restart/crash
// - No recovery possible (state is in-memory only)

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::list_store::{ListKey, ListStore, ListStoreFactory};
use crate::traits::node_query::AddressSet;

/// In-memory list store implementation
///
/// All lists live in a HashMap protected by a RwLock. Cloning shares the
/// underlying map.
///
/// # Example
///
/// ```rust,no_run
/// use nodereg_core::store::MemoryListStore;
/// use nodereg_core::traits::{ListStore, ListKey, NodeAddr, AddressSet};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryListStore::new();
///     let key = ListKey::new("seeds/testnet.json");
///
///     let addrs: AddressSet = [NodeAddr::new("1.2.3.4")].into_iter().collect();
///     store.write(&key, &addrs).await?;
///
///     assert_eq!(store.read(&key).await?, addrs);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MemoryListStore {
    inner: Arc<RwLock<HashMap<ListKey, AddressSet>>>,
}

impl MemoryListStore {
    /// Create a new empty memory store
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of lists in the store
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Remove every list from the store
    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }
}

impl Default for MemoryListStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ListStore for MemoryListStore {
    async fn list_keys(&self) -> Result<Vec<ListKey>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.keys().cloned().collect())
    }

    async fn read(&self, key: &ListKey) -> Result<AddressSet, Error> {
        let guard = self.inner.read().await;
        Ok(guard.get(key).cloned().unwrap_or_default())
    }

    async fn write(&self, key: &ListKey, addrs: &AddressSet) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.insert(key.clone(), addrs.clone());
        Ok(())
    }

    fn store_name(&self) -> &'static str {
        "memory"
    }
}

/// Factory for creating memory list stores
pub struct MemoryListStoreFactory;

impl ListStoreFactory for MemoryListStoreFactory {
    fn create(&self, config: &crate::config::StoreConfig) -> Result<Box<dyn ListStore>, Error> {
        match config {
            crate::config::StoreConfig::Memory => Ok(Box::new(MemoryListStore::new())),
            _ => Err(Error::config("invalid config for memory store")),
        }
    }
}
