//! Plugin-based component registry
//!
//! The registry allows list stores and node query clients to be registered
//! dynamically at runtime, avoiding hardcoded if-else chains in the daemon.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use nodereg_core::registry::ComponentRegistry;
//! use nodereg_core::config::StoreConfig;
//!
//! let registry = ComponentRegistry::with_builtins();
//!
//! // Implementation crates register themselves
//! nodereg_query_http::register(&registry);
//! nodereg_store_s3::register(&registry);
//!
//! let store = registry.create_store(&StoreConfig::Memory)?;
//! ```

use std::collections::HashMap;
use std::sync::RwLock;

use crate::config::{QueryConfig, StoreConfig};
use crate::error::{Error, Result};
use crate::store::{FileListStoreFactory, MemoryListStoreFactory};
use crate::traits::{ListStore, ListStoreFactory, NodeQuery, NodeQueryFactory};

/// Registry for plugin-based store and query client creation
///
/// The registry maintains a map of type names to factory objects, allowing
/// dynamic instantiation based on configuration.
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct ComponentRegistry {
    /// Registered list store factories
    stores: RwLock<HashMap<String, Box<dyn ListStoreFactory>>>,

    /// Registered node query factories
    queries: RwLock<HashMap<String, Box<dyn NodeQueryFactory>>>,
}

impl ComponentRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in `memory` and `file` stores
    /// already registered
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register_store("memory", Box::new(MemoryListStoreFactory));
        registry.register_store("file", Box::new(FileListStoreFactory));
        registry
    }

    /// Register a list store factory
    ///
    /// # Parameters
    ///
    /// - `name`: Store type name (e.g., "file", "s3")
    /// - `factory`: Factory object for creating store instances
    pub fn register_store(&self, name: impl Into<String>, factory: Box<dyn ListStoreFactory>) {
        let mut stores = self.stores.write().unwrap();
        stores.insert(name.into(), factory);
    }

    /// Register a node query factory
    ///
    /// # Parameters
    ///
    /// - `name`: Query client type name (e.g., "http")
    /// - `factory`: Factory object for creating query client instances
    pub fn register_query(&self, name: impl Into<String>, factory: Box<dyn NodeQueryFactory>) {
        let mut queries = self.queries.write().unwrap();
        queries.insert(name.into(), factory);
    }

    /// Create a list store from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn ListStore>)`: Created store instance
    /// - `Err(Error)`: If the store type is not registered or creation fails
    pub fn create_store(&self, config: &StoreConfig) -> Result<Box<dyn ListStore>> {
        let store_type = config.type_name();
        let stores = self.stores.read().unwrap();

        let factory = stores
            .get(store_type)
            .ok_or_else(|| Error::config(format!("unknown store type: {}", store_type)))?;

        factory.create(config)
    }

    /// Create a node query client from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn NodeQuery>)`: Created query client instance
    /// - `Err(Error)`: If the query type is not registered or creation fails
    pub fn create_query(&self, config: &QueryConfig) -> Result<Box<dyn NodeQuery>> {
        let query_type = config.type_name();
        let queries = self.queries.read().unwrap();

        let factory = queries
            .get(query_type)
            .ok_or_else(|| Error::config(format!("unknown query type: {}", query_type)))?;

        factory.create(config)
    }

    /// List all registered store types
    pub fn list_stores(&self) -> Vec<String> {
        let stores = self.stores.read().unwrap();
        stores.keys().cloned().collect()
    }

    /// List all registered query client types
    pub fn list_queries(&self) -> Vec<String> {
        let queries = self.queries.read().unwrap();
        queries.keys().cloned().collect()
    }

    /// Check if a store type is registered
    pub fn has_store(&self, name: &str) -> bool {
        let stores = self.stores.read().unwrap();
        stores.contains_key(name)
    }

    /// Check if a query client type is registered
    pub fn has_query(&self, name: &str) -> bool {
        let queries = self.queries.read().unwrap();
        queries.contains_key(name)
    }
}
