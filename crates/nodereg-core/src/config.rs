//! Configuration types for the peer registry service
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};

/// Main registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// List store configuration
    pub store: StoreConfig,

    /// Node query client configuration
    pub query: QueryConfig,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl RegistryConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            store: StoreConfig::default(),
            query: QueryConfig::default(),
            engine: EngineConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.store.validate()?;
        self.query.validate()?;
        self.engine.validate()?;
        Ok(())
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// List store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// In-memory store (not persistent)
    #[default]
    Memory,

    /// File-based store: one JSON file per key under a root directory
    File {
        /// Root directory holding the list files
        root: String,
    },

    /// S3-compatible object store
    S3 {
        /// Endpoint URL (e.g., "https://s3.amazonaws.com")
        endpoint: String,
        /// Bucket name
        bucket: String,
        /// Region for request signing
        region: String,
        /// Access key ID
        access_key: String,
        /// Secret access key
        secret_key: String,
        /// Keys tracked in this bucket (object stores are not enumerated)
        keys: Vec<String>,
    },

    /// Custom store backend
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl StoreConfig {
    /// Validate the store configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            StoreConfig::Memory => Ok(()),
            StoreConfig::File { root } => {
                if root.is_empty() {
                    return Err(crate::Error::config("file store root cannot be empty"));
                }
                Ok(())
            }
            StoreConfig::S3 {
                endpoint,
                bucket,
                region,
                access_key,
                secret_key,
                keys,
            } => {
                if endpoint.is_empty() || bucket.is_empty() || region.is_empty() {
                    return Err(crate::Error::config(
                        "s3 store requires endpoint, bucket, and region",
                    ));
                }
                if access_key.is_empty() || secret_key.is_empty() {
                    return Err(crate::Error::config("s3 store credentials cannot be empty"));
                }
                if keys.is_empty() {
                    return Err(crate::Error::config(
                        "s3 store requires at least one tracked key",
                    ));
                }
                Ok(())
            }
            StoreConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config("custom store factory cannot be empty"));
                }
                if config.is_null() {
                    return Err(crate::Error::config("custom store config cannot be null"));
                }
                Ok(())
            }
        }
    }

    /// Get the store type name
    pub fn type_name(&self) -> &str {
        match self {
            StoreConfig::Memory => "memory",
            StoreConfig::File { .. } => "file",
            StoreConfig::S3 { .. } => "s3",
            StoreConfig::Custom { factory, .. } => factory,
        }
    }
}

/// Node query client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueryConfig {
    /// HTTP RPC query client
    Http {
        /// RPC port on every queried node
        #[serde(default = "default_rpc_port")]
        port: u16,
        /// Per-request timeout in seconds
        #[serde(default = "default_query_timeout_secs")]
        timeout_secs: u64,
    },

    /// Custom query client
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl QueryConfig {
    /// Validate the query configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            QueryConfig::Http { port, timeout_secs } => {
                if *port == 0 {
                    return Err(crate::Error::config("query port must be > 0"));
                }
                if *timeout_secs == 0 {
                    return Err(crate::Error::config("query timeout must be > 0"));
                }
                Ok(())
            }
            QueryConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config("custom query factory cannot be empty"));
                }
                if config.is_null() {
                    return Err(crate::Error::config("custom query config cannot be null"));
                }
                Ok(())
            }
        }
    }

    /// Get the query client type name
    pub fn type_name(&self) -> &str {
        match self {
            QueryConfig::Http { .. } => "http",
            QueryConfig::Custom { factory, .. } => factory,
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        QueryConfig::Http {
            port: default_rpc_port(),
            timeout_secs: default_query_timeout_secs(),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Prefix a key must carry to be refreshed
    ///
    /// Keys outside this naming convention are left untouched.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Whether candidates are filtered by sync status
    ///
    /// When false, discovered candidates pass through unfiltered. This is
    /// the single switch replacing the historical no-filtering and
    /// full-filtering refresh variants.
    #[serde(default = "default_filter_by_sync")]
    pub filter_by_sync: bool,

    /// Bound on concurrently in-flight node queries
    #[serde(default = "default_max_concurrent_queries")]
    pub max_concurrent_queries: usize,

    /// Capacity of the internal event channel
    ///
    /// When full, new engine events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.key_prefix.is_empty() {
            return Err(crate::Error::config("key prefix cannot be empty"));
        }
        if self.max_concurrent_queries == 0 {
            return Err(crate::Error::config("max concurrent queries must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            key_prefix: default_key_prefix(),
            filter_by_sync: default_filter_by_sync(),
            max_concurrent_queries: default_max_concurrent_queries(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_key_prefix() -> String {
    "seeds/".to_string()
}

fn default_filter_by_sync() -> bool {
    true
}

fn default_max_concurrent_queries() -> usize {
    16
}

fn default_event_channel_capacity() -> usize {
    1000
}

fn default_rpc_port() -> u16 {
    26657
}

fn default_query_timeout_secs() -> u64 {
    10
}
