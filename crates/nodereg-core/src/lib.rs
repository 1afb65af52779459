// # nodereg-core
//
// Core library for the peer registry refresh service.
//
// ## Architecture Overview
//
// This library maintains named lists of reachable, synchronized peer node
// addresses for a blockchain test network:
// - **NodeQuery**: Trait for read-only status queries against a node endpoint
// - **ListStore**: Trait for durable, per-key address list storage
// - **discovery**: Candidate expansion (seed ∪ reported peers) and fail-closed
//   liveness filtering
// - **RefreshEngine**: Orchestrates read → discover → filter → conditional write
//   across every tracked list key
// - **ComponentRegistry**: Plugin-based registry for stores and query clients
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Set algebra and persistence policy live here;
//    wire formats and storage backends live in implementation crates
// 2. **Explicit Configuration**: Store handle, query client, and key-prefix
//    convention are passed in at construction, no process-wide singletons
// 3. **Graceful Degradation**: Per-address failures mean "no information",
//    per-key failures never abort the sweep, and an all-failed cycle leaves
//    the stored lists untouched
// 4. **Idempotency**: A healthy, unchanging network produces identical stored
//    lists on every cycle

pub mod traits;
pub mod discovery;
pub mod engine;
pub mod registry;
pub mod config;
pub mod error;
pub mod store;

// Re-export core types for convenience
pub use traits::{NodeQuery, ListStore, NodeAddr, AddressSet, ListKey, SyncStatus};
pub use engine::{RefreshEngine, RefreshOutcome, RefreshReport, KeyOutcome};
pub use registry::ComponentRegistry;
pub use config::{RegistryConfig, StoreConfig, QueryConfig, EngineConfig};
pub use error::{Error, Result};
pub use store::{MemoryListStore, FileListStore};
