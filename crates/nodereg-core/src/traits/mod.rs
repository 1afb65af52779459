//! Core traits for the peer registry service
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`NodeQuery`]: Read-only status queries against a node's network endpoint
//! - [`ListStore`]: Durable, per-key address list storage

pub mod node_query;
pub mod list_store;

pub use node_query::{NodeQuery, NodeAddr, AddressSet, SyncStatus, NodeQueryFactory};
pub use list_store::{ListStore, ListKey, ListStoreFactory};
