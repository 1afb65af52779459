//! Test doubles and common utilities for refresh contract tests
//!
//! Scripted implementations of the core traits: the network is a static map
//! of "who reports whom" and "who is synced", and the store can be told to
//! fail specific keys.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use nodereg_core::config::EngineConfig;
use nodereg_core::error::Result;
use nodereg_core::traits::{AddressSet, ListKey, ListStore, NodeAddr, NodeQuery, SyncStatus};

/// Build an AddressSet from host strings
pub fn addrs(hosts: &[&str]) -> AddressSet {
    hosts.iter().map(|h| NodeAddr::new(*h)).collect()
}

/// A scripted NodeQuery backed by static maps
///
/// - `peers`: what each address reports when asked for its peer list
/// - `synced`: addresses that report being caught up
/// - `unreachable`: addresses whose queries always fail
///
/// Addresses not in `peers` report an empty peer list; addresses not in
/// `synced` report catching up.
#[derive(Clone, Default)]
pub struct ScriptedNetwork {
    peers: HashMap<NodeAddr, AddressSet>,
    synced: HashSet<NodeAddr>,
    unreachable: HashSet<NodeAddr>,
    peer_calls: Arc<AtomicUsize>,
    status_calls: Arc<AtomicUsize>,
}

impl ScriptedNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the peer list an address reports
    pub fn with_peers(mut self, addr: &str, peers: &[&str]) -> Self {
        self.peers.insert(NodeAddr::new(addr), addrs(peers));
        self
    }

    /// Script addresses that report being synced
    pub fn with_synced(mut self, hosts: &[&str]) -> Self {
        self.synced.extend(hosts.iter().map(|h| NodeAddr::new(*h)));
        self
    }

    /// Script addresses whose every query fails
    pub fn with_unreachable(mut self, hosts: &[&str]) -> Self {
        self.unreachable
            .extend(hosts.iter().map(|h| NodeAddr::new(*h)));
        self
    }

    /// A network where every query fails
    pub fn fully_down(hosts: &[&str]) -> Self {
        Self::new().with_unreachable(hosts)
    }

    pub fn peer_call_count(&self) -> usize {
        self.peer_calls.load(Ordering::SeqCst)
    }

    pub fn status_call_count(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl NodeQuery for ScriptedNetwork {
    async fn peer_addresses(&self, addr: &NodeAddr) -> Result<AddressSet> {
        self.peer_calls.fetch_add(1, Ordering::SeqCst);
        if self.unreachable.contains(addr) {
            return Err(nodereg_core::Error::node_query(format!(
                "{}: connection refused",
                addr
            )));
        }
        Ok(self.peers.get(addr).cloned().unwrap_or_default())
    }

    async fn sync_status(&self, addr: &NodeAddr) -> Result<SyncStatus> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if self.unreachable.contains(addr) {
            return Err(nodereg_core::Error::node_query(format!(
                "{}: connection refused",
                addr
            )));
        }
        if self.synced.contains(addr) {
            Ok(SyncStatus::Synced)
        } else {
            Ok(SyncStatus::NotSynced)
        }
    }

    fn query_name(&self) -> &'static str {
        "scripted"
    }
}

/// A scripted ListStore with per-key failure injection and write counters
#[derive(Clone, Default)]
pub struct ScriptedStore {
    lists: Arc<Mutex<HashMap<ListKey, AddressSet>>>,
    fail_reads: HashSet<ListKey>,
    fail_writes: HashSet<ListKey>,
    write_calls: Arc<AtomicUsize>,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a stored list
    pub fn with_list(self, key: &str, hosts: &[&str]) -> Self {
        self.lists
            .lock()
            .unwrap()
            .insert(ListKey::new(key), addrs(hosts));
        self
    }

    /// Make reads of a key fail
    pub fn with_failing_read(mut self, key: &str) -> Self {
        self.fail_reads.insert(ListKey::new(key));
        self
    }

    /// Make writes of a key fail
    pub fn with_failing_write(mut self, key: &str) -> Self {
        self.fail_writes.insert(ListKey::new(key));
        self
    }

    /// What is currently stored under a key
    pub fn stored(&self, key: &str) -> AddressSet {
        self.lists
            .lock()
            .unwrap()
            .get(&ListKey::new(key))
            .cloned()
            .unwrap_or_default()
    }

    pub fn write_call_count(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ListStore for ScriptedStore {
    async fn list_keys(&self) -> Result<Vec<ListKey>> {
        Ok(self.lists.lock().unwrap().keys().cloned().collect())
    }

    async fn read(&self, key: &ListKey) -> Result<AddressSet> {
        if self.fail_reads.contains(key) {
            return Err(nodereg_core::Error::list_store(format!(
                "injected read failure for {}",
                key
            )));
        }
        Ok(self
            .lists
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .unwrap_or_default())
    }

    async fn write(&self, key: &ListKey, addrs: &AddressSet) -> Result<()> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.contains(key) {
            return Err(nodereg_core::Error::list_store(format!(
                "injected write failure for {}",
                key
            )));
        }
        self.lists
            .lock()
            .unwrap()
            .insert(key.clone(), addrs.clone());
        Ok(())
    }

    fn store_name(&self) -> &'static str {
        "scripted"
    }
}

/// A ListStore whose enumeration fails (store entirely unreachable)
pub struct DownStore;

#[async_trait::async_trait]
impl ListStore for DownStore {
    async fn list_keys(&self) -> Result<Vec<ListKey>> {
        Err(nodereg_core::Error::list_store("store unreachable"))
    }

    async fn read(&self, _key: &ListKey) -> Result<AddressSet> {
        Err(nodereg_core::Error::list_store("store unreachable"))
    }

    async fn write(&self, _key: &ListKey, _addrs: &AddressSet) -> Result<()> {
        Err(nodereg_core::Error::list_store("store unreachable"))
    }

    fn store_name(&self) -> &'static str {
        "down"
    }
}

/// A minimal EngineConfig for tests
pub fn test_config() -> EngineConfig {
    EngineConfig {
        key_prefix: "seeds/".to_string(),
        filter_by_sync: true,
        max_concurrent_queries: 8,
        event_channel_capacity: 100,
    }
}
