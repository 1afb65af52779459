// # File List Store
//
// File-based implementation of ListStore: one JSON-array file per key under
// a root directory.
//
// ## Layout
//
// The key is the file's path relative to the root, so `seeds/testnet.json`
// lives at `<root>/seeds/testnet.json` and contains:
//
// ```json
// ["203.0.113.7", "198.51.100.4"]
// ```
//
// This mirrors the published object format exactly, which makes the store
// useful both as a local deployment target and as a fixture for tests.
//
// ## Durability
//
// Writes go to a temporary file first and are renamed into place, so a crash
// mid-write never leaves a half-written list behind.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::traits::list_store::{ListKey, ListStore, ListStoreFactory};
use crate::traits::node_query::{AddressSet, NodeAddr};

/// File-based list store
///
/// # Example
///
/// ```rust,no_run
/// use nodereg_core::store::FileListStore;
/// use nodereg_core::traits::{ListStore, ListKey, NodeAddr, AddressSet};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileListStore::new("/var/lib/nodereg").await?;
///     let key = ListKey::new("seeds/testnet.json");
///
///     let addrs: AddressSet = [NodeAddr::new("1.2.3.4")].into_iter().collect();
///     store.write(&key, &addrs).await?;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileListStore {
    root: PathBuf,
}

impl FileListStore {
    /// Create a file store rooted at `root`, creating the directory if needed
    pub async fn new<P: AsRef<Path>>(root: P) -> Result<Self, Error> {
        let root = root.as_ref().to_path_buf();

        fs::create_dir_all(&root).await.map_err(|e| {
            Error::config(format!(
                "failed to create store root {}: {}",
                root.display(),
                e
            ))
        })?;

        Ok(Self { root })
    }

    /// Resolve a key to its file path, rejecting path traversal
    fn key_path(&self, key: &ListKey) -> Result<PathBuf, Error> {
        let relative = Path::new(key.as_str());
        let traversal = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if traversal || key.as_str().is_empty() {
            return Err(Error::list_store(format!("invalid list key: {:?}", key.as_str())));
        }
        Ok(self.root.join(relative))
    }

    /// Recursively collect every file under the root as a key
    async fn walk_keys(&self) -> Result<Vec<ListKey>, Error> {
        let mut keys = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                // A root that does not exist yet holds no lists
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(Error::list_store(format!(
                        "failed to read {}: {}",
                        dir.display(),
                        e
                    )));
                }
            };

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| Error::list_store(format!("failed to read {}: {}", dir.display(), e)))?
            {
                let path = entry.path();
                let file_type = entry.file_type().await.map_err(|e| {
                    Error::list_store(format!("failed to stat {}: {}", path.display(), e))
                })?;

                if file_type.is_dir() {
                    pending.push(path);
                } else if let Ok(relative) = path.strip_prefix(&self.root) {
                    // Keys use '/' separators regardless of platform
                    let key = relative
                        .components()
                        .filter_map(|c| c.as_os_str().to_str())
                        .collect::<Vec<_>>()
                        .join("/");
                    keys.push(ListKey::new(key));
                }
            }
        }

        Ok(keys)
    }
}

#[async_trait]
impl ListStore for FileListStore {
    async fn list_keys(&self) -> Result<Vec<ListKey>, Error> {
        self.walk_keys().await
    }

    async fn read(&self, key: &ListKey) -> Result<AddressSet, Error> {
        let path = self.key_path(key)?;

        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            // A missing list is an empty list, not an error
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(AddressSet::new()),
            Err(e) => {
                return Err(Error::list_store(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let addrs: Vec<NodeAddr> = serde_json::from_str(&content).map_err(|e| {
            Error::list_store(format!("failed to parse {}: {}", path.display(), e))
        })?;

        Ok(addrs.into_iter().collect())
    }

    async fn write(&self, key: &ListKey, addrs: &AddressSet) -> Result<(), Error> {
        let path = self.key_path(key)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::list_store(format!(
                    "failed to create {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let ordered: Vec<&NodeAddr> = addrs.iter().collect();
        let json = serde_json::to_string_pretty(&ordered)?;

        // Write to a temporary file first, then rename into place
        let mut temp_path = path.clone();
        temp_path.set_extension("tmp");
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::list_store(format!(
                    "failed to create {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(json.as_bytes()).await.map_err(|e| {
                Error::list_store(format!(
                    "failed to write {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.flush().await.map_err(|e| {
                Error::list_store(format!(
                    "failed to flush {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        fs::rename(&temp_path, &path).await.map_err(|e| {
            Error::list_store(format!(
                "failed to rename {} to {}: {}",
                temp_path.display(),
                path.display(),
                e
            ))
        })?;

        tracing::trace!("list written to {}", path.display());
        Ok(())
    }

    fn store_name(&self) -> &'static str {
        "file"
    }
}

/// Factory for creating file list stores
pub struct FileListStoreFactory;

impl ListStoreFactory for FileListStoreFactory {
    fn create(
        &self,
        config: &crate::config::StoreConfig,
    ) -> Result<Box<dyn ListStore>, Error> {
        match config {
            crate::config::StoreConfig::File { root } => {
                let root = PathBuf::from(root);
                // Factory creation is synchronous; the root is created on
                // first write, and a missing root enumerates zero keys.
                Ok(Box::new(FileListStore { root }))
            }
            _ => Err(Error::config("invalid config for file store")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn addrs(hosts: &[&str]) -> AddressSet {
        hosts.iter().map(|h| NodeAddr::new(*h)).collect()
    }

    #[tokio::test]
    async fn test_file_store_roundtrip() {
        let dir = tempdir().unwrap();
        let store = FileListStore::new(dir.path()).await.unwrap();
        let key = ListKey::new("seeds/testnet.json");

        // Missing key reads as empty
        assert!(store.read(&key).await.unwrap().is_empty());

        let list = addrs(&["203.0.113.7", "198.51.100.4"]);
        store.write(&key, &list).await.unwrap();
        assert_eq!(store.read(&key).await.unwrap(), list);

        // A fresh store instance sees the persisted list
        let store2 = FileListStore::new(dir.path()).await.unwrap();
        assert_eq!(store2.read(&key).await.unwrap(), list);
    }

    #[tokio::test]
    async fn test_file_store_persisted_format_is_json_array() {
        let dir = tempdir().unwrap();
        let store = FileListStore::new(dir.path()).await.unwrap();
        let key = ListKey::new("seeds/testnet.json");

        store.write(&key, &addrs(&["5.6.7.8", "1.2.3.4"])).await.unwrap();

        let raw = std::fs::read_to_string(dir.path().join("seeds/testnet.json")).unwrap();
        let parsed: Vec<String> = serde_json::from_str(&raw).unwrap();
        // Deterministic sorted order
        assert_eq!(parsed, vec!["1.2.3.4".to_string(), "5.6.7.8".to_string()]);
    }

    #[tokio::test]
    async fn test_file_store_lists_nested_keys() {
        let dir = tempdir().unwrap();
        let store = FileListStore::new(dir.path()).await.unwrap();

        store
            .write(&ListKey::new("seeds/a.json"), &addrs(&["1.2.3.4"]))
            .await
            .unwrap();
        store
            .write(&ListKey::new("other.json"), &addrs(&["5.6.7.8"]))
            .await
            .unwrap();

        let keys = store.list_keys().await.unwrap();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&ListKey::new("seeds/a.json")));
        assert!(keys.contains(&ListKey::new("other.json")));
    }

    #[tokio::test]
    async fn test_factory_store_lists_no_keys_on_fresh_root() {
        let dir = tempdir().unwrap();
        let config = crate::config::StoreConfig::File {
            root: dir.path().join("never-created").to_string_lossy().into_owned(),
        };
        let store = FileListStoreFactory.create(&config).unwrap();

        // A root that has never been written to is an empty store,
        // not a failed cycle
        assert!(store.list_keys().await.unwrap().is_empty());
        assert!(
            store
                .read(&ListKey::new("seeds/testnet.json"))
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_file_store_rejects_traversal_keys() {
        let dir = tempdir().unwrap();
        let store = FileListStore::new(dir.path()).await.unwrap();

        let key = ListKey::new("../escape.json");
        assert!(store.read(&key).await.is_err());
        assert!(store.write(&key, &addrs(&["1.2.3.4"])).await.is_err());
    }

    #[tokio::test]
    async fn test_file_store_corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let store = FileListStore::new(dir.path()).await.unwrap();
        let key = ListKey::new("seeds/bad.json");

        std::fs::create_dir_all(dir.path().join("seeds")).unwrap();
        std::fs::write(dir.path().join("seeds/bad.json"), b"not json").unwrap();

        // Surfaced as a store error; the engine confines it to this key
        assert!(store.read(&key).await.is_err());
    }
}
