//! Durable key-value storage for solved challenges and the countdown.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use deepshell_types::error::Result;

/// String-keyed, string-valued persistent storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// In-process store. Contents are lost when it is dropped.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store backed by a single JSON object on disk.
///
/// Every `set` rewrites the file through a sibling temp file and a rename.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open `path`, starting empty when it does not exist or is unreadable
    /// as a JSON object.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                log::warn!("ignoring corrupt store {}: {e}", path.display());
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                log::error!("cannot read store {}: {e}", path.display());
                return Err(e.into());
            },
        };
        log::debug!("opened store {} ({} keys)", path.display(), entries.len());
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.entries)?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }
}

/// Read and decode a JSON value. Missing, unreadable, or corrupt values
/// yield `None`; the latter two are logged.
pub fn read_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(raw) => raw?,
        Err(e) => {
            log::warn!("store read of '{key}' failed: {e}");
            return None;
        },
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("ignoring corrupt value under '{key}': {e}");
            None
        },
    }
}

/// Encode `value` as JSON and store it under `key`.
pub fn write_json<T: Serialize>(store: &mut dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
    let json = serde_json::to_string(value)?;
    store.set(key, &json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepshell_types::error::GameError;
    use std::collections::BTreeSet;

    #[test]
    fn memory_store_round_trip() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        {
            let mut store = FileStore::open(&path).unwrap();
            store.set("deepshell.solved", "[1,3]").unwrap();
        }
        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get("deepshell.solved").unwrap().as_deref(), Some("[1,3]"));
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("absent.json")).unwrap();
        assert_eq!(store.get("anything").unwrap(), None);
    }

    #[test]
    fn file_store_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{not json").unwrap();
        let mut store = FileStore::open(&path).unwrap();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v").unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"k\""));
    }

    #[test]
    fn file_store_unwritable_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        // The parent directory does not exist.
        let mut store = FileStore::open(dir.path().join("missing").join("state.json")).unwrap();
        assert!(matches!(store.set("k", "v"), Err(GameError::Io(_))));
    }

    #[test]
    fn file_store_unreadable_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(FileStore::open(dir.path()), Err(GameError::Io(_))));
    }

    #[test]
    fn json_helpers() {
        let mut store = MemoryStore::new();
        let solved: BTreeSet<u32> = [2, 1].into_iter().collect();
        write_json(&mut store, "solved", &solved).unwrap();
        assert_eq!(store.get("solved").unwrap().as_deref(), Some("[1,2]"));
        let back: Option<BTreeSet<u32>> = read_json(&store, "solved");
        assert_eq!(back, Some(solved));
    }

    #[test]
    fn corrupt_value_is_ignored() {
        let mut store = MemoryStore::new();
        store.set("solved", "oops").unwrap();
        let back: Option<BTreeSet<u32>> = read_json(&store, "solved");
        assert!(back.is_none());
    }
}
