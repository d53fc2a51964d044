//! Durable key-value storage for lists, cache entries, and flags.
//!
//! Everything the catalog layer persists goes through the `Storage` trait:
//! the installed/downloaded lists, TTL cache envelopes, and the migration
//! flag. `JsonFileStorage` keeps the whole store in a single JSON document
//! and rewrites it on every mutation; `MemoryStorage` backs tests and
//! ephemeral sessions.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{debug, warn};

/// Namespaced key-value storage over JSON values.
///
/// Implementations use interior mutability so a single instance can be
/// shared (behind `Arc`) between the catalog store, the cache, and the
/// migration service.
pub trait Storage: Send + Sync {
    /// Return the stored value for `key`, if any.
    fn get(&self, key: &str) -> Option<Value>;

    /// Store `value` under `key`, overwriting any existing entry, and
    /// persist the change before returning.
    fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Remove `key` if present and persist the change.
    fn remove(&self, key: &str) -> Result<()>;

    /// All keys currently held, in no particular order.
    fn keys(&self) -> Vec<String>;
}

/// Storage backed by one JSON document on disk.
pub struct JsonFileStorage {
    path: PathBuf,
    entries: Mutex<HashMap<String, Value>>,
}

impl JsonFileStorage {
    /// Open the store at `path`, creating parent directories as needed.
    /// An unreadable or malformed document is logged and treated as empty
    /// rather than failing the whole application.
    pub fn open(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create storage directory {}", parent.display()))?;
        }

        let entries = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read storage file {}", path.display()))?;
            match serde_json::from_str(&contents) {
                Ok(map) => map,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Storage file is malformed, starting empty");
                    HashMap::new()
                }
            }
        } else {
            HashMap::new()
        };

        debug!(path = %path.display(), keys = entries.len(), "Opened storage");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Value>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn save(&self, entries: &HashMap<String, Value>) -> Result<()> {
        let contents = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write storage file {}", self.path.display()))?;
        Ok(())
    }
}

impl Storage for JsonFileStorage {
    fn get(&self, key: &str) -> Option<Value> {
        self.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut entries = self.lock();
        entries.insert(key.to_string(), value);
        self.save(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.lock();
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }
}

/// In-memory storage with the same contract as `JsonFileStorage`.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Value>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<Value> {
        self.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        self.lock().insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock().remove(key);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_storage_roundtrip() {
        let storage = MemoryStorage::new();
        assert!(storage.get("missing").is_none());

        storage.set("a", json!({"x": 1})).unwrap();
        assert_eq!(storage.get("a").unwrap()["x"], 1);

        storage.remove("a").unwrap();
        assert!(storage.get("a").is_none());
    }

    #[test]
    fn test_json_file_storage_persists_across_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app_data.json");

        {
            let storage = JsonFileStorage::open(path.clone()).unwrap();
            storage.set("installedTrainers", json!([])).unwrap();
            storage.set("storage_migrated", json!(true)).unwrap();
        }

        let reopened = JsonFileStorage::open(path).unwrap();
        assert_eq!(reopened.get("storage_migrated"), Some(json!(true)));
        let mut keys = reopened.keys();
        keys.sort();
        assert_eq!(keys, vec!["installedTrainers", "storage_migrated"]);
    }

    #[test]
    fn test_json_file_storage_tolerates_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app_data.json");
        std::fs::write(&path, "not json {").unwrap();

        let storage = JsonFileStorage::open(path).unwrap();
        assert!(storage.keys().is_empty());
    }

    #[test]
    fn test_remove_missing_key_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::open(dir.path().join("s.json")).unwrap();
        storage.remove("nope").unwrap();
    }
}
