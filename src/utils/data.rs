use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// Serialized [`crate::models::LicenseSession`]
pub const SESSION_KEY: &str = "license_session";
/// Raw key kept after logout to pre-fill the login form
pub const REMEMBERED_KEY: &str = "remembered_license_key";

/// Local key-value store standing in for browser local storage
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Read a JSON value stored under `key`
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>> {
    match store.get(key)? {
        Some(json) => {
            let value = serde_json::from_str(&json)
                .with_context(|| format!("Failed to deserialize stored {}", key))?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

/// Store `value` as JSON under `key`
pub fn save_json<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
    let json =
        serde_json::to_string(value).with_context(|| format!("Failed to serialize {}", key))?;
    store.set(key, &json)
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store poisoned"))?;
        entries.remove(key);
        Ok(())
    }
}

/// Store persisted as one pretty-printed JSON object on disk.
/// Every write replaces the whole file through a temp file and a rename.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let json = std::fs::read_to_string(&self.path).context("Failed to read store file")?;
        if json.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&json).context("Failed to deserialize store file")
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(suffix);
        PathBuf::from(name)
    }

    /// Entries to start a write from. An unreadable file is moved aside so
    /// the store keeps working.
    fn read_for_update(&self) -> Result<BTreeMap<String, String>> {
        match self.read_all() {
            Ok(entries) => Ok(entries),
            Err(e) => {
                let backup = self.sibling(".corrupt");
                warn!(
                    "Store file {} unreadable ({:#}), moving it to {}",
                    self.path.display(),
                    e,
                    backup.display()
                );
                std::fs::rename(&self.path, &backup)
                    .context("Failed to move unreadable store file aside")?;
                Ok(BTreeMap::new())
            }
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).context("Failed to create store directory")?;
            }
        }
        let json = serde_json::to_string_pretty(entries).context("Failed to serialize store")?;
        let tmp = self.sibling(".tmp");
        std::fs::write(&tmp, json).context("Failed to write temp store file")?;
        std::fs::rename(&tmp, &self.path).context("Failed to replace store file")?;
        Ok(())
    }

    fn locked<R>(&self, f: impl FnOnce() -> Result<R>) -> Result<R> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| anyhow::anyhow!("file store poisoned"))?;
        f()
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.locked(|| Ok(self.read_all()?.get(key).cloned()))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.locked(|| {
            let mut entries = self.read_for_update()?;
            entries.insert(key.to_string(), value.to_string());
            self.write_all(&entries)
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.locked(|| {
            let mut entries = self.read_for_update()?;
            if entries.remove(key).is_some() || !self.path.exists() {
                self.write_all(&entries)?;
            }
            Ok(())
        })
    }
}
