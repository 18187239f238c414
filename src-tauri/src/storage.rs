//! Key-value persistence for the tracker's JSON documents.
//!
//! Every collection lives under one string key (`auditInstances`,
//! `customTemplates`, `users`, `currentUser`). Values are JSON text and are
//! always read and written whole.

use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{AuditError, Result};

pub const AUDIT_INSTANCES_KEY: &str = "auditInstances";
pub const CUSTOM_TEMPLATES_KEY: &str = "customTemplates";
pub const USERS_KEY: &str = "users";
pub const CURRENT_USER_KEY: &str = "currentUser";

/// Synchronous string-keyed store, the local equivalent of browser storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

pub type SharedStore = Arc<dyn KeyValueStore>;

/// One `<key>.json` file per key under a root directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(root.as_path())?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    fn key_path(&self, key: &str) -> Result<PathBuf> {
        let rel = sanitize_key(key)?;
        let mut path = self.root.join(rel);
        path.set_extension("json");
        Ok(path)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key)?;
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key)?;
        write_text_file(path, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.key_path(key)?;
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries().remove(key);
        Ok(())
    }
}

/// Loads a JSON array stored under `key`.
///
/// A missing key, unreadable value or malformed document yields an empty
/// collection. Elements that do not match `T` are skipped one by one so the
/// rest of the collection survives. Failures are logged, never surfaced.
pub fn load_list<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Vec<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(error) => {
            tracing::warn!(%error, key, "failed to read stored collection");
            return Vec::new();
        }
    };
    let values = match serde_json::from_str::<Vec<serde_json::Value>>(raw.as_str()) {
        Ok(values) => values,
        Err(error) => {
            tracing::warn!(%error, key, "malformed stored collection; using empty list");
            return Vec::new();
        }
    };
    values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value::<T>(value) {
            Ok(item) => Some(item),
            Err(error) => {
                tracing::warn!(%error, key, index, "skipping unreadable stored record");
                None
            }
        })
        .collect()
}

/// Loads a single JSON value, with the same fail-soft rules as [`load_list`].
pub fn load_value<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(raw) => raw?,
        Err(error) => {
            tracing::warn!(%error, key, "failed to read stored value");
            return None;
        }
    };
    match serde_json::from_str::<T>(raw.as_str()) {
        Ok(value) => Some(value),
        Err(error) => {
            tracing::warn!(%error, key, "malformed stored value; ignoring");
            None
        }
    }
}

pub fn save_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    store.set(key, content.as_str())
}

fn write_text_file(path: PathBuf, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

fn sanitize_key(value: &str) -> Result<PathBuf> {
    let mut out = PathBuf::new();
    for component in PathBuf::from(value).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            _ => return Err(AuditError::InvalidKey(value.to_string())),
        }
    }
    if out.as_os_str().is_empty() {
        return Err(AuditError::InvalidKey(value.to_string()));
    }
    Ok(out)
}
