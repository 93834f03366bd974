//! services/learner/src/adapters/store.rs
//!
//! A small persistent key-value store, the desktop counterpart of browser local
//! storage. It implements the `KeyValueStore` port and holds the bearer token as
//! well as the UI-preference flags.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use learning_core::ports::{KeyValueStore, PortError, PortResult};
use tracing::{info, warn};

use crate::error::LearnerError;

/// A key-value store backed by a single JSON object on disk.
///
/// Every write is flushed to disk immediately. A store created with
/// [`JsonFileStore::in_memory`] keeps its values only for the process lifetime.
pub struct JsonFileStore {
    path: Option<PathBuf>,
    values: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Opens the store at `path`, starting empty if the file does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LearnerError> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&raw)?
            }
        } else {
            info!("No store at {}, starting empty.", path.display());
            BTreeMap::new()
        };
        Ok(Self {
            path: Some(path),
            values: Mutex::new(values),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            values: Mutex::new(BTreeMap::new()),
        }
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> PortResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json =
            serde_json::to_string_pretty(values).map_err(|e| PortError::Unexpected(e.to_string()))?;
        fs::write(path, json).map_err(|e| {
            warn!("Failed to write store {}: {}", path.display(), e);
            PortError::Unexpected(e.to_string())
        })
    }

    fn lock(&self) -> PortResult<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.values
            .lock()
            .map_err(|_| PortError::Unexpected("store lock poisoned".to_string()))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.lock().ok()?.get(key).cloned()
    }

    // Both writers stage the change on a copy; memory only changes once disk has.
    fn set(&self, key: &str, value: &str) -> PortResult<()> {
        let mut values = self.lock()?;
        let mut staged = values.clone();
        staged.insert(key.to_string(), value.to_string());
        self.persist(&staged)?;
        *values = staged;
        Ok(())
    }

    fn remove(&self, key: &str) -> PortResult<()> {
        let mut values = self.lock()?;
        if !values.contains_key(key) {
            return Ok(());
        }
        let mut staged = values.clone();
        staged.remove(key);
        self.persist(&staged)?;
        *values = staged;
        Ok(())
    }
}
