//! Persistence collaborators
//!
//! Collections are loaded and saved whole: there is no partial update API.
//! An absent collection loads as an empty list.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::StorageConfig;
use crate::error::{CoreError, Result};

/// Keyed list storage
pub trait Persistence {
    /// Load the whole collection stored under `key`
    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>>;

    /// Replace the whole collection stored under `key`
    fn save<T: Serialize>(&self, key: &str, items: &[T]) -> Result<()>;
}

/// In-memory storage holding JSON-shaped collections
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, serde_json::Value>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw JSON stored under `key`
    pub fn raw(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let collections = self
            .collections
            .read()
            .map_err(|e| CoreError::StorageError(format!("Failed to read collections: {}", e)))?;
        Ok(collections.get(key).cloned())
    }

    /// Store raw JSON under `key`, bypassing typing
    pub fn put_raw(&self, key: &str, value: serde_json::Value) -> Result<()> {
        let mut collections = self
            .collections
            .write()
            .map_err(|e| CoreError::StorageError(format!("Failed to write collections: {}", e)))?;
        collections.insert(key.to_string(), value);
        Ok(())
    }
}

impl Persistence for MemoryStore {
    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        match self.raw(key)? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(Vec::new()),
        }
    }

    fn save<T: Serialize>(&self, key: &str, items: &[T]) -> Result<()> {
        let value = serde_json::to_value(items)?;
        self.put_raw(key, value)
    }
}

/// One JSON file per collection, `<dir>/<key>.json`
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
    pretty: bool,
}

impl JsonFileStore {
    /// Create a store rooted at `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        JsonFileStore {
            dir: dir.into(),
            pretty: true,
        }
    }

    /// Create a store from the storage configuration
    pub fn from_config(config: &StorageConfig) -> Self {
        JsonFileStore {
            dir: config.data_dir.clone(),
            pretty: config.pretty_json,
        }
    }

    /// Root directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(CoreError::StorageError(format!("Invalid collection key: {:?}", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl Persistence for JsonFileStore {
    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        let path = self.path_for(key)?;
        if !path.exists() {
            debug!("No collection file at {}", path.display());
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn save<T: Serialize>(&self, key: &str, items: &[T]) -> Result<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;

        let contents = if self.pretty {
            serde_json::to_string_pretty(items)?
        } else {
            serde_json::to_string(items)?
        };

        // Replace the collection file atomically
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &path)?;
        debug!("Saved {} item(s) to {}", items.len(), path.display());
        Ok(())
    }
}
