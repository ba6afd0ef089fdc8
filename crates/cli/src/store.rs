//! String key-value stores backing credentials and preferences.

use std::collections::BTreeMap;
#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::path::Path;
use std::path::PathBuf;

use proto::StoreError;
use tracing::{debug, trace, warn};

/// Credential store key holding the API key.
pub const API_KEY: &str = "apikey";
/// Credential store key holding the organization id.
pub const ORGANIZATION: &str = "org";
/// Preference store key holding the selected model version.
pub const GPT_VERSION: &str = "gptVersion";

/// Flat string key-value storage.
pub trait KeyValueStore {
    /// Returns the stored value, if any.
    fn get_string(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, persisting immediately.
    fn set_string(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Deletes `key`. Returns `true` if it existed.
    fn remove(&mut self, key: &str) -> Result<bool, StoreError>;
}

// ─── FileStore ──────────────────────────────────────────────

/// Key-value store persisted as a flat TOML table.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileStore {
    /// Opens the store at `path`; a missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            toml::from_str(&content).map_err(|e| StoreError::Toml(e.to_string()))?
        } else {
            BTreeMap::new()
        };
        trace!(path = %path.display(), keys = %values.len(), "Store opened");
        Ok(Self { path, values })
    }

    /// Opens the store, falling back to an empty one if the file is unreadable.
    ///
    /// The broken file is left in place until the next write replaces it.
    pub fn open_or_empty(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match Self::open(path.clone()) {
            Ok(store) => store,
            Err(e) => {
                warn!(path = %path.display(), "Failed to read store ({e}), starting empty");
                Self {
                    path,
                    values: BTreeMap::new(),
                }
            }
        }
    }

    /// File backing this store.
    #[cfg(test)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(&self.values).map_err(|e| StoreError::Serialize(e.to_string()))?;
        std::fs::write(&self.path, content)?;
        debug!(path = %self.path.display(), keys = %self.values.len(), "Store saved");
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get_string(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set_string(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value.to_string());
        self.persist()
    }

    fn remove(&mut self, key: &str) -> Result<bool, StoreError> {
        let existed = self.values.remove(key).is_some();
        if existed {
            self.persist()?;
        }
        Ok(existed)
    }
}

// ─── MemoryStore ────────────────────────────────────────────

/// Non-persistent store.
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

#[cfg(test)]
impl MemoryStore {
    /// Store pre-filled with `pairs`.
    pub fn with(pairs: &[(&str, &str)]) -> Self {
        Self {
            values: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

#[cfg(test)]
impl KeyValueStore for MemoryStore {
    fn get_string(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set_string(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool, StoreError> {
        Ok(self.values.remove(key).is_some())
    }
}

// ─── EnvOverride ────────────────────────────────────────────

/// Wraps a store so selected keys can be overridden by environment variables.
///
/// Reads prefer a non-empty variable; writes always go to the inner store.
pub struct EnvOverride<S> {
    inner: S,
    vars: Vec<(&'static str, &'static str)>,
}

impl<S: KeyValueStore> EnvOverride<S> {
    /// `vars` maps store keys to environment variable names.
    pub fn new(inner: S, vars: Vec<(&'static str, &'static str)>) -> Self {
        Self { inner, vars }
    }

    fn env_for(&self, key: &str) -> Option<String> {
        let (_, var) = self.vars.iter().find(|(k, _)| *k == key)?;
        std::env::var(var).ok().filter(|v| !v.trim().is_empty())
    }
}

impl<S: KeyValueStore> KeyValueStore for EnvOverride<S> {
    fn get_string(&self, key: &str) -> Option<String> {
        self.env_for(key).or_else(|| self.inner.get_string(key))
    }

    fn set_string(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.inner.set_string(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<bool, StoreError> {
        self.inner.remove(key)
    }
}

// ─── Credentials ────────────────────────────────────────────

/// API credentials read from the credential store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Secret API key.
    pub api_key: String,
    /// Organization identifier sent with every request.
    pub organization_id: String,
}

impl Credentials {
    /// Reads both values; `None` when either is absent or blank.
    pub fn read(store: &dyn KeyValueStore) -> Option<Self> {
        let non_blank = |key: &str| {
            store
                .get_string(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Some(Self {
            api_key: non_blank(API_KEY)?,
            organization_id: non_blank(ORGANIZATION)?,
        })
    }

    /// Writes both values to the store.
    pub fn write(&self, store: &mut dyn KeyValueStore) -> Result<(), StoreError> {
        store.set_string(API_KEY, &self.api_key)?;
        store.set_string(ORGANIZATION, &self.organization_id)
    }

    /// Removes both values. Returns `true` if anything was stored.
    pub fn clear(store: &mut dyn KeyValueStore) -> Result<bool, StoreError> {
        let key = store.remove(API_KEY)?;
        let org = store.remove(ORGANIZATION)?;
        Ok(key || org)
    }
}
