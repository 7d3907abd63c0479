//! API key storage
//!
//! The user-supplied key is kept behind the [`KeyValueStore`] capability so
//! the backing store can be swapped without touching the rest of the app.
//! When no key has been saved, the environment provides a default.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::get_config_dir;

/// Key under which the user-supplied API key is stored
pub const API_KEY_ENTRY: &str = "gemini_api_key";

/// Environment variables consulted, in order, when no key is stored
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Environment variable overriding the credential file location
pub const CREDENTIALS_PATH_ENV: &str = "UI2PRD_CREDENTIALS";

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Failed to access credential store {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Credential store {path:?} is corrupt: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Failed to determine credential store location: {0}")]
    Location(String),
}

/// Minimal string key-value persistence
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, CredentialError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), CredentialError>;
    fn remove(&mut self, key: &str) -> Result<(), CredentialError>;
}

/// Key-value store kept in memory for the lifetime of the process
#[derive(Debug, Default, Clone)]
pub struct MemoryKeyValueStore {
    entries: BTreeMap<String, String>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, CredentialError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CredentialError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), CredentialError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Key-value store backed by a YAML map on disk
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    path: PathBuf,
}

impl FileKeyValueStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Store at `$UI2PRD_CREDENTIALS` or `~/.ui2prd/credentials.yaml`
    pub fn open_default() -> Result<Self, CredentialError> {
        if let Ok(path) = std::env::var(CREDENTIALS_PATH_ENV) {
            return Ok(Self::new(path));
        }
        let dir = get_config_dir().map_err(|e| CredentialError::Location(e.to_string()))?;
        Ok(Self::new(dir.join("credentials.yaml")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> CredentialError {
        CredentialError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, CredentialError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_yaml::from_str(&content).map_err(|e| CredentialError::Parse {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), CredentialError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let content = serde_yaml::to_string(entries).map_err(|e| CredentialError::Parse {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        fs::write(&self.path, content).map_err(|e| self.io_error(e))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, CredentialError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CredentialError> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove(&mut self, key: &str) -> Result<(), CredentialError> {
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

/// Where a resolved API key came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    Stored,
    Environment(&'static str),
}

/// A usable API key
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey {
    pub value: String,
    pub source: KeySource,
}

impl ApiKey {
    /// Masked key plus where it came from, for status lines
    pub fn summary(&self) -> String {
        match self.source {
            KeySource::Stored => format!("{} (saved)", mask_key(&self.value)),
            KeySource::Environment(var) => format!("{} (from ${})", mask_key(&self.value), var),
        }
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKey")
            .field("value", &mask_key(&self.value))
            .field("source", &self.source)
            .finish()
    }
}

/// Saves a user-supplied key; a blank key removes the stored one
pub fn save_api_key(store: &mut dyn KeyValueStore, key: &str) -> Result<(), CredentialError> {
    let key = key.trim();
    if key.is_empty() {
        store.remove(API_KEY_ENTRY)
    } else {
        store.set(API_KEY_ENTRY, key)
    }
}

/// Removes the stored key
pub fn clear_api_key(store: &mut dyn KeyValueStore) -> Result<(), CredentialError> {
    store.remove(API_KEY_ENTRY)
}

/// The stored user-supplied key, ignoring blanks
pub fn stored_api_key(store: &dyn KeyValueStore) -> Result<Option<String>, CredentialError> {
    Ok(store
        .get(API_KEY_ENTRY)?
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty()))
}

/// Resolves the key to use: stored key first, then the environment
pub fn resolve_api_key<F>(
    store: &dyn KeyValueStore,
    env: F,
) -> Result<Option<ApiKey>, CredentialError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = stored_api_key(store)? {
        return Ok(Some(ApiKey {
            value,
            source: KeySource::Stored,
        }));
    }

    for var in API_KEY_ENV_VARS {
        if let Some(value) = env(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
            return Ok(Some(ApiKey {
                value,
                source: KeySource::Environment(var),
            }));
        }
    }

    Ok(None)
}

/// Resolves the key against the process environment
pub fn resolve_api_key_from_env(
    store: &dyn KeyValueStore,
) -> Result<Option<ApiKey>, CredentialError> {
    resolve_api_key(store, |name| std::env::var(name).ok())
}

/// Masks all but the last four characters of a key for display
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), visible)
}
