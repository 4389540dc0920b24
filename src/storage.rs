//! Persisted key-value storage behind a small injectable trait.
//!
//! Every store in the client (session, registered users, library, finished)
//! reads and writes one JSON document per named key. The key names are a
//! compatibility contract with previously persisted data, so they are fixed
//! constants here rather than derived.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::warn;

/// Key holding the current session document.
pub const USER_KEY: &str = "user";
/// Key holding the registered `{email, password}` pairs.
pub const REGISTERED_USERS_KEY: &str = "registeredUsers";
/// Key holding the saved-books collection.
pub const LIBRARY_KEY: &str = "library";
/// Key holding the finished-books collection.
pub const FINISHED_KEY: &str = "finishedBooks";

/// One JSON document per named key. An absent key is equivalent to an empty
/// collection or no session; implementations own their locking and treat
/// writes as best-effort.
pub trait Storage: Send + Sync {
    /// Raw document under `key`, if present.
    fn read(&self, key: &str) -> Option<String>;
    /// Replace the document under `key`.
    fn write(&self, key: &str, value: &str);
    /// Drop the document under `key`, if present.
    fn remove(&self, key: &str);
}

/// Decode the document under `key`. Missing and corrupt documents both read
/// as absent.
pub fn read_json<T: DeserializeOwned>(storage: &dyn Storage, key: &str) -> Option<T> {
    let raw = storage.read(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(key, "Discarding unreadable document: {err}");
            None
        }
    }
}

/// Encode and persist `value` under `key`. Errors are logged and ignored to
/// keep the client responsive.
pub fn write_json<T: Serialize>(storage: &dyn Storage, key: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(raw) => storage.write(key, &raw),
        Err(err) => warn!(key, "Failed to encode document: {err}"),
    }
}

/// Disk-backed storage: one `<key>.json` file per key under the data
/// directory.
pub struct DiskStorage {
    dir: PathBuf,
}

impl DiskStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DiskStorage { dir: dir.into() }
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for DiskStorage {
    fn read(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.key_path(key)).ok()
    }

    fn write(&self, key: &str, value: &str) {
        let path = self.key_path(key);
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        if let Err(err) = fs::write(&path, value) {
            warn!(path = %path.display(), "Failed to persist document: {err}");
        }
    }

    fn remove(&self, key: &str) {
        let path = self.key_path(key);
        if let Err(err) = fs::remove_file(&path) {
            if err.kind() != io::ErrorKind::NotFound {
                warn!(path = %path.display(), "Failed to remove document: {err}");
            }
        }
    }
}

/// In-memory storage for tests and ephemeral runs.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn write(&self, key: &str, value: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }
}
