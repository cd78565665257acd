//! Durable key-value storage for user preferences.
//!
//! Each logical key holds one JSON document. `FileStore` keeps a
//! `<key>.json` file per key under a data directory; `MemoryStore` is the
//! in-process equivalent used by tests and dry runs.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, warn};

/// Show ids the user starred.
pub const FAVORITE_SHOWS_KEY: &str = "favorites";
/// Starred episodes with their display metadata.
pub const FAVORITE_EPISODES_KEY: &str = "favoriteEpisodes";
/// Played episodes.
pub const LISTEN_HISTORY_KEY: &str = "listenHistory";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid store key {0:?}")]
    InvalidKey(String),
    #[error("store is read-only")]
    ReadOnly,
    #[error("i/o on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub trait PreferenceStore {
    /// Raw payload for `key`, or `None` if nothing was ever written.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replace the payload for `key`.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

fn validate_key(key: &str) -> Result<(), StoreError> {
    let ok = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

/// Read and decode `key`. Absent, unreadable and malformed payloads all
/// decode as `T::default()`.
pub(crate) fn load_json<T, S>(store: &S, key: &str) -> T
where
    T: DeserializeOwned + Default,
    S: PreferenceStore + ?Sized,
{
    let content = match store.get(key) {
        Ok(Some(content)) => content,
        Ok(None) => {
            debug!("[store] {} not present, starting empty", key);
            return T::default();
        }
        Err(e) => {
            warn!("[store] failed to read {}: {}", key, e);
            return T::default();
        }
    };
    match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            warn!("[store] malformed payload for {}, starting empty: {}", key, e);
            T::default()
        }
    }
}

/// Encode and write `value` under `key`. Failures are logged, not returned;
/// the in-memory state stays authoritative.
pub(crate) fn save_json<T, S>(store: &mut S, key: &str, value: &T)
where
    T: Serialize + ?Sized,
    S: PreferenceStore + ?Sized,
{
    let json = match serde_json::to_string(value) {
        Ok(json) => json,
        Err(e) => {
            warn!("[store] failed to encode {}: {}", key, e);
            return;
        }
    };
    if let Err(e) = store.set(key, &json) {
        warn!("[store] failed to persist {}: {}", key, e);
    }
}

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl PreferenceStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;
        // temp + rename: readers never see a partial payload
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, &path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    read_only: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed `key` with a raw payload.
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }

    /// Make every subsequent `set` fail, as a full disk or quota would.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        validate_key(key)?;
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_missing_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.get(FAVORITE_SHOWS_KEY).unwrap().is_none());
    }

    #[test]
    fn test_file_store_creates_dir_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("data"));
        store.set(FAVORITE_SHOWS_KEY, "[\"1\"]").unwrap();
        store.set(FAVORITE_SHOWS_KEY, "[\"2\"]").unwrap();
        assert_eq!(
            store.get(FAVORITE_SHOWS_KEY).unwrap().as_deref(),
            Some("[\"2\"]")
        );
        assert!(dir.path().join("data").join("favorites.json").exists());
        assert!(!dir.path().join("data").join("favorites.json.tmp").exists());
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path());
        assert!(matches!(
            store.set("../escape", "x"),
            Err(StoreError::InvalidKey(_))
        ));
        assert!(matches!(store.get(""), Err(StoreError::InvalidKey(_))));
    }

    #[test]
    fn test_load_json_fails_open() {
        let store = MemoryStore::new().with(FAVORITE_SHOWS_KEY, "not json");
        let ids: Vec<String> = load_json(&store, FAVORITE_SHOWS_KEY);
        assert!(ids.is_empty());

        let missing: Vec<String> = load_json(&store, FAVORITE_EPISODES_KEY);
        assert!(missing.is_empty());
    }

    #[test]
    fn test_save_json_swallows_write_errors() {
        let mut store = MemoryStore::new().read_only();
        save_json(&mut store, FAVORITE_SHOWS_KEY, &vec!["1".to_string()]);
        assert!(store.raw(FAVORITE_SHOWS_KEY).is_none());
    }

    #[test]
    fn test_memory_store_read_only() {
        let mut store = MemoryStore::new().with(FAVORITE_SHOWS_KEY, "[]").read_only();
        assert!(matches!(
            store.set(FAVORITE_SHOWS_KEY, "[\"1\"]"),
            Err(StoreError::ReadOnly)
        ));
        assert_eq!(store.raw(FAVORITE_SHOWS_KEY), Some("[]"));
    }
}
