//! Durable key/value settings storage.
//!
//! Keys are flat strings (dots are part of the key, not a path). Every
//! store serializes access through one mutex, so a multi-key `commit` is
//! atomic with respect to other commits and the last completed write wins.
//!
//! The API is synchronous. `JsonFileStore` writes the file while holding its
//! lock, so a commit blocks the calling thread for one small file write and
//! rename; commits happen once per fetch or user action.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

/// Settings file name inside the settings directory
pub const SETTINGS_FILE: &str = "settings.json";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write settings file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Settings file {path} is not a valid JSON object")]
    Corrupt { path: PathBuf },

    #[error("Invalid value for setting '{key}': {source}")]
    Value {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Synchronous, process-wide key/value store.
pub trait SettingsStore: Send + Sync {
    fn has(&self, key: &str) -> bool;

    fn get_value(&self, key: &str) -> Option<Value>;

    /// Write all entries in one step.
    fn commit(&self, entries: Vec<(&str, Value)>) -> Result<(), SettingsError>;

    /// Write all entries only if every guard key currently holds its
    /// expected value (`None` meaning absent). Returns whether the write
    /// happened.
    fn commit_if(&self, guards: &[Guard<'_>], entries: Vec<(&str, Value)>) -> Result<bool, SettingsError>;

    fn set_value(&self, key: &str, value: Value) -> Result<(), SettingsError> {
        self.commit(vec![(key, value)])
    }
}

/// Typed accessors over any `SettingsStore`.
pub trait SettingsStoreExt: SettingsStore {
    fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, SettingsError> {
        match self.get_value(key) {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|source| SettingsError::Value {
                    key: key.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), SettingsError> {
        self.set_value(key, to_value(key, value)?)
    }
}

impl<S: SettingsStore + ?Sized> SettingsStoreExt for S {}

/// Serialize a settings value, attributing failures to `key`.
pub fn to_value<T: Serialize + ?Sized>(key: &str, value: &T) -> Result<Value, SettingsError> {
    serde_json::to_value(value).map_err(|source| SettingsError::Value {
        key: key.to_string(),
        source,
    })
}

/// A key and the value it must hold for a guarded commit to go through.
pub type Guard<'a> = (&'a str, Option<&'a Value>);

fn guards_hold(doc: &Map<String, Value>, guards: &[Guard<'_>]) -> bool {
    guards.iter().all(|(key, expected)| doc.get(*key) == *expected)
}

fn apply(doc: &Map<String, Value>, entries: Vec<(&str, Value)>) -> Map<String, Value> {
    let mut next = doc.clone();
    for (key, value) in entries {
        next.insert(key.to_string(), value);
    }
    next
}

// ============================================================================
// In-memory store
// ============================================================================

/// Store that lives only as long as the process.
#[derive(Default)]
pub struct MemoryStore {
    doc: Mutex<Map<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemoryStore {
    fn has(&self, key: &str) -> bool {
        self.doc.lock().contains_key(key)
    }

    fn get_value(&self, key: &str) -> Option<Value> {
        self.doc.lock().get(key).cloned()
    }

    fn commit(&self, entries: Vec<(&str, Value)>) -> Result<(), SettingsError> {
        let mut doc = self.doc.lock();
        *doc = apply(&doc, entries);
        Ok(())
    }

    fn commit_if(&self, guards: &[Guard<'_>], entries: Vec<(&str, Value)>) -> Result<bool, SettingsError> {
        let mut doc = self.doc.lock();
        if !guards_hold(&doc, guards) {
            return Ok(false);
        }
        *doc = apply(&doc, entries);
        Ok(true)
    }
}

// ============================================================================
// JSON file store
// ============================================================================

/// Store persisted as one JSON object on disk, written through on every commit.
pub struct JsonFileStore {
    path: PathBuf,
    doc: Mutex<Map<String, Value>>,
}

impl JsonFileStore {
    /// Open (or create) `settings.json` inside `dir`.
    pub fn open(dir: &Path) -> Result<Self, SettingsError> {
        std::fs::create_dir_all(dir).map_err(|source| SettingsError::Write {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = dir.join(SETTINGS_FILE);
        let doc = Self::read_doc(&path)?;
        debug!(path = %path.display(), keys = doc.len(), "Settings loaded");
        Ok(Self {
            path,
            doc: Mutex::new(doc),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_doc(path: &Path) -> Result<Map<String, Value>, SettingsError> {
        if !path.exists() {
            return Ok(Map::new());
        }
        let contents = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if contents.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&contents) {
            Ok(Value::Object(map)) => Ok(map),
            _ => Err(SettingsError::Corrupt {
                path: path.to_path_buf(),
            }),
        }
    }

    // Write to a sibling temp file and rename so a crash never leaves a
    // half-written settings file behind.
    fn persist(&self, doc: &Map<String, Value>) -> Result<(), SettingsError> {
        let write_err = |source| SettingsError::Write {
            path: self.path.clone(),
            source,
        };
        let contents = serde_json::to_string_pretty(doc).map_err(|source| SettingsError::Value {
            key: "*".to_string(),
            source,
        })?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, contents).map_err(write_err)?;
        std::fs::rename(&tmp, &self.path).map_err(write_err)?;
        Ok(())
    }
}

impl SettingsStore for JsonFileStore {
    fn has(&self, key: &str) -> bool {
        self.doc.lock().contains_key(key)
    }

    fn get_value(&self, key: &str) -> Option<Value> {
        self.doc.lock().get(key).cloned()
    }

    fn commit(&self, entries: Vec<(&str, Value)>) -> Result<(), SettingsError> {
        let mut doc = self.doc.lock();
        let next = apply(&doc, entries);
        self.persist(&next)?;
        *doc = next;
        Ok(())
    }

    fn commit_if(&self, guards: &[Guard<'_>], entries: Vec<(&str, Value)>) -> Result<bool, SettingsError> {
        let mut doc = self.doc.lock();
        if !guards_hold(&doc, guards) {
            return Ok(false);
        }
        let next = apply(&doc, entries);
        self.persist(&next)?;
        *doc = next;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_memory_store_has_get_set() {
        let store = MemoryStore::new();
        assert!(!store.has("corona.countryCode"));
        store.set("corona.countryCode", "US").unwrap();
        assert!(store.has("corona.countryCode"));
        assert_eq!(store.get::<String>("corona.countryCode").unwrap().as_deref(), Some("US"));
    }

    #[test]
    fn test_dotted_keys_are_flat() {
        let store = MemoryStore::new();
        store.set("corona", &json!({"country": "US"})).unwrap();
        store.set("corona.countryCode", "DE").unwrap();
        assert_eq!(store.get_value("corona"), Some(json!({"country": "US"})));
    }

    #[test]
    fn test_get_wrong_type_is_error() {
        let store = MemoryStore::new();
        store.set("settings.isOpenAtLogin", "yes").unwrap();
        assert!(matches!(
            store.get::<bool>("settings.isOpenAtLogin"),
            Err(SettingsError::Value { .. })
        ));
    }

    #[test]
    fn test_commit_if_respects_guard() {
        let store = MemoryStore::new();
        store.set("corona.countryCode", "US").unwrap();

        let wrote = store
            .commit_if(&[("corona.countryCode", Some(&json!("DE")))], vec![("corona", json!(1))])
            .unwrap();
        assert!(!wrote);
        assert!(!store.has("corona"));

        let wrote = store
            .commit_if(&[("corona.countryCode", Some(&json!("US")))], vec![("corona", json!(1))])
            .unwrap();
        assert!(wrote);
        assert_eq!(store.get_value("corona"), Some(json!(1)));
    }

    #[test]
    fn test_commit_if_requires_every_guard() {
        let store = MemoryStore::new();
        store
            .commit(vec![
                ("corona.countryCode", json!("US")),
                ("corona.countryLocate", json!("auto")),
            ])
            .unwrap();

        let (us, manual) = (json!("US"), json!("manual"));
        let manual_us = [
            ("corona.countryCode", Some(&us)),
            ("corona.countryLocate", Some(&manual)),
        ];
        assert!(!store.commit_if(&manual_us, vec![("corona", json!(1))]).unwrap());
        assert!(!store.has("corona"));

        store.set("corona.countryLocate", "manual").unwrap();
        assert!(store.commit_if(&manual_us, vec![("corona", json!(1))]).unwrap());
        assert_eq!(store.get_value("corona"), Some(json!(1)));
    }

    #[test]
    fn test_commit_if_absent_guard() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        assert!(store.commit_if(&[("countries", None)], vec![("countries", json!({}))]).unwrap());
        assert!(!store.commit_if(&[("countries", None)], vec![("countries", json!([]))]).unwrap());

        let reopened = JsonFileStore::open(dir.path()).unwrap();
        assert_eq!(reopened.get_value("countries"), Some(json!({})));
    }

    #[test]
    fn test_file_store_persists_across_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = JsonFileStore::open(dir.path()).unwrap();
            store
                .commit(vec![
                    ("corona.countryCode", json!("US")),
                    ("corona.countryLocate", json!("manual")),
                ])
                .unwrap();
        }
        let store = JsonFileStore::open(dir.path()).unwrap();
        assert_eq!(store.get::<String>("corona.countryLocate").unwrap().as_deref(), Some("manual"));
        assert_eq!(store.get::<String>("corona.countryCode").unwrap().as_deref(), Some("US"));
        assert!(!dir.path().join("settings.json.tmp").exists());
    }

    #[test]
    fn test_file_store_missing_or_empty_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        assert!(!store.has("countries"));

        std::fs::write(dir.path().join(SETTINGS_FILE), "  ").unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        assert!(!store.has("countries"));
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILE), "[1, 2, 3]").unwrap();
        assert!(matches!(
            JsonFileStore::open(dir.path()),
            Err(SettingsError::Corrupt { .. })
        ));
    }
}
