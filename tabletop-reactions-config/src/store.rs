use cosmic_config::{Config, ConfigGet, ConfigSet};
use serde::{Serialize, de::DeserializeOwned};
use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::{ID, LEGACY_VERSION, VERSION};

/// Failure reported by a [`SettingsStore`] backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read setting `{key}`: {reason}")]
    Read { key: String, reason: String },
    #[error("failed to write setting `{key}`: {reason}")]
    Write { key: String, reason: String },
    #[error("settings store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn read(key: &str, reason: impl ToString) -> Self {
        Self::Read {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn write(key: &str, reason: impl ToString) -> Self {
        Self::Write {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Per-client key-value settings store.
///
/// Values are read and written as whole units; merging partial records is the
/// caller's job. A missing key reads as `Ok(None)`.
pub trait SettingsStore {
    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError>;

    fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError>;
}

impl<S: SettingsStore + ?Sized> SettingsStore for &S {
    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        (**self).read(key)
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        (**self).write(key, value)
    }
}

impl SettingsStore for Config {
    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match ConfigGet::get::<T>(self, key) {
            Ok(value) => Ok(Some(value)),
            Err(err) if !err.is_err() => Ok(None),
            Err(err) => Err(StoreError::read(key, format!("{err:?}"))),
        }
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        ConfigSet::set(self, key, value).map_err(|err| StoreError::write(key, format!("{err:?}")))
    }
}

/// Open the current settings store for this user.
pub fn open() -> Result<Config, StoreError> {
    Config::new(ID, VERSION).map_err(|err| StoreError::Unavailable(format!("{err:?}")))
}

/// Open the version-1 store that [`crate::migrate_legacy`] reads from.
pub fn open_legacy() -> Result<Config, StoreError> {
    Config::new(ID, LEGACY_VERSION).map_err(|err| StoreError::Unavailable(format!("{err:?}")))
}

/// In-memory store holding JSON values.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, serde_json::Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a raw value without type checking, e.g. a legacy JSON string.
    pub fn insert_raw(&self, key: &str, value: serde_json::Value) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value);
        }
    }

    pub fn raw(&self, key: &str) -> Option<serde_json::Value> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.raw(key).is_some()
    }
}

impl SettingsStore for MemoryStore {
    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let entries = self
            .entries
            .lock()
            .map_err(|err| StoreError::read(key, err))?;
        match entries.get(key) {
            Some(value) => T::deserialize(value)
                .map(Some)
                .map_err(|err| StoreError::read(key, err)),
            None => Ok(None),
        }
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(value).map_err(|err| StoreError::write(key, err))?;
        self.entries
            .lock()
            .map_err(|err| StoreError::write(key, err))?
            .insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_reads_as_none() {
        let store = MemoryStore::new();
        assert_eq!(store.read::<u32>("imgSize"), Ok(None));
    }

    #[test]
    fn write_then_read() {
        let store = MemoryStore::new();
        store.write("imgSize", &120u32).unwrap();
        assert_eq!(store.read::<u32>("imgSize"), Ok(Some(120)));
    }

    #[test]
    fn type_mismatch_is_a_read_error() {
        let store = MemoryStore::new();
        store.insert_raw("imgSize", serde_json::json!("not a number"));
        let err = store.read::<u32>("imgSize").unwrap_err();
        assert!(matches!(err, StoreError::Read { ref key, .. } if key == "imgSize"));
    }

    #[test]
    fn reference_forwards_to_store() {
        let store = MemoryStore::new();
        let by_ref = &store;
        by_ref.write("approvalDuration", &7u32).unwrap();
        assert_eq!(store.read::<u32>("approvalDuration"), Ok(Some(7)));
    }
}
