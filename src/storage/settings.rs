//! Process-wide editor settings persisted as a flat JSON object.

use super::{read_json_or_default, write_json};
use crate::{Error, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// File name of the settings document inside the data directory.
pub const SETTINGS_FILE: &str = "settings.json";

/// Key/value settings backed by `settings.json`.
///
/// Every `set` is flushed to disk before it returns.
#[derive(Debug, Clone)]
pub struct SettingsFile {
    path: PathBuf,
    values: BTreeMap<String, Value>,
}

impl SettingsFile {
    /// Load settings from `<data_dir>/settings.json`.
    ///
    /// A missing or corrupt file yields an empty mapping.
    pub fn load(data_dir: &Path) -> Self {
        let path = data_dir.join(SETTINGS_FILE);
        let values = read_json_or_default(&path);
        Self { path, values }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get a setting, or `default` when it is not set.
    pub fn get(&self, key: &str, default: Value) -> Value {
        self.values.get(key).cloned().unwrap_or(default)
    }

    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    /// Set a value in memory only; callers persist with [`SettingsFile::write`].
    pub(crate) fn insert(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
    }

    /// Set a value and flush the whole document.
    ///
    /// The in-memory value only changes if the write succeeds.
    pub fn set(&mut self, key: &str, value: Value) -> Result<()> {
        validate_key(key)?;
        let mut next = self.clone();
        next.insert(key, value);
        next.write()?;
        *self = next;
        Ok(())
    }

    /// Write the current values to disk.
    pub fn write(&self) -> Result<()> {
        write_json(&self.path, &self.values)
    }
}

/// Setting keys must be non-blank.
pub fn validate_key(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(Error::InvalidArgument("Setting key must not be empty".to_string()));
    }
    Ok(())
}
