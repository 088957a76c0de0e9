// SPDX-License-Identifier: MIT
// Copyright 2026 The MewScore Authors

//! Local key/value preferences stored as a JSON object in one file.
//!
//! Holds the theme mode and the persisted Firebase session.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::Config;

#[derive(Debug, thiserror::Error)]
pub enum PreferenceError {
    #[error("Preference file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Preference file is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct Preferences {
    path: PathBuf,
}

impl Preferences {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Preference file named by `PREFERENCES_PATH`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.preferences_path.clone())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        Ok(self.read_all().await?.remove(key))
    }

    /// Store `value` under `key`, keeping the other entries.
    ///
    /// An unreadable file is replaced rather than blocking the write.
    pub async fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        let mut entries = self.read_for_write().await?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries).await
    }

    /// Drop `key`. Missing keys and files are not an error.
    pub async fn remove(&self, key: &str) -> Result<(), PreferenceError> {
        let mut entries = self.read_for_write().await?;
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.write_all(&entries).await
    }

    async fn read_all(&self) -> Result<BTreeMap<String, String>, PreferenceError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn read_for_write(&self) -> Result<BTreeMap<String, String>, PreferenceError> {
        match self.read_all().await {
            Ok(entries) => Ok(entries),
            Err(PreferenceError::Corrupt(e)) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Replacing corrupt preference file");
                Ok(BTreeMap::new())
            }
            Err(e) => Err(e),
        }
    }

    async fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), PreferenceError> {
        let json = serde_json::to_vec_pretty(entries)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch() -> Preferences {
        let nonce: u64 = rand::random();
        Preferences::new(std::env::temp_dir().join(format!("mewscore-prefs-{:x}.json", nonce)))
    }

    #[tokio::test]
    async fn test_remove_keeps_other_keys() {
        let preferences = scratch();
        preferences.set("a", "1").await.unwrap();
        preferences.set("b", "2").await.unwrap();

        preferences.remove("a").await.unwrap();
        preferences.remove("missing").await.unwrap();

        assert_eq!(preferences.get("a").await.unwrap(), None);
        assert_eq!(preferences.get("b").await.unwrap().as_deref(), Some("2"));
        let _ = std::fs::remove_file(preferences.path());
    }

    #[tokio::test]
    async fn test_remove_without_file_is_noop() {
        let preferences = scratch();
        preferences.remove("a").await.unwrap();
        assert!(!preferences.path().exists());
    }
}
