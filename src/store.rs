use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Whole-file JSON persistence: every mutation rewrites the file. Loads are
/// forgiving (missing or corrupt file yields the default), saves report
/// errors so callers can log and move on.
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                log::warn!("could not create {}: {}", parent.display(), e);
            }
        }
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load<T: DeserializeOwned + Default>(&self) -> T {
        if !self.path.exists() {
            return T::default();
        }
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(e) => {
                    log::warn!("could not parse {}: {}", self.path.display(), e);
                    T::default()
                }
            },
            Err(e) => {
                log::warn!("could not read {}: {}", self.path.display(), e);
                T::default()
            }
        }
    }

    pub fn save<T: Serialize>(&self, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(value)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("items.json"));

        let empty: Vec<String> = store.load();
        assert!(empty.is_empty());

        let items = vec!["a".to_string(), "b".to_string()];
        store.save(&items).unwrap();
        let loaded: Vec<String> = store.load();
        assert_eq!(loaded, items);
    }

    #[test]
    fn corrupt_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("items.json");
        std::fs::write(&path, "not json{").unwrap();
        let store = JsonStore::new(&path);
        let loaded: Vec<String> = store.load();
        assert!(loaded.is_empty());
    }
}
