//! File-backed local store: one JSON file per key.
//!
//! ```text
//! <DATA_DIR>/
//!   events.json
//!   todos.json
//!   memo.json
//!   ...
//! ```

use serde_json::Value;
use std::fs;
use std::io;
use std::path::PathBuf;

use super::{LocalStore, StorageError};

#[derive(Debug, Clone)]
pub struct FileStore {
    data_dir: PathBuf,
}

impl FileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }

    /// Returns the file path for a key.
    pub fn path(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", key))
    }

    /// Rejects keys that would escape the data directory.
    fn validate_key(key: &str) -> Result<(), StorageError> {
        if key.is_empty()
            || key.contains('/')
            || key.contains('\\')
            || key.contains("..")
            || key.starts_with('.')
        {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(())
    }
}

impl LocalStore for FileStore {
    fn get(&self, key: &str) -> Option<Value> {
        if Self::validate_key(key).is_err() {
            tracing::warn!(key, "ignoring read of invalid storage key");
            return None;
        }
        let path = self.path(key);

        match fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "unreadable local value");
                    None
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read local value");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &Value) -> Result<(), StorageError> {
        Self::validate_key(key)?;

        fs::create_dir_all(&self.data_dir)
            .map_err(|e| StorageError::IoError(self.data_dir.clone(), e))?;

        let path = self.path(key);
        let tmp = self.data_dir.join(format!(".{}.json.tmp", key));
        let bytes = serde_json::to_vec_pretty(value)
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;

        fs::write(&tmp, bytes).map_err(|e| StorageError::IoError(tmp.clone(), e))?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(StorageError::IoError(path, e));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn test_store() -> (FileStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().to_path_buf());
        (store, temp_dir)
    }

    #[test]
    fn test_path() {
        let (store, _temp) = test_store();
        assert!(store.path("events").ends_with("events.json"));
    }

    #[test]
    fn test_get_missing_returns_none() {
        let (store, _temp) = test_store();
        assert!(store.get("events").is_none());
    }

    #[test]
    fn test_set_and_get_roundtrip() {
        let (store, _temp) = test_store();
        let value = json!([{"id": 1, "title": "Dinner"}]);
        store.set("events", &value).unwrap();
        assert_eq!(store.get("events"), Some(value));
    }

    #[test]
    fn test_set_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("nested").join("data");
        let store = FileStore::new(nested.clone());

        store.set("memo", &json!("hello")).unwrap();
        assert!(nested.join("memo.json").exists());
    }

    #[test]
    fn test_overwrite() {
        let (store, _temp) = test_store();
        store.set("memo", &json!("first")).unwrap();
        store.set("memo", &json!("second")).unwrap();
        assert_eq!(store.get("memo"), Some(json!("second")));
    }

    #[test]
    fn test_failed_rename_removes_temp_file() {
        let (store, temp) = test_store();
        fs::create_dir(store.path("memo")).unwrap();

        assert!(matches!(
            store.set("memo", &json!("hello")),
            Err(StorageError::IoError(_, _))
        ));
        assert!(!temp.path().join(".memo.json.tmp").exists());
    }

    #[test]
    fn test_corrupt_file_reads_as_absent() {
        let (store, _temp) = test_store();
        fs::write(store.path("todos"), b"{not json").unwrap();
        assert!(store.get("todos").is_none());
    }

    #[test]
    fn test_invalid_keys_rejected() {
        let (store, _temp) = test_store();
        assert!(matches!(
            store.set("../escape", &json!(1)),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(store.set("", &json!(1)).is_err());
        assert!(store.get("a/b").is_none());
    }
}
