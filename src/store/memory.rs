use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::{LocalStore, StorageError};

/// In-memory local store for ephemeral sessions and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Value>>,
    reject_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `set` fail, as a full or read-only disk would.
    pub fn reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = match self.values.lock() {
            Ok(values) => values.keys().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().keys().cloned().collect(),
        };
        keys.sort();
        keys
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        match self.values.lock() {
            Ok(values) => values.get(key).cloned(),
            Err(poisoned) => poisoned.into_inner().get(key).cloned(),
        }
    }

    fn set(&self, key: &str, value: &Value) -> Result<(), StorageError> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(format!(
                "write to '{}' rejected",
                key
            )));
        }
        let mut values = self
            .values
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        values.insert(key.to_string(), value.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::get_string;
    use serde_json::json;

    #[test]
    fn test_roundtrip() {
        let store = MemoryStore::new();
        store.set("memo", &json!("milk")).unwrap();
        assert_eq!(store.get("memo"), Some(json!("milk")));
        assert_eq!(store.keys(), vec!["memo".to_string()]);
    }

    #[test]
    fn test_rejected_writes_leave_value() {
        let store = MemoryStore::new();
        store.set("memo", &json!("before")).unwrap();
        store.reject_writes(true);
        assert!(store.set("memo", &json!("after")).is_err());
        assert_eq!(store.get("memo"), Some(json!("before")));
    }

    #[test]
    fn test_get_string_ignores_blank() {
        let store = MemoryStore::new();
        store.set("remote_url", &json!("  ")).unwrap();
        store.set("remote_key", &json!(" secret ")).unwrap();
        assert_eq!(get_string(&store, "remote_url"), None);
        assert_eq!(get_string(&store, "remote_key"), Some("secret".to_string()));
    }
}
