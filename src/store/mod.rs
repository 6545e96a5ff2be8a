//! Local durable storage of JSON values keyed by string.
//!
//! The store is a projection of in-memory state: reads happen once at
//! startup, writes after every mutation. Reads never fail observably; a
//! value that cannot be read is treated as absent.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use serde_json::Value;
use std::io;
use std::path::PathBuf;

/// Key holding the remote endpoint URL.
pub const REMOTE_URL_KEY: &str = "remote_url";
/// Key holding the remote credential.
pub const REMOTE_KEY_KEY: &str = "remote_key";

/// Key-based read/write of JSON values.
pub trait LocalStore: Send + Sync {
    /// Returns the stored value, or `None` if absent or unreadable.
    fn get(&self, key: &str) -> Option<Value>;

    /// Replaces the stored value for `key`.
    fn set(&self, key: &str, value: &Value) -> Result<(), StorageError>;
}

/// Errors that can occur while writing to local storage.
#[derive(Debug)]
pub enum StorageError {
    /// I/O error reading or writing a file.
    IoError(PathBuf, io::Error),
    /// Key cannot be used as a storage name.
    InvalidKey(String),
    /// Backend refused the write.
    Unavailable(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::IoError(path, e) => {
                write!(f, "I/O error for {}: {}", path.display(), e)
            }
            StorageError::InvalidKey(key) => write!(f, "Invalid storage key: {}", key),
            StorageError::Unavailable(e) => write!(f, "Storage unavailable: {}", e),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::IoError(_, e) => Some(e),
            _ => None,
        }
    }
}

/// Reads a string value, ignoring blank strings.
pub fn get_string(store: &dyn LocalStore, key: &str) -> Option<String> {
    store
        .get(key)
        .and_then(|v| v.as_str().map(str::trim).map(str::to_string))
        .filter(|s| !s.is_empty())
}
