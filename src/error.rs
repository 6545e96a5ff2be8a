//! Crate-level error types.

use thiserror::Error;

use crate::config::ConfigError;
use crate::models::{EventId, ItemId};
use crate::store::StorageError;
use crate::sync::{DataKey, RemoteError};

/// A mutation that could not be applied to the in-memory state.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("event {0} not found")]
    EventNotFound(EventId),

    #[error("item {0} not found")]
    ItemNotFound(ItemId),

    #[error("'{0}' belongs to a disabled module")]
    ModuleDisabled(DataKey),

    #[error("failed to encode '{0}': {1}")]
    Encode(DataKey, #[source] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    State(#[from] StateError),

    /// The in-memory change stands and the push was still issued.
    #[error("local storage write failed: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

pub type Result<T> = std::result::Result<T, Error>;
