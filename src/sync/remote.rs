//! Seams between the orchestrator and a remote row store.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::error::RemoteError;
use super::protocol::RemoteRow;
use super::realtime::Subscription;

/// Receives one payload-less signal per remote change.
pub type ChangeNotifier = mpsc::UnboundedSender<()>;

/// A connected handle to the shared `{key, content, updated_at}` table.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Selects every row.
    async fn pull_all(&self) -> Result<Vec<RemoteRow>, RemoteError>;

    /// Upserts one row by key.
    async fn push(&self, key: &str, content: &Value) -> Result<(), RemoteError>;

    /// Opens a channel that signals `notify` on any row change, including
    /// echoes of this client's own pushes.
    async fn subscribe(&self, notify: ChangeNotifier) -> Result<Subscription, RemoteError>;
}

/// Builds remote handles from an endpoint and credential pair.
pub trait RemoteConnector: Send + Sync {
    fn connect(&self, endpoint: &str, credential: &str)
        -> Result<Arc<dyn RemoteStore>, RemoteError>;
}
