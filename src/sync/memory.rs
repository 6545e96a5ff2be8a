//! In-process remote used by tests and offline demos.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

use super::error::RemoteError;
use super::protocol::RemoteRow;
use super::realtime::Subscription;
use super::remote::{ChangeNotifier, RemoteConnector, RemoteStore};

type Subscribers = Arc<Mutex<Vec<(u64, ChangeNotifier)>>>;

/// A remote row table held in memory.
///
/// Every push upserts the row and signals all open subscriptions, the
/// pushing client's own included.
#[derive(Debug, Default)]
pub struct MemoryRemote {
    rows: Mutex<BTreeMap<String, RemoteRow>>,
    subscribers: Subscribers,
    next_subscriber: AtomicU64,
    pulls: AtomicUsize,
    pushes: Mutex<Vec<(String, Value)>>,
    fail_pulls: AtomicBool,
    fail_pushes: AtomicBool,
    fail_subscribe: AtomicBool,
}

impl MemoryRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Writes a row without notifying subscribers.
    pub fn insert_row(&self, key: &str, content: Value) {
        if let Ok(mut rows) = self.rows.lock() {
            rows.insert(key.to_string(), RemoteRow::new(key, content));
        }
    }

    /// Writes a row as another device would, notifying subscribers.
    pub fn write_from_peer(&self, key: &str, content: Value) {
        self.insert_row(key, content);
        self.notify_change();
    }

    pub fn row(&self, key: &str) -> Option<Value> {
        self.rows
            .lock()
            .ok()
            .and_then(|rows| rows.get(key).map(|row| row.content.clone()))
    }

    pub fn rows(&self) -> Vec<RemoteRow> {
        self.rows
            .lock()
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn pull_count(&self) -> usize {
        self.pulls.load(Ordering::SeqCst)
    }

    /// Every push received, in order.
    pub fn pushes(&self) -> Vec<(String, Value)> {
        self.pushes
            .lock()
            .map(|pushes| pushes.clone())
            .unwrap_or_default()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .map(|subscribers| subscribers.len())
            .unwrap_or(0)
    }

    /// Signals every open subscription once.
    pub fn notify_change(&self) {
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.retain(|(_, notify)| notify.send(()).is_ok());
        }
    }

    /// Ends every open subscription from the remote side, as a dropped
    /// socket would.
    pub fn drop_subscribers(&self) {
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.clear();
        }
    }

    pub fn fail_pulls(&self, fail: bool) {
        self.fail_pulls.store(fail, Ordering::SeqCst);
    }

    pub fn fail_pushes(&self, fail: bool) {
        self.fail_pushes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_subscribe(&self, fail: bool) {
        self.fail_subscribe.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn pull_all(&self) -> Result<Vec<RemoteRow>, RemoteError> {
        self.pulls.fetch_add(1, Ordering::SeqCst);
        if self.fail_pulls.load(Ordering::SeqCst) {
            return Err(RemoteError::Status(503, "pull refused".to_string()));
        }
        Ok(self.rows())
    }

    async fn push(&self, key: &str, content: &Value) -> Result<(), RemoteError> {
        if self.fail_pushes.load(Ordering::SeqCst) {
            return Err(RemoteError::Status(503, "push refused".to_string()));
        }
        if let Ok(mut pushes) = self.pushes.lock() {
            pushes.push((key.to_string(), content.clone()));
        }
        self.insert_row(key, content.clone());
        self.notify_change();
        Ok(())
    }

    async fn subscribe(&self, notify: ChangeNotifier) -> Result<Subscription, RemoteError> {
        if self.fail_subscribe.load(Ordering::SeqCst) {
            return Err(RemoteError::HandshakeError("subscription refused".to_string()));
        }

        let id = self.next_subscriber.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.push((id, notify));
        }

        let guard = SubscriberGuard {
            id,
            subscribers: Arc::clone(&self.subscribers),
        };
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let _guard = guard;
            let _ = shutdown_rx.await;
        });

        Ok(Subscription::new(shutdown_tx, task))
    }
}

/// Removes a subscriber when its task ends, whether closed or aborted.
struct SubscriberGuard {
    id: u64,
    subscribers: Subscribers,
}

impl Drop for SubscriberGuard {
    fn drop(&mut self) {
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.retain(|(id, _)| *id != self.id);
        }
    }
}

/// Hands out one [`MemoryRemote`] per endpoint.
#[derive(Debug, Default)]
pub struct MemoryConnector {
    remotes: Mutex<HashMap<String, Arc<MemoryRemote>>>,
    connects: AtomicUsize,
    fail_connect: AtomicBool,
}

impl MemoryConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// The remote behind `endpoint`, created on first use.
    pub fn remote(&self, endpoint: &str) -> Arc<MemoryRemote> {
        match self.remotes.lock() {
            Ok(mut remotes) => Arc::clone(
                remotes
                    .entry(endpoint.to_string())
                    .or_insert_with(MemoryRemote::new),
            ),
            Err(_) => MemoryRemote::new(),
        }
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn fail_connect(&self, fail: bool) {
        self.fail_connect.store(fail, Ordering::SeqCst);
    }
}

impl RemoteConnector for MemoryConnector {
    fn connect(
        &self,
        endpoint: &str,
        credential: &str,
    ) -> Result<Arc<dyn RemoteStore>, RemoteError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if endpoint.trim().is_empty() || credential.trim().is_empty() {
            return Err(RemoteError::NotConfigured);
        }
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(RemoteError::InvalidEndpoint(endpoint.to_string()));
        }
        let remote: Arc<dyn RemoteStore> = self.remote(endpoint);
        Ok(remote)
    }
}
