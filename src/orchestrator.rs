//! Coordinates the domain state, the local store and the remote table.
//!
//! Mutations are optimistic: the in-memory change is applied, the whole
//! collection is written to the local store, a push is queued without
//! waiting for it, and the affected views are re-rendered. Pushes reach the
//! remote in the order they were queued. Remote change signals trigger a
//! full pull that replaces collections wholesale.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::config::{Config, ModulesConfig};
use crate::error::{Error, Result, StateError};
use crate::models::{
    DayOfWeek, EventDraft, EventId, ExpenseCategory, HoldingDraft, ItemId, Person,
};
use crate::state::DomainState;
use crate::store::{get_string, FileStore, LocalStore, REMOTE_KEY_KEY, REMOTE_URL_KEY};
use crate::sync::{
    DataKey, HostedConnector, RemoteConnector, RemoteError, RemoteRow, RemoteStore, Subscription,
};
use crate::view::{NoopView, View, ViewSink};

/// Connection state of the remote sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// No credentials; running local-only.
    Unconfigured,
    Connecting,
    /// Connected and subscribed to change signals.
    Online,
    /// A connect, pull or subscribe failed, or the subscription dropped.
    /// Stays until the next reconfiguration.
    Error,
}

/// The three-state indicator shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncIndicator {
    Offline,
    Online,
    Error,
}

impl SyncStatus {
    pub fn indicator(&self) -> SyncIndicator {
        match self {
            SyncStatus::Unconfigured | SyncStatus::Connecting => SyncIndicator::Offline,
            SyncStatus::Online => SyncIndicator::Online,
            SyncStatus::Error => SyncIndicator::Error,
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStatus::Unconfigured => write!(f, "unconfigured"),
            SyncStatus::Connecting => write!(f, "connecting"),
            SyncStatus::Online => write!(f, "online"),
            SyncStatus::Error => write!(f, "error"),
        }
    }
}

enum PushJob {
    Push(DataKey, Value),
    Flush(oneshot::Sender<()>),
}

/// One worker per connected remote, pushing jobs strictly in order.
struct PushQueue {
    jobs: mpsc::UnboundedSender<PushJob>,
    worker: JoinHandle<()>,
}

impl PushQueue {
    fn spawn(remote: Arc<dyn RemoteStore>) -> Self {
        let (jobs, mut queued) = mpsc::unbounded_channel();
        let worker = tokio::spawn(async move {
            while let Some(job) = queued.recv().await {
                match job {
                    PushJob::Push(key, value) => match remote.push(key.as_str(), &value).await {
                        Ok(()) => tracing::debug!(key = %key, "pushed"),
                        Err(e) => tracing::warn!(key = %key, error = %e, "push failed"),
                    },
                    PushJob::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
        });
        Self { jobs, worker }
    }
}

/// Owns the household state and its remote connection.
pub struct Orchestrator {
    state: DomainState,
    local: Arc<dyn LocalStore>,
    connector: Arc<dyn RemoteConnector>,
    view: Arc<dyn ViewSink>,
    remote: Option<Arc<dyn RemoteStore>>,
    subscription: Option<Subscription>,
    changes: mpsc::UnboundedReceiver<()>,
    status: watch::Sender<SyncStatus>,
    pushes: Option<PushQueue>,
    // Workers of replaced remotes, still draining their queues.
    retired: Vec<JoinHandle<()>>,
    fallback_credentials: Option<(String, String)>,
}

impl Orchestrator {
    /// Loads state from `local`, seeding absent keys.
    pub fn new(
        local: Arc<dyn LocalStore>,
        connector: Arc<dyn RemoteConnector>,
        view: Arc<dyn ViewSink>,
        modules: ModulesConfig,
    ) -> Self {
        let state = DomainState::load(local.as_ref(), modules);
        let (status, _) = watch::channel(SyncStatus::Unconfigured);

        Self {
            state,
            local,
            connector,
            view,
            remote: None,
            subscription: None,
            changes: closed_channel(),
            status,
            pushes: None,
            retired: Vec::new(),
            fallback_credentials: None,
        }
    }

    /// File-backed store, hosted backend, headless view.
    pub fn from_config(config: &Config) -> Self {
        let local = Arc::new(FileStore::new(config.data_dir.value.clone()));
        let connector = Arc::new(HostedConnector::from_config(&config.remote));
        let orchestrator = Self::new(local, connector, Arc::new(NoopView), config.modules);
        match config.remote.credentials() {
            Some((url, key)) => orchestrator.with_fallback_credentials(url, key),
            None => orchestrator,
        }
    }

    /// Credentials used when none were ever saved to the local store.
    pub fn with_fallback_credentials(
        mut self,
        endpoint: impl Into<String>,
        credential: impl Into<String>,
    ) -> Self {
        self.fallback_credentials = Some((endpoint.into(), credential.into()));
        self
    }

    pub fn state(&self) -> &DomainState {
        &self.state
    }

    pub fn status(&self) -> SyncStatus {
        *self.status.borrow()
    }

    pub fn watch_status(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.as_ref().is_some_and(Subscription::is_active)
    }

    /// Credentials saved in the local store, if both are present.
    pub fn stored_credentials(&self) -> Option<(String, String)> {
        let url = get_string(self.local.as_ref(), REMOTE_URL_KEY)?;
        let key = get_string(self.local.as_ref(), REMOTE_KEY_KEY)?;
        Some((url, key))
    }

    fn credentials(&self) -> Option<(String, String)> {
        let saved =
            self.local.get(REMOTE_URL_KEY).is_some() || self.local.get(REMOTE_KEY_KEY).is_some();
        if saved {
            self.stored_credentials()
        } else {
            self.fallback_credentials.clone()
        }
    }

    // Sync lifecycle

    /// Connects with the saved credentials, if any.
    pub async fn start(&mut self) -> SyncStatus {
        let credentials = self.credentials();
        self.connect(credentials).await;
        self.status()
    }

    /// Saves new credentials and reconnects, closing any open subscription.
    ///
    /// Blank values disconnect and leave the app local-only. A failure to
    /// save the credentials is returned after the connection attempt.
    pub async fn reconfigure(&mut self, endpoint: &str, credential: &str) -> Result<SyncStatus> {
        let endpoint = endpoint.trim();
        let credential = credential.trim();

        let saved = self
            .local
            .set(REMOTE_URL_KEY, &Value::String(endpoint.to_string()))
            .and_then(|()| {
                self.local
                    .set(REMOTE_KEY_KEY, &Value::String(credential.to_string()))
            });
        if let Err(e) = &saved {
            tracing::error!(error = %e, "failed to save remote credentials");
        }

        let credentials = (!endpoint.is_empty() && !credential.is_empty())
            .then(|| (endpoint.to_string(), credential.to_string()));
        self.connect(credentials).await;

        saved?;
        Ok(self.status())
    }

    async fn connect(&mut self, credentials: Option<(String, String)>) {
        self.teardown();

        let Some((endpoint, credential)) = credentials else {
            tracing::info!("remote sync not configured, running local-only");
            self.set_status(SyncStatus::Unconfigured);
            return;
        };

        self.set_status(SyncStatus::Connecting);
        let remote = match self.connector.connect(&endpoint, &credential) {
            Ok(remote) => remote,
            Err(RemoteError::NotConfigured) => {
                self.set_status(SyncStatus::Unconfigured);
                return;
            }
            Err(e) => {
                tracing::error!(endpoint = %endpoint, error = %e, "failed to create remote client");
                self.set_status(SyncStatus::Error);
                return;
            }
        };
        self.remote = Some(Arc::clone(&remote));
        self.pushes = Some(PushQueue::spawn(Arc::clone(&remote)));

        if self.pull().await.is_err() {
            return;
        }

        let (notify, changes) = mpsc::unbounded_channel();
        match remote.subscribe(notify).await {
            Ok(subscription) => {
                self.subscription = Some(subscription);
                self.changes = changes;
                self.set_status(SyncStatus::Online);
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to subscribe to remote changes");
                self.set_status(SyncStatus::Error);
            }
        }
    }

    /// Closes the subscription and drops the client handle.
    ///
    /// Pushes already queued for the old remote are still sent.
    fn teardown(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.close();
            tracing::debug!("closed realtime subscription");
        }
        self.remote = None;
        self.changes = closed_channel();

        self.retired.retain(|worker| !worker.is_finished());
        if let Some(queue) = self.pushes.take() {
            drop(queue.jobs);
            self.retired.push(queue.worker);
        }
    }

    fn set_status(&self, status: SyncStatus) {
        let previous = self.status.send_replace(status);
        if previous != status {
            tracing::info!(from = %previous, to = %status, "sync status changed");
        }
    }

    /// Fetches every row and overlays it on the state.
    ///
    /// Without a remote this is a no-op. A failure moves the status to
    /// `Error` and leaves the state untouched.
    pub async fn pull(&mut self) -> std::result::Result<Vec<DataKey>, RemoteError> {
        let Some(remote) = self.remote.clone() else {
            return Ok(Vec::new());
        };

        match remote.pull_all().await {
            Ok(rows) => Ok(self.apply_snapshot(&rows)),
            Err(e) => {
                tracing::error!(error = %e, "remote pull failed");
                self.set_status(SyncStatus::Error);
                Err(e)
            }
        }
    }

    /// Replaces collections with the snapshot's rows and re-renders every view.
    ///
    /// Replaced collections are written through to the local store.
    pub fn apply_snapshot(&mut self, rows: &[RemoteRow]) -> Vec<DataKey> {
        let applied = self.state.apply_snapshot(rows);
        for key in &applied {
            match self.state.encode(*key) {
                Ok(value) => {
                    if let Err(e) = self.local.set(key.as_str(), &value) {
                        tracing::warn!(key = %key, error = %e, "failed to store pulled value");
                    }
                }
                Err(e) => tracing::warn!(key = %key, error = %e, "failed to encode pulled value"),
            }
        }
        tracing::debug!(rows = rows.len(), applied = applied.len(), "applied remote snapshot");

        for view in View::ALL {
            self.view.render(view, &self.state);
        }
        applied
    }

    /// Waits for the next remote change signal.
    ///
    /// Returns false once no subscription is open. A subscription that ends
    /// without being closed here moves the status to `Error`.
    pub async fn next_remote_change(&mut self) -> bool {
        if self.changes.recv().await.is_some() {
            return true;
        }
        if self.subscription.take().is_some() {
            tracing::error!("realtime subscription ended unexpectedly");
            self.set_status(SyncStatus::Error);
        }
        false
    }

    /// Reacts to one change signal with exactly one full pull.
    pub async fn handle_remote_change(&mut self) -> std::result::Result<Vec<DataKey>, RemoteError> {
        tracing::debug!("remote change signalled");
        self.pull().await
    }

    /// Waits for every push issued so far.
    pub async fn flush(&mut self) {
        if let Some(queue) = &self.pushes {
            let (done, pushed) = oneshot::channel();
            if queue.jobs.send(PushJob::Flush(done)).is_ok() {
                let _ = pushed.await;
            }
        }
        for worker in self.retired.drain(..) {
            if let Err(e) = worker.await {
                tracing::warn!(error = %e, "push worker failed");
            }
        }
    }

    /// Closes the subscription and waits for outstanding pushes.
    pub async fn shutdown(&mut self) {
        self.teardown();
        self.flush().await;
    }

    // Commit path

    fn mutate<T>(
        &mut self,
        key: DataKey,
        op: impl FnOnce(&mut DomainState) -> std::result::Result<T, StateError>,
    ) -> Result<T> {
        let out = op(&mut self.state)?;
        self.commit(key)?;
        Ok(out)
    }

    /// Persists, pushes and re-renders one collection.
    fn commit(&mut self, key: DataKey) -> Result<()> {
        let value = self.state.encode(key)?;

        let stored = self.local.set(key.as_str(), &value);
        match &stored {
            Ok(()) => tracing::debug!(key = %key, "stored locally"),
            Err(e) => tracing::error!(key = %key, error = %e, "local write failed"),
        }

        self.push(key, value);

        for view in View::affected_by(key) {
            self.view.render(*view, &self.state);
        }

        stored.map_err(Error::from)
    }

    fn push(&self, key: DataKey, value: Value) {
        let Some(queue) = &self.pushes else {
            return;
        };
        if queue.jobs.send(PushJob::Push(key, value)).is_err() {
            tracing::warn!(key = %key, "push worker gone, change not uploaded");
        }
    }

    // Calendar

    pub fn add_event(&mut self, draft: EventDraft) -> Result<EventId> {
        self.mutate(DataKey::Events, |s| Ok(s.add_event(draft)))
    }

    pub fn edit_event(&mut self, id: EventId, draft: EventDraft) -> Result<()> {
        self.mutate(DataKey::Events, |s| s.edit_event(id, draft))
    }

    pub fn delete_event(&mut self, id: EventId) -> Result<()> {
        self.mutate(DataKey::Events, |s| s.delete_event(id))
    }

    // Todos

    pub fn add_todo(&mut self, person: Person, text: impl Into<String>) -> Result<ItemId> {
        self.mutate(DataKey::Todos, |s| Ok(s.add_todo(person, text)))
    }

    pub fn set_todo_text(
        &mut self,
        person: Person,
        id: ItemId,
        text: impl Into<String>,
    ) -> Result<()> {
        self.mutate(DataKey::Todos, |s| s.set_todo_text(person, id, text))
    }

    pub fn toggle_todo(&mut self, person: Person, id: ItemId) -> Result<bool> {
        self.mutate(DataKey::Todos, |s| s.toggle_todo(person, id))
    }

    pub fn delete_todo(&mut self, person: Person, id: ItemId) -> Result<()> {
        self.mutate(DataKey::Todos, |s| s.delete_todo(person, id))
    }

    // Memo

    pub fn set_memo(&mut self, text: impl Into<String>) -> Result<()> {
        self.mutate(DataKey::Memo, |s| {
            s.set_memo(text);
            Ok(())
        })
    }

    // Wishlist

    pub fn add_wish(&mut self, text: impl Into<String>, url: impl Into<String>) -> Result<ItemId> {
        self.mutate(DataKey::Wishlist, |s| s.add_wish(text, url))
    }

    pub fn edit_wish(
        &mut self,
        id: ItemId,
        text: impl Into<String>,
        url: impl Into<String>,
    ) -> Result<()> {
        self.mutate(DataKey::Wishlist, |s| s.edit_wish(id, text, url))
    }

    pub fn toggle_wish(&mut self, id: ItemId) -> Result<bool> {
        self.mutate(DataKey::Wishlist, |s| s.toggle_wish(id))
    }

    pub fn delete_wish(&mut self, id: ItemId) -> Result<()> {
        self.mutate(DataKey::Wishlist, |s| s.delete_wish(id))
    }

    // Weekly tasks

    pub fn add_weekly_task(
        &mut self,
        title: impl Into<String>,
        day: DayOfWeek,
        notify: bool,
    ) -> Result<ItemId> {
        self.mutate(DataKey::WeeklyTasks, |s| s.add_weekly_task(title, day, notify))
    }

    pub fn edit_weekly_task(
        &mut self,
        id: ItemId,
        title: impl Into<String>,
        day: DayOfWeek,
        notify: bool,
    ) -> Result<()> {
        self.mutate(DataKey::WeeklyTasks, |s| {
            s.edit_weekly_task(id, title, day, notify)
        })
    }

    pub fn toggle_weekly_notify(&mut self, id: ItemId) -> Result<bool> {
        self.mutate(DataKey::WeeklyTasks, |s| s.toggle_weekly_notify(id))
    }

    pub fn delete_weekly_task(&mut self, id: ItemId) -> Result<()> {
        self.mutate(DataKey::WeeklyTasks, |s| s.delete_weekly_task(id))
    }

    // Finance

    pub fn set_income(&mut self, person: Person, amount: i64) -> Result<()> {
        self.mutate(DataKey::Finance, |s| s.set_income(person, amount))
    }

    pub fn add_expense(
        &mut self,
        person: Person,
        category: ExpenseCategory,
        label: impl Into<String>,
        amount: i64,
    ) -> Result<ItemId> {
        self.mutate(DataKey::Finance, |s| {
            s.add_expense(person, category, label, amount)
        })
    }

    pub fn edit_expense(
        &mut self,
        person: Person,
        id: ItemId,
        label: impl Into<String>,
        amount: i64,
    ) -> Result<()> {
        self.mutate(DataKey::Finance, |s| s.edit_expense(person, id, label, amount))
    }

    pub fn delete_expense(&mut self, person: Person, id: ItemId) -> Result<()> {
        self.mutate(DataKey::Finance, |s| s.delete_expense(person, id))
    }

    // Stocks

    pub fn add_holding(&mut self, draft: HoldingDraft) -> Result<ItemId> {
        self.mutate(DataKey::Stocks, |s| s.add_holding(draft))
    }

    pub fn edit_holding(&mut self, id: ItemId, draft: HoldingDraft) -> Result<()> {
        self.mutate(DataKey::Stocks, |s| s.edit_holding(id, draft))
    }

    pub fn update_holding_price(&mut self, id: ItemId, price: f64) -> Result<()> {
        self.mutate(DataKey::Stocks, |s| s.update_holding_price(id, price))
    }

    pub fn delete_holding(&mut self, id: ItemId) -> Result<()> {
        self.mutate(DataKey::Stocks, |s| s.delete_holding(id))
    }
}

/// A receiver whose sender is already gone.
fn closed_channel() -> mpsc::UnboundedReceiver<()> {
    let (_, changes) = mpsc::unbounded_channel();
    changes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indicator() {
        assert_eq!(SyncStatus::Unconfigured.indicator(), SyncIndicator::Offline);
        assert_eq!(SyncStatus::Connecting.indicator(), SyncIndicator::Offline);
        assert_eq!(SyncStatus::Online.indicator(), SyncIndicator::Online);
        assert_eq!(SyncStatus::Error.indicator(), SyncIndicator::Error);
    }
}
