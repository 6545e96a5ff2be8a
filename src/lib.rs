//! Harmony household dashboard
//!
//! Local-first state for a shared household dashboard: calendar, todos,
//! memo, wishlist, weekly tasks, budgets and stock holdings. State is kept
//! in memory, persisted to a local store after every change, and
//! optionally mirrored to a hosted row table with realtime change
//! notifications.

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod state;
pub mod store;
pub mod sync;
pub mod view;

pub use config::{Config, ConfigError, ConfigSource, ConfigValue, ModulesConfig, RemoteConfig};
pub use error::{Error, Result, StateError};
pub use models::{
    Budget, DayOfWeek, Event, EventDraft, EventId, Expense, ExpenseCategory, Finance, Holding,
    HoldingDraft, ItemId, Person, PortfolioSummary, TodoItem, TodoLists, WeeklyTask, WishItem,
};
pub use orchestrator::{Orchestrator, SyncIndicator, SyncStatus};
pub use state::{Dashboard, DayAgenda, DomainState};
pub use store::{FileStore, LocalStore, MemoryStore, StorageError};
pub use sync::{
    DataKey, HostedConnector, MemoryConnector, MemoryRemote, RemoteConnector, RemoteError,
    RemoteRow, RemoteStore, Subscription,
};
pub use view::{NoopView, View, ViewSink};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
