//! In-memory household state.
//!
//! [`DomainState`] owns every collection while the app runs. The local
//! store and the remote table are projections of it, reconciled only at
//! load time and when a remote snapshot is applied.

mod calendar;
mod finance;
mod lists;

pub use calendar::{Dashboard, DayAgenda};

use chrono::{NaiveDate, NaiveTime};
use serde_json::Value;

use crate::config::ModulesConfig;
use crate::error::StateError;
use crate::models::{
    fill_missing_ids, Event, EventId, Finance, Holding, Person, TodoItem, TodoLists, WeeklyTask,
    WishItem,
};
use crate::store::LocalStore;
use crate::sync::{DataKey, RemoteRow};

/// Every synchronized collection of the household.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainState {
    modules: ModulesConfig,
    events: Vec<Event>,
    todos: TodoLists,
    memo: String,
    wishlist: Vec<WishItem>,
    weekly_tasks: Vec<WeeklyTask>,
    finance: Finance,
    stocks: Vec<Holding>,
    last_event_id: i64,
}

impl DomainState {
    /// First-run contents.
    pub fn seeded(modules: ModulesConfig) -> Self {
        let events = seed_events();
        let last_event_id = events.iter().map(|e| e.id.0).max().unwrap_or(0);
        Self {
            modules,
            events,
            todos: seed_todos(),
            memo: String::new(),
            wishlist: Vec::new(),
            weekly_tasks: Vec::new(),
            finance: Finance::default(),
            stocks: Vec::new(),
            last_event_id,
        }
    }

    /// Reads every enabled key from `store`.
    ///
    /// Absent or unreadable keys keep their seed, which is written back so
    /// the next load finds it.
    pub fn load(store: &dyn LocalStore, modules: ModulesConfig) -> Self {
        let mut state = Self::seeded(modules);

        for key in modules.enabled_keys() {
            match store.get(key.as_str()) {
                Some(value) => match state.decode_into(key, value) {
                    Ok(()) => {
                        tracing::debug!(key = %key, "loaded from local store");
                        continue;
                    }
                    Err(e) => {
                        tracing::warn!(
                            key = %key,
                            error = %e,
                            "unreadable local value, using default"
                        );
                    }
                },
                None => tracing::debug!(key = %key, "no local value, seeding default"),
            }

            match state.encode(key) {
                Ok(value) => {
                    if let Err(e) = store.set(key.as_str(), &value) {
                        tracing::warn!(key = %key, error = %e, "failed to persist default");
                    }
                }
                Err(e) => tracing::warn!(key = %key, error = %e, "failed to encode default"),
            }
        }

        state
    }

    pub fn modules(&self) -> ModulesConfig {
        self.modules
    }

    pub fn is_enabled(&self, key: DataKey) -> bool {
        self.modules.enables(key)
    }

    pub(crate) fn ensure_enabled(&self, key: DataKey) -> Result<(), StateError> {
        if self.is_enabled(key) {
            Ok(())
        } else {
            Err(StateError::ModuleDisabled(key))
        }
    }

    /// The whole collection stored under `key`, as written to both stores.
    pub fn encode(&self, key: DataKey) -> Result<Value, StateError> {
        let encoded = match key {
            DataKey::Events => serde_json::to_value(&self.events),
            DataKey::Todos => serde_json::to_value(&self.todos),
            DataKey::Memo => serde_json::to_value(&self.memo),
            DataKey::Wishlist => serde_json::to_value(&self.wishlist),
            DataKey::WeeklyTasks => serde_json::to_value(&self.weekly_tasks),
            DataKey::Finance => serde_json::to_value(&self.finance),
            DataKey::Stocks => serde_json::to_value(&self.stocks),
        };
        encoded.map_err(|e| StateError::Encode(key, e))
    }

    /// Replaces the collection under `key` with `value`.
    ///
    /// On error the current collection is left untouched.
    pub fn decode_into(&mut self, key: DataKey, value: Value) -> Result<(), serde_json::Error> {
        let scope = key.as_str();
        match key {
            DataKey::Events => {
                let events: Vec<Event> = serde_json::from_value(value)?;
                let newest = events.iter().map(|e| e.id.0).max().unwrap_or(0);
                self.last_event_id = self.last_event_id.max(newest);
                self.events = events;
            }
            DataKey::Todos => {
                let mut todos: TodoLists = serde_json::from_value(value)?;
                todos.fill_missing_ids(scope);
                self.todos = todos;
            }
            DataKey::Memo => {
                let memo: Option<String> = serde_json::from_value(value)?;
                self.memo = memo.unwrap_or_default();
            }
            DataKey::Wishlist => {
                let mut wishlist: Vec<WishItem> = serde_json::from_value(value)?;
                fill_missing_ids(&mut wishlist, scope, "items");
                self.wishlist = wishlist;
            }
            DataKey::WeeklyTasks => {
                let mut tasks: Vec<WeeklyTask> = serde_json::from_value(value)?;
                fill_missing_ids(&mut tasks, scope, "items");
                self.weekly_tasks = tasks;
            }
            DataKey::Finance => {
                let mut finance: Finance = serde_json::from_value(value)?;
                finance.fill_missing_ids(scope);
                self.finance = finance;
            }
            DataKey::Stocks => {
                let mut stocks: Vec<Holding> = serde_json::from_value(value)?;
                fill_missing_ids(&mut stocks, scope, "items");
                self.stocks = stocks;
            }
        }
        Ok(())
    }

    /// Overlays a remote snapshot, returning the keys that were replaced.
    ///
    /// Unknown keys and keys of disabled modules are ignored. Keys absent
    /// from the snapshot keep their current value.
    pub fn apply_snapshot(&mut self, rows: &[RemoteRow]) -> Vec<DataKey> {
        let mut applied = Vec::new();

        for row in rows {
            let Some(key) = DataKey::parse(&row.key) else {
                tracing::debug!(key = %row.key, "ignoring unknown remote key");
                continue;
            };
            if !self.is_enabled(key) {
                tracing::debug!(key = %key, "ignoring key of disabled module");
                continue;
            }
            match self.decode_into(key, row.content.clone()) {
                Ok(()) => applied.push(key),
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "skipping undecodable remote row");
                }
            }
        }

        applied
    }

    /// Saturates at `i64::MAX` when a remote snapshot carried the largest id.
    pub(crate) fn next_event_id(&mut self, now_ms: i64) -> EventId {
        let id = now_ms.max(self.last_event_id.saturating_add(1));
        self.last_event_id = id;
        EventId(id)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn todos(&self) -> &TodoLists {
        &self.todos
    }

    pub fn memo(&self) -> &str {
        &self.memo
    }

    pub fn wishlist(&self) -> &[WishItem] {
        &self.wishlist
    }

    pub fn weekly_tasks(&self) -> &[WeeklyTask] {
        &self.weekly_tasks
    }

    pub fn finance(&self) -> &Finance {
        &self.finance
    }

    pub fn stocks(&self) -> &[Holding] {
        &self.stocks
    }
}

fn seed_events() -> Vec<Event> {
    let Some(date) = NaiveDate::from_ymd_opt(2026, 1, 30) else {
        return Vec::new();
    };
    vec![
        Event {
            id: EventId(1),
            date,
            title: "Meeting (husband)".to_string(),
            time: NaiveTime::from_hms_opt(10, 0, 0),
            person: Person::Husband,
            memo: None,
        },
        Event {
            id: EventId(2),
            date,
            title: "Dinner together".to_string(),
            time: NaiveTime::from_hms_opt(19, 0, 0),
            person: Person::Shared,
            memo: None,
        },
    ]
}

fn seed_todos() -> TodoLists {
    let item = |text: &str, done: bool| TodoItem {
        done,
        ..TodoItem::new(text)
    };
    TodoLists {
        husband: vec![
            item("Take out the trash", false),
            item("Drop off dry cleaning", false),
        ],
        wife: vec![
            item("Book the weekend reservation", true),
            item("Water the plants", false),
        ],
        shared: vec![
            item("Make a packing list for the trip", false),
            item("Look into hometown tax donations", false),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    #[test]
    fn test_seeded_defaults() {
        let state = DomainState::seeded(ModulesConfig::default());
        assert_eq!(state.events().len(), 2);
        assert_eq!(state.events()[0].title, "Meeting (husband)");
        assert_eq!(state.todos().list(Person::Wife).len(), 2);
        assert!(state.todos().list(Person::Wife)[0].done);
        assert_eq!(state.memo(), "");
        assert!(state.wishlist().is_empty());
        assert!(state.finance().budget(Person::Husband).is_some());
    }

    #[test]
    fn test_load_seeds_and_persists_absent_keys() {
        let store = MemoryStore::new();
        let state = DomainState::load(&store, ModulesConfig::default());

        assert_eq!(store.keys().len(), DataKey::ALL.len());
        assert_eq!(
            store.get("events"),
            Some(state.encode(DataKey::Events).unwrap())
        );
        assert_eq!(store.get("memo"), Some(json!("")));
    }

    #[test]
    fn test_load_skips_disabled_modules() {
        let store = MemoryStore::new();
        DomainState::load(&store, ModulesConfig::core_only());
        assert_eq!(store.keys(), vec!["events", "memo", "todos"]);
    }

    #[test]
    fn test_load_prefers_stored_value() {
        let store = MemoryStore::new();
        store.set("memo", &json!("milk")).unwrap();
        store.set("events", &json!([])).unwrap();

        let state = DomainState::load(&store, ModulesConfig::default());
        assert_eq!(state.memo(), "milk");
        assert!(state.events().is_empty());
    }

    #[test]
    fn test_load_unreadable_value_uses_seed() {
        let store = MemoryStore::new();
        store.set("events", &json!({"not": "a list"})).unwrap();

        let state = DomainState::load(&store, ModulesConfig::default());
        assert_eq!(state.events().len(), 2);
        assert_eq!(
            store.get("events"),
            Some(state.encode(DataKey::Events).unwrap())
        );
    }

    #[test]
    fn test_apply_snapshot_replaces_known_keys() {
        let mut state = DomainState::seeded(ModulesConfig::default());
        let rows = vec![
            RemoteRow::new("memo", json!("from remote")),
            RemoteRow::new("nonsense", json!([1, 2, 3])),
        ];

        let applied = state.apply_snapshot(&rows);
        assert_eq!(applied, vec![DataKey::Memo]);
        assert_eq!(state.memo(), "from remote");
        assert_eq!(state.events().len(), 2);
    }

    #[test]
    fn test_apply_snapshot_ignores_disabled_module() {
        let mut state = DomainState::seeded(ModulesConfig::core_only());
        let rows = vec![RemoteRow::new("wishlist", json!([{"text": "Kettle"}]))];

        assert!(state.apply_snapshot(&rows).is_empty());
        assert!(state.wishlist().is_empty());
    }

    #[test]
    fn test_apply_snapshot_skips_undecodable_row() {
        let mut state = DomainState::seeded(ModulesConfig::default());
        let before = state.todos().clone();
        let rows = vec![RemoteRow::new("todos", json!("garbage"))];

        assert!(state.apply_snapshot(&rows).is_empty());
        assert_eq!(state.todos(), &before);
    }

    #[test]
    fn test_legacy_items_get_stable_ids() {
        let rows = vec![RemoteRow::new(
            "todos",
            json!({"husband": [{"text": "a", "done": false}], "wife": [], "shared": []}),
        )];

        let mut first = DomainState::seeded(ModulesConfig::default());
        first.apply_snapshot(&rows);
        let mut second = DomainState::seeded(ModulesConfig::default());
        second.apply_snapshot(&rows);
        second.apply_snapshot(&rows);

        let id = first.todos().husband[0].id;
        assert!(!id.is_nil());
        assert_eq!(second.todos().husband[0].id, id);
    }

    #[test]
    fn test_memo_null_reads_as_empty() {
        let mut state = DomainState::seeded(ModulesConfig::default());
        state.decode_into(DataKey::Memo, Value::Null).unwrap();
        assert_eq!(state.memo(), "");
    }

    #[test]
    fn test_next_event_id_is_monotonic() {
        let mut state = DomainState::seeded(ModulesConfig::default());
        assert_eq!(state.next_event_id(1_000), EventId(1_000));
        assert_eq!(state.next_event_id(1_000), EventId(1_001));
        assert_eq!(state.next_event_id(900), EventId(1_002));
        assert_eq!(state.next_event_id(5_000), EventId(5_000));
    }

    #[test]
    fn test_next_event_id_after_max_remote_id() {
        let mut state = DomainState::seeded(ModulesConfig::default());
        let rows = vec![RemoteRow::new(
            "events",
            json!([{"id": i64::MAX, "date": "2026-01-30", "title": "X", "person": "shared"}]),
        )];
        assert_eq!(state.apply_snapshot(&rows), vec![DataKey::Events]);

        assert_eq!(state.next_event_id(1_000), EventId(i64::MAX));
        assert_eq!(state.next_event_id(1_000), EventId(i64::MAX));
    }
}
