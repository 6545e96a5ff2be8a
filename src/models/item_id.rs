use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Namespace for ids assigned to items that arrive without one.
const LEGACY_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2a9e_43d1_4b7a_9c3e_5d08_e2b4_a771);

/// Stable identity of a list item (todo, wish, weekly task, expense, holding).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Deterministic id for an item stored without one.
    ///
    /// The same `(key, scope, position, text)` always yields the same id, so
    /// applying an id-less snapshot twice produces identical state.
    pub fn legacy(key: &str, scope: &str, position: usize, text: &str) -> Self {
        let name = format!("{}/{}/{}/{}", key, scope, position, text);
        Self(Uuid::new_v5(&LEGACY_NAMESPACE, name.as_bytes()))
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ItemId {
    /// The nil id marks an item decoded without an id; it is replaced on load.
    fn default() -> Self {
        Self(Uuid::nil())
    }
}

/// Items in a synchronized list that carry an [`ItemId`].
pub trait Identified {
    fn id(&self) -> ItemId;
    fn set_id(&mut self, id: ItemId);
    /// Text mixed into the legacy id so reordered id-less items stay distinct.
    fn label(&self) -> &str;
}

/// Assigns deterministic ids to items decoded without one.
pub fn fill_missing_ids<T: Identified>(items: &mut [T], key: &str, scope: &str) {
    for (position, item) in items.iter_mut().enumerate() {
        if item.id().is_nil() {
            let id = ItemId::legacy(key, scope, position, item.label());
            item.set_id(id);
        }
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
