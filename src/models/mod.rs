mod event;
mod finance;
mod item_id;
mod person;
mod stock;
mod todo;
mod weekly_task;
mod wishlist;

pub use event::{Event, EventDraft, EventId};
pub use finance::{Budget, Expense, ExpenseCategory, Finance};
pub use item_id::{fill_missing_ids, Identified, ItemId};
pub use person::Person;
pub use stock::{Holding, HoldingDraft, PortfolioSummary};
pub use todo::{TodoItem, TodoLists};
pub use weekly_task::{DayOfWeek, WeeklyTask};
pub use wishlist::WishItem;

use serde::{Deserialize, Deserializer};

/// Reads `null`, a missing field, or a blank string as `None`.
pub(crate) fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()))
}
