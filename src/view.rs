//! Render entrypoints the orchestrator calls after state changes.

use std::fmt;

use crate::state::DomainState;
use crate::sync::DataKey;

/// A panel of the dashboard UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Calendar,
    Dashboard,
    Todos,
    Wishlist,
    WeeklyTasks,
    Finance,
    Stocks,
}

impl View {
    pub const ALL: [View; 7] = [
        View::Calendar,
        View::Dashboard,
        View::Todos,
        View::Wishlist,
        View::WeeklyTasks,
        View::Finance,
        View::Stocks,
    ];

    /// Views showing data stored under `key`.
    pub fn affected_by(key: DataKey) -> &'static [View] {
        match key {
            DataKey::Events => &[View::Calendar, View::Dashboard],
            DataKey::Todos => &[View::Todos, View::Dashboard],
            DataKey::Memo => &[View::Dashboard],
            DataKey::Wishlist => &[View::Wishlist],
            DataKey::WeeklyTasks => &[View::WeeklyTasks, View::Calendar, View::Dashboard],
            DataKey::Finance => &[View::Finance],
            DataKey::Stocks => &[View::Stocks],
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            View::Calendar => "calendar",
            View::Dashboard => "dashboard",
            View::Todos => "todos",
            View::Wishlist => "wishlist",
            View::WeeklyTasks => "weekly tasks",
            View::Finance => "finance",
            View::Stocks => "stocks",
        };
        write!(f, "{}", name)
    }
}

/// The UI layer. Implementations read whatever they need from `state`.
pub trait ViewSink: Send + Sync {
    fn render(&self, view: View, state: &DomainState);
}

/// Discards render requests; used when running headless.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopView;

impl ViewSink for NoopView {
    fn render(&self, view: View, _state: &DomainState) {
        tracing::trace!(view = %view, "render skipped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_key_refreshes_something() {
        for key in DataKey::ALL {
            assert!(!View::affected_by(key).is_empty(), "{key}");
        }
        assert!(View::affected_by(DataKey::WeeklyTasks).contains(&View::Calendar));
    }
}
