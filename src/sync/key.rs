use std::fmt;

/// Logical key of one synchronized collection or scalar.
///
/// The same string names the local storage entry and the remote row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DataKey {
    Events,
    Todos,
    Memo,
    Wishlist,
    WeeklyTasks,
    Finance,
    Stocks,
}

/// Feature group a key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Module {
    /// Calendar, todos and memo; always enabled.
    Core,
    /// Wishlist and weekly tasks.
    Planner,
    /// Budgets and stock holdings.
    Finance,
}

impl DataKey {
    pub const ALL: [DataKey; 7] = [
        DataKey::Events,
        DataKey::Todos,
        DataKey::Memo,
        DataKey::Wishlist,
        DataKey::WeeklyTasks,
        DataKey::Finance,
        DataKey::Stocks,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataKey::Events => "events",
            DataKey::Todos => "todos",
            DataKey::Memo => "memo",
            DataKey::Wishlist => "wishlist",
            DataKey::WeeklyTasks => "weeklyTasks",
            DataKey::Finance => "finance",
            DataKey::Stocks => "stocks",
        }
    }

    /// Parse from the wire name. Unknown names yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        DataKey::ALL.into_iter().find(|k| k.as_str() == s)
    }

    pub fn module(&self) -> Module {
        match self {
            DataKey::Events | DataKey::Todos | DataKey::Memo => Module::Core,
            DataKey::Wishlist | DataKey::WeeklyTasks => Module::Planner,
            DataKey::Finance | DataKey::Stocks => Module::Finance,
        }
    }
}

impl fmt::Display for DataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        for key in DataKey::ALL {
            assert_eq!(DataKey::parse(key.as_str()), Some(key));
        }
    }

    #[test]
    fn test_parse_is_exact() {
        assert_eq!(DataKey::parse("weeklyTasks"), Some(DataKey::WeeklyTasks));
        assert_eq!(DataKey::parse("weeklytasks"), None);
        assert_eq!(DataKey::parse("harmony_memo"), None);
    }

    #[test]
    fn test_modules() {
        assert_eq!(DataKey::Memo.module(), Module::Core);
        assert_eq!(DataKey::Wishlist.module(), Module::Planner);
        assert_eq!(DataKey::Stocks.module(), Module::Finance);
    }
}
