use serde::{Deserialize, Serialize};

use super::{fill_missing_ids, Identified, ItemId, Person};

/// One entry of a person's todo list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoItem {
    #[serde(default)]
    pub id: ItemId,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub done: bool,
}

impl TodoItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: ItemId::new(),
            text: text.into(),
            done: false,
        }
    }
}

impl Identified for TodoItem {
    fn id(&self) -> ItemId {
        self.id
    }

    fn set_id(&mut self, id: ItemId) {
        self.id = id;
    }

    fn label(&self) -> &str {
        &self.text
    }
}

/// Todo lists for each person, in display order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TodoLists {
    #[serde(default)]
    pub husband: Vec<TodoItem>,
    #[serde(default)]
    pub wife: Vec<TodoItem>,
    #[serde(default)]
    pub shared: Vec<TodoItem>,
}

impl TodoLists {
    pub fn list(&self, person: Person) -> &[TodoItem] {
        match person {
            Person::Husband => &self.husband,
            Person::Wife => &self.wife,
            Person::Shared => &self.shared,
        }
    }

    pub fn list_mut(&mut self, person: Person) -> &mut Vec<TodoItem> {
        match person {
            Person::Husband => &mut self.husband,
            Person::Wife => &mut self.wife,
            Person::Shared => &mut self.shared,
        }
    }

    pub fn find_mut(&mut self, person: Person, id: ItemId) -> Option<&mut TodoItem> {
        self.list_mut(person).iter_mut().find(|item| item.id == id)
    }

    pub fn fill_missing_ids(&mut self, key: &str) {
        for person in Person::ALL {
            fill_missing_ids(self.list_mut(person), key, person.as_str());
        }
    }

    /// Number of open items across all lists.
    pub fn open_count(&self) -> usize {
        Person::ALL
            .iter()
            .map(|p| self.list(*p).iter().filter(|item| !item.done).count())
            .sum()
    }
}
