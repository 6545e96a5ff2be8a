use super::DomainState;
use crate::error::StateError;
use crate::models::{DayOfWeek, Identified, ItemId, Person, TodoItem, WeeklyTask, WishItem};
use crate::sync::DataKey;

pub(super) fn find_item<T: Identified>(items: &mut [T], id: ItemId) -> Result<&mut T, StateError> {
    items
        .iter_mut()
        .find(|item| item.id() == id)
        .ok_or(StateError::ItemNotFound(id))
}

pub(super) fn remove_item<T: Identified>(items: &mut Vec<T>, id: ItemId) -> Result<T, StateError> {
    let pos = items
        .iter()
        .position(|item| item.id() == id)
        .ok_or(StateError::ItemNotFound(id))?;
    Ok(items.remove(pos))
}

impl DomainState {
    // Todos

    pub fn add_todo(&mut self, person: Person, text: impl Into<String>) -> ItemId {
        let item = TodoItem::new(text);
        let id = item.id;
        self.todos.list_mut(person).push(item);
        id
    }

    pub fn set_todo_text(
        &mut self,
        person: Person,
        id: ItemId,
        text: impl Into<String>,
    ) -> Result<(), StateError> {
        let item = self
            .todos
            .find_mut(person, id)
            .ok_or(StateError::ItemNotFound(id))?;
        item.text = text.into();
        Ok(())
    }

    /// Flips `done`, returning the new value.
    pub fn toggle_todo(&mut self, person: Person, id: ItemId) -> Result<bool, StateError> {
        let item = self
            .todos
            .find_mut(person, id)
            .ok_or(StateError::ItemNotFound(id))?;
        item.done = !item.done;
        Ok(item.done)
    }

    pub fn delete_todo(&mut self, person: Person, id: ItemId) -> Result<(), StateError> {
        remove_item(self.todos.list_mut(person), id).map(|_| ())
    }

    // Memo

    pub fn set_memo(&mut self, text: impl Into<String>) {
        self.memo = text.into();
    }

    // Wishlist

    pub fn add_wish(
        &mut self,
        text: impl Into<String>,
        url: impl Into<String>,
    ) -> Result<ItemId, StateError> {
        self.ensure_enabled(DataKey::Wishlist)?;
        let item = WishItem::new(text, url);
        let id = item.id;
        self.wishlist.push(item);
        Ok(id)
    }

    pub fn edit_wish(
        &mut self,
        id: ItemId,
        text: impl Into<String>,
        url: impl Into<String>,
    ) -> Result<(), StateError> {
        self.ensure_enabled(DataKey::Wishlist)?;
        let item = find_item(&mut self.wishlist, id)?;
        item.text = text.into();
        item.url = url.into();
        Ok(())
    }

    pub fn toggle_wish(&mut self, id: ItemId) -> Result<bool, StateError> {
        self.ensure_enabled(DataKey::Wishlist)?;
        let item = find_item(&mut self.wishlist, id)?;
        item.done = !item.done;
        Ok(item.done)
    }

    pub fn delete_wish(&mut self, id: ItemId) -> Result<(), StateError> {
        self.ensure_enabled(DataKey::Wishlist)?;
        remove_item(&mut self.wishlist, id).map(|_| ())
    }

    // Weekly tasks

    pub fn add_weekly_task(
        &mut self,
        title: impl Into<String>,
        day: DayOfWeek,
        notify: bool,
    ) -> Result<ItemId, StateError> {
        self.ensure_enabled(DataKey::WeeklyTasks)?;
        let task = WeeklyTask::new(title, day, notify);
        let id = task.id;
        self.weekly_tasks.push(task);
        Ok(id)
    }

    pub fn edit_weekly_task(
        &mut self,
        id: ItemId,
        title: impl Into<String>,
        day: DayOfWeek,
        notify: bool,
    ) -> Result<(), StateError> {
        self.ensure_enabled(DataKey::WeeklyTasks)?;
        let task = find_item(&mut self.weekly_tasks, id)?;
        task.title = title.into();
        task.day = day;
        task.notify = notify;
        Ok(())
    }

    pub fn toggle_weekly_notify(&mut self, id: ItemId) -> Result<bool, StateError> {
        self.ensure_enabled(DataKey::WeeklyTasks)?;
        let task = find_item(&mut self.weekly_tasks, id)?;
        task.notify = !task.notify;
        Ok(task.notify)
    }

    pub fn delete_weekly_task(&mut self, id: ItemId) -> Result<(), StateError> {
        self.ensure_enabled(DataKey::WeeklyTasks)?;
        remove_item(&mut self.weekly_tasks, id).map(|_| ())
    }
}
