use chrono::{Days, NaiveDate, Utc};

use super::DomainState;
use crate::error::StateError;
use crate::models::{Event, EventDraft, EventId, WeeklyTask};

/// What happens on one day: dated events plus recurring weekly tasks.
#[derive(Debug, Clone, PartialEq)]
pub struct DayAgenda<'a> {
    pub date: NaiveDate,
    pub events: Vec<&'a Event>,
    pub tasks: Vec<&'a WeeklyTask>,
}

impl DayAgenda<'_> {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.tasks.is_empty()
    }
}

/// Today and tomorrow, as shown on the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard<'a> {
    pub today: DayAgenda<'a>,
    pub tomorrow: Option<DayAgenda<'a>>,
}

impl DomainState {
    pub fn add_event(&mut self, draft: EventDraft) -> EventId {
        let id = self.next_event_id(Utc::now().timestamp_millis());
        self.events.push(Event::from_draft(id, draft));
        id
    }

    /// Replaces every non-id field of the event.
    pub fn edit_event(&mut self, id: EventId, draft: EventDraft) -> Result<(), StateError> {
        let event = self
            .events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(StateError::EventNotFound(id))?;
        event.apply(draft);
        Ok(())
    }

    pub fn delete_event(&mut self, id: EventId) -> Result<(), StateError> {
        let pos = self
            .events
            .iter()
            .position(|e| e.id == id)
            .ok_or(StateError::EventNotFound(id))?;
        self.events.remove(pos);
        Ok(())
    }

    pub fn event(&self, id: EventId) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }

    /// Events on `date`, by time of day. Untimed events sort as midnight.
    pub fn events_on(&self, date: NaiveDate) -> Vec<&Event> {
        let mut events: Vec<&Event> = self.events.iter().filter(|e| e.date == date).collect();
        events.sort_by_key(|e| e.sort_time());
        events
    }

    pub fn agenda(&self, date: NaiveDate) -> DayAgenda<'_> {
        DayAgenda {
            date,
            events: self.events_on(date),
            tasks: self
                .weekly_tasks
                .iter()
                .filter(|t| t.occurs_on(date))
                .collect(),
        }
    }

    pub fn dashboard(&self, today: NaiveDate) -> Dashboard<'_> {
        Dashboard {
            today: self.agenda(today),
            tomorrow: today
                .checked_add_days(Days::new(1))
                .map(|date| self.agenda(date)),
        }
    }

    /// Weekly tasks due on `date` that asked for a reminder.
    pub fn notifications_for(&self, date: NaiveDate) -> Vec<&WeeklyTask> {
        self.weekly_tasks
            .iter()
            .filter(|t| t.notify && t.occurs_on(date))
            .collect()
    }
}
