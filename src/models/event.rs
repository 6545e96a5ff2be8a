use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{empty_as_none, Person};

/// Identity of a calendar event: a millisecond timestamp taken at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub i64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A calendar entry for a single day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub date: NaiveDate,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "time_of_day")]
    pub time: Option<NaiveTime>,
    pub person: Person,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "empty_as_none"
    )]
    pub memo: Option<String>,
}

impl Event {
    pub fn from_draft(id: EventId, draft: EventDraft) -> Self {
        Self {
            id,
            date: draft.date,
            title: draft.title,
            time: draft.time,
            person: draft.person,
            memo: draft.memo,
        }
    }

    /// Replaces every field except the id.
    pub fn apply(&mut self, draft: EventDraft) {
        self.date = draft.date;
        self.title = draft.title;
        self.time = draft.time;
        self.person = draft.person;
        self.memo = draft.memo;
    }

    /// Time used for ordering within a day; untimed events sort as midnight.
    pub fn sort_time(&self) -> NaiveTime {
        self.time.unwrap_or(NaiveTime::MIN)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.time {
            Some(time) => write!(f, "{} {}", time.format("%H:%M"), self.title)?,
            None => write!(f, "--:-- {}", self.title)?,
        }
        write!(f, " ({})", self.person)
    }
}

/// Form values for creating or editing an event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub date: NaiveDate,
    pub title: String,
    pub time: Option<NaiveTime>,
    pub person: Person,
    pub memo: Option<String>,
}

impl EventDraft {
    pub fn new(date: NaiveDate, title: impl Into<String>, person: Person) -> Self {
        Self {
            date,
            title: title.into(),
            time: None,
            person,
            memo: None,
        }
    }

    pub fn at(mut self, time: NaiveTime) -> Self {
        self.time = Some(time);
        self
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        let memo = memo.into();
        self.memo = if memo.trim().is_empty() { None } else { Some(memo) };
        self
    }
}

/// `HH:MM` on the wire; empty strings read as no time.
mod time_of_day {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match time {
            Some(t) => serializer.serialize_str(&t.format("%H:%M").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => NaiveTime::parse_from_str(s, "%H:%M")
                .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}
