use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Identified, ItemId};

/// Day of the week, 0 = Sunday through 6 = Saturday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct DayOfWeek(u8);

impl DayOfWeek {
    pub const SUNDAY: DayOfWeek = DayOfWeek(0);
    pub const SATURDAY: DayOfWeek = DayOfWeek(6);

    pub fn new(day: u8) -> Option<Self> {
        (day <= 6).then_some(Self(day))
    }

    pub fn of(date: NaiveDate) -> Self {
        Self::from(date.weekday())
    }

    pub fn index(&self) -> u8 {
        self.0
    }

    pub fn name(&self) -> &'static str {
        match self.0 {
            0 => "Sunday",
            1 => "Monday",
            2 => "Tuesday",
            3 => "Wednesday",
            4 => "Thursday",
            5 => "Friday",
            _ => "Saturday",
        }
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(day: Weekday) -> Self {
        // num_days_from_sunday is always 0..=6
        Self(day.num_days_from_sunday() as u8)
    }
}

impl TryFrom<u8> for DayOfWeek {
    type Error = String;

    fn try_from(day: u8) -> Result<Self, Self::Error> {
        Self::new(day).ok_or_else(|| format!("Invalid day of week {}. Expected 0-6", day))
    }
}

impl From<DayOfWeek> for u8 {
    fn from(day: DayOfWeek) -> Self {
        day.0
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A chore that recurs on the same weekday every week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyTask {
    #[serde(default)]
    pub id: ItemId,
    pub title: String,
    pub day: DayOfWeek,
    #[serde(default)]
    pub notify: bool,
}

impl WeeklyTask {
    pub fn new(title: impl Into<String>, day: DayOfWeek, notify: bool) -> Self {
        Self {
            id: ItemId::new(),
            title: title.into(),
            day,
            notify,
        }
    }

    pub fn occurs_on(&self, date: NaiveDate) -> bool {
        self.day == DayOfWeek::of(date)
    }
}

impl Identified for WeeklyTask {
    fn id(&self) -> ItemId {
        self.id
    }

    fn set_id(&mut self, id: ItemId) {
        self.id = id;
    }

    fn label(&self) -> &str {
        &self.title
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_of_week_bounds() {
        assert!(DayOfWeek::new(0).is_some());
        assert!(DayOfWeek::new(6).is_some());
        assert!(DayOfWeek::new(7).is_none());
    }

    #[test]
    fn test_day_of_week_from_date() {
        // 2026-01-30 is a Friday
        let date = NaiveDate::from_ymd_opt(2026, 1, 30).unwrap();
        assert_eq!(DayOfWeek::of(date).index(), 5);
        assert_eq!(DayOfWeek::from(Weekday::Sun), DayOfWeek::SUNDAY);
    }

    #[test]
    fn test_invalid_day_is_rejected_on_decode() {
        let result: Result<WeeklyTask, _> =
            serde_json::from_str(r#"{"title": "Recycling", "day": 9}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_occurs_on() {
        let task = WeeklyTask::new("Recycling", DayOfWeek::new(5).unwrap(), true);
        let friday = NaiveDate::from_ymd_opt(2026, 1, 30).unwrap();
        let saturday = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
        assert!(task.occurs_on(friday));
        assert!(!task.occurs_on(saturday));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", DayOfWeek::SATURDAY), "Saturday");
    }
}
