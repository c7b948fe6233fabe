use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDate, Weekday};

use crate::error::ParseError;

pub type ProjectId = u32;
pub type TaskId = u32;
pub type RecordId = u32;
pub type IntervalId = u32;

pub const DEFAULT_PRIORITY: i32 = 2;

/// A named group of tasks. Deleting it deletes the tasks and their records.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Project {
    pub id: Option<ProjectId>,
    pub name: String,
    pub start_date: NaiveDate,
    pub priority: i32,
    pub tasks: Vec<Task>,
}

pub enum ProjectQuery {
    All,
    ByName(String),
}

/// A trackable activity with an optional weekly recurrence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Task {
    pub id: Option<TaskId>,
    pub project_id: ProjectId,
    pub name: String,
    pub tags: Vec<String>,
    pub start_date: NaiveDate,
    pub priority: i32,
    pub repeat_days: RepeatDays,
}

pub enum TaskQuery {
    All,
    ByProjectId(ProjectId),
    ByProjectAndName(ProjectId, String),
}

/// Time spent on a task, attributed to one calendar day.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimeRecord {
    pub id: Option<RecordId>,
    pub task_id: TaskId,
    pub completion_date: NaiveDate,
    pub intervals: Vec<Interval>,
}

pub enum RecordQuery {
    All,
    ByTask(TaskId),
    /// Inclusive on both ends.
    InRange(NaiveDate, NaiveDate),
    InRangeForTasks(NaiveDate, NaiveDate, Vec<TaskId>),
}

/// One start/end pair of a record. `end_time` is `None` only while a
/// stopwatch session is running.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Interval {
    pub id: Option<IntervalId>,
    pub start_time: DateTime<Local>,
    pub end_time: Option<DateTime<Local>>,
}

impl Interval {
    pub fn closed(start_time: DateTime<Local>, end_time: DateTime<Local>) -> Self {
        Self {
            id: None,
            start_time,
            end_time: Some(end_time),
        }
    }
}

/// Label used by the priority picker.
pub fn priority_label(priority: i32) -> Option<&'static str> {
    match priority {
        1 => Some("Meh"),
        2 => Some("Maybe"),
        3 => Some("Must"),
        _ => None,
    }
}

const ALL_WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Set of ISO weekdays a task repeats on. Empty means the task only happens on
/// its start date.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RepeatDays(u8);

impl RepeatDays {
    pub const NEVER: RepeatDays = RepeatDays(0);
    pub const WEEKDAYS: RepeatDays = RepeatDays(0b0001_1111);
    pub const WEEKENDS: RepeatDays = RepeatDays(0b0110_0000);
    pub const EVERY_DAY: RepeatDays = RepeatDays(0b0111_1111);

    pub fn from_bits(bits: u8) -> Self {
        RepeatDays(bits & Self::EVERY_DAY.0)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, day: Weekday) -> bool {
        self.0 & bit(day) != 0
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= bit(day);
    }

    pub fn remove(&mut self, day: Weekday) {
        self.0 &= !bit(day);
    }

    /// Days in Monday..Sunday order.
    pub fn iter(self) -> impl Iterator<Item = Weekday> {
        ALL_WEEKDAYS.into_iter().filter(move |day| self.contains(*day))
    }

    pub fn describe(self) -> String {
        match self {
            Self::NEVER => "Never".to_string(),
            Self::WEEKDAYS => "Every Weekday".to_string(),
            Self::WEEKENDS => "Every Weekend Day".to_string(),
            Self::EVERY_DAY => "Every Day".to_string(),
            _ => self
                .iter()
                .map(|day| day.to_string())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

fn bit(day: Weekday) -> u8 {
    1 << day.num_days_from_monday()
}

impl FromIterator<Weekday> for RepeatDays {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        let mut days = RepeatDays::NEVER;
        for day in iter {
            days.insert(day);
        }
        days
    }
}

impl fmt::Display for RepeatDays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl FromStr for RepeatDays {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_ascii_lowercase();
        match value.as_str() {
            "" | "never" | "none" => return Ok(Self::NEVER),
            "daily" | "every-day" | "everyday" => return Ok(Self::EVERY_DAY),
            "weekdays" => return Ok(Self::WEEKDAYS),
            "weekends" => return Ok(Self::WEEKENDS),
            _ => {}
        }
        value
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<Weekday>()
                    .map_err(|_| ParseError::Weekday(part.to_string()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_day_lists_and_presets() {
        let days: RepeatDays = "mon, Wednesday".parse().unwrap();
        assert!(days.contains(Weekday::Mon));
        assert!(days.contains(Weekday::Wed));
        assert!(!days.contains(Weekday::Tue));

        assert_eq!("weekdays".parse::<RepeatDays>().unwrap(), RepeatDays::WEEKDAYS);
        assert_eq!("never".parse::<RepeatDays>().unwrap(), RepeatDays::NEVER);
        assert_eq!(
            "mon,xyz".parse::<RepeatDays>(),
            Err(ParseError::Weekday("xyz".to_string()))
        );
    }

    #[test]
    fn describes_like_the_repeat_picker() {
        assert_eq!(RepeatDays::NEVER.describe(), "Never");
        assert_eq!(RepeatDays::EVERY_DAY.describe(), "Every Day");
        assert_eq!(RepeatDays::WEEKENDS.describe(), "Every Weekend Day");
        let custom: RepeatDays = [Weekday::Wed, Weekday::Mon].into_iter().collect();
        assert_eq!(custom.describe(), "Mon, Wed");
    }

    #[test]
    fn bits_are_masked_to_seven_days() {
        assert_eq!(RepeatDays::from_bits(0xFF), RepeatDays::EVERY_DAY);
        let mut days = RepeatDays::EVERY_DAY;
        days.remove(Weekday::Sun);
        assert!(!days.contains(Weekday::Sun));
        assert_eq!(days.iter().count(), 6);
    }
}
