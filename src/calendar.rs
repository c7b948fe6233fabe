//! Calendar-day and month keys shared by scheduling and aggregation.
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Days, Local, NaiveDate, NaiveTime, TimeZone};

use crate::error::ParseError;
use crate::types::{Task, TimeRecord};

/// A (year, month) pair. Ordering is year major, month minor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    /// Returns `None` when `month` is outside 1..=12 or the month falls
    /// outside the representable date range.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        let candidate = Self { year, month };
        NaiveDate::from_ymd_opt(year, month, 1)?;
        NaiveDate::from_ymd_opt(year, month, candidate.days_in_month())?;
        Some(candidate)
    }

    pub fn first_day(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn next(self) -> Option<Self> {
        if self.month == 12 {
            Self::new(self.year.checked_add(1)?, 1)
        } else {
            Self::new(self.year, self.month + 1)
        }
    }

    pub fn previous(self) -> Option<Self> {
        if self.month == 1 {
            Self::new(self.year.checked_sub(1)?, 12)
        } else {
            Self::new(self.year, self.month.checked_sub(1)?)
        }
    }

    pub fn days_in_month(self) -> u32 {
        match self.month {
            4 | 6 | 9 | 11 => 30,
            2 if NaiveDate::from_ymd_opt(self.year, 2, 29).is_some() => 29,
            2 => 28,
            _ => 31,
        }
    }

    pub fn days(self) -> impl Iterator<Item = NaiveDate> {
        let first = self.first_day();
        (0..self.days_in_month()).filter_map(move |offset| first.checked_add_days(Days::new(offset.into())))
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        month_key(date) == self
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseError::Month(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        YearMonth::new(year, month).ok_or_else(invalid)
    }
}

pub fn day_key(timestamp: DateTime<Local>) -> NaiveDate {
    timestamp.date_naive()
}

pub fn month_key(date: NaiveDate) -> YearMonth {
    YearMonth {
        year: date.year(),
        month: date.month(),
    }
}

/// Distinct months covered by `dates`, oldest first.
pub fn months_spanned<I>(dates: I) -> Vec<YearMonth>
where
    I: IntoIterator<Item = NaiveDate>,
{
    dates
        .into_iter()
        .map(month_key)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn record_months(records: &[TimeRecord]) -> Vec<YearMonth> {
    months_spanned(records.iter().map(|record| record.completion_date))
}

pub fn task_months(tasks: &[Task]) -> Vec<YearMonth> {
    months_spanned(tasks.iter().map(|task| task.start_date))
}

/// Empty cells before day 1 in a Monday-first week grid.
pub fn leading_blank_days(month: YearMonth) -> u32 {
    month.first_day().weekday().num_days_from_monday()
}

/// Parses `YYYY-MM-DD`, an RFC 3339 timestamp (taken as its local calendar
/// day), or one of `today`, `yesterday`, `tomorrow` relative to `today`.
pub fn parse_date(value: &str, today: NaiveDate) -> Result<NaiveDate, ParseError> {
    let trimmed = value.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "today" => return Ok(today),
        "yesterday" => return today.pred_opt().ok_or_else(|| ParseError::Date(value.to_string())),
        "tomorrow" => return today.succ_opt().ok_or_else(|| ParseError::Date(value.to_string())),
        _ => {}
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| day_key(dt.with_timezone(&Local)))
        .map_err(|_| ParseError::Date(value.to_string()))
}

/// Parses a wall-clock time on `day` (`HH:MM` or `HH:MM:SS`) or a full RFC 3339
/// timestamp.
pub fn parse_time_on(value: &str, day: NaiveDate) -> Result<DateTime<Local>, ParseError> {
    let trimmed = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Local));
    }
    let time = NaiveTime::parse_from_str(trimmed, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
        .map_err(|_| ParseError::Time(value.to_string()))?;
    Local
        .from_local_datetime(&day.and_time(time))
        .earliest()
        .ok_or_else(|| ParseError::Time(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_lengths_follow_the_gregorian_calendar() {
        assert_eq!(YearMonth::new(2024, 2).unwrap().days_in_month(), 29);
        assert_eq!(YearMonth::new(2023, 2).unwrap().days_in_month(), 28);
        assert_eq!(YearMonth::new(2024, 12).unwrap().days_in_month(), 31);
        assert_eq!(YearMonth::new(2024, 4).unwrap().days().count(), 30);
    }

    #[test]
    fn navigation_wraps_years() {
        let dec = YearMonth::new(2023, 12).unwrap();
        assert_eq!(dec.next(), YearMonth::new(2024, 1));
        assert_eq!(dec.next().and_then(YearMonth::previous), Some(dec));
        assert!(YearMonth::new(2024, 13).is_none());
    }

    #[test]
    fn rejects_months_outside_the_date_range() {
        assert!(YearMonth::new(300_000, 2).is_none());
        assert!(YearMonth::new(i32::MAX, 12).is_none());
        assert!("300000-02".parse::<YearMonth>().is_err());
        assert!("2147483647-12".parse::<YearMonth>().is_err());

        let last = month_key(NaiveDate::MAX);
        assert_eq!(last.days_in_month(), 31);
        assert_eq!(last.days().count(), 31);
        assert!(last.next().is_none());
        assert!(month_key(NaiveDate::MIN).previous().is_none());
    }

    #[test]
    fn leading_blanks_are_monday_based() {
        // 2024-01-01 is a Monday, 2023-10-01 a Sunday.
        assert_eq!(leading_blank_days(YearMonth::new(2024, 1).unwrap()), 0);
        assert_eq!(leading_blank_days(YearMonth::new(2023, 10).unwrap()), 6);
        // 2024-02-01 is a Thursday.
        assert_eq!(leading_blank_days(YearMonth::new(2024, 2).unwrap()), 3);
    }

    #[test]
    fn months_spanned_is_sorted_and_distinct() {
        let months = months_spanned([
            date(2024, 3, 9),
            date(2023, 11, 2),
            date(2024, 3, 1),
            date(2024, 1, 31),
        ]);
        assert_eq!(
            months,
            vec![
                YearMonth::new(2023, 11).unwrap(),
                YearMonth::new(2024, 1).unwrap(),
                YearMonth::new(2024, 3).unwrap(),
            ]
        );
        assert!(months_spanned(Vec::new()).is_empty());
    }

    #[test]
    fn task_months_follow_start_dates() {
        let task = |id: u32, start: NaiveDate| Task {
            id: Some(id),
            project_id: 1,
            name: format!("task {id}"),
            tags: Vec::new(),
            start_date: start,
            priority: crate::types::DEFAULT_PRIORITY,
            repeat_days: crate::types::RepeatDays::NEVER,
        };
        let tasks = vec![
            task(1, date(2024, 5, 20)),
            task(2, date(2024, 2, 1)),
            task(3, date(2024, 5, 2)),
        ];
        assert_eq!(
            task_months(&tasks),
            vec![YearMonth::new(2024, 2).unwrap(), YearMonth::new(2024, 5).unwrap()]
        );
        assert!(task_months(&[]).is_empty());
    }

    #[test]
    fn parses_months_and_dates() {
        assert_eq!("2024-02".parse::<YearMonth>().unwrap().to_string(), "2024-02");
        assert!("2024-00".parse::<YearMonth>().is_err());
        assert!("feb".parse::<YearMonth>().is_err());

        let today = date(2024, 2, 15);
        assert_eq!(parse_date("2024-01-03", today).unwrap(), date(2024, 1, 3));
        assert_eq!(parse_date("yesterday", today).unwrap(), date(2024, 2, 14));
        assert!(parse_date("15/02/2024", today).is_err());
    }

    #[test]
    fn parses_wall_clock_times_on_a_day() {
        let day = date(2024, 2, 15);
        let time = parse_time_on("10:05", day).unwrap();
        assert_eq!(day_key(time), day);
        assert_eq!(time.format("%H:%M:%S").to_string(), "10:05:00");
        assert!(parse_time_on("25:00", day).is_err());
    }
}
