//! Per-task time totals over stopwatch records.
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate};

use crate::calendar::month_key;
use crate::error::ParseError;
use crate::types::{Task, TaskId, TimeRecord};

/// Time window applied to records before aggregation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Scope {
    Day,
    Month,
    #[default]
    AllTime,
}

impl FromStr for Scope {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" | "today" => Ok(Scope::Day),
            "month" => Ok(Scope::Month),
            "all" | "all-time" | "alltime" => Ok(Scope::AllTime),
            _ => Err(ParseError::Scope(s.to_string())),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scope::Day => "day",
            Scope::Month => "month",
            Scope::AllTime => "all",
        };
        f.write_str(name)
    }
}

pub fn filter_records(records: &[TimeRecord], scope: Scope, reference: NaiveDate) -> Vec<&TimeRecord> {
    records
        .iter()
        .filter(|record| match scope {
            Scope::Day => record.completion_date == reference,
            Scope::Month => month_key(record.completion_date) == month_key(reference),
            Scope::AllTime => true,
        })
        .collect()
}

/// Sum of `end - start` over the finalized intervals of one record.
pub fn record_duration(record: &TimeRecord) -> Duration {
    record
        .intervals
        .iter()
        .filter_map(|interval| {
            interval
                .end_time
                .map(|end| end.signed_duration_since(interval.start_time))
        })
        .fold(Duration::zero(), |total, part| total + part)
}

/// Total time per task. Tasks whose total is not strictly positive are left
/// out.
pub fn aggregate_by_task<'a, I>(records: I) -> BTreeMap<TaskId, Duration>
where
    I: IntoIterator<Item = &'a TimeRecord>,
{
    let mut totals: BTreeMap<TaskId, Duration> = BTreeMap::new();
    for record in records {
        let entry = totals.entry(record.task_id).or_insert_with(Duration::zero);
        *entry += record_duration(record);
    }
    totals.retain(|_, total| *total > Duration::zero());
    totals
}

/// Compact `1h 2m 3s` rendering. Zero units are omitted; zero or negative
/// input renders as an empty string.
pub fn format_seconds(seconds: i64) -> String {
    let total = seconds.max(0);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    let mut parts = Vec::with_capacity(3);
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes}m"));
    }
    if secs > 0 {
        parts.push(format!("{secs}s"));
    }
    parts.join(" ").trim().to_string()
}

pub fn format_duration(duration: Duration) -> String {
    format_seconds(duration.num_seconds())
}

/// `HH:MM:SS` read-out of a running stopwatch.
pub fn format_clock(duration: Duration) -> String {
    let total_seconds = duration.num_seconds().max(0);
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Display name for `task_id`, or `Unknown` when the task no longer exists.
pub fn label_for(task_id: TaskId, tasks: &[Task]) -> String {
    tasks
        .iter()
        .find(|task| task.id == Some(task_id))
        .map(|task| task.name.clone())
        .unwrap_or_else(|| "Unknown".to_string())
}
