//! Decides which tasks are due on a given calendar day.
use chrono::{Datelike, Days, NaiveDate};

use crate::calendar::YearMonth;
use crate::types::{Task, TaskId, TimeRecord};

/// Whether `task` is expected to be performed on `date`.
///
/// A task whose start date lies more than one day after `date` is never due.
/// Otherwise it is due on its start date and on every weekday in its repeat
/// set.
pub fn is_task_due_on(task: &Task, date: NaiveDate) -> bool {
    let bound = date.checked_add_days(Days::new(1)).unwrap_or(date);
    if task.start_date > bound {
        return false;
    }
    if task.start_date == date {
        return true;
    }
    task.repeat_days.contains(date.weekday())
}

/// Tasks due on `date`, in input order.
pub fn tasks_due_on(tasks: &[Task], date: NaiveDate) -> Vec<&Task> {
    tasks
        .iter()
        .filter(|task| is_task_due_on(task, date))
        .collect()
}

pub fn is_completed_on(task_id: TaskId, records: &[TimeRecord], date: NaiveDate) -> bool {
    records
        .iter()
        .any(|record| record.task_id == task_id && record.completion_date == date)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DayProgress {
    pub due: usize,
    pub done: usize,
}

impl DayProgress {
    pub fn is_complete(&self) -> bool {
        self.due > 0 && self.done == self.due
    }
}

/// Counts the tasks due on `date` and how many of them have a record that day.
pub fn day_progress(tasks: &[Task], records: &[TimeRecord], date: NaiveDate) -> DayProgress {
    let due = tasks_due_on(tasks, date);
    let done = due
        .iter()
        .filter(|task| {
            task.id
                .map(|id| is_completed_on(id, records, date))
                .unwrap_or(false)
        })
        .count();
    DayProgress {
        due: due.len(),
        done,
    }
}

/// Each day of `month` that has at least one due task, oldest first.
pub fn month_agenda(tasks: &[Task], month: YearMonth) -> Vec<(NaiveDate, Vec<&Task>)> {
    month
        .days()
        .map(|day| (day, tasks_due_on(tasks, day)))
        .filter(|(_, due)| !due.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Weekday;

    use super::*;
    use crate::types::{DEFAULT_PRIORITY, RepeatDays};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn task(id: TaskId, start: NaiveDate, repeat: RepeatDays) -> Task {
        Task {
            id: Some(id),
            project_id: 1,
            name: format!("task {id}"),
            tags: Vec::new(),
            start_date: start,
            priority: DEFAULT_PRIORITY,
            repeat_days: repeat,
        }
    }

    fn record(task_id: TaskId, day: NaiveDate) -> TimeRecord {
        TimeRecord {
            id: None,
            task_id,
            completion_date: day,
            intervals: Vec::new(),
        }
    }

    #[test]
    fn start_date_is_always_due() {
        let one_shot = task(1, date(2024, 5, 17), RepeatDays::NEVER);
        assert!(is_task_due_on(&one_shot, date(2024, 5, 17)));
        assert!(!is_task_due_on(&one_shot, date(2024, 5, 18)));
        assert!(!is_task_due_on(&one_shot, date(2024, 5, 24)));
    }

    #[test]
    fn repeats_on_weekdays_after_start() {
        let days: RepeatDays = [Weekday::Mon, Weekday::Wed].into_iter().collect();
        let a = task(1, date(2024, 1, 1), days);
        assert!(is_task_due_on(&a, date(2024, 1, 1)));
        assert!(is_task_due_on(&a, date(2024, 1, 3)));
        assert!(!is_task_due_on(&a, date(2024, 1, 2)));
        assert!(is_task_due_on(&a, date(2024, 3, 4)));
    }

    #[test]
    fn tolerates_a_start_one_day_ahead() {
        // Starts on a Tuesday; the Monday before matches the repeat set.
        let t = task(1, date(2024, 1, 9), RepeatDays::EVERY_DAY);
        assert!(is_task_due_on(&t, date(2024, 1, 8)));
        assert!(!is_task_due_on(&t, date(2024, 1, 7)));
    }

    #[test]
    fn filter_keeps_input_order() {
        let tasks = vec![
            task(3, date(2024, 1, 1), RepeatDays::EVERY_DAY),
            task(1, date(2024, 6, 1), RepeatDays::EVERY_DAY),
            task(2, date(2024, 1, 2), RepeatDays::WEEKDAYS),
        ];
        let due: Vec<_> = tasks_due_on(&tasks, date(2024, 1, 3))
            .iter()
            .filter_map(|t| t.id)
            .collect();
        assert_eq!(due, vec![3, 2]);
        assert!(tasks_due_on(&[], date(2024, 1, 3)).is_empty());
    }

    #[test]
    fn progress_counts_records_on_the_same_day() {
        let tasks = vec![
            task(1, date(2024, 1, 1), RepeatDays::EVERY_DAY),
            task(2, date(2024, 1, 1), RepeatDays::EVERY_DAY),
        ];
        let records = vec![record(1, date(2024, 1, 5)), record(2, date(2024, 1, 4))];
        let progress = day_progress(&tasks, &records, date(2024, 1, 5));
        assert_eq!(progress, DayProgress { due: 2, done: 1 });
        assert!(!progress.is_complete());
        assert!(!DayProgress::default().is_complete());
    }

    #[test]
    fn agenda_skips_empty_days() {
        let tasks = vec![task(1, date(2024, 2, 10), RepeatDays::WEEKENDS)];
        let agenda = month_agenda(&tasks, YearMonth::new(2024, 2).unwrap());
        let days: Vec<_> = agenda.iter().map(|(day, _)| day.day()).collect();
        assert_eq!(days, vec![10, 11, 17, 18, 24, 25]);
    }
}
