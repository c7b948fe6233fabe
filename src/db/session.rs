/// Stopwatch sessions persisted as unfinished time records.
use anyhow::{Result, bail};
use chrono::{DateTime, Local, NaiveDate};
use rusqlite::Connection;

use super::records::{
    insert_interval, insert_record, load_intervals, record_from_row, update_interval_end,
};
use crate::stopwatch::{Stopwatch, StopwatchError};
use crate::types::{Interval, RecordId, TaskId, TimeRecord};

/// The running or paused session, if any.
pub fn active_session(conn: &Connection) -> Result<Option<TimeRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, task_id, completion_date FROM time_records WHERE finished = 0 ORDER BY id DESC LIMIT 1",
    )?;
    let rows = stmt.query_map([], record_from_row)?;
    let mut records = Vec::new();
    for row in rows {
        records.push(row?);
    }
    load_intervals(&mut records, conn)?;
    Ok(records.pop())
}

/// Starts timing `task_id`, attributing the session to `completion_date`.
pub fn start_session(
    task_id: TaskId,
    completion_date: NaiveDate,
    now: DateTime<Local>,
    conn: &Connection,
) -> Result<RecordId> {
    if let Some(active) = active_session(conn)? {
        bail!(
            "A session for task {} is already in progress, stop or discard it first",
            active.task_id
        );
    }
    let mut stopwatch = Stopwatch::new();
    stopwatch.start(now)?;
    let record = TimeRecord {
        id: None,
        task_id,
        completion_date,
        intervals: Vec::new(),
    };
    let id = insert_record(&record, false, conn)?;
    save_intervals(id, stopwatch.intervals(), conn)?;
    tracing::info!(record_id = id, task_id, "started session");
    Ok(id)
}

pub fn pause_session(now: DateTime<Local>, conn: &Connection) -> Result<Option<TimeRecord>> {
    apply(conn, |stopwatch| stopwatch.pause(now))
}

pub fn resume_session(now: DateTime<Local>, conn: &Connection) -> Result<Option<TimeRecord>> {
    apply(conn, |stopwatch| stopwatch.resume(now))
}

/// Closes the running interval and marks the record finished, making it
/// visible to aggregation.
pub fn finish_session(now: DateTime<Local>, conn: &Connection) -> Result<Option<TimeRecord>> {
    let Some(mut record) = active_session(conn)? else {
        return Ok(None);
    };
    let Some(id) = record.id else {
        return Ok(None);
    };
    let intervals = Stopwatch::from_intervals(record.intervals).finish(now)?;
    save_intervals(id, &intervals, conn)?;
    conn.execute("UPDATE time_records SET finished = 1 WHERE id = ?1", [id])?;
    record.intervals = intervals;
    tracing::info!(record_id = id, task_id = record.task_id, "finished session");
    Ok(Some(record))
}

/// Throws the active session away without recording any time.
pub fn discard_session(conn: &Connection) -> Result<Option<TimeRecord>> {
    let Some(record) = active_session(conn)? else {
        return Ok(None);
    };
    if let Some(id) = record.id {
        conn.execute("DELETE FROM time_records WHERE id = ?1", [id])?;
        tracing::info!(record_id = id, "discarded session");
    }
    Ok(Some(record))
}

fn apply<F>(conn: &Connection, transition: F) -> Result<Option<TimeRecord>>
where
    F: FnOnce(&mut Stopwatch) -> Result<(), StopwatchError>,
{
    let Some(mut record) = active_session(conn)? else {
        return Ok(None);
    };
    let Some(id) = record.id else {
        return Ok(None);
    };
    let mut stopwatch = Stopwatch::from_intervals(record.intervals);
    transition(&mut stopwatch)?;
    save_intervals(id, stopwatch.intervals(), conn)?;
    record.intervals = active_session(conn)?
        .map(|stored| stored.intervals)
        .unwrap_or_default();
    Ok(Some(record))
}

/// Inserts new intervals and writes end times of stored ones.
fn save_intervals(record_id: RecordId, intervals: &[Interval], conn: &Connection) -> Result<()> {
    for interval in intervals {
        match interval.id {
            Some(id) => update_interval_end(interval, id, conn)?,
            None => {
                insert_interval(record_id, interval, conn)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::db::{create_project, create_task, init, query_records};
    use crate::stopwatch::StopwatchState;
    use crate::types::{Project, RecordQuery, RepeatDays, Task};

    fn at(h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 4, h, m, 0).earliest().unwrap()
    }

    fn seed(conn: &Connection) -> TaskId {
        let day = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let project_id = create_project(
            Project {
                id: None,
                name: "Running".into(),
                start_date: day,
                priority: 2,
                tasks: Vec::new(),
            },
            conn,
        )
        .unwrap();
        create_task(
            Task {
                id: None,
                project_id,
                name: "5k".into(),
                tags: vec!["cardio".into()],
                start_date: day,
                priority: 3,
                repeat_days: RepeatDays::NEVER,
            },
            conn,
        )
        .unwrap()
    }

    #[test]
    fn session_lifecycle_produces_a_finished_record() {
        let conn = init(":memory:").unwrap();
        let task_id = seed(&conn);
        let day = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();

        start_session(task_id, day, at(7, 0), &conn).unwrap();
        assert!(start_session(task_id, day, at(7, 1), &conn).is_err());

        let paused = pause_session(at(7, 10), &conn).unwrap().unwrap();
        assert_eq!(
            Stopwatch::from_intervals(paused.intervals).state(),
            StopwatchState::Paused
        );
        resume_session(at(7, 20), &conn).unwrap();
        assert!(query_records(RecordQuery::All, &conn).unwrap().is_empty());

        let record = finish_session(at(7, 25), &conn).unwrap().unwrap();
        assert_eq!(record.intervals.len(), 2);
        assert!(active_session(&conn).unwrap().is_none());

        let stored = query_records(RecordQuery::All, &conn).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(
            crate::aggregate::record_duration(&stored[0]),
            Duration::minutes(15)
        );
    }

    #[test]
    fn invalid_transitions_surface_stopwatch_errors() {
        let conn = init(":memory:").unwrap();
        let task_id = seed(&conn);
        let day = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();

        assert!(pause_session(at(8, 0), &conn).unwrap().is_none());
        start_session(task_id, day, at(8, 0), &conn).unwrap();
        let err = resume_session(at(8, 1), &conn).unwrap_err();
        assert_eq!(
            err.downcast_ref::<StopwatchError>(),
            Some(&StopwatchError::AlreadyRunning)
        );

        let discarded = discard_session(&conn).unwrap();
        assert!(discarded.is_some());
        assert!(active_session(&conn).unwrap().is_none());
    }
}
