/// Time record and interval queries.
use anyhow::Result;
use rusqlite::{Connection, Row, types::Value};

use super::{datetime_column, date_column, format_date, optional_datetime_column};
use crate::types::{Interval, IntervalId, RecordId, RecordQuery, TimeRecord};

/// Stores a finished record and its intervals.
pub fn create_record(record: TimeRecord, conn: &Connection) -> Result<RecordId> {
    let id = insert_record(&record, true, conn)?;
    for interval in &record.intervals {
        insert_interval(id, interval, conn)?;
    }
    tracing::info!(
        record_id = id,
        task_id = record.task_id,
        date = %record.completion_date,
        "created time record"
    );
    Ok(id)
}

/// Finished records only; a running session is never part of the result.
pub fn query_records(query: RecordQuery, conn: &Connection) -> Result<Vec<TimeRecord>> {
    const BASE: &str = "SELECT id, task_id, completion_date FROM time_records WHERE finished = 1";
    let (sql, params): (String, Vec<Value>) = match query {
        RecordQuery::All => (format!("{BASE} ORDER BY id"), Vec::new()),
        RecordQuery::ByTask(task_id) => (
            format!("{BASE} AND task_id = ?1 ORDER BY id"),
            vec![Value::from(task_id)],
        ),
        RecordQuery::InRange(from, to) => (
            format!("{BASE} AND completion_date >= ?1 AND completion_date <= ?2 ORDER BY id"),
            vec![Value::from(format_date(from)), Value::from(format_date(to))],
        ),
        RecordQuery::InRangeForTasks(from, to, task_ids) => {
            if task_ids.is_empty() {
                return Ok(Vec::new());
            }
            let placeholders = (0..task_ids.len())
                .map(|idx| format!("?{}", idx + 3))
                .collect::<Vec<_>>()
                .join(", ");
            let mut params = vec![Value::from(format_date(from)), Value::from(format_date(to))];
            params.extend(task_ids.into_iter().map(Value::from));
            (
                format!(
                    "{BASE} AND completion_date >= ?1 AND completion_date <= ?2 AND task_id IN ({placeholders}) ORDER BY id"
                ),
                params,
            )
        }
    };

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(params), record_from_row)?;
    let mut records = Vec::new();
    for row in rows {
        records.push(row?);
    }
    load_intervals(&mut records, conn)?;
    Ok(records)
}

pub fn delete_record(id: RecordId, conn: &Connection) -> Result<()> {
    conn.execute("DELETE FROM time_records WHERE id = ?1", [id])?;
    tracing::info!(record_id = id, "deleted time record");
    Ok(())
}

pub(super) fn insert_record(record: &TimeRecord, finished: bool, conn: &Connection) -> Result<RecordId> {
    conn.execute(
        "INSERT INTO time_records (task_id, completion_date, finished) VALUES (?1, ?2, ?3)",
        rusqlite::params![record.task_id, format_date(record.completion_date), finished],
    )?;
    Ok(conn.last_insert_rowid() as RecordId)
}

pub(super) fn insert_interval(record_id: RecordId, interval: &Interval, conn: &Connection) -> Result<IntervalId> {
    conn.execute(
        "INSERT INTO intervals (record_id, start_time, end_time) VALUES (?1, ?2, ?3)",
        rusqlite::params![
            record_id,
            interval.start_time.to_rfc3339(),
            interval.end_time.map(|dt| dt.to_rfc3339()),
        ],
    )?;
    Ok(conn.last_insert_rowid() as IntervalId)
}

pub(super) fn update_interval_end(interval: &Interval, id: IntervalId, conn: &Connection) -> Result<()> {
    conn.execute(
        "UPDATE intervals SET end_time = ?1 WHERE id = ?2",
        rusqlite::params![interval.end_time.map(|dt| dt.to_rfc3339()), id],
    )?;
    Ok(())
}

pub(super) fn query_intervals_by_record_id(record_id: RecordId, conn: &Connection) -> Result<Vec<Interval>> {
    let mut stmt = conn.prepare(
        "SELECT id, start_time, end_time FROM intervals WHERE record_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map([record_id], |row| {
        Ok(Interval {
            id: Some(row.get(0)?),
            start_time: datetime_column(row, 1)?,
            end_time: optional_datetime_column(row, 2)?,
        })
    })?;
    let mut result = Vec::new();
    for row in rows {
        result.push(row?);
    }
    Ok(result)
}

pub(super) fn record_from_row(row: &Row<'_>) -> rusqlite::Result<TimeRecord> {
    Ok(TimeRecord {
        id: Some(row.get(0)?),
        task_id: row.get(1)?,
        completion_date: date_column(row, 2)?,
        intervals: Vec::new(),
    })
}

pub(super) fn load_intervals(records: &mut [TimeRecord], conn: &Connection) -> Result<()> {
    for record in records {
        if let Some(id) = record.id {
            record.intervals = query_intervals_by_record_id(id, conn)?;
        }
    }
    Ok(())
}
