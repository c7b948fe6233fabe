/// Database module with project, task, record and session queries and migrations.
mod migrations;
mod project;
mod records;
mod session;
mod task;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate};
use rusqlite::{Connection, Row, types::Type};

// Re-export all public functions
pub use project::{
    check_project_exists, create_project, delete_project, query_project, query_project_by_id,
    query_projects,
};
pub use records::{create_record, delete_record, query_records};
pub use session::{
    active_session, discard_session, finish_session, pause_session, resume_session, start_session,
};
pub use task::{create_task, delete_task, query_task_by_id, query_tasks, update_task};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Opens (or creates) the SQLite database and runs migrations.
pub fn init(db_path: &str) -> Result<Connection> {
    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {db_path}"))?;
    conn.pragma_update(None, "foreign_keys", true)?;
    migrations::run_migrations(&conn)?;
    tracing::debug!(path = db_path, "database ready");
    Ok(conn)
}

/// Returns the default database path inside the user's data directory.
/// Falls back to `./habitr.db` when no data dir is found.
pub fn default_db_path() -> String {
    if let Some(data_dir) = dirs::data_local_dir() {
        let habitr_dir = data_dir.join("habitr");
        std::fs::create_dir_all(&habitr_dir).ok();
        habitr_dir.join("habitr.db").to_string_lossy().into_owned()
    } else {
        "habitr.db".to_string()
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn date_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, DATE_FORMAT)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

fn datetime_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Local>> {
    let raw: String = row.get(idx)?;
    parse_datetime(&raw, idx)
}

fn optional_datetime_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Local>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|value| parse_datetime(&value, idx)).transpose()
}

fn parse_datetime(raw: &str, idx: usize) -> rusqlite::Result<DateTime<Local>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Local))
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}
