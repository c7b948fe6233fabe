/// Database migrations and schema management.
use anyhow::Result;
use rusqlite::Connection;

/// Creates the schema if it doesn't exist yet.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS projects (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            name        TEXT    NOT NULL UNIQUE,
            start_date  TEXT    NOT NULL,
            priority    INTEGER NOT NULL DEFAULT 2
        );

        CREATE TABLE IF NOT EXISTS tasks (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            project_id  INTEGER NOT NULL,
            name        TEXT    NOT NULL,
            start_date  TEXT    NOT NULL,
            priority    INTEGER NOT NULL DEFAULT 2,
            repeat_days INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS task_tags (
            task_id     INTEGER NOT NULL,
            position    INTEGER NOT NULL,
            tag         TEXT    NOT NULL,
            FOREIGN KEY (task_id) REFERENCES tasks(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS time_records (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            task_id         INTEGER NOT NULL,
            completion_date TEXT    NOT NULL,
            finished        INTEGER NOT NULL DEFAULT 1,
            FOREIGN KEY (task_id) REFERENCES tasks(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS intervals (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            record_id  INTEGER NOT NULL,
            start_time TEXT    NOT NULL,
            end_time   TEXT,
            FOREIGN KEY (record_id) REFERENCES time_records(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_records_date ON time_records (completion_date);
        CREATE INDEX IF NOT EXISTS idx_intervals_record ON intervals (record_id);
        ",
    )?;
    Ok(())
}
