/// Task database queries.
use anyhow::{Result, bail};
use rusqlite::{Connection, Row};

use super::{date_column, format_date};
use crate::types::{RepeatDays, Task, TaskId, TaskQuery};

const TASK_COLUMNS: &str = "id, project_id, name, start_date, priority, repeat_days";

pub fn create_task(arg: Task, conn: &Connection) -> Result<TaskId> {
    conn.execute(
        "INSERT INTO tasks (project_id, name, start_date, priority, repeat_days) VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            arg.project_id,
            arg.name,
            format_date(arg.start_date),
            arg.priority,
            arg.repeat_days.bits(),
        ],
    )?;
    let id = conn.last_insert_rowid() as TaskId;
    replace_tags(id, &arg.tags, conn)?;
    tracing::info!(task_id = id, name = %arg.name, "created task");
    Ok(id)
}

pub fn query_tasks(query: TaskQuery, conn: &Connection) -> Result<Vec<Task>> {
    match query {
        TaskQuery::All => {
            query_tasks_where(&format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY id"), rusqlite::params![], conn)
        }
        TaskQuery::ByProjectId(project_id) => query_tasks_where(
            &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE project_id = ?1 ORDER BY id"),
            rusqlite::params![project_id],
            conn,
        ),
        TaskQuery::ByProjectAndName(project_id, name) => query_tasks_where(
            &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE project_id = ?1 AND name = ?2 ORDER BY id"),
            rusqlite::params![project_id, name],
            conn,
        ),
    }
}

pub fn query_task_by_id(id: TaskId, conn: &Connection) -> Result<Option<Task>> {
    let mut tasks = query_tasks_where(
        &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
        [id],
        conn,
    )?;
    Ok(tasks.pop())
}

/// Overwrites name, date, priority, repeat set and tags of an existing task.
pub fn update_task(task: &Task, conn: &Connection) -> Result<()> {
    let Some(id) = task.id else {
        bail!("Cannot update a task that has not been saved");
    };
    conn.execute(
        "UPDATE tasks SET name = ?1, start_date = ?2, priority = ?3, repeat_days = ?4 WHERE id = ?5",
        rusqlite::params![
            task.name,
            format_date(task.start_date),
            task.priority,
            task.repeat_days.bits(),
            id,
        ],
    )?;
    replace_tags(id, &task.tags, conn)?;
    tracing::info!(task_id = id, "updated task");
    Ok(())
}

/// Deletes the task together with its tags and time records.
pub fn delete_task(id: TaskId, conn: &Connection) -> Result<()> {
    conn.execute("DELETE FROM tasks WHERE id = ?1", [id])?;
    tracing::info!(task_id = id, "deleted task");
    Ok(())
}

fn query_tasks_where<P: rusqlite::Params>(sql: &str, params: P, conn: &Connection) -> Result<Vec<Task>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, task_from_row)?;
    let mut tasks = Vec::new();
    for row in rows {
        tasks.push(row?);
    }
    for task in &mut tasks {
        if let Some(id) = task.id {
            task.tags = query_tags(id, conn)?;
        }
    }
    Ok(tasks)
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: Some(row.get(0)?),
        project_id: row.get(1)?,
        name: row.get(2)?,
        tags: Vec::new(),
        start_date: date_column(row, 3)?,
        priority: row.get(4)?,
        repeat_days: RepeatDays::from_bits(row.get(5)?),
    })
}

fn query_tags(task_id: TaskId, conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT tag FROM task_tags WHERE task_id = ?1 ORDER BY position")?;
    let rows = stmt.query_map([task_id], |row| row.get(0))?;
    let mut tags = Vec::new();
    for row in rows {
        tags.push(row?);
    }
    Ok(tags)
}

fn replace_tags(task_id: TaskId, tags: &[String], conn: &Connection) -> Result<()> {
    conn.execute("DELETE FROM task_tags WHERE task_id = ?1", [task_id])?;
    for (position, tag) in tags.iter().enumerate() {
        conn.execute(
            "INSERT INTO task_tags (task_id, position, tag) VALUES (?1, ?2, ?3)",
            rusqlite::params![task_id, position as i64, tag],
        )?;
    }
    Ok(())
}
