/// Project-related database queries.
use anyhow::Result;
use rusqlite::{Connection, Row};

use super::task::query_tasks;
use super::{date_column, format_date};
use crate::types::{Project, ProjectId, ProjectQuery, TaskQuery};

pub fn create_project(arg: Project, conn: &Connection) -> Result<ProjectId> {
    conn.execute(
        "INSERT INTO projects (name, start_date, priority) VALUES (?1, ?2, ?3)",
        rusqlite::params![arg.name, format_date(arg.start_date), arg.priority],
    )?;
    let id = conn.last_insert_rowid() as ProjectId;
    tracing::info!(project_id = id, name = %arg.name, "created project");
    Ok(id)
}

/// All projects with their tasks loaded.
pub fn query_projects(conn: &Connection) -> Result<Vec<Project>> {
    let mut stmt = conn.prepare("SELECT id, name, start_date, priority FROM projects ORDER BY id")?;
    let rows = stmt.query_map([], project_from_row)?;
    let mut projects = Vec::new();
    for row in rows {
        projects.push(row?);
    }
    load_tasks(&mut projects, conn)?;
    Ok(projects)
}

pub fn query_project(query: ProjectQuery, conn: &Connection) -> Result<Vec<Project>> {
    match query {
        ProjectQuery::ByName(name) => {
            query_project_by_name(name, conn).map(|opt| opt.into_iter().collect())
        }
        ProjectQuery::All => query_projects(conn),
    }
}

pub fn query_project_by_name(name: String, conn: &Connection) -> Result<Option<Project>> {
    let mut stmt =
        conn.prepare("SELECT id, name, start_date, priority FROM projects WHERE name = ?1")?;
    let mut rows = stmt.query([name])?;
    if let Some(row) = rows.next()? {
        let mut projects = vec![project_from_row(row)?];
        load_tasks(&mut projects, conn)?;
        Ok(projects.pop())
    } else {
        Ok(None)
    }
}

pub fn query_project_by_id(id: ProjectId, conn: &Connection) -> Result<Option<Project>> {
    let mut stmt =
        conn.prepare("SELECT id, name, start_date, priority FROM projects WHERE id = ?1")?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        let mut projects = vec![project_from_row(row)?];
        load_tasks(&mut projects, conn)?;
        Ok(projects.pop())
    } else {
        Ok(None)
    }
}

pub fn check_project_exists(name: &str, conn: &Connection) -> Result<bool> {
    let mut stmt = conn.prepare("SELECT COUNT(*) FROM projects WHERE name = ?1")?;
    let count: i64 = stmt.query_row([name], |row| row.get(0))?;
    Ok(count > 0)
}

/// Deletes the project, its tasks and every time record of those tasks.
pub fn delete_project(id: ProjectId, conn: &Connection) -> Result<()> {
    conn.execute("DELETE FROM projects WHERE id = ?1", [id])?;
    tracing::info!(project_id = id, "deleted project");
    Ok(())
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: Some(row.get(0)?),
        name: row.get(1)?,
        start_date: date_column(row, 2)?,
        priority: row.get(3)?,
        tasks: Vec::new(),
    })
}

fn load_tasks(projects: &mut [Project], conn: &Connection) -> Result<()> {
    for project in projects {
        if let Some(id) = project.id {
            project.tasks = query_tasks(TaskQuery::ByProjectId(id), conn)?;
        }
    }
    Ok(())
}
