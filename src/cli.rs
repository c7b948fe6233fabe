/// CLI argument parsing and command handling.
use anyhow::Result;
use chrono::{DateTime, Datelike, Local, NaiveDate};
use clap::{Parser, Subcommand};
use rusqlite::Connection;

use crate::aggregate::{self, Scope};
use crate::calendar::{self, YearMonth};
use crate::search::{self, FindReason};
use crate::stopwatch::{Stopwatch, StopwatchState};
use crate::types::{self, RepeatDays};
use crate::{db, schedule};

#[derive(Parser, Debug)]
#[command(
    name = "habitr",
    version,
    about = "habitr - A terminal habit tracker with recurring tasks"
)]
pub struct Cli {
    /// Path of the SQLite database (overrides HABITR_DB)
    #[arg(long, global = true)]
    pub db: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Project {
        #[command(subcommand)]
        command: ProjectCommand,
    },
    Task {
        #[command(subcommand)]
        command: TaskCommand,
    },
    /// List the tasks due on a day
    Due {
        #[arg(short = 'd', long = "date")]
        date: Option<String>,
    },
    /// Record a finished session with a single interval
    Log {
        project: String,
        task: String,
        #[arg(long = "from")]
        from: String,
        #[arg(long = "to")]
        to: String,
        #[arg(short = 'd', long = "date")]
        date: Option<String>,
    },
    Track {
        #[command(subcommand)]
        command: TrackCommand,
    },
    /// Total time per task
    Totals {
        #[arg(short = 's', long = "scope", default_value = "all")]
        scope: Scope,
        #[arg(short = 'd', long = "date")]
        date: Option<String>,
    },
    /// Months that contain time records
    Months {
        /// Use task start dates instead of time records
        #[arg(long)]
        tasks: bool,
    },
    /// Month grid with done/due counts
    Calendar {
        #[arg(short = 'm', long = "month")]
        month: Option<YearMonth>,
    },
    Search {
        term: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    Add {
        name: String,
        #[arg(short = 's', long = "start")]
        start: Option<String>,
        #[arg(short = 'p', long = "priority", default_value_t = types::DEFAULT_PRIORITY)]
        priority: i32,
    },
    List,
    Delete {
        name: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    Add {
        project: String,
        name: String,
        #[arg(short = 's', long = "start")]
        start: Option<String>,
        /// never, daily, weekdays, weekends or a list such as mon,wed
        #[arg(short = 'r', long = "repeat", default_value = "never")]
        repeat: RepeatDays,
        #[arg(short = 't', long = "tag")]
        tags: Vec<String>,
        #[arg(short = 'p', long = "priority", default_value_t = types::DEFAULT_PRIORITY)]
        priority: i32,
    },
    Edit {
        project: String,
        name: String,
        #[arg(long = "rename")]
        rename: Option<String>,
        #[arg(short = 's', long = "start")]
        start: Option<String>,
        #[arg(short = 'r', long = "repeat")]
        repeat: Option<RepeatDays>,
        /// Replaces the tag list
        #[arg(short = 't', long = "tag")]
        tags: Vec<String>,
        #[arg(long = "clear-tags")]
        clear_tags: bool,
        #[arg(short = 'p', long = "priority")]
        priority: Option<i32>,
    },
    List {
        project: Option<String>,
    },
    Delete {
        project: String,
        name: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum TrackCommand {
    Start {
        project: String,
        task: String,
        /// Day the session counts towards
        #[arg(short = 'd', long = "date")]
        date: Option<String>,
    },
    Pause,
    Resume,
    Stop,
    Discard,
    Status,
}

/// Execute a CLI command against the database.
pub fn run(command: Command, conn: &Connection) -> Result<()> {
    run_at(command, conn, Local::now())
}

/// Same as [`run`] with an explicit clock reading.
pub fn run_at(command: Command, conn: &Connection, now: DateTime<Local>) -> Result<()> {
    tracing::debug!(?command, "dispatching command");
    let today = calendar::day_key(now);
    match command {
        Command::Project { command } => match command {
            ProjectCommand::Add {
                name,
                start,
                priority,
            } => handle_project_add(name, start, priority, today, conn)?,
            ProjectCommand::List => handle_project_list(conn)?,
            ProjectCommand::Delete { name } => handle_project_delete(name, conn)?,
        },
        Command::Task { command } => match command {
            TaskCommand::Add {
                project,
                name,
                start,
                repeat,
                tags,
                priority,
            } => handle_task_add(project, name, start, repeat, tags, priority, today, conn)?,
            TaskCommand::Edit {
                project,
                name,
                rename,
                start,
                repeat,
                tags,
                clear_tags,
                priority,
            } => {
                let edit = TaskEdit {
                    rename,
                    start,
                    repeat,
                    tags,
                    clear_tags,
                    priority,
                };
                handle_task_edit(project, name, edit, today, conn)?
            }
            TaskCommand::List { project } => handle_task_list(project, conn)?,
            TaskCommand::Delete { project, name } => handle_task_delete(project, name, conn)?,
        },
        Command::Due { date } => handle_due(date, today, conn)?,
        Command::Log {
            project,
            task,
            from,
            to,
            date,
        } => handle_log(project, task, from, to, date, today, conn)?,
        Command::Track { command } => handle_track(command, now, conn)?,
        Command::Totals { scope, date } => handle_totals(scope, date, today, conn)?,
        Command::Months { tasks } => handle_months(tasks, conn)?,
        Command::Calendar { month } => handle_calendar(month, today, conn)?,
        Command::Search { term } => handle_search(term, conn)?,
    }
    Ok(())
}

struct TaskEdit {
    rename: Option<String>,
    start: Option<String>,
    repeat: Option<RepeatDays>,
    tags: Vec<String>,
    clear_tags: bool,
    priority: Option<i32>,
}

fn handle_project_add(
    name: String,
    start: Option<String>,
    priority: i32,
    today: NaiveDate,
    conn: &Connection,
) -> Result<()> {
    if db::check_project_exists(&name, conn)? {
        println!("Project '{name}' already exists.");
        return Ok(());
    }
    let start_date = parse_optional_date(start, today)?;
    db::create_project(
        types::Project {
            id: None,
            name,
            start_date,
            priority,
            tasks: Vec::new(),
        },
        conn,
    )?;
    Ok(())
}

fn handle_project_list(conn: &Connection) -> Result<()> {
    let projects = db::query_projects(conn)?;
    if projects.is_empty() {
        println!("No projects yet.");
        return Ok(());
    }
    for project in projects {
        println!(
            "{}  (since {}, priority {}, {} task(s))",
            project.name,
            project.start_date,
            describe_priority(project.priority),
            project.tasks.len()
        );
    }
    Ok(())
}

fn handle_project_delete(name: String, conn: &Connection) -> Result<()> {
    let Some(project) = find_project(&name, conn)? else {
        return Ok(());
    };
    if let Some(id) = project.id {
        db::delete_project(id, conn)?;
        println!(
            "Deleted project '{}' and {} task(s).",
            project.name,
            project.tasks.len()
        );
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn handle_task_add(
    project: String,
    name: String,
    start: Option<String>,
    repeat: RepeatDays,
    tags: Vec<String>,
    priority: i32,
    today: NaiveDate,
    conn: &Connection,
) -> Result<()> {
    let Some(project) = find_project(&project, conn)? else {
        return Ok(());
    };
    let Some(project_id) = project.id else {
        return Ok(());
    };
    if project.tasks.iter().any(|task| task.name == name) {
        println!("Task '{name}' already exists in project '{}'.", project.name);
        return Ok(());
    }
    let start_date = parse_optional_date(start, today)?;
    db::create_task(
        types::Task {
            id: None,
            project_id,
            name,
            tags,
            start_date,
            priority,
            repeat_days: repeat,
        },
        conn,
    )?;
    Ok(())
}

fn handle_task_edit(
    project: String,
    name: String,
    edit: TaskEdit,
    today: NaiveDate,
    conn: &Connection,
) -> Result<()> {
    let Some((project, mut task)) = find_task(&project, &name, conn)? else {
        return Ok(());
    };
    if let Some(rename) = edit.rename {
        if project
            .tasks
            .iter()
            .any(|other| other.name == rename && other.id != task.id)
        {
            println!("Task '{rename}' already exists in project '{}'.", project.name);
            return Ok(());
        }
        task.name = rename;
    }
    if let Some(start) = edit.start {
        task.start_date = calendar::parse_date(&start, today)?;
    }
    if let Some(repeat) = edit.repeat {
        task.repeat_days = repeat;
    }
    if edit.clear_tags {
        task.tags.clear();
    }
    if !edit.tags.is_empty() {
        task.tags = edit.tags;
    }
    if let Some(priority) = edit.priority {
        task.priority = priority;
    }
    db::update_task(&task, conn)?;
    println!("Updated task '{}'.", task.name);
    Ok(())
}

fn handle_task_list(project: Option<String>, conn: &Connection) -> Result<()> {
    let projects = match project {
        Some(name) => match find_project(&name, conn)? {
            Some(project) => vec![project],
            None => return Ok(()),
        },
        None => db::query_projects(conn)?,
    };
    for project in projects {
        println!("{}", project.name);
        if project.tasks.is_empty() {
            println!("  (no tasks)");
        }
        for task in &project.tasks {
            let tags = if task.tags.is_empty() {
                String::new()
            } else {
                format!("  [{}]", task.tags.join(", "))
            };
            println!(
                "  {}  from {}  repeat: {}  priority: {}{}",
                task.name,
                task.start_date,
                task.repeat_days,
                describe_priority(task.priority),
                tags
            );
        }
    }
    Ok(())
}

fn handle_task_delete(project: String, name: String, conn: &Connection) -> Result<()> {
    let Some((_, task)) = find_task(&project, &name, conn)? else {
        return Ok(());
    };
    if let Some(id) = task.id {
        db::delete_task(id, conn)?;
        println!("Deleted task '{}' and its time records.", task.name);
    }
    Ok(())
}

fn handle_due(date: Option<String>, today: NaiveDate, conn: &Connection) -> Result<()> {
    let date = parse_optional_date(date, today)?;
    let projects = db::query_projects(conn)?;
    let tasks: Vec<types::Task> = projects.iter().flat_map(|p| p.tasks.clone()).collect();
    let due = schedule::tasks_due_on(&tasks, date);
    let ids: Vec<types::TaskId> = due.iter().filter_map(|task| task.id).collect();
    let records = db::query_records(types::RecordQuery::InRangeForTasks(date, date, ids), conn)?;
    let progress = schedule::day_progress(&tasks, &records, date);

    println!(
        "Due on {} ({}): {}/{} done",
        date,
        date.weekday(),
        progress.done,
        progress.due
    );
    if due.is_empty() {
        println!("  No tasks for this day");
        return Ok(());
    }
    let day_records = aggregate::filter_records(&records, Scope::Day, date);
    let totals = aggregate::aggregate_by_task(day_records);
    for task in due {
        let done = task
            .id
            .map(|id| schedule::is_completed_on(id, &records, date))
            .unwrap_or(false);
        let time = task
            .id
            .and_then(|id| totals.get(&id))
            .map(|total| format!("  {}", format_total(*total)))
            .unwrap_or_default();
        println!(
            "  [{}] {} / {}{}",
            if done { "x" } else { " " },
            project_name(task.project_id, &projects),
            task.name,
            time
        );
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn handle_log(
    project: String,
    task: String,
    from: String,
    to: String,
    date: Option<String>,
    today: NaiveDate,
    conn: &Connection,
) -> Result<()> {
    let Some((_, task)) = find_task(&project, &task, conn)? else {
        return Ok(());
    };
    let Some(task_id) = task.id else {
        return Ok(());
    };
    let date = parse_optional_date(date, today)?;
    let start_time = calendar::parse_time_on(&from, date)?;
    let end_time = calendar::parse_time_on(&to, date)?;
    if end_time <= start_time {
        println!("End time must be after the start time.");
        return Ok(());
    }
    db::create_record(
        types::TimeRecord {
            id: None,
            task_id,
            completion_date: date,
            intervals: vec![types::Interval::closed(start_time, end_time)],
        },
        conn,
    )?;
    println!(
        "Logged {} for '{}' on {}.",
        format_total(end_time.signed_duration_since(start_time)),
        task.name,
        date
    );
    Ok(())
}

fn handle_track(command: TrackCommand, now: DateTime<Local>, conn: &Connection) -> Result<()> {
    match command {
        TrackCommand::Start {
            project,
            task,
            date,
        } => {
            let Some((_, task)) = find_task(&project, &task, conn)? else {
                return Ok(());
            };
            let Some(task_id) = task.id else {
                return Ok(());
            };
            let date = parse_optional_date(date, calendar::day_key(now))?;
            db::start_session(task_id, date, now, conn)?;
            println!("Started '{}' (counts towards {}).", task.name, date);
        }
        TrackCommand::Pause => {
            if db::pause_session(now, conn)?.is_some() {
                println!("Paused.");
            } else {
                println!("No session in progress.");
            }
        }
        TrackCommand::Resume => {
            if db::resume_session(now, conn)?.is_some() {
                println!("Resumed.");
            } else {
                println!("No session in progress.");
            }
        }
        TrackCommand::Stop => match db::finish_session(now, conn)? {
            Some(record) => println!(
                "Saved {} for {}.",
                format_total(aggregate::record_duration(&record)),
                task_label(record.task_id, conn)?
            ),
            None => println!("No session in progress."),
        },
        TrackCommand::Discard => match db::discard_session(conn)? {
            Some(record) => println!("Discarded session for {}.", task_label(record.task_id, conn)?),
            None => println!("No session in progress."),
        },
        TrackCommand::Status => match db::active_session(conn)? {
            Some(record) => {
                let label = task_label(record.task_id, conn)?;
                let stopwatch = Stopwatch::from_intervals(record.intervals);
                let state = match stopwatch.state() {
                    StopwatchState::Running => "running",
                    StopwatchState::Paused => "paused",
                    StopwatchState::Idle => "idle",
                };
                println!(
                    "{label} ({state}) {}",
                    aggregate::format_clock(stopwatch.elapsed(now))
                );
            }
            None => println!("No session in progress."),
        },
    }
    Ok(())
}

fn handle_totals(
    scope: Scope,
    date: Option<String>,
    today: NaiveDate,
    conn: &Connection,
) -> Result<()> {
    let reference = parse_optional_date(date, today)?;
    let query = match scope {
        Scope::Day => types::RecordQuery::InRange(reference, reference),
        Scope::Month => {
            let month = calendar::month_key(reference);
            let last = month.days().last().unwrap_or(reference);
            types::RecordQuery::InRange(month.first_day(), last)
        }
        Scope::AllTime => types::RecordQuery::All,
    };
    let records = db::query_records(query, conn)?;
    let scoped = aggregate::filter_records(&records, scope, reference);
    let totals = aggregate::aggregate_by_task(scoped);
    if totals.is_empty() {
        println!("No time recorded ({scope}).");
        return Ok(());
    }

    let projects = db::query_projects(conn)?;
    let tasks: Vec<types::Task> = projects.iter().flat_map(|p| p.tasks.clone()).collect();
    let mut rows: Vec<_> = totals.into_iter().collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    for (task_id, total) in rows {
        let project = tasks
            .iter()
            .find(|task| task.id == Some(task_id))
            .map(|task| project_name(task.project_id, &projects));
        if project.is_none() {
            tracing::warn!(task_id, "time record references a missing task");
        }
        println!(
            "{} / {}  {}",
            project.unwrap_or_else(|| "Unknown".to_string()),
            aggregate::label_for(task_id, &tasks),
            format_total(total)
        );
    }
    Ok(())
}

fn handle_months(use_tasks: bool, conn: &Connection) -> Result<()> {
    let months = if use_tasks {
        calendar::task_months(&db::query_tasks(types::TaskQuery::All, conn)?)
    } else {
        calendar::record_months(&db::query_records(types::RecordQuery::All, conn)?)
    };
    if months.is_empty() {
        println!("Nothing recorded yet.");
    }
    for month in months {
        println!("{month}");
    }
    Ok(())
}

fn handle_calendar(month: Option<YearMonth>, today: NaiveDate, conn: &Connection) -> Result<()> {
    let month = month.unwrap_or_else(|| calendar::month_key(today));
    let tasks = db::query_tasks(types::TaskQuery::All, conn)?;
    let last = month.days().last().unwrap_or_else(|| month.first_day());
    let records = db::query_records(types::RecordQuery::InRange(month.first_day(), last), conn)?;

    println!("{month}");
    println!("{}", render_month_grid(month, &tasks, &records));
    for (day, due) in schedule::month_agenda(&tasks, month) {
        let progress = schedule::day_progress(&tasks, &records, day);
        let names = due
            .iter()
            .map(|task| task.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "{} {}  {}/{}  {}",
            day,
            day.weekday(),
            progress.done,
            progress.due,
            names
        );
    }
    Ok(())
}

/// Monday-first grid. `*` marks a day with every due task done, `.` a day
/// with tasks still open.
pub fn render_month_grid(
    month: YearMonth,
    tasks: &[types::Task],
    records: &[types::TimeRecord],
) -> String {
    let mut cells: Vec<String> = (0..calendar::leading_blank_days(month))
        .map(|_| "    ".to_string())
        .collect();
    for day in month.days() {
        let progress = schedule::day_progress(tasks, records, day);
        let marker = if progress.is_complete() {
            '*'
        } else if progress.due > 0 {
            '.'
        } else {
            ' '
        };
        cells.push(format!("{:>3}{}", day.day(), marker));
    }

    let mut lines = vec![" Mo  Tu  We  Th  Fr  Sa  Su ".to_string()];
    for week in cells.chunks(7) {
        lines.push(week.concat().trim_end().to_string());
    }
    lines.join("\n")
}

fn handle_search(term: String, conn: &Connection) -> Result<()> {
    let projects = db::query_projects(conn)?;
    let results = search::search(&projects, &term);
    if results.is_empty() {
        println!("Nothing matches '{term}'.");
        return Ok(());
    }
    for result in results {
        let matched_project = result.reasons.contains(&FindReason::Project);
        println!(
            "{}{}",
            result.project.name,
            if matched_project { "  (project)" } else { "" }
        );
        for task in &result.tasks {
            println!("  {}", task.name);
        }
        if !result.tags.is_empty() {
            println!("  tags: {}", result.tags.join(", "));
        }
    }
    Ok(())
}

fn find_project(name: &str, conn: &Connection) -> Result<Option<types::Project>> {
    let projects = db::query_project(types::ProjectQuery::ByName(name.to_string()), conn)?;
    let project = projects.into_iter().next();
    if project.is_none() {
        println!("Project '{name}' not found");
    }
    Ok(project)
}

fn find_task(
    project: &str,
    name: &str,
    conn: &Connection,
) -> Result<Option<(types::Project, types::Task)>> {
    let Some(project) = find_project(project, conn)? else {
        return Ok(None);
    };
    let task = project.tasks.iter().find(|task| task.name == name).cloned();
    match task {
        Some(task) => Ok(Some((project, task))),
        None => {
            println!("Task '{}' not found in project '{}'", name, project.name);
            Ok(None)
        }
    }
}

fn task_label(task_id: types::TaskId, conn: &Connection) -> Result<String> {
    Ok(db::query_task_by_id(task_id, conn)?
        .map(|task| task.name)
        .unwrap_or_else(|| "Unknown".to_string()))
}

fn project_name(project_id: types::ProjectId, projects: &[types::Project]) -> String {
    projects
        .iter()
        .find(|project| project.id == Some(project_id))
        .map(|project| project.name.clone())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Sub-second totals still count as time spent, so they read `0s` rather
/// than an empty column.
fn format_total(duration: chrono::Duration) -> String {
    let text = aggregate::format_duration(duration);
    if text.is_empty() { "0s".to_string() } else { text }
}

fn describe_priority(priority: i32) -> String {
    match types::priority_label(priority) {
        Some(label) => label.to_string(),
        None => priority.to_string(),
    }
}

fn parse_optional_date(value: Option<String>, today: NaiveDate) -> Result<NaiveDate> {
    match value {
        Some(s) => Ok(calendar::parse_date(&s, today)?),
        None => Ok(today),
    }
}
