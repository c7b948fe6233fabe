//! Case-insensitive search over projects, task names and tags.
use crate::types::{Project, Task, TaskId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FindReason {
    Project,
    Task(TaskId),
    Tag(String),
}

#[derive(Clone, Debug)]
pub struct SearchResult<'a> {
    pub project: &'a Project,
    pub tasks: Vec<&'a Task>,
    pub tags: Vec<String>,
    pub reasons: Vec<FindReason>,
}

impl SearchResult<'_> {
    fn note(&mut self, reason: FindReason) {
        if !self.reasons.contains(&reason) {
            self.reasons.push(reason);
        }
    }
}

/// One result per project that matches by name or owns a matching task or
/// tag. Results follow the order of `projects`.
pub fn search<'a>(projects: &'a [Project], term: &str) -> Vec<SearchResult<'a>> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let mut results = Vec::new();
    for project in projects {
        let mut result = SearchResult {
            project,
            tasks: Vec::new(),
            tags: Vec::new(),
            reasons: Vec::new(),
        };
        if project.name.to_lowercase().contains(&needle) {
            result.note(FindReason::Project);
        }
        for task in &project.tasks {
            let mut matched = false;
            if task.name.to_lowercase().contains(&needle) {
                matched = true;
                if let Some(id) = task.id {
                    result.note(FindReason::Task(id));
                }
            }
            for tag in &task.tags {
                if tag.to_lowercase().contains(&needle) {
                    matched = true;
                    if !result.tags.contains(tag) {
                        result.tags.push(tag.clone());
                    }
                    result.note(FindReason::Tag(tag.clone()));
                }
            }
            if matched {
                result.tasks.push(task);
            }
        }
        if !result.reasons.is_empty() {
            results.push(result);
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::types::RepeatDays;

    fn project(id: u32, name: &str, tasks: Vec<(&str, Vec<&str>)>) -> Project {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        Project {
            id: Some(id),
            name: name.to_string(),
            start_date: start,
            priority: 2,
            tasks: tasks
                .into_iter()
                .enumerate()
                .map(|(i, (name, tags))| Task {
                    id: Some(id * 10 + i as u32),
                    project_id: id,
                    name: name.to_string(),
                    tags: tags.iter().map(|t| t.to_string()).collect(),
                    start_date: start,
                    priority: 2,
                    repeat_days: RepeatDays::NEVER,
                })
                .collect(),
        }
    }

    #[test]
    fn matches_projects_tasks_and_tags() {
        let projects = vec![
            project(1, "Running", vec![("Intervals", vec!["cardio"])]),
            project(2, "Gym", vec![("Bench press", vec!["strength"]), ("Rowing", vec!["Cardio"])]),
            project(3, "Reading", vec![("Novel", Vec::new())]),
        ];

        let results = search(&projects, "CARDIO");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].project.name, "Running");
        assert_eq!(results[1].tasks.len(), 1);
        assert_eq!(results[1].tags, vec!["Cardio".to_string()]);

        let results = search(&projects, "run");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].reasons, vec![FindReason::Project]);

        let results = search(&projects, "row");
        assert_eq!(results[0].reasons, vec![FindReason::Task(21)]);
    }

    #[test]
    fn blank_term_finds_nothing() {
        let projects = vec![project(1, "Running", Vec::new())];
        assert!(search(&projects, "  ").is_empty());
    }
}
