use std::collections::HashSet;

use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::domain::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TaskProgress {
    pub completed: usize,
    pub total: usize,
}

impl TaskProgress {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.completed as f64 / self.total as f64 * 100.0
    }

    pub fn rounded_percent(&self) -> u32 {
        self.percent().round() as u32
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TaskVisit<'a> {
    pub task: &'a Task,
    pub depth: usize,
    pub parent: Option<&'a Task>,
}

/// Pre-order walk over a task forest. Siblings keep their stored order.
pub struct TaskWalk<'a> {
    stack: Vec<TaskVisit<'a>>,
}

impl<'a> TaskWalk<'a> {
    pub fn new(tasks: &'a [Task]) -> Self {
        let stack = tasks
            .iter()
            .rev()
            .map(|task| TaskVisit {
                task,
                depth: 0,
                parent: None,
            })
            .collect();
        Self { stack }
    }
}

impl<'a> Iterator for TaskWalk<'a> {
    type Item = TaskVisit<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let visit = self.stack.pop()?;
        for child in visit.task.sub_tasks.iter().rev() {
            self.stack.push(TaskVisit {
                task: child,
                depth: visit.depth + 1,
                parent: Some(visit.task),
            });
        }
        Some(visit)
    }
}

pub fn walk(tasks: &[Task]) -> TaskWalk<'_> {
    TaskWalk::new(tasks)
}

pub fn progress(tasks: &[Task]) -> TaskProgress {
    walk(tasks).fold(TaskProgress::default(), |mut acc, visit| {
        acc.total += 1;
        if visit.task.completed {
            acc.completed += 1;
        }
        acc
    })
}

pub fn find_task<'a>(tasks: &'a [Task], task_id: &str) -> Option<&'a Task> {
    walk(tasks)
        .map(|visit| visit.task)
        .find(|task| task.id == task_id)
}

pub fn duplicate_task_ids(tasks: &[Task]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for visit in walk(tasks) {
        let id = visit.task.id.as_str();
        if !seen.insert(id) && !duplicates.iter().any(|dup: &String| dup == id) {
            duplicates.push(id.to_string());
        }
    }
    duplicates
}

/// Incomplete tasks whose due date falls at or before `cutoff`, in walk order.
/// Tasks with a due date that does not parse are skipped.
pub fn due_tasks(tasks: &[Task], cutoff: OffsetDateTime) -> Vec<TaskVisit<'_>> {
    walk(tasks)
        .filter(|visit| !visit.task.completed)
        .filter(|visit| {
            visit
                .task
                .due_date
                .as_deref()
                .and_then(parse_due)
                .is_some_and(|due| due <= cutoff)
        })
        .collect()
}

pub fn parse_due(raw: &str) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    if let Ok(parsed) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(parsed);
    }
    let date = Date::parse(raw, format_description!("[year]-[month]-[day]")).ok()?;
    Some(date.midnight().assume_utc())
}
