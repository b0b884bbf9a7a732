use std::io::{self, IsTerminal};

use crate::app::{DueReport, ProjectProgress};
use crate::coordinator::{LoadReport, Notice};
use crate::domain::{MyStatus, Project, Task, UserAlert};
use crate::listing::ProjectListFilter;
use crate::progress::{self, TaskProgress};
use crate::search::SearchResults;

pub fn print_project_list(projects: &[Project], filter: &ProjectListFilter) {
    let palette = Palette::auto();
    println!("{}", palette.heading("Projects"));
    if let Some(summary) = filter_summary(filter) {
        println!("{}", palette.dim(&format!("filters: {summary}")));
    }

    if projects.is_empty() {
        println!("{}", palette.dim("no projects matched"));
        return;
    }

    for project in projects {
        println!("{}", format_project_row(project, &palette));
    }
    println!("{}", palette.dim(&format!("{} project(s)", projects.len())));
}

fn format_project_row(project: &Project, palette: &Palette) -> String {
    let progress = progress::progress(&project.tasks);
    let mut line = format!(
        "{} {} {} {} {}",
        palette.id(&project.id),
        palette.status(project.my_status),
        project.name,
        palette.dim(&format!("({})", project.chain)),
        progress_label(&progress)
    );
    if project.is_archived {
        line.push(' ');
        line.push_str(&palette.dim("[archived]"));
    }
    if !project.tags.is_empty() {
        line.push(' ');
        line.push_str(&palette.tags(&format!("#{}", project.tags.join(" #"))));
    }
    line
}

fn progress_label(progress: &TaskProgress) -> String {
    format!(
        "{}/{} {}%",
        progress.completed,
        progress.total,
        progress.rounded_percent()
    )
}

pub fn print_progress(view: &ProjectProgress) {
    let palette = Palette::auto();
    let project = &view.project;
    println!(
        "{} {} {}",
        palette.heading(&project.name),
        palette.status(project.my_status),
        progress_label(&view.progress)
    );
    if project.tasks.is_empty() {
        println!("{}", palette.dim("no tasks"));
        return;
    }
    for visit in progress::walk(&project.tasks) {
        println!("{}", format_task_row(visit.task, visit.depth, &palette));
    }
}

fn format_task_row(task: &Task, depth: usize, palette: &Palette) -> String {
    let marker = if task.completed { "[x]" } else { "[ ]" };
    let mut line = format!(
        "{}{} {} {}",
        indentation_prefix(depth, palette),
        palette.paint(if task.completed { "32" } else { "37" }, marker),
        palette.id(&task.id),
        task.description
    );
    if let Some(due) = task.due_date.as_deref() {
        line.push(' ');
        line.push_str(&palette.dim(&format!("due {due}")));
    }
    line
}

fn indentation_prefix(depth: usize, palette: &Palette) -> String {
    if depth == 0 {
        return String::new();
    }
    let spaces = "  ".repeat(depth.saturating_sub(1));
    palette.dim(&format!("{spaces}↳ "))
}

pub fn print_search_results(query: &str, results: &SearchResults) {
    let palette = Palette::auto();
    if results.is_empty() {
        println!("{}", palette.dim(&format!("nothing matched '{}'", query.trim())));
        return;
    }
    for group in &results.groups {
        println!("{}", palette.heading(group.label));
        for result in &group.results {
            let mut line = format!("  {} {}", palette.id(&result.id), result.title);
            if let Some(parent) = result.parent_label.as_deref() {
                line.push(' ');
                line.push_str(&palette.dim(&format!("under {parent}")));
            }
            println!("{line}");
            println!("    {}", palette.dim(&format!("{} · {}", result.description, result.path)));
        }
    }
    let shown = results.len();
    if results.truncated {
        println!(
            "{}",
            palette.dim(&format!(
                "showing {shown} of {} matches; refine the query to narrow it down",
                results.total_matches
            ))
        );
    } else {
        println!("{}", palette.dim(&format!("{shown} result(s)")));
    }
}

pub fn print_alerts(alerts: &[UserAlert]) {
    let palette = Palette::auto();
    println!("{}", palette.heading("Alerts"));
    if alerts.is_empty() {
        println!("{}", palette.dim("no alerts"));
        return;
    }
    for alert in alerts {
        let marker = if alert.is_read {
            palette.dim("·")
        } else {
            palette.paint("1;33", "●")
        };
        println!(
            "{} {} {} {}",
            marker,
            palette.id(&alert.id),
            alert.message,
            palette.dim(&format!("({} · {})", alert.alert_type.label(), alert.date))
        );
    }
}

pub fn print_due(report: &DueReport, within_days: u32) {
    let palette = Palette::auto();
    println!(
        "{}",
        palette.heading(&format!("Due within {within_days} day(s)"))
    );
    if report.is_empty() {
        println!("{}", palette.dim("nothing due"));
        return;
    }
    for due in &report.tasks {
        println!(
            "{}{} {} {}",
            indentation_prefix(due.depth, &palette),
            palette.id(&due.task.id),
            due.task.description,
            palette.dim(&format!(
                "({} · due {})",
                due.project_name,
                due.task.due_date.as_deref().unwrap_or("?")
            ))
        );
    }
    for chore in &report.chores {
        println!(
            "{} {} {}",
            palette.id(&chore.id),
            chore.name,
            palette.dim(&format!("({} · next due {})", chore.cadence_label(), chore.next_due))
        );
    }
}

pub fn print_load_report(report: &LoadReport) {
    let palette = Palette::auto();
    let attempted = report.loaded.len() + report.failed.len();
    println!(
        "{}",
        palette.heading(&format!(
            "Loaded {} of {attempted} families",
            report.loaded.len()
        ))
    );
    for failed in &report.failed {
        println!(
            "  {} {}",
            palette.paint("31", failed.family.label()),
            palette.dim(&failed.error)
        );
    }
}

pub fn print_notices(notices: &[Notice]) {
    let palette = Palette::auto();
    for notice in notices {
        eprintln!("{}", palette.paint("33", &notice.message));
    }
}

fn filter_summary(filter: &ProjectListFilter) -> Option<String> {
    let mut parts = Vec::new();
    if filter.include_archived {
        parts.push("all=true".to_string());
    }
    if let Some(status) = filter.my_status {
        parts.push(format!("status={status}"));
    }
    if let Some(chain) = filter.chain.as_deref().and_then(non_empty) {
        parts.push(format!("chain={chain}"));
    }
    if !filter.tags.is_empty() {
        let tags = filter
            .tags
            .iter()
            .filter_map(|tag| non_empty(tag))
            .collect::<Vec<_>>();
        if !tags.is_empty() {
            parts.push(format!("tags={}", tags.join(",")));
        }
    }
    if let Some(query) = filter.query.as_deref().and_then(non_empty) {
        parts.push(format!("query={query}"));
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

fn non_empty(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

struct Palette {
    enabled: bool,
}

impl Palette {
    fn auto() -> Self {
        let enabled = std::env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal();
        Self { enabled }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.enabled {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    fn heading(&self, text: &str) -> String {
        self.paint("1;36", text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint("2", text)
    }

    fn id(&self, text: &str) -> String {
        self.paint("1;94", text)
    }

    fn status(&self, status: MyStatus) -> String {
        let upper = status.label().to_ascii_uppercase();
        self.paint(status_color_code(status), &format!("[{upper}]"))
    }

    fn tags(&self, text: &str) -> String {
        self.paint("90", text)
    }
}

fn status_color_code(status: MyStatus) -> &'static str {
    match status {
        MyStatus::NotStarted => "34",
        MyStatus::InProgress => "33",
        MyStatus::Completed => "32",
        MyStatus::Abandoned => "31",
    }
}
