use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::domain::{
    LearningResource, MyStatus, ParseEnumError, Project, RecurringTask, ResourceKind,
    StrategyNote, UserAlert, Wallet, WatchlistItem,
};
use crate::progress;

mod fields;
mod tokenize;

pub use tokenize::tokenize;

pub const DEFAULT_MAX_RESULTS: usize = 50;
const PARENT_LABEL_CHARS: usize = 32;
const SNIPPET_CHARS: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    Project,
    Task,
    Wallet,
    Recurring,
    Watchlist,
    Note,
    Guide,
    Glossary,
    News,
    Alert,
}

impl ResultKind {
    /// Fixed group order of a result list.
    pub const PRIORITY: [ResultKind; 10] = [
        ResultKind::Project,
        ResultKind::Task,
        ResultKind::Wallet,
        ResultKind::Recurring,
        ResultKind::Watchlist,
        ResultKind::Note,
        ResultKind::Guide,
        ResultKind::Glossary,
        ResultKind::News,
        ResultKind::Alert,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResultKind::Project => "project",
            ResultKind::Task => "task",
            ResultKind::Wallet => "wallet",
            ResultKind::Recurring => "recurring",
            ResultKind::Watchlist => "watchlist",
            ResultKind::Note => "note",
            ResultKind::Guide => "guide",
            ResultKind::Glossary => "glossary",
            ResultKind::News => "news",
            ResultKind::Alert => "alert",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ResultKind::Project => "Projects",
            ResultKind::Task => "Tasks",
            ResultKind::Wallet => "Wallets",
            ResultKind::Recurring => "Recurring tasks",
            ResultKind::Watchlist => "Watchlist",
            ResultKind::Note => "Strategy notes",
            ResultKind::Guide => "Guides",
            ResultKind::Glossary => "Glossary",
            ResultKind::News => "News",
            ResultKind::Alert => "Alerts",
        }
    }

    /// Only project and task results carry a personal status.
    pub fn carries_status(self) -> bool {
        match self {
            ResultKind::Project | ResultKind::Task => true,
            ResultKind::Wallet
            | ResultKind::Recurring
            | ResultKind::Watchlist
            | ResultKind::Note
            | ResultKind::Guide
            | ResultKind::Glossary
            | ResultKind::News
            | ResultKind::Alert => false,
        }
    }

    fn for_resource(kind: ResourceKind) -> Self {
        match kind {
            ResourceKind::Guide => ResultKind::Guide,
            ResourceKind::Glossary => ResultKind::Glossary,
            ResourceKind::NewsSummary => ResultKind::News,
        }
    }
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResultKind {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        let singular = normalized.strip_suffix('s').unwrap_or(&normalized);
        ResultKind::PRIORITY
            .into_iter()
            .find(|kind| kind.as_str() == normalized || kind.as_str() == singular)
            .ok_or_else(|| {
                ParseEnumError::new(
                    "result type",
                    value,
                    ResultKind::PRIORITY.map(ResultKind::as_str).to_vec(),
                )
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub id: String,
    pub kind: ResultKind,
    pub title: String,
    pub description: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<MyStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultGroup {
    pub kind: ResultKind,
    pub label: &'static str,
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SearchResults {
    pub groups: Vec<ResultGroup>,
    /// Matches after faceting, before the cap.
    pub total_matches: usize,
    pub truncated: bool,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(|group| group.results.len()).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SearchResult> {
        self.groups.iter().flat_map(|group| group.results.iter())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFacets {
    types: BTreeSet<ResultKind>,
    status: Option<MyStatus>,
}

impl SearchFacets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_types(types: impl IntoIterator<Item = ResultKind>) -> Self {
        Self {
            types: types.into_iter().collect(),
            status: None,
        }
    }

    pub fn types(&self) -> &BTreeSet<ResultKind> {
        &self.types
    }

    pub fn status(&self) -> Option<MyStatus> {
        self.status
    }

    /// Flips one type facet. Dropping the last of project and task also drops
    /// the status facet.
    pub fn toggle_type(&mut self, kind: ResultKind) {
        let removed = self.types.remove(&kind);
        if !removed {
            self.types.insert(kind);
        }
        if removed && kind.carries_status() && !self.status_applies() {
            self.status = None;
        }
    }

    pub fn set_status(&mut self, status: Option<MyStatus>) {
        self.status = status;
    }

    pub fn status_applies(&self) -> bool {
        self.types.iter().any(|kind| kind.carries_status())
    }

    pub fn admits(&self, result: &SearchResult) -> bool {
        if !self.types.is_empty() && !self.types.contains(&result.kind) {
            return false;
        }
        match self.status {
            Some(status) if self.status_applies() && result.kind.carries_status() => {
                result.status == Some(status)
            }
            _ => true,
        }
    }
}

/// Owned copy of every searchable collection, taken from the stores.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    pub projects: Vec<Project>,
    pub wallets: Vec<Wallet>,
    pub recurring: Vec<RecurringTask>,
    pub watchlist: Vec<WatchlistItem>,
    pub notes: Vec<StrategyNote>,
    pub learning: Vec<LearningResource>,
    pub alerts: Vec<UserAlert>,
}

pub fn search(snapshot: &CatalogSnapshot, query: &str, facets: &SearchFacets) -> SearchResults {
    search_with_limit(snapshot, query, facets, DEFAULT_MAX_RESULTS)
}

pub fn search_with_limit(
    snapshot: &CatalogSnapshot,
    query: &str,
    facets: &SearchFacets,
    limit: usize,
) -> SearchResults {
    let tokens = tokenize(query);
    if tokens.is_empty() {
        return SearchResults::default();
    }

    let mut kept = Vec::new();
    let mut total_matches = 0;
    for_each_candidate(snapshot, &tokens, |result| {
        if facets.admits(&result) {
            total_matches += 1;
            if kept.len() < limit {
                kept.push(result);
            }
        }
    });

    SearchResults {
        groups: group(kept),
        total_matches,
        truncated: total_matches > limit,
    }
}

fn group(results: Vec<SearchResult>) -> Vec<ResultGroup> {
    ResultKind::PRIORITY
        .into_iter()
        .filter_map(|kind| {
            let members: Vec<SearchResult> = results
                .iter()
                .filter(|result| result.kind == kind)
                .cloned()
                .collect();
            (!members.is_empty()).then(|| ResultGroup {
                kind,
                label: kind.label(),
                results: members,
            })
        })
        .collect()
}

/// Visits matches in canonical order: each project followed by its tasks in
/// walk order, then wallets, chores, watchlist, notes, learning and alerts.
fn for_each_candidate(
    snapshot: &CatalogSnapshot,
    tokens: &[String],
    mut emit: impl FnMut(SearchResult),
) {
    for project in &snapshot.projects {
        if fields::project(project).matches(tokens) {
            emit(project_result(project));
        }
        for visit in progress::walk(&project.tasks) {
            if fields::task(visit.task).matches(tokens) {
                emit(SearchResult {
                    id: visit.task.id.clone(),
                    kind: ResultKind::Task,
                    title: visit.task.description.clone(),
                    description: project.name.clone(),
                    path: format!("/projects/{}?task={}", project.id, visit.task.id),
                    status: Some(project.my_status),
                    project_id: Some(project.id.clone()),
                    parent_label: visit
                        .parent
                        .map(|parent| fields::truncate_label(&parent.description, PARENT_LABEL_CHARS)),
                });
            }
        }
    }
    for wallet in &snapshot.wallets {
        if fields::wallet(wallet).matches(tokens) {
            emit(plain(
                ResultKind::Wallet,
                &wallet.id,
                &wallet.name,
                format!("{} · {}", wallet.chain, wallet.short_address()),
                format!("/wallets/{}", wallet.id),
            ));
        }
    }
    for chore in &snapshot.recurring {
        if fields::recurring(chore).matches(tokens) {
            emit(plain(
                ResultKind::Recurring,
                &chore.id,
                &chore.name,
                format!("{} · next due {}", chore.cadence_label(), chore.next_due),
                format!("/recurring/{}", chore.id),
            ));
        }
    }
    for item in &snapshot.watchlist {
        if fields::watchlist(item).matches(tokens) {
            emit(plain(
                ResultKind::Watchlist,
                &item.id,
                &item.name,
                format!("{} · {} confidence", item.chain, item.confidence),
                format!("/watchlist/{}", item.id),
            ));
        }
    }
    for note in &snapshot.notes {
        if fields::note(note).matches(tokens) {
            emit(plain(
                ResultKind::Note,
                &note.id,
                &note.title,
                fields::truncate_label(&note.content, SNIPPET_CHARS),
                format!("/notes/{}", note.id),
            ));
        }
    }
    for resource in &snapshot.learning {
        if fields::learning(resource).matches(tokens) {
            let kind = ResultKind::for_resource(resource.kind);
            let description = resource
                .category
                .clone()
                .unwrap_or_else(|| kind.label().to_string());
            emit(plain(
                kind,
                &resource.id,
                &resource.title,
                description,
                format!("/learning/{}", resource.id),
            ));
        }
    }
    for alert in &snapshot.alerts {
        if fields::alert(alert).matches(tokens) {
            emit(plain(
                ResultKind::Alert,
                &alert.id,
                &alert.message,
                format!("{} · {}", alert.alert_type.label(), alert.date),
                "/alerts".to_string(),
            ));
        }
    }
}

fn project_result(project: &Project) -> SearchResult {
    SearchResult {
        id: project.id.clone(),
        kind: ResultKind::Project,
        title: project.name.clone(),
        description: format!("{} · {}", project.chain, project.status),
        path: format!("/projects/{}", project.id),
        status: Some(project.my_status),
        project_id: None,
        parent_label: None,
    }
}

fn plain(kind: ResultKind, id: &str, title: &str, description: String, path: String) -> SearchResult {
    SearchResult {
        id: id.to_string(),
        kind,
        title: title.to_string(),
        description,
        path,
        status: None,
        project_id: None,
        parent_label: None,
    }
}
