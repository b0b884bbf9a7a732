use std::error::Error;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use time::{Duration, OffsetDateTime};
use tracing::warn;

use crate::cache::{CacheError, LocalCache};
use crate::config::{Config, ConfigError};
use crate::coordinator::{Coordinator, LoadReport, Notice};
use crate::domain::{now_utc_rfc3339, NewTask, Project, RecurringTask, Task, UserAlert};
use crate::gateway::{Credentials, Gateway, GatewayError, HttpGateway};
use crate::listing::{self, ProjectListFilter};
use crate::progress::{self, TaskProgress};
use crate::search::{self, SearchFacets, SearchResults};
use crate::store::StoreError;

pub struct App {
    coordinator: Coordinator,
    cache: LocalCache,
    credentials: Arc<Credentials>,
    max_results: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProjectProgress {
    pub project: Project,
    pub progress: TaskProgress,
    pub percent: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DueTask {
    pub project_id: String,
    pub project_name: String,
    pub depth: usize,
    pub task: Task,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct DueReport {
    pub tasks: Vec<DueTask>,
    pub chores: Vec<RecurringTask>,
}

impl DueReport {
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty() && self.chores.is_empty()
    }
}

impl App {
    pub fn open(config: &Config) -> Result<Self, AppError> {
        let cache = LocalCache::open(&config.cache_path)?;
        let session = cache.session()?;
        let credentials = Arc::new(Credentials::new(session.token));
        let gateway = HttpGateway::new(&config.base_url, config.timeout, Arc::clone(&credentials))?;
        Self::with_gateway(cache, Arc::new(gateway), credentials, config.max_results)
    }

    pub(crate) fn with_gateway(
        cache: LocalCache,
        gateway: Arc<dyn Gateway>,
        credentials: Arc<Credentials>,
        max_results: usize,
    ) -> Result<Self, AppError> {
        let coordinator = Coordinator::new(gateway);
        coordinator.restore(&cache)?;
        Ok(Self {
            coordinator,
            cache,
            credentials,
            max_results,
        })
    }

    pub fn is_signed_in(&self) -> bool {
        self.coordinator.is_authenticated() && self.credentials.is_present()
    }

    pub fn take_notices(&self) -> Vec<Notice> {
        self.coordinator.take_notices()
    }

    /// Stores the token and runs the full load of a fresh sign-in.
    pub async fn login(&self, token: &str) -> Result<LoadReport, AppError> {
        if token.trim().is_empty() {
            return Err(AppError::InvalidArgument("token cannot be empty".to_string()));
        }
        self.credentials.set(token);
        self.cache.set_token(self.credentials.token().as_deref())?;
        self.coordinator.sign_out();
        let report = self
            .coordinator
            .set_authenticated(true)
            .await
            .unwrap_or_default();
        self.after_load(&report)?;
        Ok(report)
    }

    pub fn logout(&self) -> Result<(), AppError> {
        self.credentials.revoke();
        self.credentials.take_revoked();
        self.coordinator.clear_all();
        self.cache.clear()?;
        Ok(())
    }

    pub async fn sync(&self) -> Result<LoadReport, AppError> {
        self.require_session()?;
        let report = self.coordinator.reload().await;
        self.after_load(&report)?;
        Ok(report)
    }

    pub fn search(&self, query: &str, facets: &SearchFacets) -> SearchResults {
        search::search_with_limit(&self.coordinator.snapshot(), query, facets, self.max_results)
    }

    pub fn projects(&self, filter: &ProjectListFilter) -> Vec<Project> {
        listing::apply_filters(self.coordinator.projects.items(), filter)
    }

    pub fn project_progress(&self, reference: &str) -> Result<ProjectProgress, AppError> {
        let project = self.resolve_project(reference)?;
        let progress = progress::progress(&project.tasks);
        Ok(ProjectProgress {
            percent: progress.rounded_percent(),
            progress,
            project,
        })
    }

    pub async fn set_tasks_done(
        &self,
        reference: &str,
        task_ids: &[String],
        done: bool,
    ) -> Result<Project, AppError> {
        self.require_session()?;
        let project = self.resolve_project(reference)?;
        for task_id in task_ids {
            if progress::find_task(&project.tasks, task_id).is_none() {
                return Err(AppError::NotFound {
                    kind: "task",
                    reference: task_id.clone(),
                });
            }
        }
        let now = now_utc_rfc3339();
        let result = self
            .coordinator
            .projects
            .set_tasks_completed(&project.id, task_ids, done, &now)
            .await;
        self.settle(result)
    }

    pub async fn add_task(
        &self,
        reference: &str,
        description: &str,
        parent_task_id: Option<&str>,
        due_date: Option<String>,
    ) -> Result<Project, AppError> {
        self.require_session()?;
        let project = self.resolve_project(reference)?;
        if let Some(parent) = parent_task_id {
            if progress::find_task(&project.tasks, parent).is_none() {
                return Err(AppError::NotFound {
                    kind: "task",
                    reference: parent.to_string(),
                });
            }
        }
        if let Some(due) = due_date.as_deref() {
            if progress::parse_due(due).is_none() {
                return Err(AppError::InvalidArgument(format!(
                    "due date '{due}' must be YYYY-MM-DD or RFC3339"
                )));
            }
        }
        let task = NewTask {
            description: description.trim().to_string(),
            due_date,
            ..NewTask::default()
        };
        let result = self
            .coordinator
            .projects
            .add_task(&project.id, parent_task_id, task)
            .await;
        self.settle(result)
    }

    pub async fn add_note(&self, references: &[String], text: &str) -> Result<Vec<Project>, AppError> {
        self.require_session()?;
        let ids = references
            .iter()
            .map(|reference| self.resolve_project(reference).map(|project| project.id))
            .collect::<Result<Vec<_>, _>>()?;
        let result = self.coordinator.projects.batch_add_notes(&ids, text).await;
        self.settle(result)
    }

    pub async fn promote(&self, watchlist_id: &str) -> Result<Project, AppError> {
        self.require_session()?;
        let result = self.coordinator.promote_watchlist_item(watchlist_id).await;
        self.settle(result)
    }

    pub fn alerts(&self, unread_only: bool) -> Vec<UserAlert> {
        self.coordinator
            .alerts
            .items()
            .into_iter()
            .filter(|alert| !unread_only || !alert.is_read)
            .collect()
    }

    pub async fn mark_alert_read(&self, id: &str) -> Result<UserAlert, AppError> {
        self.require_session()?;
        let result = self.coordinator.alerts.mark_read(id).await;
        self.settle(result)
    }

    pub async fn mark_all_alerts_read(&self) -> Result<usize, AppError> {
        self.require_session()?;
        let result = self.coordinator.alerts.mark_all_read().await;
        self.settle(result)
    }

    pub async fn complete_chore(&self, id: &str) -> Result<RecurringTask, AppError> {
        self.require_session()?;
        let result = self.coordinator.recurring.complete(id).await;
        self.settle(result)
    }

    /// Open tasks of active projects and chores due within `within_days` of `now`.
    pub fn due(&self, within_days: u32, now: OffsetDateTime) -> DueReport {
        let cutoff = now + Duration::days(i64::from(within_days));
        let mut report = DueReport::default();
        for project in self.coordinator.projects.items() {
            if project.is_archived {
                continue;
            }
            for visit in progress::due_tasks(&project.tasks, cutoff) {
                report.tasks.push(DueTask {
                    project_id: project.id.clone(),
                    project_name: project.name.clone(),
                    depth: visit.depth,
                    task: visit.task.clone(),
                });
            }
        }
        report.chores = self
            .coordinator
            .recurring
            .items()
            .into_iter()
            .filter(|chore| chore.is_due(cutoff))
            .collect();
        report
    }

    fn require_session(&self) -> Result<(), AppError> {
        if self.is_signed_in() {
            Ok(())
        } else {
            Err(AppError::NotSignedIn)
        }
    }

    /// Matches an id first, then a case-insensitive project name.
    fn resolve_project(&self, reference: &str) -> Result<Project, AppError> {
        let reference = reference.trim();
        if let Some(project) = self.coordinator.projects.get(reference) {
            return Ok(project);
        }
        let mut named = self
            .coordinator
            .projects
            .items()
            .into_iter()
            .filter(|project| project.name.trim().eq_ignore_ascii_case(reference));
        match (named.next(), named.next()) {
            (Some(project), None) => Ok(project),
            (Some(_), Some(_)) => Err(AppError::InvalidArgument(format!(
                "more than one project is named '{reference}'; use its id"
            ))),
            (None, _) => Err(AppError::NotFound {
                kind: "project",
                reference: reference.to_string(),
            }),
        }
    }

    fn after_load(&self, report: &LoadReport) -> Result<(), AppError> {
        if report.session_expired || self.credentials.take_revoked() {
            self.forget_session()?;
            return Err(AppError::SessionExpired);
        }
        self.coordinator.persist(&self.cache)?;
        if report.is_complete() {
            self.cache.mark_synced()?;
        }
        Ok(())
    }

    /// Persists after a successful mutation. An expired session clears the
    /// stored token instead.
    fn settle<T>(&self, result: Result<T, StoreError>) -> Result<T, AppError> {
        let revoked = self.credentials.take_revoked();
        match result {
            Ok(value) => {
                self.coordinator.persist(&self.cache)?;
                Ok(value)
            }
            Err(err) if revoked || err.is_session_expired() => {
                self.forget_session()?;
                Err(AppError::SessionExpired)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn forget_session(&self) -> Result<(), AppError> {
        warn!("session expired; clearing stored credential");
        self.credentials.revoke();
        self.credentials.take_revoked();
        self.coordinator.sign_out();
        self.cache.set_token(None)?;
        self.coordinator.persist(&self.cache)?;
        Ok(())
    }
}

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Cache(CacheError),
    Gateway(GatewayError),
    Store(StoreError),
    Io(std::io::Error),
    InvalidArgument(String),
    NotFound {
        kind: &'static str,
        reference: String,
    },
    NotSignedIn,
    SessionExpired,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "{}", err),
            AppError::Cache(err) => write!(f, "{}", err),
            AppError::Gateway(err) => write!(f, "{}", err),
            AppError::Store(err) => write!(f, "{}", err),
            AppError::Io(err) => write!(f, "I/O error: {}", err),
            AppError::InvalidArgument(message) => write!(f, "{}", message),
            AppError::NotFound { kind, reference } => write!(
                f,
                "no {} matches '{}' locally; run `dropfarm sync` to refresh",
                kind, reference
            ),
            AppError::NotSignedIn => write!(f, "not signed in; run `dropfarm login --token <token>`"),
            AppError::SessionExpired => write!(f, "{}", GatewayError::SessionExpired),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Cache(err) => Some(err),
            AppError::Gateway(err) => Some(err),
            AppError::Store(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::InvalidArgument(_) => None,
            AppError::NotFound { .. } => None,
            AppError::NotSignedIn => None,
            AppError::SessionExpired => None,
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        AppError::Config(value)
    }
}

impl From<CacheError> for AppError {
    fn from(value: CacheError) -> Self {
        AppError::Cache(value)
    }
}

impl From<GatewayError> for AppError {
    fn from(value: GatewayError) -> Self {
        AppError::Gateway(value)
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        AppError::Store(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        AppError::Io(value)
    }
}
