use std::error::Error;
use std::fmt;

use async_trait::async_trait;

use crate::domain::{
    Editable, Entity, LearningResource, NewGasLog, NewTask, NewTransaction, Position, Project,
    RecurringTask, SavedStrategy, Settings, SettingsPatch, StrategyNote, TaskPatch, Template,
    UserAlert, Wallet, WatchlistItem,
};

pub mod http;
#[cfg(test)]
pub mod memory;
pub mod session;

pub use http::HttpGateway;
pub use session::Credentials;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    Remote { status: u16, message: String },
    Network(String),
    Encode(String),
    Decode(String),
    SessionExpired,
}

impl GatewayError {
    pub fn is_session_expired(&self) -> bool {
        matches!(self, GatewayError::SessionExpired)
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::Remote { message, .. } => write!(f, "{}", message),
            GatewayError::Network(message) => write!(f, "network error: {}", message),
            GatewayError::Encode(message) => write!(f, "could not encode request: {}", message),
            GatewayError::Decode(message) => write!(f, "unexpected server response: {}", message),
            GatewayError::SessionExpired => {
                write!(f, "session expired; run `dropfarm login` to sign in again")
            }
        }
    }
}

impl Error for GatewayError {}

#[async_trait]
pub trait Fetch<E: Entity>: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<E>, GatewayError>;
}

/// Write half of a family's remote. Every call answers with the
/// server-confirmed record, never an echo of the request.
#[async_trait]
pub trait Remote<E: Editable>: Fetch<E> {
    async fn create(&self, draft: &E::Draft) -> Result<E, GatewayError>;
    async fn update(&self, id: &str, patch: &E::Patch) -> Result<E, GatewayError>;
    async fn delete(&self, id: &str) -> Result<(), GatewayError>;
    async fn batch_update(&self, ids: &[String], patch: &E::Patch)
        -> Result<Vec<E>, GatewayError>;
}

#[async_trait]
pub trait ProjectRemote: Remote<Project> {
    async fn add_task(
        &self,
        project_id: &str,
        parent_task_id: Option<&str>,
        task: &NewTask,
    ) -> Result<Project, GatewayError>;
    async fn update_task(
        &self,
        project_id: &str,
        task_id: &str,
        patch: &TaskPatch,
    ) -> Result<Project, GatewayError>;
    async fn delete_task(&self, project_id: &str, task_id: &str) -> Result<Project, GatewayError>;
    async fn update_tasks(
        &self,
        project_id: &str,
        task_ids: &[String],
        patch: &TaskPatch,
    ) -> Result<Project, GatewayError>;
    async fn batch_add_notes(
        &self,
        project_ids: &[String],
        note: &str,
    ) -> Result<Vec<Project>, GatewayError>;
}

#[async_trait]
pub trait WalletRemote: Remote<Wallet> {
    async fn add_transaction(
        &self,
        wallet_id: &str,
        transaction: &NewTransaction,
    ) -> Result<Wallet, GatewayError>;
    async fn delete_transaction(
        &self,
        wallet_id: &str,
        transaction_id: &str,
    ) -> Result<Wallet, GatewayError>;
    async fn add_gas_log(&self, wallet_id: &str, log: &NewGasLog) -> Result<Wallet, GatewayError>;
    async fn delete_gas_log(&self, wallet_id: &str, log_id: &str)
        -> Result<Wallet, GatewayError>;
}

#[async_trait]
pub trait RecurringRemote: Remote<RecurringTask> {
    async fn complete(&self, id: &str) -> Result<RecurringTask, GatewayError>;
}

#[async_trait]
pub trait AlertRemote: Remote<UserAlert> {
    async fn mark_read(&self, id: &str) -> Result<UserAlert, GatewayError>;
    async fn mark_all_read(&self) -> Result<Vec<UserAlert>, GatewayError>;
}

#[async_trait]
pub trait WatchlistRemote: Remote<WatchlistItem> {
    /// Creates the project on the server and retires the watchlist item there.
    async fn promote(&self, id: &str) -> Result<Project, GatewayError>;
}

#[async_trait]
pub trait SettingsRemote: Send + Sync {
    async fn fetch_settings(&self) -> Result<Settings, GatewayError>;
    async fn update_settings(&self, patch: &SettingsPatch) -> Result<Settings, GatewayError>;
}

pub trait LearningRemote: Fetch<LearningResource> {}

impl<T: Fetch<LearningResource>> LearningRemote for T {}

/// Everything the coordinator needs from one backend.
pub trait Gateway:
    ProjectRemote
    + WalletRemote
    + RecurringRemote
    + AlertRemote
    + WatchlistRemote
    + SettingsRemote
    + LearningRemote
    + Remote<StrategyNote>
    + Remote<Template>
    + Remote<Position>
    + Remote<SavedStrategy>
{
}

impl<T> Gateway for T where
    T: ProjectRemote
        + WalletRemote
        + RecurringRemote
        + AlertRemote
        + WatchlistRemote
        + SettingsRemote
        + LearningRemote
        + Remote<StrategyNote>
        + Remote<Template>
        + Remote<Position>
        + Remote<SavedStrategy>
{
}
