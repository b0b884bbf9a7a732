use std::error::Error;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::Mutex;
use tracing::warn;

use crate::domain::{
    Editable, Entity, Family, LearningResource, Position, Project, RecurringTask, SavedStrategy,
    StrategyNote, Template, UserAlert, Wallet, WatchlistItem,
};
use crate::gateway::{Fetch, GatewayError, Remote};

mod families;
mod merge;
mod settings;

pub use settings::SettingsStore;

/// `items` holds the family's collection, or the singleton for settings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StoreState<T> {
    pub items: T,
    pub is_loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    Gateway(GatewayError),
    InvalidInput(String),
    IncompleteBatch { family: Family, missing: Vec<String> },
    NotFound { family: Family, id: String },
}

impl StoreError {
    pub fn is_session_expired(&self) -> bool {
        matches!(self, StoreError::Gateway(err) if err.is_session_expired())
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Gateway(err) => write!(f, "{}", err),
            StoreError::InvalidInput(message) => write!(f, "{}", message),
            StoreError::IncompleteBatch { family, missing } => write!(
                f,
                "server response for {} omitted {}; nothing was changed",
                family.label(),
                missing.join(", ")
            ),
            StoreError::NotFound { family, id } => {
                write!(f, "{} '{}' is not in the local store", family.label(), id)
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StoreError::Gateway(err) => Some(err),
            StoreError::InvalidInput(_) => None,
            StoreError::IncompleteBatch { .. } => None,
            StoreError::NotFound { .. } => None,
        }
    }
}

impl From<GatewayError> for StoreError {
    fn from(value: GatewayError) -> Self {
        StoreError::Gateway(value)
    }
}

/// State cell shared by every store. Reads never wait on the network; writes
/// queue behind `turn` so same-store operations apply in call order.
pub(crate) struct Synced<T> {
    family: Family,
    state: RwLock<StoreState<T>>,
    turn: Mutex<()>,
}

impl<T: Clone> Synced<T> {
    pub(crate) fn new(family: Family, items: T) -> Self {
        Self {
            family,
            state: RwLock::new(StoreState {
                items,
                is_loading: false,
                error: None,
            }),
            turn: Mutex::new(()),
        }
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, StoreState<T>> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState<T>> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn snapshot(&self) -> StoreState<T> {
        self.read().clone()
    }

    pub(crate) fn replace(&self, items: T) {
        let mut state = self.write();
        state.items = items;
        state.error = None;
    }

    /// Records a validation failure without a remote call. An operation
    /// already holding the turn keeps the store marked as loading.
    pub(crate) fn reject<R>(&self, operation: &'static str, err: StoreError) -> Result<R, StoreError> {
        let idle = self.turn.try_lock().is_ok();
        let mut state = self.write();
        if idle {
            state.is_loading = false;
        }
        state.error = Some(err.to_string());
        warn!(family = %self.family, operation, error = %err, "store operation rejected");
        Err(err)
    }

    /// Runs one remote call under the store's turn. `merge` builds the next
    /// collection from the current one; nothing is committed unless both the
    /// call and the merge succeed.
    pub(crate) async fn run<V, R, F>(
        &self,
        operation: &'static str,
        call: F,
        merge: impl FnOnce(&T, V) -> Result<(T, R), StoreError>,
    ) -> Result<R, StoreError>
    where
        F: Future<Output = Result<V, GatewayError>>,
    {
        let _turn = self.turn.lock().await;
        {
            let mut state = self.write();
            state.is_loading = true;
            state.error = None;
        }

        let outcome = call.await;

        let mut state = self.write();
        state.is_loading = false;
        let merged = match outcome {
            Ok(value) => merge(&state.items, value),
            Err(err) => Err(StoreError::from(err)),
        };
        match merged {
            Ok((next, result)) => {
                state.items = next;
                Ok(result)
            }
            Err(err) => {
                state.error = Some(err.to_string());
                warn!(family = %self.family, operation, error = %err, "store operation failed");
                Err(err)
            }
        }
    }
}

/// Local mirror of one remote family.
pub struct EntityStore<E, R: ?Sized> {
    remote: Arc<R>,
    cell: Synced<Vec<E>>,
}

impl<E: Entity, R: ?Sized> EntityStore<E, R> {
    pub fn new(remote: Arc<R>) -> Self {
        Self {
            remote,
            cell: Synced::new(E::FAMILY, Vec::new()),
        }
    }

    pub fn family(&self) -> Family {
        E::FAMILY
    }

    pub fn state(&self) -> StoreState<Vec<E>> {
        self.cell.snapshot()
    }

    pub fn items(&self) -> Vec<E> {
        self.cell.read().items.clone()
    }

    pub fn get(&self, id: &str) -> Option<E> {
        self.cell
            .read()
            .items
            .iter()
            .find(|item| item.id() == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.cell.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_loading(&self) -> bool {
        self.cell.read().is_loading
    }

    pub fn error(&self) -> Option<String> {
        self.cell.read().error.clone()
    }

    /// Warm start from the local cache. Duplicate ids collapse to one record.
    pub fn restore(&self, items: Vec<E>) {
        self.cell.replace(merge::dedupe(items));
    }

    pub fn clear(&self) {
        self.cell.replace(Vec::new());
    }

    /// Inserts a record the server already confirmed through another family.
    pub(crate) fn adopt(&self, entity: E) {
        let next = merge::upsert(&self.cell.read().items, entity);
        self.cell.replace(next);
    }

    pub(crate) async fn replace_one<F>(&self, operation: &'static str, call: F) -> Result<E, StoreError>
    where
        F: Future<Output = Result<E, GatewayError>>,
    {
        self.cell
            .run(operation, call, |items, entity: E| {
                Ok((merge::upsert(items, entity.clone()), entity))
            })
            .await
    }

    pub(crate) async fn replace_many<F>(
        &self,
        operation: &'static str,
        targets: &[String],
        call: F,
    ) -> Result<Vec<E>, StoreError>
    where
        F: Future<Output = Result<Vec<E>, GatewayError>>,
    {
        self.cell
            .run(operation, call, |items, updated: Vec<E>| {
                let next = merge::replace_many(items, &updated, targets)?;
                Ok((next, updated))
            })
            .await
    }
}

impl<E: Entity, R: Fetch<E> + ?Sized> EntityStore<E, R> {
    /// Replaces the whole collection with the server's. Returns the record count.
    pub async fn load(&self) -> Result<usize, StoreError> {
        self.cell
            .run("load", self.remote.fetch_all(), |_, fetched: Vec<E>| {
                let items = merge::dedupe(fetched);
                let count = items.len();
                Ok((items, count))
            })
            .await
    }
}

impl<E: Editable, R: Remote<E> + ?Sized> EntityStore<E, R> {
    pub async fn create(&self, draft: E::Draft) -> Result<E, StoreError> {
        if let Err(message) = E::validate_draft(&draft) {
            return self.cell.reject("create", StoreError::InvalidInput(message));
        }
        self.replace_one("create", self.remote.create(&draft)).await
    }

    /// Replaces the local record with the server's answer. A record missing
    /// locally is inserted.
    pub async fn update(&self, id: &str, patch: E::Patch) -> Result<E, StoreError> {
        if id.trim().is_empty() {
            return self
                .cell
                .reject("update", StoreError::InvalidInput("an id is required".to_string()));
        }
        self.replace_one("update", self.remote.update(id, &patch))
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        if id.trim().is_empty() {
            return self
                .cell
                .reject("delete", StoreError::InvalidInput("an id is required".to_string()));
        }
        self.cell
            .run("delete", self.remote.delete(id), |items, ()| {
                Ok((merge::remove(items, id), ()))
            })
            .await
    }

    /// Applies one patch to every id. Commits only if the server answers for
    /// all of them.
    pub async fn batch_update(&self, ids: &[String], patch: E::Patch) -> Result<Vec<E>, StoreError> {
        let targets = merge::unique_ids(ids);
        if targets.is_empty() {
            return Ok(Vec::new());
        }
        self.replace_many(
            "batch_update",
            &targets,
            self.remote.batch_update(&targets, &patch),
        )
        .await
    }
}

pub type ProjectStore<R> = EntityStore<Project, R>;
pub type WalletStore<R> = EntityStore<Wallet, R>;
pub type RecurringStore<R> = EntityStore<RecurringTask, R>;
pub type NoteStore<R> = EntityStore<StrategyNote, R>;
pub type AlertStore<R> = EntityStore<UserAlert, R>;
pub type WatchlistStore<R> = EntityStore<WatchlistItem, R>;
pub type TemplateStore<R> = EntityStore<Template, R>;
pub type PositionStore<R> = EntityStore<Position, R>;
pub type StrategyStore<R> = EntityStore<SavedStrategy, R>;
pub type LearningStore<R> = EntityStore<LearningResource, R>;
