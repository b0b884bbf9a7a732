//! Scripted in-process backend for store and coordinator tests.
//!
//! Records are kept as JSON so every family shares one code path. Failures,
//! latency, truncated batch answers and session expiry can be injected per
//! family to exercise the store protocol.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use super::{
    AlertRemote, Fetch, GatewayError, ProjectRemote, RecurringRemote, Remote, SettingsRemote,
    WalletRemote, WatchlistRemote,
};
use crate::domain::{
    now_utc_rfc3339, Cadence, Completion, Confidence, Editable, Entity, Family, GasLog, MyStatus,
    NewGasLog, NewTask, NewTransaction, Priority, Project, ProjectStatus, RecurringTask, Settings,
    SettingsPatch, Task, TaskPatch, UserAlert, Wallet, WalletTransaction, WatchlistItem,
};

#[derive(Default)]
struct Backend {
    records: HashMap<Family, Vec<Value>>,
    settings: Option<Value>,
    failing: HashMap<Family, String>,
    fail_once: HashMap<Family, String>,
    delays: HashMap<Family, VecDeque<Duration>>,
    truncate_batches: bool,
    expired: bool,
    calls: Vec<String>,
    next_id: u64,
}

impl Backend {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn records(&mut self, family: Family) -> &mut Vec<Value> {
        self.records.entry(family).or_default()
    }
}

#[derive(Default)]
pub struct MemoryGateway {
    backend: Mutex<Backend>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Backend> {
        self.backend.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn seed<E: Entity>(&self, items: &[E]) {
        let values = items
            .iter()
            .map(|item| serde_json::to_value(item).expect("seed record should serialize"))
            .collect();
        self.lock().records.insert(E::FAMILY, values);
    }

    pub fn seed_settings(&self, settings: &Settings) {
        self.lock().settings =
            Some(serde_json::to_value(settings).expect("settings should serialize"));
    }

    pub fn stored<E: Entity>(&self) -> Vec<E> {
        self.lock()
            .records(E::FAMILY)
            .iter()
            .cloned()
            .map(|value| serde_json::from_value(value).expect("stored record should decode"))
            .collect()
    }

    /// Every call for `family` fails until `recover` is called.
    pub fn fail(&self, family: Family, message: &str) {
        self.lock().failing.insert(family, message.to_string());
    }

    pub fn fail_once(&self, family: Family, message: &str) {
        self.lock().fail_once.insert(family, message.to_string());
    }

    pub fn recover(&self, family: Family) {
        let mut backend = self.lock();
        backend.failing.remove(&family);
        backend.fail_once.remove(&family);
    }

    /// The next call for `family` sleeps for `delay` before touching any record.
    pub fn delay_next(&self, family: Family, delay: Duration) {
        self.lock()
            .delays
            .entry(family)
            .or_default()
            .push_back(delay);
    }

    /// Batch calls answer without the last affected record.
    pub fn truncate_batches(&self) {
        self.lock().truncate_batches = true;
    }

    pub fn expire_session(&self) {
        self.lock().expired = true;
    }

    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    async fn enter(&self, family: Family, call: String) -> Result<(), GatewayError> {
        let delay = {
            let mut backend = self.lock();
            backend.calls.push(call);
            if backend.expired {
                return Err(GatewayError::SessionExpired);
            }
            if let Some(message) = backend.fail_once.remove(&family) {
                return Err(server_error(message));
            }
            if let Some(message) = backend.failing.get(&family) {
                return Err(server_error(message.clone()));
            }
            backend
                .delays
                .get_mut(&family)
                .and_then(VecDeque::pop_front)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    fn edit<E: Entity>(
        &self,
        id: &str,
        change: impl FnOnce(&mut E) -> Result<(), GatewayError>,
    ) -> Result<E, GatewayError> {
        let mut backend = self.lock();
        let records = backend.records(E::FAMILY);
        let slot = records
            .iter_mut()
            .find(|value| has_id(value, id))
            .ok_or_else(|| not_found(E::FAMILY, id))?;
        let mut entity: E = decode(slot.clone())?;
        change(&mut entity)?;
        *slot = encode(&entity)?;
        Ok(entity)
    }

    fn next_id(&self, prefix: &str) -> String {
        self.lock().next_id(prefix)
    }
}

fn server_error(message: String) -> GatewayError {
    GatewayError::Remote {
        status: 500,
        message,
    }
}

fn not_found(family: Family, id: &str) -> GatewayError {
    GatewayError::Remote {
        status: 404,
        message: format!("{} '{}' not found", family.label(), id),
    }
}

fn has_id(value: &Value, id: &str) -> bool {
    value.get("id").and_then(Value::as_str) == Some(id)
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, GatewayError> {
    serde_json::from_value(value).map_err(|err| GatewayError::Decode(err.to_string()))
}

fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Value, GatewayError> {
    serde_json::to_value(value).map_err(|err| GatewayError::Encode(err.to_string()))
}

fn merge_object(target: &mut Value, patch: Value) {
    if let (Some(target), Value::Object(patch)) = (target.as_object_mut(), patch) {
        for (key, value) in patch {
            target.insert(key, value);
        }
    }
}

fn task_mut<'a>(tasks: &'a mut [Task], id: &str) -> Option<&'a mut Task> {
    for task in tasks.iter_mut() {
        if task.id == id {
            return Some(task);
        }
        if let Some(found) = task_mut(&mut task.sub_tasks, id) {
            return Some(found);
        }
    }
    None
}

fn remove_task(tasks: &mut Vec<Task>, id: &str) -> bool {
    if let Some(index) = tasks.iter().position(|task| task.id == id) {
        tasks.remove(index);
        return true;
    }
    tasks
        .iter_mut()
        .any(|task| remove_task(&mut task.sub_tasks, id))
}

fn apply_task_patch(task: &mut Task, patch: &TaskPatch) {
    if let Some(description) = &patch.description {
        task.description = description.clone();
    }
    if let Some(due_date) = &patch.due_date {
        task.due_date = Some(due_date.clone());
    }
    if let Some(wallet_id) = &patch.linked_wallet_id {
        task.linked_wallet_id = Some(wallet_id.clone());
    }
    if let Some(notes) = &patch.notes {
        task.notes = Some(notes.clone());
    }
    match &patch.completion {
        Some(Completion::Done { at }) => {
            task.completed = true;
            task.completion_date = Some(at.clone());
        }
        Some(Completion::Open) => {
            task.completed = false;
            task.completion_date = None;
        }
        None => {}
    }
}

fn reschedule(chore: &mut RecurringTask, now: &str) {
    chore.completion_history.push(now.to_string());
    let days = match chore.cadence {
        Cadence::Daily => 1,
        Cadence::Weekly => 7,
        Cadence::Monthly => 30,
        Cadence::EveryNDays => chore.cadence_days.unwrap_or(1),
    };
    if let Ok(due) = OffsetDateTime::parse(&chore.next_due, &Rfc3339) {
        if let Ok(next) = (due + time::Duration::days(i64::from(days))).format(&Rfc3339) {
            chore.next_due = next;
        }
    }
}

fn promoted_project(id: String, item: WatchlistItem) -> Project {
    let priority = match item.confidence {
        Confidence::Low => Priority::Low,
        Confidence::Medium => Priority::Medium,
        Confidence::High => Priority::High,
    };
    Project {
        id,
        name: item.name,
        chain: item.chain,
        status: ProjectStatus::Rumored,
        my_status: MyStatus::NotStarted,
        priority,
        is_archived: false,
        notes: item.notes,
        tags: item.tags,
        website: item.website,
        tasks: Vec::new(),
    }
}

#[async_trait]
impl<E: Entity> Fetch<E> for MemoryGateway {
    async fn fetch_all(&self) -> Result<Vec<E>, GatewayError> {
        let family = E::FAMILY;
        self.enter(family, format!("GET {}", family.path())).await?;
        self.lock()
            .records(family)
            .iter()
            .cloned()
            .map(decode)
            .collect()
    }
}

#[async_trait]
impl<E: Editable> Remote<E> for MemoryGateway {
    async fn create(&self, draft: &E::Draft) -> Result<E, GatewayError> {
        let family = E::FAMILY;
        self.enter(family, format!("POST {}", family.path())).await?;
        let mut value = encode(draft)?;
        let mut backend = self.lock();
        let id = backend.next_id(family.as_str());
        if let Some(object) = value.as_object_mut() {
            object.insert("id".to_string(), Value::String(id));
            if family == Family::Notes && !object.contains_key("lastModified") {
                object.insert("lastModified".to_string(), Value::String(now_utc_rfc3339()));
            }
        }
        if family == Family::Projects {
            let task_count = value
                .get("tasks")
                .and_then(Value::as_array)
                .map_or(0, Vec::len);
            let ids: Vec<String> = (0..task_count).map(|_| backend.next_id("task")).collect();
            if let Some(tasks) = value.get_mut("tasks").and_then(Value::as_array_mut) {
                for (task, id) in tasks.iter_mut().zip(ids) {
                    merge_object(task, serde_json::json!({ "id": id }));
                }
            }
        }
        let entity: E = decode(value.clone())?;
        backend.records(family).push(value);
        Ok(entity)
    }

    async fn update(&self, id: &str, patch: &E::Patch) -> Result<E, GatewayError> {
        let family = E::FAMILY;
        self.enter(family, format!("PATCH {}/{}", family.path(), id))
            .await?;
        let patch = encode(patch)?;
        let mut backend = self.lock();
        let slot = backend
            .records(family)
            .iter_mut()
            .find(|value| has_id(value, id))
            .ok_or_else(|| not_found(family, id))?;
        merge_object(slot, patch);
        decode(slot.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), GatewayError> {
        let family = E::FAMILY;
        self.enter(family, format!("DELETE {}/{}", family.path(), id))
            .await?;
        let mut backend = self.lock();
        let records = backend.records(family);
        let index = records
            .iter()
            .position(|value| has_id(value, id))
            .ok_or_else(|| not_found(family, id))?;
        records.remove(index);
        Ok(())
    }

    async fn batch_update(
        &self,
        ids: &[String],
        patch: &E::Patch,
    ) -> Result<Vec<E>, GatewayError> {
        let family = E::FAMILY;
        self.enter(family, format!("PATCH {}/batch", family.path()))
            .await?;
        let patch = encode(patch)?;
        let mut backend = self.lock();
        let truncate = backend.truncate_batches;
        let mut updated = Vec::new();
        for value in backend.records(family).iter_mut() {
            if ids.iter().any(|id| has_id(value, id)) {
                merge_object(value, patch.clone());
                updated.push(decode(value.clone())?);
            }
        }
        if truncate {
            updated.pop();
        }
        Ok(updated)
    }
}

#[async_trait]
impl ProjectRemote for MemoryGateway {
    async fn add_task(
        &self,
        project_id: &str,
        parent_task_id: Option<&str>,
        task: &NewTask,
    ) -> Result<Project, GatewayError> {
        self.enter(Family::Projects, format!("POST projects/{project_id}/tasks"))
            .await?;
        let created = Task {
            id: self.next_id("task"),
            description: task.description.clone(),
            completed: false,
            completion_date: None,
            due_date: task.due_date.clone(),
            linked_wallet_id: task.linked_wallet_id.clone(),
            notes: task.notes.clone(),
            sub_tasks: Vec::new(),
        };
        self.edit(project_id, |project: &mut Project| {
            match parent_task_id {
                Some(parent_id) => task_mut(&mut project.tasks, parent_id)
                    .ok_or_else(|| not_found(Family::Projects, parent_id))?
                    .sub_tasks
                    .push(created),
                None => project.tasks.push(created),
            }
            Ok(())
        })
    }

    async fn update_task(
        &self,
        project_id: &str,
        task_id: &str,
        patch: &TaskPatch,
    ) -> Result<Project, GatewayError> {
        self.enter(
            Family::Projects,
            format!("PATCH projects/{project_id}/tasks/{task_id}"),
        )
        .await?;
        self.edit(project_id, |project: &mut Project| {
            let task = task_mut(&mut project.tasks, task_id)
                .ok_or_else(|| not_found(Family::Projects, task_id))?;
            apply_task_patch(task, patch);
            Ok(())
        })
    }

    async fn delete_task(&self, project_id: &str, task_id: &str) -> Result<Project, GatewayError> {
        self.enter(
            Family::Projects,
            format!("DELETE projects/{project_id}/tasks/{task_id}"),
        )
        .await?;
        self.edit(project_id, |project: &mut Project| {
            if remove_task(&mut project.tasks, task_id) {
                Ok(())
            } else {
                Err(not_found(Family::Projects, task_id))
            }
        })
    }

    async fn update_tasks(
        &self,
        project_id: &str,
        task_ids: &[String],
        patch: &TaskPatch,
    ) -> Result<Project, GatewayError> {
        self.enter(
            Family::Projects,
            format!("PATCH projects/{project_id}/tasks/batch"),
        )
        .await?;
        let truncate = self.lock().truncate_batches;
        self.edit(project_id, |project: &mut Project| {
            for task_id in task_ids {
                let task = task_mut(&mut project.tasks, task_id)
                    .ok_or_else(|| not_found(Family::Projects, task_id))?;
                apply_task_patch(task, patch);
            }
            if truncate {
                if let Some(last) = task_ids.last() {
                    remove_task(&mut project.tasks, last);
                }
            }
            Ok(())
        })
    }

    async fn batch_add_notes(
        &self,
        project_ids: &[String],
        note: &str,
    ) -> Result<Vec<Project>, GatewayError> {
        self.enter(Family::Projects, "POST projects/batch/notes".to_string())
            .await?;
        let mut backend = self.lock();
        let truncate = backend.truncate_batches;
        let mut updated = Vec::new();
        for value in backend.records(Family::Projects).iter_mut() {
            if !project_ids.iter().any(|id| has_id(value, id)) {
                continue;
            }
            let mut project: Project = decode(value.clone())?;
            if project.notes.trim().is_empty() {
                project.notes = note.to_string();
            } else {
                project.notes = format!("{}\n{}", project.notes, note);
            }
            *value = encode(&project)?;
            updated.push(project);
        }
        if truncate {
            updated.pop();
        }
        Ok(updated)
    }
}

#[async_trait]
impl WalletRemote for MemoryGateway {
    async fn add_transaction(
        &self,
        wallet_id: &str,
        transaction: &NewTransaction,
    ) -> Result<Wallet, GatewayError> {
        self.enter(
            Family::Wallets,
            format!("POST wallets/{wallet_id}/transactions"),
        )
        .await?;
        let record = WalletTransaction {
            id: self.next_id("tx"),
            hash: transaction.hash.clone(),
            date: transaction.date.clone(),
            description: transaction.description.clone(),
            amount: transaction.amount,
        };
        self.edit(wallet_id, |wallet: &mut Wallet| {
            wallet.transactions.push(record);
            Ok(())
        })
    }

    async fn delete_transaction(
        &self,
        wallet_id: &str,
        transaction_id: &str,
    ) -> Result<Wallet, GatewayError> {
        self.enter(
            Family::Wallets,
            format!("DELETE wallets/{wallet_id}/transactions/{transaction_id}"),
        )
        .await?;
        self.edit(wallet_id, |wallet: &mut Wallet| {
            let before = wallet.transactions.len();
            wallet.transactions.retain(|tx| tx.id != transaction_id);
            if wallet.transactions.len() == before {
                return Err(not_found(Family::Wallets, transaction_id));
            }
            Ok(())
        })
    }

    async fn add_gas_log(&self, wallet_id: &str, log: &NewGasLog) -> Result<Wallet, GatewayError> {
        self.enter(Family::Wallets, format!("POST wallets/{wallet_id}/gas-logs"))
            .await?;
        let record = GasLog {
            id: self.next_id("gas"),
            amount: log.amount,
            currency: log.currency.clone(),
            date: log.date.clone(),
            notes: log.notes.clone(),
        };
        self.edit(wallet_id, |wallet: &mut Wallet| {
            wallet.gas_logs.push(record);
            Ok(())
        })
    }

    async fn delete_gas_log(
        &self,
        wallet_id: &str,
        log_id: &str,
    ) -> Result<Wallet, GatewayError> {
        self.enter(
            Family::Wallets,
            format!("DELETE wallets/{wallet_id}/gas-logs/{log_id}"),
        )
        .await?;
        self.edit(wallet_id, |wallet: &mut Wallet| {
            let before = wallet.gas_logs.len();
            wallet.gas_logs.retain(|log| log.id != log_id);
            if wallet.gas_logs.len() == before {
                return Err(not_found(Family::Wallets, log_id));
            }
            Ok(())
        })
    }
}

#[async_trait]
impl RecurringRemote for MemoryGateway {
    async fn complete(&self, id: &str) -> Result<RecurringTask, GatewayError> {
        self.enter(
            Family::RecurringTasks,
            format!("POST recurring-tasks/{id}/complete"),
        )
        .await?;
        let now = now_utc_rfc3339();
        self.edit(id, |chore: &mut RecurringTask| {
            reschedule(chore, &now);
            Ok(())
        })
    }
}

#[async_trait]
impl AlertRemote for MemoryGateway {
    async fn mark_read(&self, id: &str) -> Result<UserAlert, GatewayError> {
        self.enter(Family::Alerts, format!("POST alerts/{id}/read"))
            .await?;
        self.edit(id, |alert: &mut UserAlert| {
            alert.is_read = true;
            Ok(())
        })
    }

    async fn mark_all_read(&self) -> Result<Vec<UserAlert>, GatewayError> {
        self.enter(Family::Alerts, "POST alerts/read-all".to_string())
            .await?;
        let mut backend = self.lock();
        let mut alerts = Vec::new();
        for value in backend.records(Family::Alerts).iter_mut() {
            merge_object(value, serde_json::json!({ "isRead": true }));
            alerts.push(decode(value.clone())?);
        }
        Ok(alerts)
    }
}

#[async_trait]
impl WatchlistRemote for MemoryGateway {
    async fn promote(&self, id: &str) -> Result<Project, GatewayError> {
        self.enter(Family::Watchlist, format!("POST watchlist/{id}/promote"))
            .await?;
        let mut backend = self.lock();
        let watchlist = backend.records(Family::Watchlist);
        let index = watchlist
            .iter()
            .position(|value| has_id(value, id))
            .ok_or_else(|| not_found(Family::Watchlist, id))?;
        let item: WatchlistItem = decode(watchlist.remove(index))?;
        let project_id = backend.next_id("projects");
        let project = promoted_project(project_id, item);
        let value = encode(&project)?;
        backend.records(Family::Projects).push(value);
        Ok(project)
    }
}

#[async_trait]
impl SettingsRemote for MemoryGateway {
    async fn fetch_settings(&self) -> Result<Settings, GatewayError> {
        self.enter(Family::Settings, "GET settings".to_string())
            .await?;
        match self.lock().settings.clone() {
            Some(value) => decode(value),
            None => Ok(Settings::default()),
        }
    }

    async fn update_settings(&self, patch: &SettingsPatch) -> Result<Settings, GatewayError> {
        self.enter(Family::Settings, "PATCH settings".to_string())
            .await?;
        let patch = encode(patch)?;
        let mut backend = self.lock();
        let mut current = match backend.settings.take() {
            Some(value) => value,
            None => encode(&Settings::default())?,
        };
        merge_object(&mut current, patch);
        let settings = decode(current.clone());
        backend.settings = Some(current);
        settings
    }
}
