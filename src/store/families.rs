use super::{merge, EntityStore, StoreError};
use crate::domain::{
    require_text, Family, NewGasLog, NewTask, NewTransaction, Project, ProjectPatch,
    RecurringTask, TaskPatch, UserAlert, Wallet, WalletPatch, WatchlistItem,
};
use crate::gateway::{AlertRemote, ProjectRemote, RecurringRemote, WalletRemote, WatchlistRemote};
use crate::progress;

impl<R: ProjectRemote + ?Sized> EntityStore<Project, R> {
    pub async fn add_task(
        &self,
        project_id: &str,
        parent_task_id: Option<&str>,
        task: NewTask,
    ) -> Result<Project, StoreError> {
        if let Err(message) = require_text("task description", &task.description) {
            return self.cell.reject("add_task", StoreError::InvalidInput(message));
        }
        self.replace_one(
            "add_task",
            self.remote.add_task(project_id, parent_task_id, &task),
        )
        .await
    }

    pub async fn update_task(
        &self,
        project_id: &str,
        task_id: &str,
        patch: TaskPatch,
    ) -> Result<Project, StoreError> {
        if patch.is_empty() {
            return self.cell.reject(
                "update_task",
                StoreError::InvalidInput("task patch has no changes".to_string()),
            );
        }
        self.replace_one(
            "update_task",
            self.remote.update_task(project_id, task_id, &patch),
        )
        .await
    }

    pub async fn delete_task(&self, project_id: &str, task_id: &str) -> Result<Project, StoreError> {
        self.replace_one("delete_task", self.remote.delete_task(project_id, task_id))
            .await
    }

    /// One patch over many tasks of a project. The canonical project replaces
    /// the local one only if it still carries every targeted task.
    pub async fn update_multiple_tasks(
        &self,
        project_id: &str,
        task_ids: &[String],
        patch: TaskPatch,
    ) -> Result<Project, StoreError> {
        let targets = merge::unique_ids(task_ids);
        if targets.is_empty() || patch.is_empty() {
            return self.cell.reject(
                "update_multiple_tasks",
                StoreError::InvalidInput("select at least one task and one change".to_string()),
            );
        }
        let call = self.remote.update_tasks(project_id, &targets, &patch);
        self.cell
            .run("update_multiple_tasks", call, |items, project: Project| {
                let missing: Vec<String> = targets
                    .iter()
                    .filter(|id| progress::find_task(&project.tasks, id).is_none())
                    .cloned()
                    .collect();
                if !missing.is_empty() {
                    return Err(StoreError::IncompleteBatch {
                        family: Family::Projects,
                        missing,
                    });
                }
                Ok((merge::upsert(items, project.clone()), project))
            })
            .await
    }

    pub async fn set_tasks_completed(
        &self,
        project_id: &str,
        task_ids: &[String],
        done: bool,
        now: &str,
    ) -> Result<Project, StoreError> {
        self.update_multiple_tasks(project_id, task_ids, TaskPatch::completed(done, now))
            .await
    }

    pub async fn batch_add_notes(
        &self,
        project_ids: &[String],
        note: &str,
    ) -> Result<Vec<Project>, StoreError> {
        if let Err(message) = require_text("note", note) {
            return self.cell.reject("batch_add_notes", StoreError::InvalidInput(message));
        }
        let targets = merge::unique_ids(project_ids);
        if targets.is_empty() {
            return Ok(Vec::new());
        }
        self.replace_many(
            "batch_add_notes",
            &targets,
            self.remote.batch_add_notes(&targets, note.trim()),
        )
        .await
    }

    pub async fn toggle_archive(&self, project_id: &str) -> Result<Project, StoreError> {
        let Some(current) = self.get(project_id) else {
            return self.cell.reject(
                "toggle_archive",
                StoreError::NotFound {
                    family: Family::Projects,
                    id: project_id.to_string(),
                },
            );
        };
        let patch = ProjectPatch {
            is_archived: Some(!current.is_archived),
            ..ProjectPatch::default()
        };
        self.update(project_id, patch).await
    }
}

impl<R: WalletRemote + ?Sized> EntityStore<Wallet, R> {
    pub async fn add_transaction(
        &self,
        wallet_id: &str,
        transaction: NewTransaction,
    ) -> Result<Wallet, StoreError> {
        if let Err(message) = require_text("transaction hash", &transaction.hash) {
            return self.cell.reject("add_transaction", StoreError::InvalidInput(message));
        }
        self.replace_one(
            "add_transaction",
            self.remote.add_transaction(wallet_id, &transaction),
        )
        .await
    }

    pub async fn delete_transaction(
        &self,
        wallet_id: &str,
        transaction_id: &str,
    ) -> Result<Wallet, StoreError> {
        self.replace_one(
            "delete_transaction",
            self.remote.delete_transaction(wallet_id, transaction_id),
        )
        .await
    }

    pub async fn add_gas_log(&self, wallet_id: &str, log: NewGasLog) -> Result<Wallet, StoreError> {
        if !log.amount.is_finite() || log.amount < 0.0 {
            return self.cell.reject(
                "add_gas_log",
                StoreError::InvalidInput("gas amount must be a non-negative number".to_string()),
            );
        }
        self.replace_one("add_gas_log", self.remote.add_gas_log(wallet_id, &log))
            .await
    }

    pub async fn delete_gas_log(&self, wallet_id: &str, log_id: &str) -> Result<Wallet, StoreError> {
        self.replace_one(
            "delete_gas_log",
            self.remote.delete_gas_log(wallet_id, log_id),
        )
        .await
    }

    pub async fn toggle_archive(&self, wallet_id: &str) -> Result<Wallet, StoreError> {
        let Some(current) = self.get(wallet_id) else {
            return self.cell.reject(
                "toggle_archive",
                StoreError::NotFound {
                    family: Family::Wallets,
                    id: wallet_id.to_string(),
                },
            );
        };
        let patch = WalletPatch {
            is_archived: Some(!current.is_archived),
            ..WalletPatch::default()
        };
        self.update(wallet_id, patch).await
    }
}

impl<R: RecurringRemote + ?Sized> EntityStore<RecurringTask, R> {
    /// Records a completion; the server answers with the rescheduled chore.
    pub async fn complete(&self, id: &str) -> Result<RecurringTask, StoreError> {
        self.replace_one("complete", self.remote.complete(id)).await
    }
}

impl<R: AlertRemote + ?Sized> EntityStore<UserAlert, R> {
    pub async fn mark_read(&self, id: &str) -> Result<UserAlert, StoreError> {
        self.replace_one("mark_read", self.remote.mark_read(id)).await
    }

    pub async fn mark_all_read(&self) -> Result<usize, StoreError> {
        self.cell
            .run("mark_all_read", self.remote.mark_all_read(), |_, alerts: Vec<UserAlert>| {
                let alerts = merge::dedupe(alerts);
                let count = alerts.len();
                Ok((alerts, count))
            })
            .await
    }

    pub fn unread_count(&self) -> usize {
        self.cell
            .read()
            .items
            .iter()
            .filter(|alert| !alert.is_read)
            .count()
    }
}

impl<R: WatchlistRemote + ?Sized> EntityStore<WatchlistItem, R> {
    /// Removes the item once the server has created its project. The project
    /// is handed back for the caller to place in the project store.
    pub async fn promote(&self, id: &str) -> Result<Project, StoreError> {
        self.cell
            .run("promote", self.remote.promote(id), |items, project: Project| {
                Ok((merge::remove(items, id), project))
            })
            .await
    }
}
