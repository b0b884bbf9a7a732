use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use super::{
    AlertRemote, Credentials, Fetch, GatewayError, ProjectRemote, RecurringRemote, Remote,
    SettingsRemote, WalletRemote, WatchlistRemote,
};
use crate::domain::{
    Editable, Entity, Family, NewGasLog, NewTask, NewTransaction, Project, RecurringTask,
    Settings, SettingsPatch, TaskPatch, UserAlert, Wallet,
};

const REQUEST_ID_HEADER: &str = "x-request-id";

pub struct HttpGateway {
    client: Client,
    base_url: Url,
    credentials: Arc<Credentials>,
}

impl HttpGateway {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        credentials: Arc<Credentials>,
    ) -> Result<Self, GatewayError> {
        let base_url = Url::parse(base_url.trim())
            .map_err(|err| GatewayError::Network(format!("invalid base url '{base_url}': {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(GatewayError::Network(format!(
                "base url '{base_url}' cannot carry resource paths"
            )));
        }
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("dropfarm/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| GatewayError::Network(err.to_string()))?;
        Ok(Self {
            client,
            base_url,
            credentials,
        })
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> (RequestBuilder, String) {
        let request_id = Uuid::now_v7().to_string();
        let url = self.url(segments);
        debug!(request_id = %request_id, method = %method, url = %url, "gateway request");
        let mut builder = self
            .client
            .request(method, url)
            .header(REQUEST_ID_HEADER, &request_id);
        if let Some(token) = self.credentials.token() {
            builder = builder.bearer_auth(token);
        }
        (builder, request_id)
    }

    async fn send(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<Value>,
    ) -> Result<Vec<u8>, GatewayError> {
        let (mut builder, request_id) = self.request(method, segments);
        if let Some(body) = body {
            builder = builder.json(&body);
        }
        let response = builder
            .send()
            .await
            .map_err(|err| GatewayError::Network(err.to_string()))?;
        let status = response.status();
        debug!(request_id = %request_id, status = status.as_u16(), "gateway response");

        if status == StatusCode::UNAUTHORIZED {
            self.credentials.revoke();
            return Err(GatewayError::SessionExpired);
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|err| GatewayError::Network(err.to_string()))?;
        if !status.is_success() {
            return Err(error_from_body(status.as_u16(), &bytes));
        }
        Ok(bytes.to_vec())
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<Value>,
    ) -> Result<T, GatewayError> {
        let bytes = self.send(method, segments, body).await?;
        serde_json::from_slice(&bytes).map_err(|err| GatewayError::Decode(err.to_string()))
    }
}

fn encode<T: Serialize + ?Sized>(body: &T) -> Result<Value, GatewayError> {
    serde_json::to_value(body).map_err(|err| GatewayError::Encode(err.to_string()))
}

/// Server error bodies look like `{ "message": "..." }` or `{ "error": "..." }`.
/// Anything else falls back to the bare status code.
pub fn error_from_body(status: u16, body: &[u8]) -> GatewayError {
    let message = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|value| {
            ["message", "error"].iter().find_map(|key| {
                value
                    .get(*key)
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|text| !text.is_empty())
                    .map(str::to_string)
            })
        })
        .unwrap_or_else(|| format!("request failed with status {status}"));
    GatewayError::Remote { status, message }
}

#[async_trait]
impl<E: Entity> Fetch<E> for HttpGateway {
    async fn fetch_all(&self) -> Result<Vec<E>, GatewayError> {
        self.call(Method::GET, &[E::FAMILY.path()], None).await
    }
}

#[async_trait]
impl<E: Editable> Remote<E> for HttpGateway {
    async fn create(&self, draft: &E::Draft) -> Result<E, GatewayError> {
        let body = encode(draft)?;
        self.call(Method::POST, &[E::FAMILY.path()], Some(body))
            .await
    }

    async fn update(&self, id: &str, patch: &E::Patch) -> Result<E, GatewayError> {
        let body = encode(patch)?;
        self.call(Method::PATCH, &[E::FAMILY.path(), id], Some(body))
            .await
    }

    async fn delete(&self, id: &str) -> Result<(), GatewayError> {
        self.send(Method::DELETE, &[E::FAMILY.path(), id], None)
            .await
            .map(|_| ())
    }

    async fn batch_update(
        &self,
        ids: &[String],
        patch: &E::Patch,
    ) -> Result<Vec<E>, GatewayError> {
        let patch = encode(patch)?;
        let body = json!({ "ids": ids, "patch": patch });
        self.call(Method::PATCH, &[E::FAMILY.path(), "batch"], Some(body))
            .await
    }
}

#[async_trait]
impl ProjectRemote for HttpGateway {
    async fn add_task(
        &self,
        project_id: &str,
        parent_task_id: Option<&str>,
        task: &NewTask,
    ) -> Result<Project, GatewayError> {
        let task = encode(task)?;
        let body = json!({ "parentTaskId": parent_task_id, "task": task });
        self.call(Method::POST, &["projects", project_id, "tasks"], Some(body))
            .await
    }

    async fn update_task(
        &self,
        project_id: &str,
        task_id: &str,
        patch: &TaskPatch,
    ) -> Result<Project, GatewayError> {
        let body = encode(patch)?;
        self.call(
            Method::PATCH,
            &["projects", project_id, "tasks", task_id],
            Some(body),
        )
        .await
    }

    async fn delete_task(&self, project_id: &str, task_id: &str) -> Result<Project, GatewayError> {
        self.call(
            Method::DELETE,
            &["projects", project_id, "tasks", task_id],
            None,
        )
        .await
    }

    async fn update_tasks(
        &self,
        project_id: &str,
        task_ids: &[String],
        patch: &TaskPatch,
    ) -> Result<Project, GatewayError> {
        let patch = encode(patch)?;
        let body = json!({ "taskIds": task_ids, "patch": patch });
        self.call(
            Method::PATCH,
            &["projects", project_id, "tasks", "batch"],
            Some(body),
        )
        .await
    }

    async fn batch_add_notes(
        &self,
        project_ids: &[String],
        note: &str,
    ) -> Result<Vec<Project>, GatewayError> {
        let body = json!({ "ids": project_ids, "note": note });
        self.call(Method::POST, &["projects", "batch", "notes"], Some(body))
            .await
    }
}

#[async_trait]
impl WalletRemote for HttpGateway {
    async fn add_transaction(
        &self,
        wallet_id: &str,
        transaction: &NewTransaction,
    ) -> Result<Wallet, GatewayError> {
        let body = encode(transaction)?;
        self.call(
            Method::POST,
            &["wallets", wallet_id, "transactions"],
            Some(body),
        )
        .await
    }

    async fn delete_transaction(
        &self,
        wallet_id: &str,
        transaction_id: &str,
    ) -> Result<Wallet, GatewayError> {
        self.call(
            Method::DELETE,
            &["wallets", wallet_id, "transactions", transaction_id],
            None,
        )
        .await
    }

    async fn add_gas_log(&self, wallet_id: &str, log: &NewGasLog) -> Result<Wallet, GatewayError> {
        let body = encode(log)?;
        self.call(Method::POST, &["wallets", wallet_id, "gas-logs"], Some(body))
            .await
    }

    async fn delete_gas_log(
        &self,
        wallet_id: &str,
        log_id: &str,
    ) -> Result<Wallet, GatewayError> {
        self.call(
            Method::DELETE,
            &["wallets", wallet_id, "gas-logs", log_id],
            None,
        )
        .await
    }
}

#[async_trait]
impl RecurringRemote for HttpGateway {
    async fn complete(&self, id: &str) -> Result<RecurringTask, GatewayError> {
        let family = Family::RecurringTasks.path();
        self.call(Method::POST, &[family, id, "complete"], None).await
    }
}

#[async_trait]
impl AlertRemote for HttpGateway {
    async fn mark_read(&self, id: &str) -> Result<UserAlert, GatewayError> {
        self.call(Method::POST, &["alerts", id, "read"], None).await
    }

    async fn mark_all_read(&self) -> Result<Vec<UserAlert>, GatewayError> {
        self.call(Method::POST, &["alerts", "read-all"], None).await
    }
}

#[async_trait]
impl WatchlistRemote for HttpGateway {
    async fn promote(&self, id: &str) -> Result<Project, GatewayError> {
        self.call(Method::POST, &["watchlist", id, "promote"], None)
            .await
    }
}

#[async_trait]
impl SettingsRemote for HttpGateway {
    async fn fetch_settings(&self) -> Result<Settings, GatewayError> {
        self.call(Method::GET, &[Family::Settings.path()], None).await
    }

    async fn update_settings(&self, patch: &SettingsPatch) -> Result<Settings, GatewayError> {
        let body = encode(patch)?;
        self.call(Method::PATCH, &[Family::Settings.path()], Some(body))
            .await
    }
}
