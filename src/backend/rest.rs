//! PostgREST-style HTTP remote store.
//!
//! Talks to `{base_url}/rest/v1/{table}` with the `apikey` header and a bearer
//! session token. Timestamps travel as milliseconds since the Unix epoch.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use log::{debug, error};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{BackendError, RemoteMember, RemoteTask, RemoteTaskList, RemoteTaskStore};
use crate::entities::task::Priority;

const TABLE_TASKS: &str = "tasks";
const TABLE_LISTS: &str = "task_lists";
const TABLE_MEMBERS: &str = "list_members";

#[derive(Debug, Serialize, Deserialize)]
struct TaskRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    is_done: bool,
    #[serde(default = "default_priority")]
    priority: i32,
    #[serde(default)]
    due_date: Option<i64>,
    #[serde(default)]
    image_uri: Option<String>,
    list_id: i32,
    updated_at: i64,
}

fn default_priority() -> i32 {
    Priority::Normal.as_i32()
}

#[derive(Debug, Serialize, Deserialize)]
struct ListRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<i32>,
    name: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct MemberRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    list_id: Option<i32>,
    user_id: String,
}

fn from_millis(millis: i64) -> Result<DateTime<Utc>, BackendError> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| BackendError::InvalidData(format!("Timestamp out of range: {}", millis)))
}

impl TaskRow {
    fn from_remote(task: &RemoteTask, list_id: i32) -> Self {
        Self {
            id: task.remote_id.clone(),
            title: task.title.clone(),
            description: task.description.clone(),
            is_done: task.is_done,
            priority: task.priority.as_i32(),
            due_date: task.due_date.map(|due| due.timestamp_millis()),
            image_uri: task.image_ref.clone(),
            list_id,
            updated_at: task.updated_at.timestamp_millis(),
        }
    }

    fn into_remote(self) -> Result<RemoteTask, BackendError> {
        Ok(RemoteTask {
            remote_id: self.id,
            local_id: 0,
            title: self.title,
            description: self.description,
            is_done: self.is_done,
            priority: Priority::from_i32(self.priority),
            due_date: self.due_date.map(from_millis).transpose()?,
            image_ref: self.image_uri,
            list_id: self.list_id,
            updated_at: from_millis(self.updated_at)?,
        })
    }
}

/// Remote store backed by a PostgREST endpoint.
pub struct RestRemoteTaskStore {
    client: Client,
    base_url: String,
    api_key: String,
    access_token: Option<String>,
}

impl RestRemoteTaskStore {
    /// Create a store for `base_url`. Without an access token every call fails
    /// with [`BackendError::Auth`].
    pub fn new(base_url: &str, api_key: String, access_token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            access_token,
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, BackendError> {
        let token = self
            .access_token
            .as_deref()
            .ok_or_else(|| BackendError::Auth("No active session".to_string()))?;
        Ok(request.header("apikey", &self.api_key).bearer_auth(token))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = self
            .authorized(request)?
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BackendError::Auth(format!("HTTP {}: {}", status, body)),
            StatusCode::NOT_FOUND | StatusCode::GONE => BackendError::NotFound(format!("HTTP {}: {}", status, body)),
            _ if status.is_server_error() => BackendError::Network(format!("HTTP {}: {}", status, body)),
            _ => BackendError::Other(format!("HTTP {}: {}", status, body)),
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BackendError> {
        self.send(request)
            .await?
            .json::<T>()
            .await
            .map_err(|e| BackendError::InvalidData(e.to_string()))
    }

    /// Insert rows and return the representation PostgREST sends back.
    async fn insert_returning<B, T>(&self, table: &str, body: &B, merge: bool) -> Result<T, BackendError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let prefer = if merge {
            "resolution=merge-duplicates,return=representation"
        } else {
            "return=representation"
        };
        let request = self.client.post(self.table_url(table)).header("Prefer", prefer).json(body);

        let mut rows: Vec<T> = self.send_json(request).await?;
        if rows.is_empty() {
            return Err(BackendError::InvalidData(format!("Empty response from {}", table)));
        }
        Ok(rows.swap_remove(0))
    }
}

#[async_trait]
impl RemoteTaskStore for RestRemoteTaskStore {
    fn backend_type(&self) -> &str {
        "rest"
    }

    async fn fetch_lists(&self) -> Result<Vec<RemoteTaskList>, BackendError> {
        let rows: Vec<ListRow> = self
            .send_json(self.client.get(self.table_url(TABLE_LISTS)).query(&[("select", "*")]))
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| RemoteTaskList {
                id: row.id.unwrap_or(0),
                name: row.name,
            })
            .collect())
    }

    async fn create_list(&self, name: &str) -> Result<RemoteTaskList, BackendError> {
        let body = ListRow {
            id: None,
            name: name.to_string(),
        };
        let row: ListRow = self.insert_returning(TABLE_LISTS, &body, false).await?;
        Ok(RemoteTaskList {
            id: row.id.unwrap_or(0),
            name: row.name,
        })
    }

    async fn share_list(&self, list_id: i32, member_ids: &[String]) -> Result<bool, BackendError> {
        for user_id in member_ids {
            let body = MemberRow {
                list_id: Some(list_id),
                user_id: user_id.clone(),
            };
            if let Err(e) = self.send(self.client.post(self.table_url(TABLE_MEMBERS)).json(&body)).await {
                error!("Share list {} failed: {}", list_id, e);
                return Ok(false);
            }
        }
        Ok(true)
    }

    async fn fetch_tasks(&self, list_id: i32) -> Result<Vec<RemoteTask>, BackendError> {
        let request = self
            .client
            .get(self.table_url(TABLE_TASKS))
            .query(&[("select", "*".to_string()), ("list_id", format!("eq.{}", list_id))]);
        let rows: Vec<TaskRow> = self.send_json(request).await?;
        debug!("Fetched {} remote tasks for list {}", rows.len(), list_id);
        rows.into_iter().map(TaskRow::into_remote).collect()
    }

    async fn upsert_task(&self, task: &RemoteTask, list_id: i32) -> Result<Option<String>, BackendError> {
        let body = TaskRow::from_remote(task, list_id);
        let row: TaskRow = self.insert_returning(TABLE_TASKS, &body, true).await?;
        Ok(row.id)
    }

    async fn delete_task(&self, local_id: i32, list_id: i32) -> Result<(), BackendError> {
        let request = self.client.delete(self.table_url(TABLE_TASKS)).query(&[
            ("id", format!("eq.{}", local_id)),
            ("list_id", format!("eq.{}", list_id)),
        ]);
        self.send(request).await?;
        Ok(())
    }

    async fn delete_task_by_remote_id(&self, remote_id: &str, list_id: i32) -> Result<(), BackendError> {
        let request = self.client.delete(self.table_url(TABLE_TASKS)).query(&[
            ("id", format!("eq.{}", remote_id)),
            ("list_id", format!("eq.{}", list_id)),
        ]);
        self.send(request).await?;
        Ok(())
    }

    async fn fetch_members(&self, list_id: i32) -> Result<Vec<RemoteMember>, BackendError> {
        let request = self
            .client
            .get(self.table_url(TABLE_MEMBERS))
            .query(&[("select", "user_id".to_string()), ("list_id", format!("eq.{}", list_id))]);
        let rows: Vec<MemberRow> = self.send_json(request).await?;
        Ok(rows
            .into_iter()
            .map(|row| RemoteMember { user_id: row.user_id })
            .collect())
    }
}
