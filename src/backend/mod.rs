//! Remote task store abstraction.
//!
//! This module defines the interface every remote task store implements, the
//! transfer types exchanged with it, and the error type its operations return.
//! The sync engine only ever talks to a `dyn RemoteTaskStore`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::task::{self, Priority, SyncState};

pub mod factory;
pub mod fake;
pub mod rest;

pub use factory::create_remote_store;
pub use fake::FakeRemoteTaskStore;
pub use rest::RestRemoteTaskStore;

/// Common error types for remote operations.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Backend error: {0}")]
    Other(String),
}

/// Store-agnostic task representation.
///
/// `local_id` is the id of the task on the device that pushed it. Stores use
/// it to address rows that have not been assigned a remote id yet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RemoteTask {
    pub remote_id: Option<String>,
    pub local_id: i32,
    pub title: String,
    pub description: String,
    pub is_done: bool,
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
    pub image_ref: Option<String>,
    pub list_id: i32,
    pub updated_at: DateTime<Utc>,
}

impl RemoteTask {
    /// Build the pushed representation of a local task.
    pub fn from_local(task: &task::Model, list_id: i32) -> Self {
        Self {
            remote_id: task.remote_id.clone(),
            local_id: task.id,
            title: task.title.clone(),
            description: task.description.clone(),
            is_done: task.is_done,
            priority: task.priority,
            due_date: task.due_date,
            image_ref: task.image_ref.clone(),
            list_id,
            updated_at: task.updated_at,
        }
    }

    /// Overwrite the content of an existing local record, keeping its local id.
    ///
    /// The record keeps the later of both stamps so a slow remote clock cannot
    /// move it backwards.
    pub fn apply_to(self, local: task::Model) -> task::Model {
        task::Model {
            id: local.id,
            remote_id: self.remote_id.or(local.remote_id),
            title: self.title,
            description: self.description,
            is_done: self.is_done,
            priority: self.priority,
            due_date: self.due_date,
            image_ref: self.image_ref,
            list_id: self.list_id,
            updated_at: self.updated_at.max(local.updated_at),
            sync_state: SyncState::Synced,
        }
    }

    /// A fresh local record for a task the device has never seen.
    pub fn into_new_local(self) -> task::ActiveModel {
        use sea_orm::ActiveValue::{NotSet, Set};

        task::ActiveModel {
            id: NotSet,
            remote_id: Set(self.remote_id),
            title: Set(self.title),
            description: Set(self.description),
            is_done: Set(self.is_done),
            priority: Set(self.priority),
            due_date: Set(self.due_date),
            image_ref: Set(self.image_ref),
            list_id: Set(self.list_id),
            updated_at: Set(self.updated_at),
            sync_state: Set(SyncState::Synced),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTaskList {
    pub id: i32,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteMember {
    pub user_id: String,
}

/// Remote task store every backend must implement.
///
/// Stores return [`BackendError`] and never touch local storage.
#[async_trait]
pub trait RemoteTaskStore: Send + Sync {
    /// Returns the store type identifier (e.g., "fake", "rest").
    fn backend_type(&self) -> &str;

    // Lists
    async fn fetch_lists(&self) -> Result<Vec<RemoteTaskList>, BackendError>;
    async fn create_list(&self, name: &str) -> Result<RemoteTaskList, BackendError>;
    async fn share_list(&self, list_id: i32, member_ids: &[String]) -> Result<bool, BackendError>;

    // Tasks
    async fn fetch_tasks(&self, list_id: i32) -> Result<Vec<RemoteTask>, BackendError>;

    /// Create or replace a task, returning the remote id the store assigned,
    /// if it reports one.
    async fn upsert_task(&self, task: &RemoteTask, list_id: i32) -> Result<Option<String>, BackendError>;
    async fn delete_task(&self, local_id: i32, list_id: i32) -> Result<(), BackendError>;
    async fn delete_task_by_remote_id(&self, remote_id: &str, list_id: i32) -> Result<(), BackendError>;

    // Members
    async fn fetch_members(&self, list_id: i32) -> Result<Vec<RemoteMember>, BackendError>;
}
