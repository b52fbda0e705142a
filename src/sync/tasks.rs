use anyhow::Result;
use chrono::{DateTime, Utc};
use log::info;
use sea_orm::ActiveValue::{NotSet, Set, Unchanged};

use crate::entities::task::{self, Priority, SyncState, DEFAULT_LIST_ID};
use crate::error::SyncError;
use crate::repositories::TaskRepository;
use crate::sync::SyncService;
use crate::utils::datetime;

/// Content of a task about to be created.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
    pub image_ref: Option<String>,
    /// Defaults to [`DEFAULT_LIST_ID`]
    pub list_id: Option<i32>,
}

impl NewTask {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

impl SyncService {
    /// Retrieves a task by local id, including soft-deleted ones.
    pub async fn get_task(&self, id: i32) -> Result<Option<task::Model>> {
        TaskRepository::get_by_id(&self.storage.conn, id).await
    }

    /// Retrieves every task that is not pending deletion, newest first.
    pub async fn get_tasks(&self) -> Result<Vec<task::Model>> {
        TaskRepository::get_all_active(&self.storage.conn).await
    }

    pub async fn get_tasks_for_list(&self, list_id: i32) -> Result<Vec<task::Model>> {
        TaskRepository::get_by_list(&self.storage.conn, list_id).await
    }

    pub async fn count_tasks_for_list(&self, list_id: i32) -> Result<u64> {
        TaskRepository::count_for_list(&self.storage.conn, list_id).await
    }

    /// Creates a local task. It reaches the remote store on the next push.
    ///
    /// # Returns
    /// The stored task, DIRTY and without a remote id
    pub async fn create_task(&self, new_task: NewTask) -> Result<task::Model> {
        let conn = &self.storage.conn;
        let active = task::ActiveModel {
            id: NotSet,
            remote_id: Set(None),
            title: Set(new_task.title),
            description: Set(new_task.description),
            is_done: Set(false),
            image_ref: Set(new_task.image_ref),
            priority: Set(new_task.priority),
            due_date: Set(new_task.due_date),
            list_id: Set(new_task.list_id.unwrap_or(DEFAULT_LIST_ID)),
            updated_at: Set(datetime::now_millis()),
            sync_state: Set(SyncState::Dirty),
        };

        let id = TaskRepository::upsert(conn, active).await?;
        TaskRepository::get_by_id(conn, id)
            .await?
            .ok_or_else(|| SyncError::TaskNotFound(id).into())
    }

    /// Saves the content of an edited task and marks it DIRTY.
    ///
    /// Only the content fields of `task` are used. The remote id stays the one
    /// stored locally, and `updated_at` never moves backwards.
    ///
    /// # Errors
    /// Returns [`SyncError::TaskNotFound`] if the task does not exist or is
    /// pending deletion
    pub async fn update_task(&self, task: task::Model) -> Result<task::Model> {
        let conn = &self.storage.conn;
        let existing = TaskRepository::get_by_id(conn, task.id)
            .await?
            .filter(|existing| !existing.is_deleted())
            .ok_or(SyncError::TaskNotFound(task.id))?;

        let active = task::ActiveModel {
            id: Unchanged(existing.id),
            remote_id: NotSet,
            title: Set(task.title),
            description: Set(task.description),
            is_done: Set(task.is_done),
            image_ref: Set(task.image_ref),
            priority: Set(task.priority),
            due_date: Set(task.due_date),
            list_id: Set(task.list_id),
            updated_at: Set(datetime::next_stamp(Some(existing.updated_at))),
            sync_state: Set(SyncState::Dirty),
        };

        TaskRepository::upsert(conn, active).await?;
        TaskRepository::get_by_id(conn, existing.id)
            .await?
            .ok_or_else(|| SyncError::TaskNotFound(existing.id).into())
    }

    /// Marks a task done or not done.
    pub async fn set_task_done(&self, id: i32, is_done: bool) -> Result<task::Model> {
        let existing = TaskRepository::get_by_id(&self.storage.conn, id)
            .await?
            .ok_or(SyncError::TaskNotFound(id))?;
        self.update_task(task::Model { is_done, ..existing }).await
    }

    /// Soft-deletes a task. The row is removed for good by the next push.
    ///
    /// # Errors
    /// Returns [`SyncError::TaskNotFound`] if the task does not exist
    pub async fn delete_task(&self, id: i32) -> Result<()> {
        let conn = &self.storage.conn;
        let existing = TaskRepository::get_by_id(conn, id)
            .await?
            .ok_or(SyncError::TaskNotFound(id))?;

        let active = task::ActiveModel {
            id: Unchanged(existing.id),
            updated_at: Set(datetime::next_stamp(Some(existing.updated_at))),
            sync_state: Set(SyncState::Deleted),
            ..Default::default()
        };
        TaskRepository::upsert(conn, active).await?;
        Ok(())
    }

    /// Removes every local task without touching the remote store.
    pub async fn delete_all_tasks(&self) -> Result<u64> {
        let removed = TaskRepository::delete_all(&self.storage.conn).await?;
        info!("🗑️ Removed {} local tasks", removed);
        Ok(removed)
    }
}
