//! Task repository for database operations.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, PaginatorTrait,
    QueryFilter, QueryOrder,
};

use crate::entities::task::{self, SyncState};

/// Repository for task-related database operations.
///
/// This is the local task store the sync and calendar engines are written against.
pub struct TaskRepository;

impl TaskRepository {
    /// Get a single task by local id.
    pub async fn get_by_id<C>(conn: &C, id: i32) -> Result<Option<task::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(task::Entity::find_by_id(id).one(conn).await?)
    }

    /// Get a single task by remote_id.
    pub async fn get_by_remote_id<C>(conn: &C, remote_id: &str) -> Result<Option<task::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(task::Entity::find()
            .filter(task::Column::RemoteId.eq(remote_id))
            .one(conn)
            .await?)
    }

    /// Get every task with an unpushed local change (dirty or soft-deleted).
    pub async fn get_dirty_or_deleted<C>(conn: &C) -> Result<Vec<task::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(task::Entity::find()
            .filter(task::Column::SyncState.is_in([SyncState::Dirty, SyncState::Deleted]))
            .order_by_asc(task::Column::Id)
            .all(conn)
            .await?)
    }

    /// Get all tasks that are not soft-deleted, newest first.
    pub async fn get_all_active<C>(conn: &C) -> Result<Vec<task::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(task::Entity::find()
            .filter(task::Column::SyncState.ne(SyncState::Deleted))
            .order_by_desc(task::Column::Id)
            .all(conn)
            .await?)
    }

    /// Get the non-deleted tasks of a list, newest first.
    pub async fn get_by_list<C>(conn: &C, list_id: i32) -> Result<Vec<task::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(task::Entity::find()
            .filter(task::Column::ListId.eq(list_id))
            .filter(task::Column::SyncState.ne(SyncState::Deleted))
            .order_by_desc(task::Column::Id)
            .all(conn)
            .await?)
    }

    pub async fn count_for_list<C>(conn: &C, list_id: i32) -> Result<u64>
    where
        C: ConnectionTrait,
    {
        Ok(task::Entity::find()
            .filter(task::Column::ListId.eq(list_id))
            .filter(task::Column::SyncState.ne(SyncState::Deleted))
            .count(conn)
            .await?)
    }

    /// Insert a new task or replace an existing one, returning its local id.
    ///
    /// A task whose id is unset, or whose id no longer exists, is inserted as
    /// a new row with a freshly assigned id.
    pub async fn upsert<C>(conn: &C, mut task: task::ActiveModel) -> Result<i32>
    where
        C: ConnectionTrait,
    {
        let existing_id = match &task.id {
            ActiveValue::Set(id) | ActiveValue::Unchanged(id) => Some(*id),
            ActiveValue::NotSet => None,
        };
        let exists = match existing_id {
            Some(id) => task::Entity::find_by_id(id).one(conn).await?.is_some(),
            None => false,
        };

        let saved = if exists {
            task.update(conn).await?
        } else {
            task.id = ActiveValue::NotSet;
            task.insert(conn).await?
        };
        Ok(saved.id)
    }

    /// Overwrite the stored row with `model` only if that row is still SYNCED.
    ///
    /// Returns `false` when the row was edited locally (or is gone) and was
    /// left untouched.
    pub async fn replace_if_synced<C>(conn: &C, model: task::Model) -> Result<bool>
    where
        C: ConnectionTrait,
    {
        let id = model.id;
        let mut active = model.into_active_model().reset_all();
        active.id = ActiveValue::NotSet;

        let result = task::Entity::update_many()
            .set(active)
            .filter(task::Column::Id.eq(id))
            .filter(task::Column::SyncState.eq(SyncState::Synced))
            .exec(conn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Mark the given tasks as synced.
    pub async fn mark_synced<C>(conn: &C, ids: &[i32]) -> Result<u64>
    where
        C: ConnectionTrait,
    {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = task::Entity::update_many()
            .col_expr(task::Column::SyncState, Expr::value(SyncState::Synced))
            .filter(task::Column::Id.is_in(ids.iter().copied()))
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }

    /// Mark tasks as synced only if they were not edited again since the
    /// snapshot taken at `updated_at`. Returns the number of rows marked.
    pub async fn mark_synced_unchanged<C>(conn: &C, pushed: &[(i32, DateTime<Utc>)]) -> Result<u64>
    where
        C: ConnectionTrait,
    {
        let mut marked = 0;
        for (id, updated_at) in pushed {
            let result = task::Entity::update_many()
                .col_expr(task::Column::SyncState, Expr::value(SyncState::Synced))
                .filter(task::Column::Id.eq(*id))
                .filter(task::Column::UpdatedAt.eq(*updated_at))
                .filter(task::Column::SyncState.eq(SyncState::Dirty))
                .exec(conn)
                .await?;
            marked += result.rows_affected;
        }
        Ok(marked)
    }

    /// Record the remote identity assigned to a task without touching its content.
    pub async fn set_remote_id<C>(conn: &C, id: i32, remote_id: &str) -> Result<()>
    where
        C: ConnectionTrait,
    {
        task::Entity::update_many()
            .col_expr(task::Column::RemoteId, Expr::value(remote_id))
            .filter(task::Column::Id.eq(id))
            .exec(conn)
            .await?;
        Ok(())
    }

    /// Physically remove tasks by local id.
    pub async fn delete_by_ids<C>(conn: &C, ids: &[i32]) -> Result<u64>
    where
        C: ConnectionTrait,
    {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = task::Entity::delete_many()
            .filter(task::Column::Id.is_in(ids.iter().copied()))
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn delete_all<C>(conn: &C) -> Result<u64>
    where
        C: ConnectionTrait,
    {
        Ok(task::Entity::delete_many().exec(conn).await?.rows_affected)
    }
}
