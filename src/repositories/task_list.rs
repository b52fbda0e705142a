//! Task list repository for database operations.

use anyhow::Result;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::entities::task_list;
use crate::error::SyncError;

/// Repository for list-related database operations.
pub struct TaskListRepository;

impl TaskListRepository {
    /// Get all lists, most recently updated first.
    pub async fn get_all<C>(conn: &C) -> Result<Vec<task_list::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(task_list::Entity::find()
            .order_by_desc(task_list::Column::UpdatedAt)
            .order_by_asc(task_list::Column::Id)
            .all(conn)
            .await?)
    }

    pub async fn get_by_id<C>(conn: &C, id: i32) -> Result<Option<task_list::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(task_list::Entity::find_by_id(id).one(conn).await?)
    }

    pub async fn get_by_name<C>(conn: &C, name: &str) -> Result<Option<task_list::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(task_list::Entity::find()
            .filter(task_list::Column::Name.eq(name))
            .one(conn)
            .await?)
    }

    /// Return the list called `name`, creating it first if needed.
    ///
    /// The insert ignores a conflict on the unique name, so concurrent callers
    /// all end up with the same row.
    pub async fn get_or_create<C>(conn: &C, name: &str) -> Result<task_list::Model>
    where
        C: ConnectionTrait,
    {
        let list = task_list::ActiveModel {
            id: ActiveValue::NotSet,
            name: ActiveValue::Set(name.to_string()),
            owner_id: ActiveValue::Set(None),
            remote_id: ActiveValue::Set(None),
            updated_at: ActiveValue::Set(Utc::now()),
        };

        task_list::Entity::insert(list)
            .on_conflict(OnConflict::column(task_list::Column::Name).do_nothing().to_owned())
            .exec_without_returning(conn)
            .await?;

        Self::get_by_name(conn, name)
            .await?
            .ok_or_else(|| SyncError::ListNotFound(name.to_string()).into())
    }
}
