//! Calendar import mapping repository.
//!
//! Only the calendar import/export engine reads or writes this table.

use std::collections::HashMap;

use anyhow::Result;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, QueryTrait,
};

use crate::entities::{calendar_import_map, task};

/// Repository for the event-to-task mapping table.
pub struct CalendarImportMapRepository;

impl CalendarImportMapRepository {
    pub async fn get_all<C>(conn: &C) -> Result<Vec<calendar_import_map::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(calendar_import_map::Entity::find()
            .order_by_asc(calendar_import_map::Column::Id)
            .all(conn)
            .await?)
    }

    pub async fn get_all_event_ids<C>(conn: &C) -> Result<Vec<String>>
    where
        C: ConnectionTrait,
    {
        Ok(calendar_import_map::Entity::find()
            .select_only()
            .column(calendar_import_map::Column::EventId)
            .into_tuple::<String>()
            .all(conn)
            .await?)
    }

    /// The event id of the most recent mapping of a task.
    pub async fn get_latest_event_id_for_task<C>(conn: &C, task_id: i32) -> Result<Option<String>>
    where
        C: ConnectionTrait,
    {
        Ok(calendar_import_map::Entity::find()
            .filter(calendar_import_map::Column::TaskId.eq(task_id))
            .order_by_desc(calendar_import_map::Column::ImportedAt)
            .order_by_desc(calendar_import_map::Column::Id)
            .one(conn)
            .await?
            .map(|mapping| mapping.event_id))
    }

    /// The most recent event id per task, across the whole table.
    pub async fn get_latest_by_task<C>(conn: &C) -> Result<HashMap<i32, String>>
    where
        C: ConnectionTrait,
    {
        let mut latest: HashMap<i32, calendar_import_map::Model> = HashMap::new();
        for mapping in Self::get_all(conn).await? {
            let newer = match latest.get(&mapping.task_id) {
                Some(current) => (mapping.imported_at, mapping.id) > (current.imported_at, current.id),
                None => true,
            };
            if newer {
                latest.insert(mapping.task_id, mapping);
            }
        }

        Ok(latest
            .into_iter()
            .map(|(task_id, mapping)| (task_id, mapping.event_id))
            .collect())
    }

    /// Insert a mapping unless its event id is already present.
    ///
    /// Returns `true` when a row was written.
    pub async fn insert_if_new<C>(conn: &C, event_id: &str, task_id: i32) -> Result<bool>
    where
        C: ConnectionTrait,
    {
        let mapping = calendar_import_map::ActiveModel {
            id: ActiveValue::NotSet,
            event_id: ActiveValue::Set(event_id.to_string()),
            task_id: ActiveValue::Set(task_id),
            imported_at: ActiveValue::Set(Utc::now()),
        };

        let inserted = calendar_import_map::Entity::insert(mapping)
            .on_conflict(
                OnConflict::column(calendar_import_map::Column::EventId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await?;

        Ok(inserted > 0)
    }

    pub async fn delete_by_task_id<C>(conn: &C, task_id: i32) -> Result<u64>
    where
        C: ConnectionTrait,
    {
        let result = calendar_import_map::Entity::delete_many()
            .filter(calendar_import_map::Column::TaskId.eq(task_id))
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }

    /// Remove mappings whose task no longer exists.
    pub async fn delete_orphans<C>(conn: &C) -> Result<u64>
    where
        C: ConnectionTrait,
    {
        let result = calendar_import_map::Entity::delete_many()
            .filter(
                calendar_import_map::Column::TaskId.not_in_subquery(
                    task::Entity::find()
                        .select_only()
                        .column(task::Column::Id)
                        .into_query(),
                ),
            )
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn delete_all<C>(conn: &C) -> Result<u64>
    where
        C: ConnectionTrait,
    {
        Ok(calendar_import_map::Entity::delete_many().exec(conn).await?.rows_affected)
    }
}
