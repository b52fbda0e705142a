use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use log::info;
use sea_orm::sea_query::{Index, OnConflict};
use sea_orm::{
    ActiveValue, ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema,
};

use crate::entities::{calendar_import_map, list_member, task, task_list};

/// Name of the list seeded with [`task::DEFAULT_LIST_ID`] on first start.
pub const DEFAULT_LIST_NAME: &str = "My Tasks";

// An in-memory SQLite database lives exactly as long as its connection, so the
// pool must never recycle it.
const MEMORY_CONNECTION_LIFETIME: Duration = Duration::from_secs(60 * 60 * 24 * 365);

/// Local storage backed by SQLite through SeaORM.
///
/// The storage engine serializes concurrent reads and writes itself; callers
/// share it behind an `Arc` without additional locking.
pub struct LocalStorage {
    pub conn: DatabaseConnection,
}

impl LocalStorage {
    /// Open (or create) the database at `database_path`, or an in-memory
    /// database when no path is given.
    pub async fn new(database_path: Option<&Path>) -> Result<Self> {
        let options = match database_path {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("Failed to create database directory: {}", parent.display()))?;
                }
                let mut options = ConnectOptions::new(format!("sqlite://{}?mode=rwc", path.display()));
                options.max_connections(4).sqlx_logging(false);
                options
            }
            None => {
                let mut options = ConnectOptions::new("sqlite::memory:".to_string());
                options
                    .min_connections(1)
                    .max_connections(1)
                    .idle_timeout(MEMORY_CONNECTION_LIFETIME)
                    .max_lifetime(MEMORY_CONNECTION_LIFETIME)
                    .sqlx_logging(false);
                options
            }
        };

        let conn = Database::connect(options).await?;
        let storage = LocalStorage { conn };
        storage.init_schema().await?;

        match database_path {
            Some(path) => info!("💾 Local storage ready at {}", path.display()),
            None => info!("💾 Local storage ready (in-memory)"),
        }

        Ok(storage)
    }

    /// In-memory storage, used by tests and by the default configuration.
    pub async fn in_memory() -> Result<Self> {
        Self::new(None).await
    }

    /// Create tables and indexes if missing, then seed the default list.
    async fn init_schema(&self) -> Result<()> {
        let schema = Schema::new(self.conn.get_database_backend());

        self.create_table(&schema, task_list::Entity).await?;
        self.create_table(&schema, task::Entity).await?;
        self.create_table(&schema, list_member::Entity).await?;
        self.create_table(&schema, calendar_import_map::Entity).await?;

        let members_unique = Index::create()
            .name("idx-list_members-list_id-user_id")
            .table(list_member::Entity)
            .col(list_member::Column::ListId)
            .col(list_member::Column::UserId)
            .unique()
            .if_not_exists()
            .to_owned();
        let backend = self.conn.get_database_backend();
        self.conn.execute(backend.build(&members_unique)).await?;

        self.seed_default_list().await
    }

    async fn create_table<E>(&self, schema: &Schema, entity: E) -> Result<()>
    where
        E: EntityTrait + Copy,
    {
        let backend = self.conn.get_database_backend();

        let mut table = schema.create_table_from_entity(entity);
        table.if_not_exists();
        self.conn.execute(backend.build(&table)).await?;

        for mut index in schema.create_index_from_entity(entity) {
            index.if_not_exists();
            self.conn.execute(backend.build(&index)).await?;
        }

        Ok(())
    }

    async fn seed_default_list(&self) -> Result<()> {
        let default_list = task_list::ActiveModel {
            id: ActiveValue::Set(task::DEFAULT_LIST_ID),
            name: ActiveValue::Set(DEFAULT_LIST_NAME.to_string()),
            owner_id: ActiveValue::Set(None),
            remote_id: ActiveValue::Set(None),
            updated_at: ActiveValue::Set(Utc::now()),
        };

        task_list::Entity::insert(default_list)
            .on_conflict(OnConflict::column(task_list::Column::Id).do_nothing().to_owned())
            .exec_without_returning(&self.conn)
            .await?;

        Ok(())
    }

    /// Clear all data from the database, keeping the default list.
    pub async fn clear_all_data(&self) -> Result<()> {
        calendar_import_map::Entity::delete_many().exec(&self.conn).await?;
        list_member::Entity::delete_many().exec(&self.conn).await?;
        task::Entity::delete_many().exec(&self.conn).await?;
        task_list::Entity::delete_many().exec(&self.conn).await?;
        self.seed_default_list().await
    }
}
