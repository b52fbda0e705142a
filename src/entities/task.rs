use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Identity of the list every task belongs to unless told otherwise.
pub const DEFAULT_LIST_ID: i32 = 1;

/// Local dirty-tracking state of a task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum SyncState {
    #[sea_orm(string_value = "SYNCED")]
    Synced,
    #[sea_orm(string_value = "DIRTY")]
    Dirty,
    #[sea_orm(string_value = "DELETED")]
    Deleted,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
pub enum Priority {
    #[sea_orm(num_value = 0)]
    Low,
    #[default]
    #[sea_orm(num_value = 1)]
    Normal,
    #[sea_orm(num_value = 2)]
    High,
}

impl Priority {
    /// Wire value used by remote stores (0 = Low, 1 = Normal, 2 = High).
    pub fn as_i32(self) -> i32 {
        match self {
            Priority::Low => 0,
            Priority::Normal => 1,
            Priority::High => 2,
        }
    }

    /// Unknown values fall back to `Normal`.
    pub fn from_i32(value: i32) -> Self {
        match value {
            0 => Priority::Low,
            2 => Priority::High,
            _ => Priority::Normal,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tasks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(indexed)]
    pub remote_id: Option<String>,
    pub title: String,
    pub description: String,
    pub is_done: bool,
    pub image_ref: Option<String>,
    pub priority: Priority,
    pub due_date: Option<DateTimeUtc>,
    #[sea_orm(indexed)]
    pub list_id: i32,
    pub updated_at: DateTimeUtc,
    pub sync_state: SyncState,
}

// Mapping rows reference tasks by id without a foreign key: orphans are
// tolerated and purged explicitly before each calendar import.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl Model {
    pub fn is_deleted(&self) -> bool {
        self.sync_state == SyncState::Deleted
    }
}

impl ActiveModelBehavior for ActiveModel {}
