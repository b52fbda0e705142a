use anyhow::{Context, Result};
use log::{info, warn};

use crate::entities::{list_member, task_list};
use crate::error::SyncError;
use crate::repositories::{ListMemberRepository, TaskListRepository, TaskRepository};
use crate::sync::SyncService;

pub const ROLE_OWNER: &str = "owner";
pub const ROLE_MEMBER: &str = "member";

impl SyncService {
    /// Retrieves all lists from local storage.
    pub async fn get_lists(&self) -> Result<Vec<task_list::Model>> {
        TaskListRepository::get_all(&self.storage.conn).await
    }

    /// Retrieves all lists together with their number of live tasks.
    pub async fn get_lists_with_counts(&self) -> Result<Vec<(task_list::Model, u64)>> {
        let conn = &self.storage.conn;
        let mut counted = Vec::new();
        for list in TaskListRepository::get_all(conn).await? {
            let count = TaskRepository::count_for_list(conn, list.id).await?;
            counted.push((list, count));
        }
        Ok(counted)
    }

    /// Creates a local list. Creating a list whose name already exists
    /// returns the existing one.
    pub async fn create_list(&self, name: &str) -> Result<task_list::Model> {
        let name = name.trim();
        if name.is_empty() {
            anyhow::bail!("List name cannot be empty");
        }
        let list = TaskListRepository::get_or_create(&self.storage.conn, name).await?;
        info!("📋 List ready: {} ({})", list.name, list.id);
        Ok(list)
    }

    /// Returns the list called `name`, creating it if needed.
    pub async fn get_or_create_list(&self, name: &str) -> Result<task_list::Model> {
        TaskListRepository::get_or_create(&self.storage.conn, name).await
    }

    /// Shares a list with another user.
    ///
    /// When the remote store accepts, the invited user is recorded as a member
    /// and the current user as owner.
    ///
    /// # Returns
    /// Whether the remote store accepted the invitation
    ///
    /// # Errors
    /// Returns [`SyncError::ListNotFound`] if the list does not exist locally
    pub async fn share_list(&self, list_id: i32, invited_user_id: &str, current_user_id: &str) -> Result<bool> {
        TaskListRepository::get_by_id(&self.storage.conn, list_id)
            .await?
            .ok_or_else(|| SyncError::ListNotFound(list_id.to_string()))?;

        let accepted = self
            .remote
            .share_list(list_id, &[invited_user_id.to_string()])
            .await
            .with_context(|| format!("Failed to share list {}", list_id))?;

        if !accepted {
            warn!("⚠️ Remote store refused to share list {} with {}", list_id, invited_user_id);
            return Ok(false);
        }

        ListMemberRepository::upsert_all(
            &self.storage.conn,
            vec![
                (list_id, invited_user_id.to_string(), ROLE_MEMBER.to_string()),
                (list_id, current_user_id.to_string(), ROLE_OWNER.to_string()),
            ],
        )
        .await?;

        info!("🤝 Shared list {} with {}", list_id, invited_user_id);
        Ok(true)
    }

    /// Members of a list as recorded locally.
    pub async fn get_members(&self, list_id: i32) -> Result<Vec<list_member::Model>> {
        ListMemberRepository::get_for_list(&self.storage.conn, list_id).await
    }
}
