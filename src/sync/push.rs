use anyhow::{Context, Result};
use log::{debug, info};

use crate::backend::RemoteTask;
use crate::entities::task::SyncState;
use crate::repositories::TaskRepository;
use crate::sync::SyncService;

/// Counters of a push.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushReport {
    /// Dirty tasks written to the remote store
    pub pushed: usize,
    /// Soft-deleted tasks removed locally
    pub deleted: usize,
    /// Pushed tasks edited again while the push was running; they stay dirty
    pub still_dirty: usize,
}

impl SyncService {
    /// Send every dirty or deleted task to the remote store.
    ///
    /// Deleted tasks are removed remotely (when they ever reached the remote
    /// store) and then physically removed locally. Dirty tasks are upserted
    /// and marked SYNCED, unless they were edited again in the meantime.
    ///
    /// The first remote error aborts the push; remote writes already made are
    /// kept and re-running the push is safe.
    pub async fn sync_push(&self) -> Result<PushReport> {
        let conn = &self.storage.conn;
        let pending = TaskRepository::get_dirty_or_deleted(conn).await?;
        if pending.is_empty() {
            debug!("Nothing to push");
            return Ok(PushReport::default());
        }

        info!("⬆️ Pushing {} local changes...", pending.len());

        let mut deleted_ids = Vec::new();
        let mut pushed = Vec::new();

        for task in pending {
            match task.sync_state {
                SyncState::Deleted => {
                    if let Some(remote_id) = &task.remote_id {
                        self.remote
                            .delete_task_by_remote_id(remote_id, task.list_id)
                            .await
                            .with_context(|| format!("Failed to delete remote task {}", remote_id))?;
                    }
                    deleted_ids.push(task.id);
                }
                SyncState::Dirty => {
                    let payload = RemoteTask::from_local(&task, task.list_id);
                    let assigned = self
                        .remote
                        .upsert_task(&payload, task.list_id)
                        .await
                        .with_context(|| format!("Failed to push task {}", task.id))?;

                    if let Some(remote_id) = assigned.filter(|id| task.remote_id.as_ref() != Some(id)) {
                        TaskRepository::set_remote_id(conn, task.id, &remote_id).await?;
                    }
                    pushed.push((task.id, task.updated_at));
                }
                SyncState::Synced => {}
            }
        }

        let deleted = TaskRepository::delete_by_ids(conn, &deleted_ids).await? as usize;
        let marked = TaskRepository::mark_synced_unchanged(conn, &pushed).await? as usize;

        let report = PushReport {
            pushed: pushed.len(),
            deleted,
            still_dirty: pushed.len() - marked.min(pushed.len()),
        };
        if report.still_dirty > 0 {
            info!("✏️ {} tasks changed during push and stay dirty", report.still_dirty);
        }
        info!("✅ Pushed {} tasks, removed {} deleted tasks", report.pushed, report.deleted);

        Ok(report)
    }
}
