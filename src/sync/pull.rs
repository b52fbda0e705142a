use anyhow::{Context, Result};
use log::{debug, info};

use crate::entities::task::{SyncState, DEFAULT_LIST_ID};
use crate::repositories::TaskRepository;
use crate::sync::SyncService;

/// Counters of a pull.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullReport {
    /// Remote tasks inserted as new local tasks
    pub inserted: usize,
    /// Synced local tasks overwritten with the remote copy
    pub updated: usize,
    /// Remote tasks whose local copy has unpushed changes
    pub kept_local: usize,
}

impl SyncService {
    /// Merge the remote default list into local storage.
    ///
    /// A local task is overwritten only while it is SYNCED; dirty and deleted
    /// tasks keep their local state until the next push. Remote tasks without
    /// a remote id are ignored, and tasks deleted remotely are not removed
    /// locally.
    pub async fn sync_pull(&self) -> Result<PullReport> {
        let conn = &self.storage.conn;
        let remote_tasks = self
            .remote
            .fetch_tasks(DEFAULT_LIST_ID)
            .await
            .context("Failed to fetch remote tasks")?;

        info!("⬇️ Fetched {} tasks from remote", remote_tasks.len());

        let mut report = PullReport::default();
        for remote in remote_tasks {
            let Some(remote_id) = remote.remote_id.clone() else {
                debug!("Ignoring remote task without id: {}", remote.title);
                continue;
            };

            match TaskRepository::get_by_remote_id(conn, &remote_id).await? {
                Some(local) if local.sync_state == SyncState::Synced => {
                    if TaskRepository::replace_if_synced(conn, remote.apply_to(local)).await? {
                        report.updated += 1;
                    } else {
                        report.kept_local += 1;
                    }
                }
                Some(_) => report.kept_local += 1,
                None => {
                    TaskRepository::upsert(conn, remote.into_new_local()).await?;
                    report.inserted += 1;
                }
            }
        }

        info!(
            "✅ Pulled {} new tasks, updated {}, kept {} local changes",
            report.inserted, report.updated, report.kept_local
        );
        Ok(report)
    }
}
