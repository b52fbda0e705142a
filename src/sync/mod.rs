//! Synchronization service module for tasksync.
//!
//! This module provides the [`SyncService`] struct which reconciles the local
//! task store with a remote task store. Local edits are tracked with a
//! three-state flag on every task (SYNCED, DIRTY, DELETED); a sync pushes
//! every pending local change and then pulls the remote state, never letting
//! a remote copy overwrite a change that has not been pushed yet.
//!
//! The service also carries the local mutation API used by front-ends:
//! - Task creation, edits and soft deletion, each marking the task dirty
//! - List management and list sharing
//! - Read access for list and task views

pub mod lists;
pub mod pull;
pub mod push;
pub mod tasks;

use std::sync::Arc;

use anyhow::Result;
use log::{error, info};

use crate::backend::RemoteTaskStore;
use crate::error::SyncFailure;
use crate::storage::LocalStorage;

pub use pull::PullReport;
pub use push::PushReport;
pub use tasks::NewTask;

/// Service that keeps local storage and a remote task store in sync.
///
/// The service holds no locks of its own: the database serializes access,
/// and callers that need at most one sync in flight go through
/// [`crate::sync_coordinator::SyncCoordinator`].
///
/// # Example
/// ```rust,no_run
/// use std::sync::Arc;
/// use tasksync::backend::FakeRemoteTaskStore;
/// use tasksync::storage::LocalStorage;
/// use tasksync::sync::{NewTask, SyncOutcome, SyncService};
///
/// # async fn example() -> anyhow::Result<()> {
/// let storage = Arc::new(LocalStorage::in_memory().await?);
/// let sync_service = SyncService::new(storage, Arc::new(FakeRemoteTaskStore::new()));
///
/// sync_service.create_task(NewTask::titled("Buy milk")).await?;
/// if let SyncOutcome::Failure(failure) = sync_service.sync_now().await {
///     eprintln!("sync failed: {}", failure.message);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SyncService {
    storage: Arc<LocalStorage>,
    remote: Arc<dyn RemoteTaskStore>,
}

/// Counters of a completed sync.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub push: PushReport,
    pub pull: PullReport,
}

/// Result of a full sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Push and pull both completed
    Success(SyncReport),
    /// The sync stopped at the first error. Changes committed before that
    /// point are kept.
    Failure(SyncFailure),
}

impl SyncOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SyncOutcome::Success(_))
    }
}

impl SyncService {
    pub fn new(storage: Arc<LocalStorage>, remote: Arc<dyn RemoteTaskStore>) -> Self {
        Self { storage, remote }
    }

    pub fn storage(&self) -> &Arc<LocalStorage> {
        &self.storage
    }

    pub fn backend_type(&self) -> &str {
        self.remote.backend_type()
    }

    /// Push local changes, then pull the remote state.
    ///
    /// Pull runs only after push has finished so that it sees the remote ids
    /// assigned during push. Every error is caught and reported as
    /// [`SyncOutcome::Failure`].
    pub async fn sync_now(&self) -> SyncOutcome {
        info!("🔄 Starting sync process...");

        match self.perform_sync().await {
            Ok(report) => {
                info!(
                    "✅ Sync complete: {} pushed, {} deleted, {} pulled, {} updated",
                    report.push.pushed, report.push.deleted, report.pull.inserted, report.pull.updated
                );
                SyncOutcome::Success(report)
            }
            Err(e) => {
                error!("❌ Sync failed: {:#}", e);
                SyncOutcome::Failure(SyncFailure::from_error(&e))
            }
        }
    }

    async fn perform_sync(&self) -> Result<SyncReport> {
        let push = self.sync_push().await?;
        let pull = self.sync_pull().await?;
        Ok(SyncReport { push, pull })
    }
}
