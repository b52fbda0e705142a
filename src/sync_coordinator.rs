//! Caller-side serialization of sync and calendar operations.

use std::sync::Arc;

use log::{info, warn};
use tokio::sync::Mutex;

use crate::calendar::{CalendarService, ExportOutcome, ImportOutcome};
use crate::error::SyncFailure;
use crate::sync::{SyncOutcome, SyncService};

/// Errors returned by the coordinator itself.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error("Another sync or calendar operation is already running")]
    Busy,

    #[error("{0}")]
    Failed(SyncFailure),
}

impl From<SyncFailure> for CoordinatorError {
    fn from(failure: SyncFailure) -> Self {
        CoordinatorError::Failed(failure)
    }
}

/// Result of [`SyncCoordinator::sync_now`].
#[derive(Debug, Clone)]
pub struct SyncRun {
    pub outcome: SyncOutcome,
    /// Present when a calendar export ran after a successful sync
    pub export: Option<Result<ExportOutcome, SyncFailure>>,
}

/// Runs at most one sync or calendar operation at a time.
///
/// A call made while another one is outstanding returns
/// [`CoordinatorError::Busy`] immediately instead of queueing.
#[derive(Clone)]
pub struct SyncCoordinator {
    sync: SyncService,
    calendar: CalendarService,
    import_window_days: u32,
    export_after_sync: bool,
    running: Arc<Mutex<()>>,
}

impl SyncCoordinator {
    pub fn new(sync: SyncService, calendar: CalendarService, import_window_days: u32, export_after_sync: bool) -> Self {
        Self {
            sync,
            calendar,
            import_window_days,
            export_after_sync,
            running: Arc::new(Mutex::new(())),
        }
    }

    pub fn sync_service(&self) -> &SyncService {
        &self.sync
    }

    pub fn calendar_service(&self) -> &CalendarService {
        &self.calendar
    }

    /// Whether an operation is currently running.
    pub fn is_busy(&self) -> bool {
        self.running.try_lock().is_err()
    }

    /// Sync with the remote store, then export to the calendar if enabled.
    pub async fn sync_now(&self) -> Result<SyncRun, CoordinatorError> {
        let _guard = self.running.try_lock().map_err(|_| CoordinatorError::Busy)?;

        let outcome = self.sync.sync_now().await;
        let export = if outcome.is_success() && self.export_after_sync {
            info!("📤 Exporting to calendar after sync");
            let result = self.calendar.sync_tasks_to_calendar().await;
            if let Err(failure) = &result {
                warn!("⚠️ Export after sync failed: {}", failure.message);
            }
            Some(result)
        } else {
            None
        };

        Ok(SyncRun { outcome, export })
    }

    /// Import calendar events over the configured window.
    pub async fn import_calendar(&self) -> Result<ImportOutcome, CoordinatorError> {
        let _guard = self.running.try_lock().map_err(|_| CoordinatorError::Busy)?;
        Ok(self.calendar.import_calendar(self.import_window_days).await?)
    }

    pub async fn export_to_calendar(&self) -> Result<ExportOutcome, CoordinatorError> {
        let _guard = self.running.try_lock().map_err(|_| CoordinatorError::Busy)?;
        Ok(self.calendar.sync_tasks_to_calendar().await?)
    }

    pub async fn clear_import_history(&self) -> Result<u64, CoordinatorError> {
        let _guard = self.running.try_lock().map_err(|_| CoordinatorError::Busy)?;
        Ok(self.calendar.clear_import_history().await?)
    }
}
