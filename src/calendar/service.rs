//! Calendar import/export engine.
//!
//! Import turns calendar events into local tasks, recording which event each
//! task came from. Export writes local tasks back to the calendar and records
//! the event each task now lives in. Both directions share the mapping table,
//! which is what keeps an event from being imported twice.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use sea_orm::ActiveValue::{NotSet, Set};

use super::{is_import_only, CalendarEvent, CalendarSource, EventPayload, EventRef};
use crate::backend::BackendError;
use crate::entities::task::{self, Priority, SyncState};
use crate::error::SyncFailure;
use crate::repositories::{CalendarImportMapRepository, TaskListRepository, TaskRepository};
use crate::storage::LocalStorage;
use crate::utils::datetime::now_millis;

/// Result of a calendar import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOutcome {
    pub imported: usize,
    pub skipped: usize,
    pub list_id: i32,
    pub total_events: usize,
}

/// Result of exporting tasks to a calendar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportOutcome {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
}

/// Engine moving data between local tasks and a calendar source.
#[derive(Clone)]
pub struct CalendarService {
    storage: Arc<LocalStorage>,
    source: Arc<dyn CalendarSource>,
    imported_list_name: String,
}

impl CalendarService {
    pub fn new(storage: Arc<LocalStorage>, source: Arc<dyn CalendarSource>, imported_list_name: impl Into<String>) -> Self {
        Self {
            storage,
            source,
            imported_list_name: imported_list_name.into(),
        }
    }

    pub fn source_type(&self) -> &str {
        self.source.source_type()
    }

    pub fn required_import_scopes(&self) -> Vec<String> {
        self.source.import_scopes()
    }

    pub fn required_sync_scopes(&self) -> Vec<String> {
        self.source.sync_scopes()
    }

    /// Import the events of the next `window_days` days as tasks of the
    /// imported list. Events already mapped to a task are skipped.
    pub async fn import_calendar(&self, window_days: u32) -> Result<ImportOutcome, SyncFailure> {
        self.perform_import(window_days).await.map_err(|e| {
            error!("❌ Calendar import failed: {:#}", e);
            SyncFailure::from_error(&e)
        })
    }

    /// Push every non-deleted task to the calendar, updating the event it was
    /// last mapped to or creating a new one.
    pub async fn sync_tasks_to_calendar(&self) -> Result<ExportOutcome, SyncFailure> {
        self.perform_export().await.map_err(|e| {
            error!("❌ Calendar export failed: {:#}", e);
            SyncFailure::from_error(&e)
        })
    }

    /// Forget every event-to-task mapping. Tasks are left in place, so the
    /// next import creates fresh copies of events already imported.
    pub async fn clear_import_history(&self) -> Result<u64, SyncFailure> {
        CalendarImportMapRepository::delete_all(&self.storage.conn)
            .await
            .map(|removed| {
                info!("🧹 Cleared {} calendar import mappings", removed);
                removed
            })
            .map_err(|e| SyncFailure::from_error(&e))
    }

    async fn perform_import(&self, window_days: u32) -> Result<ImportOutcome> {
        info!("📅 Importing calendar events for the next {} days...", window_days);
        let conn = &self.storage.conn;

        let list = TaskListRepository::get_or_create(conn, &self.imported_list_name).await?;

        let purged = CalendarImportMapRepository::delete_orphans(conn).await?;
        if purged > 0 {
            debug!("Removed {} import mappings of deleted tasks", purged);
        }

        let events = self
            .source
            .fetch_events(window_days)
            .await
            .context("Failed to fetch calendar events")?;
        let total_events = events.len();

        let mut known: HashSet<String> = CalendarImportMapRepository::get_all_event_ids(conn)
            .await?
            .into_iter()
            .collect();

        let mut imported = 0;
        let mut skipped = 0;
        for event in events {
            if !known.insert(event.event_id.clone()) {
                skipped += 1;
                continue;
            }

            let event_id = event.event_id.clone();
            let task_id = TaskRepository::upsert(conn, imported_task(event, list.id)).await?;

            if !CalendarImportMapRepository::insert_if_new(conn, &event_id, task_id).await? {
                // Another import mapped this event in the meantime
                TaskRepository::delete_by_ids(conn, &[task_id]).await?;
                skipped += 1;
                continue;
            }
            imported += 1;
        }

        info!(
            "✅ Calendar import complete: {} imported, {} skipped of {} events",
            imported, skipped, total_events
        );

        Ok(ImportOutcome {
            imported,
            skipped,
            list_id: list.id,
            total_events,
        })
    }

    async fn perform_export(&self) -> Result<ExportOutcome> {
        let Some(writer) = self.source.writer() else {
            debug!("Calendar source '{}' is read-only, nothing to export", self.source.source_type());
            return Ok(ExportOutcome::default());
        };

        let conn = &self.storage.conn;
        let tasks = TaskRepository::get_all_active(conn).await?;
        if tasks.is_empty() {
            return Ok(ExportOutcome::default());
        }

        info!("📤 Exporting {} tasks to calendar...", tasks.len());
        let existing = CalendarImportMapRepository::get_latest_by_task(conn).await?;

        let mut outcome = ExportOutcome::default();
        let mut new_refs: Vec<(i32, EventRef)> = Vec::new();

        for task in &tasks {
            if task.title.trim().is_empty() {
                outcome.skipped += 1;
                continue;
            }

            let existing_ref = existing.get(&task.id);
            if existing_ref.is_some_and(|event_id| is_import_only(event_id)) {
                outcome.skipped += 1;
                continue;
            }

            let payload = EventPayload::from_task(task);

            if let Some(target) = existing_ref.and_then(|event_id| EventRef::parse(event_id)) {
                match writer.update_event(&target, &payload).await {
                    Ok(updated) => {
                        new_refs.push((task.id, updated));
                        outcome.updated += 1;
                        continue;
                    }
                    Err(BackendError::NotFound(_)) => {
                        warn!("⚠️ Mapped event {} is gone, recreating for task {}", target, task.id);
                    }
                    Err(e) => {
                        return Err(e).with_context(|| format!("Failed to update event {} for task {}", target, task.id));
                    }
                }
            }

            match writer
                .create_event(&payload)
                .await
                .with_context(|| format!("Failed to create event for task {}", task.id))?
            {
                Some(created) => {
                    new_refs.push((task.id, created));
                    outcome.created += 1;
                }
                None => outcome.skipped += 1,
            }
        }

        for (task_id, event_ref) in new_refs {
            CalendarImportMapRepository::delete_by_task_id(conn, task_id).await?;
            CalendarImportMapRepository::insert_if_new(conn, &event_ref.to_string(), task_id).await?;
        }

        info!(
            "✅ Calendar export complete: {} created, {} updated, {} skipped",
            outcome.created, outcome.updated, outcome.skipped
        );
        Ok(outcome)
    }
}

fn imported_task(event: CalendarEvent, list_id: i32) -> task::ActiveModel {
    task::ActiveModel {
        id: NotSet,
        remote_id: Set(None),
        title: Set(event.title),
        description: Set(event.description),
        is_done: Set(false),
        image_ref: Set(None),
        priority: Set(Priority::Normal),
        due_date: Set(Some(event.start)),
        list_id: Set(list_id),
        updated_at: Set(now_millis()),
        sync_state: Set(SyncState::Dirty),
    }
}
