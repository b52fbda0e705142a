mod common;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use tasksync::backend::BackendError;
use tasksync::calendar::{CalendarEvent, CalendarSource, FakeCalendarSource, MemoryCalendar};
use tasksync::entities::task::{Priority, SyncState};
use tasksync::error::FailureKind;
use tasksync::repositories::{CalendarImportMapRepository, TaskListRepository, TaskRepository};

use common::{calendar_service, event, storage};

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()
}

struct FailingSource;

#[async_trait]
impl CalendarSource for FailingSource {
    fn source_type(&self) -> &str {
        "failing"
    }

    async fn fetch_events(&self, _days: u32) -> Result<Vec<CalendarEvent>, BackendError> {
        Err(BackendError::Network("calendar unreachable".to_string()))
    }
}

#[tokio::test]
async fn test_import_creates_tasks_in_imported_list() {
    let storage = storage().await;
    let service = calendar_service(&storage, Arc::new(FakeCalendarSource::starting_on(monday())));

    let outcome = service.import_calendar(7).await.unwrap();
    assert_eq!(outcome.total_events, 13);
    assert_eq!(outcome.imported, 13);
    assert_eq!(outcome.skipped, 0);

    let list = TaskListRepository::get_by_name(&storage.conn, "Imported").await.unwrap().unwrap();
    assert_eq!(outcome.list_id, list.id);

    let tasks = TaskRepository::get_by_list(&storage.conn, list.id).await.unwrap();
    assert_eq!(tasks.len(), 13);
    assert!(tasks.iter().all(|t| t.sync_state == SyncState::Dirty));
    assert!(tasks.iter().all(|t| t.priority == Priority::Normal && !t.is_done));

    let standup = tasks
        .iter()
        .find(|t| t.title == "Daily Standup" && t.due_date == Some(Utc.with_ymd_and_hms(2025, 1, 6, 9, 0, 0).unwrap()))
        .expect("monday standup imported");
    assert_eq!(standup.description, "Team sync meeting");

    assert_eq!(CalendarImportMapRepository::get_all(&storage.conn).await.unwrap().len(), 13);
}

#[tokio::test]
async fn test_reimport_skips_known_events() {
    let storage = storage().await;
    let service = calendar_service(&storage, Arc::new(FakeCalendarSource::starting_on(monday())));

    service.import_calendar(7).await.unwrap();
    let again = service.import_calendar(7).await.unwrap();
    assert_eq!(again.imported, 0);
    assert_eq!(again.skipped, 13);

    // A wider window only brings in the new days
    let wider = service.import_calendar(8).await.unwrap();
    assert_eq!(wider.imported, 2, "the following monday's standup and lunch");
    assert_eq!(wider.skipped, 13);
}

#[tokio::test]
async fn test_duplicate_events_in_one_fetch_import_once() {
    let storage = storage().await;
    let calendar = Arc::new(MemoryCalendar::new());
    let start = Utc.with_ymd_and_hms(2025, 2, 3, 10, 0, 0).unwrap();
    calendar.add_event(event("dup", "Planning", start)).await;
    calendar.add_event(event("dup", "Planning", start)).await;
    calendar.add_event(event("other", "Retro", start)).await;

    let service = calendar_service(&storage, calendar);
    let outcome = service.import_calendar(30).await.unwrap();
    assert_eq!(outcome.total_events, 3);
    assert_eq!(outcome.imported, 2);
    assert_eq!(outcome.skipped, 1);
}

#[tokio::test]
async fn test_physically_removed_tasks_are_reimported() {
    let storage = storage().await;
    let service = calendar_service(&storage, Arc::new(FakeCalendarSource::starting_on(monday())));
    let first = service.import_calendar(1).await.unwrap();
    assert_eq!(first.imported, 2);

    let tasks = TaskRepository::get_by_list(&storage.conn, first.list_id).await.unwrap();
    TaskRepository::delete_by_ids(&storage.conn, &[tasks[0].id]).await.unwrap();

    let second = service.import_calendar(1).await.unwrap();
    assert_eq!(second.imported, 1);
    assert_eq!(second.skipped, 1);
    assert_eq!(CalendarImportMapRepository::get_all(&storage.conn).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_soft_deleted_tasks_stay_deleted() {
    let storage = storage().await;
    let source = Arc::new(FakeCalendarSource::starting_on(monday()));
    let service = calendar_service(&storage, source);
    let sync = tasksync::sync::SyncService::new(storage.clone(), Arc::new(tasksync::backend::FakeRemoteTaskStore::new()));

    let first = service.import_calendar(1).await.unwrap();
    let tasks = TaskRepository::get_by_list(&storage.conn, first.list_id).await.unwrap();
    sync.delete_task(tasks[0].id).await.unwrap();

    let second = service.import_calendar(1).await.unwrap();
    assert_eq!(second.imported, 0);
    assert_eq!(TaskRepository::count_for_list(&storage.conn, first.list_id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_clear_import_history_allows_reimport() {
    let storage = storage().await;
    let service = calendar_service(&storage, Arc::new(FakeCalendarSource::starting_on(monday())));
    service.import_calendar(1).await.unwrap();

    assert_eq!(service.clear_import_history().await.unwrap(), 2);
    assert!(CalendarImportMapRepository::get_all(&storage.conn).await.unwrap().is_empty());

    let again = service.import_calendar(1).await.unwrap();
    assert_eq!(again.imported, 2);
    assert_eq!(TaskRepository::count_for_list(&storage.conn, again.list_id).await.unwrap(), 4);
}

#[tokio::test]
async fn test_import_reuses_existing_list() {
    let storage = storage().await;
    let existing = TaskListRepository::get_or_create(&storage.conn, "Imported").await.unwrap();
    let service = calendar_service(&storage, Arc::new(FakeCalendarSource::starting_on(monday())));

    let outcome = service.import_calendar(1).await.unwrap();
    assert_eq!(outcome.list_id, existing.id);
    assert_eq!(TaskListRepository::get_all(&storage.conn).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_source_failure_is_reported() {
    let storage = storage().await;
    let service = calendar_service(&storage, Arc::new(FailingSource));

    let failure = service.import_calendar(7).await.unwrap_err();
    assert_eq!(failure.kind, FailureKind::Transient);
    assert!(failure.message.contains("calendar unreachable"));
    assert_eq!(TaskRepository::get_all_active(&storage.conn).await.unwrap().len(), 0);
}

#[tokio::test]
async fn test_read_only_source_has_no_scopes() {
    let storage = storage().await;
    let service = calendar_service(&storage, Arc::new(FakeCalendarSource::new()));
    assert_eq!(service.source_type(), "fake");
    assert!(service.required_import_scopes().is_empty());
    assert!(service.required_sync_scopes().is_empty());
}
