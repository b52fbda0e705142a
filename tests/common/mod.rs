#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tasksync::backend::{BackendError, FakeRemoteTaskStore, RemoteMember, RemoteTask, RemoteTaskList, RemoteTaskStore};
use tasksync::calendar::{CalendarEvent, CalendarService, CalendarSource};
use tasksync::entities::task::{Priority, DEFAULT_LIST_ID};
use tasksync::storage::LocalStorage;
use tasksync::sync::SyncService;
use tasksync::utils::datetime::now_millis;
use tokio::sync::Mutex;

pub async fn storage() -> Arc<LocalStorage> {
    Arc::new(LocalStorage::in_memory().await.expect("in-memory storage"))
}

pub async fn sync_setup() -> (Arc<LocalStorage>, Arc<FakeRemoteTaskStore>, SyncService) {
    let storage = storage().await;
    let remote = Arc::new(FakeRemoteTaskStore::new());
    let service = SyncService::new(storage.clone(), remote.clone());
    (storage, remote, service)
}

pub fn calendar_service(storage: &Arc<LocalStorage>, source: Arc<dyn CalendarSource>) -> CalendarService {
    CalendarService::new(storage.clone(), source, "Imported")
}

/// A task as another device would have pushed it.
pub fn remote_task(title: &str) -> RemoteTask {
    RemoteTask {
        remote_id: None,
        local_id: 0,
        title: title.to_string(),
        description: String::new(),
        is_done: false,
        priority: Priority::Normal,
        due_date: None,
        image_ref: None,
        list_id: DEFAULT_LIST_ID,
        updated_at: now_millis(),
    }
}

pub fn event(event_id: &str, title: &str, start: DateTime<Utc>) -> CalendarEvent {
    CalendarEvent {
        event_id: event_id.to_string(),
        title: title.to_string(),
        description: format!("{} description", title),
        start,
        end: start + Duration::hours(1),
    }
}

/// Fake remote store that can fail a chosen upsert or run a local edit while
/// an upsert is in flight.
pub struct ScriptedRemote {
    pub inner: Arc<FakeRemoteTaskStore>,
    upserts: AtomicU64,
    fail_on_upsert: AtomicU64,
    edit_during_upsert: Mutex<Option<(SyncService, tasksync::task::Model)>>,
}

impl ScriptedRemote {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(FakeRemoteTaskStore::new()),
            upserts: AtomicU64::new(0),
            fail_on_upsert: AtomicU64::new(0),
            edit_during_upsert: Mutex::new(None),
        }
    }

    /// Fail the `n`th upsert from now on (1-based). Zero disables.
    pub fn fail_on_upsert(&self, n: u64) {
        self.upserts.store(0, Ordering::SeqCst);
        self.fail_on_upsert.store(n, Ordering::SeqCst);
    }

    /// Apply `edited` through `service` during the next upsert.
    pub async fn edit_during_next_upsert(&self, service: SyncService, edited: tasksync::task::Model) {
        *self.edit_during_upsert.lock().await = Some((service, edited));
    }
}

#[async_trait]
impl RemoteTaskStore for ScriptedRemote {
    fn backend_type(&self) -> &str {
        "scripted"
    }

    async fn fetch_lists(&self) -> Result<Vec<RemoteTaskList>, BackendError> {
        self.inner.fetch_lists().await
    }

    async fn create_list(&self, name: &str) -> Result<RemoteTaskList, BackendError> {
        self.inner.create_list(name).await
    }

    async fn share_list(&self, list_id: i32, member_ids: &[String]) -> Result<bool, BackendError> {
        self.inner.share_list(list_id, member_ids).await
    }

    async fn fetch_tasks(&self, list_id: i32) -> Result<Vec<RemoteTask>, BackendError> {
        self.inner.fetch_tasks(list_id).await
    }

    async fn upsert_task(&self, task: &RemoteTask, list_id: i32) -> Result<Option<String>, BackendError> {
        let count = self.upserts.fetch_add(1, Ordering::SeqCst) + 1;
        if count == self.fail_on_upsert.load(Ordering::SeqCst) {
            return Err(BackendError::Network(format!("Upsert {} dropped", count)));
        }

        let edit = self.edit_during_upsert.lock().await.take();
        if let Some((service, edited)) = edit {
            service
                .update_task(edited)
                .await
                .map_err(|e| BackendError::Other(e.to_string()))?;
        }

        self.inner.upsert_task(task, list_id).await
    }

    async fn delete_task(&self, local_id: i32, list_id: i32) -> Result<(), BackendError> {
        self.inner.delete_task(local_id, list_id).await
    }

    async fn delete_task_by_remote_id(&self, remote_id: &str, list_id: i32) -> Result<(), BackendError> {
        self.inner.delete_task_by_remote_id(remote_id, list_id).await
    }

    async fn fetch_members(&self, list_id: i32) -> Result<Vec<RemoteMember>, BackendError> {
        self.inner.fetch_members(list_id).await
    }
}

pub async fn scripted_setup() -> (Arc<LocalStorage>, Arc<ScriptedRemote>, SyncService) {
    let storage = storage().await;
    let remote = Arc::new(ScriptedRemote::new());
    let service = SyncService::new(storage.clone(), remote.clone());
    (storage, remote, service)
}
