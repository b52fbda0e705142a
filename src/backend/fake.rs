//! In-memory remote store used for tests and offline runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{BackendError, RemoteMember, RemoteTask, RemoteTaskList, RemoteTaskStore};
use crate::entities::task::DEFAULT_LIST_ID;

#[derive(Default)]
struct FakeState {
    lists: Vec<RemoteTaskList>,
    members: HashMap<i32, Vec<RemoteMember>>,
    tasks: HashMap<i32, Vec<RemoteTask>>,
}

/// Remote store that keeps everything in memory.
///
/// Setting [`FakeRemoteTaskStore::set_should_fail`] makes every subsequent call
/// fail with a network error, and [`FakeRemoteTaskStore::set_auth_failure`]
/// with an authentication error.
pub struct FakeRemoteTaskStore {
    state: Mutex<FakeState>,
    should_fail: AtomicBool,
    auth_failure: AtomicBool,
    next_id: AtomicU64,
    calls: AtomicU64,
}

impl Default for FakeRemoteTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeRemoteTaskStore {
    pub fn new() -> Self {
        let mut state = FakeState::default();
        state.lists.push(RemoteTaskList {
            id: DEFAULT_LIST_ID,
            name: "Default".to_string(),
        });
        state.members.insert(
            DEFAULT_LIST_ID,
            vec![RemoteMember {
                user_id: "owner".to_string(),
            }],
        );
        state.tasks.insert(DEFAULT_LIST_ID, Vec::new());

        Self {
            state: Mutex::new(state),
            should_fail: AtomicBool::new(false),
            auth_failure: AtomicBool::new(false),
            next_id: AtomicU64::new(1),
            calls: AtomicU64::new(0),
        }
    }

    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::SeqCst);
    }

    pub fn set_auth_failure(&self, fail: bool) {
        self.auth_failure.store(fail, Ordering::SeqCst);
    }

    /// Number of calls that reached the store, failed ones included.
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Current contents of a remote list.
    pub async fn tasks_in(&self, list_id: i32) -> Vec<RemoteTask> {
        self.state.lock().await.tasks.get(&list_id).cloned().unwrap_or_default()
    }

    /// Place a task directly in the store, as another device would.
    pub async fn insert_remote(&self, task: RemoteTask) -> String {
        let remote_id = task.remote_id.clone().unwrap_or_else(|| self.fresh_remote_id());
        let mut state = self.state.lock().await;
        state.tasks.entry(task.list_id).or_default().push(RemoteTask {
            remote_id: Some(remote_id.clone()),
            ..task
        });
        remote_id
    }

    fn fresh_remote_id(&self) -> String {
        format!("fake_remote_{}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn check(&self) -> Result<(), BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.auth_failure.load(Ordering::SeqCst) {
            return Err(BackendError::Auth("No active session".to_string()));
        }
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(BackendError::Network("Simulated network failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteTaskStore for FakeRemoteTaskStore {
    fn backend_type(&self) -> &str {
        "fake"
    }

    async fn fetch_lists(&self) -> Result<Vec<RemoteTaskList>, BackendError> {
        self.check()?;
        Ok(self.state.lock().await.lists.clone())
    }

    async fn create_list(&self, name: &str) -> Result<RemoteTaskList, BackendError> {
        self.check()?;
        let mut state = self.state.lock().await;
        let id = state.lists.iter().map(|list| list.id).max().unwrap_or(0) + 1;
        let list = RemoteTaskList {
            id,
            name: name.to_string(),
        };
        state.lists.push(list.clone());
        state.tasks.insert(id, Vec::new());
        state.members.insert(id, Vec::new());
        Ok(list)
    }

    async fn share_list(&self, list_id: i32, member_ids: &[String]) -> Result<bool, BackendError> {
        self.check()?;
        let mut state = self.state.lock().await;
        let members = state.members.entry(list_id).or_default();
        for user_id in member_ids {
            members.push(RemoteMember {
                user_id: user_id.clone(),
            });
        }
        Ok(true)
    }

    async fn fetch_tasks(&self, list_id: i32) -> Result<Vec<RemoteTask>, BackendError> {
        self.check()?;
        Ok(self.state.lock().await.tasks.get(&list_id).cloned().unwrap_or_default())
    }

    async fn upsert_task(&self, task: &RemoteTask, list_id: i32) -> Result<Option<String>, BackendError> {
        self.check()?;
        let remote_id = task.remote_id.clone().unwrap_or_else(|| self.fresh_remote_id());

        let mut state = self.state.lock().await;
        let rows = state.tasks.entry(list_id).or_default();
        let position = rows.iter().position(|row| match &task.remote_id {
            Some(id) => row.remote_id.as_ref() == Some(id),
            None => row.local_id == task.local_id,
        });

        let stored = RemoteTask {
            remote_id: Some(remote_id.clone()),
            list_id,
            ..task.clone()
        };
        match position {
            Some(index) => rows[index] = stored,
            None => rows.push(stored),
        }

        Ok(Some(remote_id))
    }

    async fn delete_task(&self, local_id: i32, list_id: i32) -> Result<(), BackendError> {
        self.check()?;
        if let Some(rows) = self.state.lock().await.tasks.get_mut(&list_id) {
            rows.retain(|row| row.local_id != local_id);
        }
        Ok(())
    }

    async fn delete_task_by_remote_id(&self, remote_id: &str, list_id: i32) -> Result<(), BackendError> {
        self.check()?;
        if let Some(rows) = self.state.lock().await.tasks.get_mut(&list_id) {
            rows.retain(|row| row.remote_id.as_deref() != Some(remote_id));
        }
        Ok(())
    }

    async fn fetch_members(&self, list_id: i32) -> Result<Vec<RemoteMember>, BackendError> {
        self.check()?;
        Ok(self.state.lock().await.members.get(&list_id).cloned().unwrap_or_default())
    }
}
