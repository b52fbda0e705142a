//! Composition root: builds every service once from a [`Config`].

use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;

use crate::backend::{self, RemoteTaskStore};
use crate::calendar::{self, CalendarService, CalendarSource};
use crate::config::Config;
use crate::storage::LocalStorage;
use crate::sync::SyncService;
use crate::sync_coordinator::SyncCoordinator;

/// The wired application.
pub struct App {
    pub storage: Arc<LocalStorage>,
    pub sync: SyncService,
    pub calendar: CalendarService,
    pub coordinator: SyncCoordinator,
}

impl App {
    /// Open storage and create the remote store and calendar source selected
    /// by `config`.
    pub async fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let storage = Arc::new(
            LocalStorage::new(config.storage.database_path().as_deref())
                .await
                .context("Failed to open local storage")?,
        );
        let remote = backend::create_remote_store(&config.remote)?;
        let source = calendar::create_calendar_source(&config.calendar)?;

        Ok(Self::with_parts(storage, remote, source, config))
    }

    /// Wire already-built parts, e.g. fakes in tests.
    pub fn with_parts(
        storage: Arc<LocalStorage>,
        remote: Arc<dyn RemoteTaskStore>,
        source: Arc<dyn CalendarSource>,
        config: &Config,
    ) -> Self {
        info!(
            "🚀 Using remote store '{}' and calendar '{}'",
            remote.backend_type(),
            source.source_type()
        );

        let sync = SyncService::new(storage.clone(), remote);
        let calendar = CalendarService::new(storage.clone(), source, config.calendar.imported_list_name.clone());
        let coordinator = SyncCoordinator::new(
            sync.clone(),
            calendar.clone(),
            config.calendar.import_window_days,
            config.calendar.export_after_sync,
        );

        Self {
            storage,
            sync,
            calendar,
            coordinator,
        }
    }
}
