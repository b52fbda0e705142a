//! Calendar sources and the import/export engine built on top of them.
//!
//! A [`CalendarSource`] lists events; sources that can also be written to
//! expose a [`CalendarWriter`] through [`CalendarSource::writer`].

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Days, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::backend::BackendError;
use crate::entities::task;

pub mod factory;
pub mod fake;
pub mod google;
pub mod memory;
pub mod service;

pub use factory::create_calendar_source;
pub use fake::FakeCalendarSource;
pub use google::GoogleCalendarSource;
pub use memory::MemoryCalendar;
pub use service::{CalendarService, ExportOutcome, ImportOutcome};

/// Calendar id prefix of items that can be imported but never written back.
pub const IMPORT_ONLY_PREFIX: &str = "gtask";

/// An event as read from a calendar source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// Provider-unique identifier, used as the import dedup key.
    pub event_id: String,
    pub title: String,
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// What gets written to a calendar for one task: an all-day event on the
/// task's due date.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPayload {
    pub task_id: i32,
    pub title: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl EventPayload {
    /// Tasks without a due date land on today.
    pub fn from_task(task: &task::Model) -> Self {
        let start_date = task
            .due_date
            .map(|due| due.with_timezone(&Local).date_naive())
            .unwrap_or_else(|| Local::now().date_naive());
        let end_date = start_date.checked_add_days(Days::new(1)).unwrap_or(start_date);

        let mut description = String::new();
        if !task.description.trim().is_empty() {
            description.push_str(&task.description);
            description.push_str("\n\n");
        }
        description.push_str(&format!("Synced from tasksync (taskId={})", task.id));

        Self {
            task_id: task.id,
            title: task.title.clone(),
            description,
            start_date,
            end_date,
        }
    }
}

/// Reference to a writable calendar event, stored as `"<calendarId>:<eventId>"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EventRef {
    pub calendar_id: String,
    pub event_id: String,
}

impl EventRef {
    pub fn new(calendar_id: impl Into<String>, event_id: impl Into<String>) -> Self {
        Self {
            calendar_id: calendar_id.into(),
            event_id: event_id.into(),
        }
    }

    /// Parse a stored mapping. Import-only and untagged ids yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let (calendar_id, event_id) = raw.split_once(':')?;
        if calendar_id.is_empty() || calendar_id == IMPORT_ONLY_PREFIX || event_id.trim().is_empty() {
            return None;
        }
        Some(Self::new(calendar_id, event_id))
    }
}

impl fmt::Display for EventRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.calendar_id, self.event_id)
    }
}

/// Whether a mapped event id came from a provider that cannot be written back.
pub fn is_import_only(event_id: &str) -> bool {
    event_id
        .strip_prefix(IMPORT_ONLY_PREFIX)
        .is_some_and(|rest| rest.starts_with(':'))
}

/// Write-back capability of a calendar.
#[async_trait]
pub trait CalendarWriter: Send + Sync {
    /// Create an event. `None` means the provider accepted it without
    /// reporting an identifier.
    async fn create_event(&self, payload: &EventPayload) -> Result<Option<EventRef>, BackendError>;

    /// Replace an existing event. Fails with [`BackendError::NotFound`] when
    /// the target no longer exists.
    async fn update_event(&self, target: &EventRef, payload: &EventPayload) -> Result<EventRef, BackendError>;
}

/// Calendar source trait that all calendar providers implement.
#[async_trait]
pub trait CalendarSource: Send + Sync {
    /// Returns the source type identifier (e.g., "fake", "google").
    fn source_type(&self) -> &str;

    /// Fetch events for the next `days` days.
    async fn fetch_events(&self, days: u32) -> Result<Vec<CalendarEvent>, BackendError>;

    /// Write-back capability, for sources that have one.
    fn writer(&self) -> Option<&dyn CalendarWriter> {
        None
    }

    /// OAuth scopes an import needs. Empty for providers without auth.
    fn import_scopes(&self) -> Vec<String> {
        Vec::new()
    }

    /// OAuth scopes an export needs.
    fn sync_scopes(&self) -> Vec<String> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_ref_parsing() {
        assert_eq!(EventRef::parse("primary:abc123"), Some(EventRef::new("primary", "abc123")));
        assert_eq!(
            EventRef::parse("team@group.calendar.google.com:ev:1"),
            Some(EventRef::new("team@group.calendar.google.com", "ev:1"))
        );
        assert_eq!(EventRef::parse("gtask:list:task"), None);
        assert_eq!(EventRef::parse("standup_20250106"), None);
        assert_eq!(EventRef::parse(":abc"), None);
        assert_eq!(EventRef::parse("primary:"), None);
    }

    #[test]
    fn test_event_ref_display() {
        assert_eq!(EventRef::new("primary", "abc").to_string(), "primary:abc");
    }

    #[test]
    fn test_import_only_ids() {
        assert!(is_import_only("gtask:list:task"));
        assert!(!is_import_only("gtasks:abc"));
        assert!(!is_import_only("primary:abc"));
    }
}
