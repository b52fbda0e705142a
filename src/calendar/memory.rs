//! Writable in-memory calendar.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{CalendarEvent, CalendarSource, CalendarWriter, EventPayload, EventRef};
use crate::backend::BackendError;
use crate::utils::datetime::start_of_day_utc;

const CALENDAR_ID: &str = "memory";

/// Calendar kept entirely in memory, readable and writable.
///
/// Events written through [`CalendarWriter`] are returned by
/// [`CalendarSource::fetch_events`] under their `memory:<id>` reference, next
/// to any events seeded with [`MemoryCalendar::add_event`].
pub struct MemoryCalendar {
    seeded: Mutex<Vec<CalendarEvent>>,
    written: Mutex<BTreeMap<String, EventPayload>>,
    next_id: AtomicU64,
    anonymous_creates: AtomicBool,
}

impl Default for MemoryCalendar {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCalendar {
    pub fn new() -> Self {
        Self {
            seeded: Mutex::new(Vec::new()),
            written: Mutex::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
            anonymous_creates: AtomicBool::new(false),
        }
    }

    pub async fn add_event(&self, event: CalendarEvent) {
        self.seeded.lock().await.push(event);
    }

    /// Events written by exports, keyed by their reference.
    pub async fn written_events(&self) -> Vec<(EventRef, EventPayload)> {
        self.written
            .lock()
            .await
            .iter()
            .map(|(event_id, payload)| (EventRef::new(CALENDAR_ID, event_id.clone()), payload.clone()))
            .collect()
    }

    /// Delete a written event behind the exporter's back.
    pub async fn remove_event(&self, target: &EventRef) -> bool {
        self.written.lock().await.remove(&target.event_id).is_some()
    }

    /// Make creates succeed without reporting an identifier.
    pub fn set_anonymous_creates(&self, anonymous: bool) {
        self.anonymous_creates.store(anonymous, Ordering::SeqCst);
    }
}

#[async_trait]
impl CalendarSource for MemoryCalendar {
    fn source_type(&self) -> &str {
        "memory"
    }

    async fn fetch_events(&self, _days: u32) -> Result<Vec<CalendarEvent>, BackendError> {
        let mut events = self.seeded.lock().await.clone();

        for (event_id, payload) in self.written.lock().await.iter() {
            let start = start_of_day_utc(payload.start_date);
            let end = start_of_day_utc(payload.end_date);
            events.push(CalendarEvent {
                event_id: EventRef::new(CALENDAR_ID, event_id.clone()).to_string(),
                title: payload.title.clone(),
                description: payload.description.clone(),
                start,
                end,
            });
        }

        events.sort_by_key(|event| event.start);
        Ok(events)
    }

    fn writer(&self) -> Option<&dyn CalendarWriter> {
        Some(self)
    }
}

#[async_trait]
impl CalendarWriter for MemoryCalendar {
    async fn create_event(&self, payload: &EventPayload) -> Result<Option<EventRef>, BackendError> {
        let event_id = format!("evt_{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.written.lock().await.insert(event_id.clone(), payload.clone());

        if self.anonymous_creates.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(Some(EventRef::new(CALENDAR_ID, event_id)))
    }

    async fn update_event(&self, target: &EventRef, payload: &EventPayload) -> Result<EventRef, BackendError> {
        let mut written = self.written.lock().await;
        match written.get_mut(&target.event_id) {
            Some(existing) if target.calendar_id == CALENDAR_ID => {
                *existing = payload.clone();
                Ok(target.clone())
            }
            _ => Err(BackendError::NotFound(format!("Event {} does not exist", target))),
        }
    }
}
