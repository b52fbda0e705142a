//! Google Calendar and Google Tasks source.
//!
//! Reads events from every calendar the account can see plus open Google
//! Tasks, and writes exported tasks to the primary calendar as all-day
//! events. Token acquisition happens elsewhere; this source only takes a
//! bearer token.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use log::{debug, warn};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{CalendarEvent, CalendarSource, CalendarWriter, EventPayload, EventRef, IMPORT_ONLY_PREFIX};
use crate::backend::BackendError;
use crate::utils::datetime::{format_ymd, parse_date, start_of_day_utc};

const CALENDAR_API: &str = "https://www.googleapis.com/calendar/v3";
const TASKS_API: &str = "https://tasks.googleapis.com/tasks/v1";
const PRIMARY_CALENDAR: &str = "primary";

pub const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";
pub const TASKS_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/tasks.readonly";

#[derive(Deserialize)]
struct ItemsResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Deserialize)]
struct CalendarListEntry {
    id: Option<String>,
    #[serde(default)]
    primary: bool,
}

#[derive(Deserialize)]
struct GoogleEvent {
    id: Option<String>,
    summary: Option<String>,
    description: Option<String>,
    start: Option<EventDateTime>,
    end: Option<EventDateTime>,
}

#[derive(Deserialize, Serialize)]
struct EventDateTime {
    #[serde(rename = "dateTime", skip_serializing_if = "Option::is_none")]
    date_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<String>,
}

#[derive(Serialize)]
struct EventBody<'a> {
    summary: &'a str,
    description: &'a str,
    start: EventDateTime,
    end: EventDateTime,
}

#[derive(Deserialize)]
struct TaskListEntry {
    id: Option<String>,
    title: Option<String>,
}

#[derive(Deserialize)]
struct GoogleTask {
    id: Option<String>,
    title: Option<String>,
    notes: Option<String>,
    status: Option<String>,
    due: Option<String>,
}

impl EventDateTime {
    fn all_day(date: NaiveDate) -> Self {
        Self {
            date_time: None,
            date: Some(format_ymd(date)),
        }
    }

    fn parse(&self) -> Option<DateTime<Utc>> {
        if let Some(date_time) = &self.date_time {
            return DateTime::parse_from_rfc3339(date_time)
                .ok()
                .map(|parsed| parsed.with_timezone(&Utc));
        }
        self.date
            .as_deref()
            .and_then(|date| parse_date(date).ok())
            .map(start_of_day_utc)
    }
}

impl<'a> EventBody<'a> {
    fn from_payload(payload: &'a EventPayload) -> Self {
        Self {
            summary: &payload.title,
            description: &payload.description,
            start: EventDateTime::all_day(payload.start_date),
            end: EventDateTime::all_day(payload.end_date),
        }
    }
}

/// Calendar source backed by the Google Calendar v3 and Tasks v1 APIs.
pub struct GoogleCalendarSource {
    client: Client,
    access_token: Option<String>,
    calendar_api: String,
    tasks_api: String,
}

impl GoogleCalendarSource {
    pub fn new(access_token: Option<String>) -> Self {
        Self::with_base_urls(access_token, CALENDAR_API, TASKS_API)
    }

    /// Point the source at different API roots, e.g. a local mock server.
    pub fn with_base_urls(access_token: Option<String>, calendar_api: &str, tasks_api: &str) -> Self {
        Self {
            client: Client::new(),
            access_token,
            calendar_api: calendar_api.trim_end_matches('/').to_string(),
            tasks_api: tasks_api.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(base: &str, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = Url::parse(base).map_err(|e| BackendError::Other(format!("Invalid API URL {}: {}", base, e)))?;
        url.path_segments_mut()
            .map_err(|_| BackendError::Other(format!("API URL cannot have a path: {}", base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BackendError> {
        let token = self
            .access_token
            .as_deref()
            .ok_or_else(|| BackendError::Auth("Google account or required permissions are missing".to_string()))?;

        let response = request
            .bearer_auth(token)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    BackendError::Auth(format!("Google API error {}: {}", status, body))
                }
                StatusCode::NOT_FOUND | StatusCode::GONE => {
                    BackendError::NotFound(format!("Google API error {}: {}", status, body))
                }
                _ if status.is_server_error() => BackendError::Network(format!("Google API error {}: {}", status, body)),
                _ => BackendError::Other(format!("Google API error {}: {}", status, body)),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| BackendError::InvalidData(e.to_string()))
    }

    /// Ids of every readable calendar, falling back to the primary one.
    ///
    /// The primary calendar is always addressed as `primary`, the id exports
    /// are written under, so imported and exported keys agree.
    async fn calendar_ids(&self) -> Vec<String> {
        let listed = match Self::endpoint(&self.calendar_api, &["users", "me", "calendarList"]) {
            Ok(url) => {
                self.send_json::<ItemsResponse<CalendarListEntry>>(
                    self.client.get(url).query(&[("minAccessRole", "reader")]),
                )
                .await
            }
            Err(e) => Err(e),
        };

        match listed {
            Ok(response) => {
                let mut seen = HashSet::new();
                let ids: Vec<String> = response
                    .items
                    .into_iter()
                    .filter_map(|entry| {
                        if entry.primary {
                            Some(PRIMARY_CALENDAR.to_string())
                        } else {
                            entry.id
                        }
                    })
                    .filter(|id| seen.insert(id.clone()))
                    .collect();
                if ids.is_empty() {
                    vec![PRIMARY_CALENDAR.to_string()]
                } else {
                    ids
                }
            }
            Err(e) => {
                warn!("⚠️ Failed to load calendar list ({}), falling back to primary", e);
                vec![PRIMARY_CALENDAR.to_string()]
            }
        }
    }

    async fn fetch_calendar_events(
        &self,
        calendar_id: &str,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, BackendError> {
        let url = Self::endpoint(&self.calendar_api, &["calendars", calendar_id, "events"])?;
        let request = self.client.get(url).query(&[
            ("timeMin", window_start.to_rfc3339()),
            ("timeMax", window_end.to_rfc3339()),
            ("singleEvents", "true".to_string()),
            ("orderBy", "startTime".to_string()),
            ("showDeleted", "false".to_string()),
            ("maxResults", "250".to_string()),
        ]);
        let response: ItemsResponse<GoogleEvent> = self.send_json(request).await?;
        debug!("Fetched {} events from calendar '{}'", response.items.len(), calendar_id);

        Ok(response
            .items
            .into_iter()
            .filter_map(|event| {
                let raw_id = event.id?;
                let start = event.start.as_ref().and_then(EventDateTime::parse).unwrap_or(window_start);
                let end = event.end.as_ref().and_then(EventDateTime::parse).unwrap_or(start);
                Some(CalendarEvent {
                    event_id: EventRef::new(calendar_id, raw_id).to_string(),
                    title: event.summary.unwrap_or_else(|| "Untitled Event".to_string()),
                    description: event.description.unwrap_or_default(),
                    start,
                    end,
                })
            })
            .collect())
    }

    /// Open Google Tasks due inside the window (or undated), as import-only events.
    async fn fetch_task_events(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, BackendError> {
        let url = Self::endpoint(&self.tasks_api, &["users", "@me", "lists"])?;
        let lists: ItemsResponse<TaskListEntry> = self
            .send_json(self.client.get(url).query(&[("maxResults", "100")]))
            .await?;

        let mut events = Vec::new();
        for list in lists.items {
            let Some(list_id) = list.id.filter(|id| !id.trim().is_empty()) else {
                continue;
            };
            let list_title = list.title.unwrap_or_else(|| "Google Tasks".to_string());

            let url = Self::endpoint(&self.tasks_api, &["lists", list_id.as_str(), "tasks"])?;
            let tasks: ItemsResponse<GoogleTask> = self
                .send_json(self.client.get(url).query(&[
                    ("showCompleted", "false"),
                    ("showDeleted", "false"),
                    ("showHidden", "false"),
                    ("maxResults", "100"),
                ]))
                .await?;

            for task in tasks.items {
                if task.status.as_deref() == Some("completed") {
                    continue;
                }
                let Some(task_id) = task.id.filter(|id| !id.trim().is_empty()) else {
                    continue;
                };

                let due = task
                    .due
                    .as_deref()
                    .and_then(|due| DateTime::parse_from_rfc3339(due).ok())
                    .map(|due| due.with_timezone(&Utc));
                if let Some(due) = due {
                    if due < window_start || due > window_end {
                        continue;
                    }
                }
                let start = due.unwrap_or(window_start);

                let mut description = String::new();
                if let Some(notes) = task.notes.filter(|notes| !notes.trim().is_empty()) {
                    description.push_str(&notes);
                    description.push_str("\n\n");
                }
                description.push_str("From Google Tasks: ");
                description.push_str(&list_title);

                events.push(CalendarEvent {
                    event_id: format!("{}:{}:{}", IMPORT_ONLY_PREFIX, list_id, task_id),
                    title: task.title.unwrap_or_else(|| "Untitled Task".to_string()),
                    description,
                    start,
                    end: start + Duration::minutes(30),
                });
            }
        }

        debug!("Fetched {} items from Google Tasks", events.len());
        Ok(events)
    }
}

#[async_trait]
impl CalendarSource for GoogleCalendarSource {
    fn source_type(&self) -> &str {
        "google"
    }

    async fn fetch_events(&self, days: u32) -> Result<Vec<CalendarEvent>, BackendError> {
        if self.access_token.is_none() {
            return Err(BackendError::Auth(
                "Google account or required permissions are missing".to_string(),
            ));
        }

        let window_start = start_of_day_utc(Utc::now().date_naive());
        let window_end = window_start + Duration::days(i64::from(days));

        let mut events = Vec::new();
        for calendar_id in self.calendar_ids().await {
            events.extend(self.fetch_calendar_events(&calendar_id, window_start, window_end).await?);
        }
        events.extend(self.fetch_task_events(window_start, window_end).await?);

        let mut seen = HashSet::new();
        events.retain(|event| seen.insert(event.event_id.clone()));
        events.sort_by_key(|event| event.start);
        Ok(events)
    }

    fn writer(&self) -> Option<&dyn CalendarWriter> {
        Some(self)
    }

    fn import_scopes(&self) -> Vec<String> {
        vec![CALENDAR_SCOPE.to_string(), TASKS_READONLY_SCOPE.to_string()]
    }

    fn sync_scopes(&self) -> Vec<String> {
        vec![CALENDAR_SCOPE.to_string()]
    }
}

#[async_trait]
impl CalendarWriter for GoogleCalendarSource {
    async fn create_event(&self, payload: &EventPayload) -> Result<Option<EventRef>, BackendError> {
        let url = Self::endpoint(&self.calendar_api, &["calendars", PRIMARY_CALENDAR, "events"])?;
        let created: GoogleEvent = self
            .send_json(self.client.post(url).json(&EventBody::from_payload(payload)))
            .await?;

        Ok(created
            .id
            .filter(|id| !id.trim().is_empty())
            .map(|id| EventRef::new(PRIMARY_CALENDAR, id)))
    }

    async fn update_event(&self, target: &EventRef, payload: &EventPayload) -> Result<EventRef, BackendError> {
        let url = Self::endpoint(
            &self.calendar_api,
            &["calendars", target.calendar_id.as_str(), "events", target.event_id.as_str()],
        )?;
        let updated: GoogleEvent = self
            .send_json(self.client.put(url).json(&EventBody::from_payload(payload)))
            .await?;

        let event_id = updated
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| target.event_id.clone());
        Ok(EventRef::new(target.calendar_id.clone(), event_id))
    }
}
