//! Deterministic read-only calendar.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, Utc, Weekday};

use super::{CalendarEvent, CalendarSource};
use crate::backend::BackendError;
use crate::utils::datetime::start_of_day_utc;

/// Calendar that generates the same recurring events for any window:
/// a weekday standup at 09:00, a daily lunch at 12:00 and a Friday review at
/// 14:00 (UTC). Event ids embed the date, e.g. `standup_20250106`.
pub struct FakeCalendarSource {
    start_date: Option<NaiveDate>,
}

impl Default for FakeCalendarSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeCalendarSource {
    /// A calendar whose window starts today.
    pub fn new() -> Self {
        Self { start_date: None }
    }

    /// A calendar whose window always starts on `date`.
    pub fn starting_on(date: NaiveDate) -> Self {
        Self {
            start_date: Some(date),
        }
    }

    /// Events for `days` consecutive days starting at `first_day`.
    pub fn events_for(first_day: NaiveDate, days: u32) -> Vec<CalendarEvent> {
        let mut events = Vec::new();

        for offset in 0..days {
            let Some(day) = first_day.checked_add_days(Days::new(u64::from(offset))) else {
                break;
            };
            let stamp = day.format("%Y%m%d");
            let weekday = day.weekday();

            if weekday.number_from_monday() <= 5 {
                events.push(event(
                    format!("standup_{}", stamp),
                    "Daily Standup",
                    "Team sync meeting",
                    at(day, 9),
                    Duration::minutes(30),
                ));
            }

            events.push(event(
                format!("lunch_{}", stamp),
                "Lunch Break",
                "Take a break",
                at(day, 12),
                Duration::hours(1),
            ));

            if weekday == Weekday::Fri {
                events.push(event(
                    format!("review_{}", stamp),
                    "Weekly Review",
                    "Review weekly progress and plan next week",
                    at(day, 14),
                    Duration::hours(1),
                ));
            }
        }

        events
    }
}

fn at(day: NaiveDate, hour: i64) -> DateTime<Utc> {
    start_of_day_utc(day) + Duration::hours(hour)
}

fn event(event_id: String, title: &str, description: &str, start: DateTime<Utc>, length: Duration) -> CalendarEvent {
    CalendarEvent {
        event_id,
        title: title.to_string(),
        description: description.to_string(),
        start,
        end: start + length,
    }
}

#[async_trait]
impl CalendarSource for FakeCalendarSource {
    fn source_type(&self) -> &str {
        "fake"
    }

    async fn fetch_events(&self, days: u32) -> Result<Vec<CalendarEvent>, BackendError> {
        let first_day = self.start_date.unwrap_or_else(|| Utc::now().date_naive());
        Ok(Self::events_for(first_day, days))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_week_of_events() {
        // 2025-01-06 is a Monday
        let monday = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let events = FakeCalendarSource::events_for(monday, 7);

        let standups = events.iter().filter(|e| e.event_id.starts_with("standup_")).count();
        let lunches = events.iter().filter(|e| e.event_id.starts_with("lunch_")).count();
        let reviews: Vec<_> = events.iter().filter(|e| e.event_id.starts_with("review_")).collect();

        assert_eq!(standups, 5);
        assert_eq!(lunches, 7);
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].event_id, "review_20250110");
        assert_eq!(events[0].event_id, "standup_20250106");
        assert_eq!(events[0].end - events[0].start, Duration::minutes(30));
    }

    #[test]
    fn test_ids_are_stable() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        assert_eq!(FakeCalendarSource::events_for(day, 3), FakeCalendarSource::events_for(day, 3));
        assert!(FakeCalendarSource::events_for(day, 0).is_empty());
    }
}
