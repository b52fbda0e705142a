//! Calendar source factory.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use log::warn;

use super::{CalendarSource, FakeCalendarSource, GoogleCalendarSource, MemoryCalendar};
use crate::config::CalendarConfig;

/// Create the calendar source selected by `config.provider`.
pub fn create_calendar_source(config: &CalendarConfig) -> Result<Arc<dyn CalendarSource>> {
    match config.provider.as_str() {
        "fake" => Ok(Arc::new(FakeCalendarSource::new())),
        "memory" => Ok(Arc::new(MemoryCalendar::new())),
        "google" => {
            let access_token = config.access_token();
            if access_token.is_none() {
                warn!("⚠️ {} is not set; calendar calls will fail", config.access_token_env);
            }
            Ok(Arc::new(GoogleCalendarSource::new(access_token)))
        }
        _ => Err(anyhow!("Unknown calendar provider: {}", config.provider)),
    }
}
