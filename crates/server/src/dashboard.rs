use askama::Template;
use chrono::{DateTime, Utc};
use shared::domain::PlaybackStatus;

/// One status snapshot; the page refreshes itself from `/status` afterwards.
#[derive(Template)]
#[template(path = "dashboard.html")]
struct Dashboard<'a> {
    status: &'a PlaybackStatus,
    updated: String,
}

pub fn render(status: &PlaybackStatus) -> Result<String, askama::Error> {
    Dashboard {
        status,
        updated: display_timestamp(&status.timestamp),
    }
    .render()
}

/// RFC 3339 timestamps are shown in UTC, anything else verbatim.
pub fn display_timestamp(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw.trim()) {
        Ok(parsed) => parsed
            .with_timezone(&Utc)
            .format("%Y-%m-%d %H:%M:%S UTC")
            .to_string(),
        Err(_) => raw.to_string(),
    }
}

#[cfg(test)]
#[path = "tests/dashboard_tests.rs"]
mod tests;
