pub mod client;
pub mod parser;
pub mod reconcile;
pub mod schedule;

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use std::fmt;

pub use schedule::{
    CurrentEvent, CurrentEventNotice, DayGroup, EventSummary, ReminderRequest, Schedule,
};

/// Readable start time, e.g. "6:00 PM".
pub const TIME_FORMAT: &str = "%-I:%M %p";
/// Day label used to group the schedule into tabs, e.g. "Jan 1".
pub const DAY_FORMAT: &str = "%b %-d";
/// Status line timestamp, e.g. "Jan 1, 6:00 PM".
pub const STATUS_FORMAT: &str = "%b %-d, %-I:%M %p";

// ---------------------------------------------------------------------------
// Row types, one per table row shape, produced in document order
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawRow {
    /// Even rows: the run itself.
    Game {
        title: String,
        runner: String,
        start_time: String,
    },
    /// Odd rows: estimate and category of the run above.
    Info {
        time_label: String,
        description: String,
    },
}

// ---------------------------------------------------------------------------
// Event: one reconciled run
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub game: Option<String>,
    pub runner: Option<String>,
    /// ISO-8601 instant as scraped. Source of truth for ordering.
    pub start_time: Option<String>,
    /// Estimated duration label, e.g. "1:30:00".
    pub time_label: Option<String>,
    pub info: Option<String>,
}

impl Event {
    /// Open an event from a game row. The info half is filled in later.
    pub fn open(title: String, runner: String, start_time: String) -> Self {
        let start_time = Some(start_time.trim().to_owned()).filter(|s| !s.is_empty());
        Self {
            game: Some(title),
            runner: Some(runner),
            start_time,
            time_label: None,
            info: None,
        }
    }

    /// Parsed start instant. `None` when the start time is missing or malformed;
    /// such events are left out of grouping and resolution.
    pub fn start_instant(&self) -> Option<DateTime<Utc>> {
        let raw = self.start_time.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn start_time_readable(&self) -> Option<String> {
        self.start_time_readable_in(&chrono::Local)
    }

    pub fn start_time_readable_in<Tz: TimeZone>(&self, tz: &Tz) -> Option<String>
    where
        Tz::Offset: fmt::Display,
    {
        self.start_instant().map(|i| format_in(i, tz, TIME_FORMAT))
    }

    pub fn day_label_in<Tz: TimeZone>(&self, tz: &Tz) -> Option<String>
    where
        Tz::Offset: fmt::Display,
    {
        self.start_instant().map(|i| format_in(i, tz, DAY_FORMAT))
    }

    /// Stable natural key used to register and cancel reminders.
    pub fn key(&self) -> EventKey {
        EventKey::new(self.game.as_deref(), self.info.as_deref())
    }

    /// True while the run has not started yet. Only upcoming runs take reminders.
    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.start_instant().is_some_and(|start| now < start)
    }

    /// Has both halves: a game row and its info row.
    pub fn is_complete(&self) -> bool {
        self.game.is_some()
            && self.runner.is_some()
            && self.start_time.is_some()
            && self.time_label.is_some()
            && self.info.is_some()
    }
}

/// Identity of an event for reminder bookkeeping: the `(game, info)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EventKey(String);

impl EventKey {
    pub fn new(game: Option<&str>, info: Option<&str>) -> Self {
        Self(format!("{}{}", game.unwrap_or_default(), info.unwrap_or_default()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn format_in<Tz: TimeZone>(instant: DateTime<Utc>, tz: &Tz, format: &str) -> String
where
    Tz::Offset: fmt::Display,
{
    instant.with_timezone(tz).format(format).to_string()
}
