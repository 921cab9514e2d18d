use chrono::{DateTime, TimeZone, Utc};
use gdq_api::{CurrentEventNotice, Event, ReminderRequest, STATUS_FORMAT, Schedule, format_in};
use std::fmt::{self, Write};

const CURRENT_MARKER: &str = ">";
const TODAY_MARKER: &str = " (today)";

pub fn status_line<Tz: TimeZone>(now: DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: fmt::Display,
{
    format_in(now, tz, STATUS_FORMAT)
}

/// Day-by-day listing. The run in progress is marked and today's day is flagged.
pub fn schedule_text<Tz: TimeZone>(schedule: &Schedule, now: DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: fmt::Display,
{
    let groups = schedule.grouped_by_day_in(tz);
    if groups.is_empty() {
        return "No runs scheduled.\n".to_owned();
    }

    let today = Schedule::day_index_of(&groups, now, tz);
    let current = schedule.current_event(now).map(|c| c.event);

    let mut out = String::new();
    for (index, group) in groups.iter().enumerate() {
        let flag = if today == Some(index) { TODAY_MARKER } else { "" };
        let _ = writeln!(out, "== {}{flag}", group.label);
        for event in &group.events {
            let marker = if current == Some(event) { CURRENT_MARKER } else { " " };
            let _ = writeln!(out, "{marker} {}", event_line(event, tz));
        }
    }
    out
}

fn event_line<Tz: TimeZone>(event: &Event, tz: &Tz) -> String
where
    Tz::Offset: fmt::Display,
{
    let mut line = format!(
        "{:>8}  {}",
        event.start_time_readable_in(tz).unwrap_or_default(),
        event.game.as_deref().unwrap_or("?"),
    );
    if let Some(info) = &event.info {
        let _ = write!(line, " ({info})");
    }
    if let Some(runner) = &event.runner {
        let _ = write!(line, " - {runner}");
    }
    if let Some(estimate) = &event.time_label {
        let _ = write!(line, " [{estimate}]");
    }
    line
}

pub fn notice_text(notice: &CurrentEventNotice) -> String {
    let mut out = match &notice.current {
        Some(current) => format!("Now: {current}\n"),
        None => "Now: nothing running\n".to_owned(),
    };
    if let Some(info) = &notice.info {
        let _ = writeln!(out, "      {info}");
    }
    for next in &notice.upcoming {
        let _ = writeln!(out, "Next: {next}");
    }
    out
}

pub fn now_playing_text(event: Option<&Event>) -> String {
    match event {
        Some(event) => format!(
            "Now playing: {} ({})",
            event.game.as_deref().unwrap_or("?"),
            event.info.as_deref().unwrap_or_default()
        ),
        None => "Now playing: nothing".to_owned(),
    }
}

pub fn reminder_text(request: &ReminderRequest) -> String {
    format!(
        "Starting {}: {} ({})",
        request.start_time_readable,
        request.game.as_deref().unwrap_or("?"),
        request.info.as_deref().unwrap_or_default()
    )
}
