use crate::{DAY_FORMAT, Event, EventKey, format_in};
use chrono::{DateTime, Local, TimeZone, Utc};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// How many runs the current-event notice lists after the current one.
pub const UPCOMING_IN_NOTICE: usize = 3;

/// Full event list as of one successful fetch, in document order.
///
/// Never mutated after construction; a refresh builds a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Schedule {
    events: Vec<Event>,
}

/// Events sharing one calendar day, in schedule order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayGroup {
    pub label: String,
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentEvent<'a> {
    /// Position in `Schedule::events`.
    pub index: usize,
    pub event: &'a Event,
}

/// Payload for a one-shot reminder about a single run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReminderRequest {
    pub key: EventKey,
    pub game: Option<String>,
    pub info: Option<String>,
    pub start_time_readable: String,
    #[serde(skip)]
    pub delay: Duration,
}

/// One line of a notice: "6:00 PM - Mario".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventSummary {
    pub game: Option<String>,
    pub start_time_readable: Option<String>,
}

impl fmt::Display for EventSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.start_time_readable.as_deref().unwrap_or("?"),
            self.game.as_deref().unwrap_or("?")
        )
    }
}

/// Periodic "what's on now" notice: the current run plus what follows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentEventNotice {
    pub current: Option<EventSummary>,
    pub info: Option<String>,
    pub upcoming: Vec<EventSummary>,
}

impl Schedule {
    pub fn new(events: Vec<Event>) -> Self {
        Self { events }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events that can be placed in time, with their index and start.
    fn timed(&self) -> impl Iterator<Item = (usize, &Event, DateTime<Utc>)> + '_ {
        self.events
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.start_instant().map(|start| (i, e, start)))
    }

    pub fn grouped_by_day(&self) -> Vec<DayGroup> {
        self.grouped_by_day_in(&Local)
    }

    /// Partition by local day label. Groups appear in first-seen order and keep
    /// schedule order inside; events without a start instant are left out.
    pub fn grouped_by_day_in<Tz: TimeZone>(&self, tz: &Tz) -> Vec<DayGroup>
    where
        Tz::Offset: fmt::Display,
    {
        let mut groups: Vec<DayGroup> = Vec::new();
        for (_, event, start) in self.timed() {
            let label = format_in(start, tz, DAY_FORMAT);
            match groups.iter_mut().find(|g| g.label == label) {
                Some(group) => group.events.push(event.clone()),
                None => groups.push(DayGroup { label, events: vec![event.clone()] }),
            }
        }
        groups
    }

    /// Index of the day group for `now`, used to open on today's runs.
    pub fn day_index_of<Tz: TimeZone>(groups: &[DayGroup], now: DateTime<Utc>, tz: &Tz) -> Option<usize>
    where
        Tz::Offset: fmt::Display,
    {
        let today = format_in(now, tz, DAY_FORMAT);
        groups.iter().position(|g| g.label == today)
    }

    /// The run in progress at `now`: the event whose start is at or before `now`
    /// and whose successor starts after it.
    ///
    /// The last timed event is never current since nothing bounds its end.
    pub fn current_event(&self, now: DateTime<Utc>) -> Option<CurrentEvent<'_>> {
        current_in(self.timed(), now)
    }

    /// Timed events starting strictly after `now`.
    pub fn upcoming(&self, now: DateTime<Utc>) -> impl Iterator<Item = &Event> + '_ {
        self.events.iter().filter(move |event| event.is_upcoming(now))
    }

    pub fn current_notice(&self, now: DateTime<Utc>) -> CurrentEventNotice {
        self.current_notice_in(now, &Local)
    }

    /// Current run plus the next few. With no current run, lists the next few
    /// runs that have not started yet.
    pub fn current_notice_in<Tz: TimeZone>(&self, now: DateTime<Utc>, tz: &Tz) -> CurrentEventNotice
    where
        Tz::Offset: fmt::Display,
    {
        let current = self.current_event(now);
        let upcoming: Vec<EventSummary> = match current {
            Some(c) => self
                .timed()
                .filter(|(i, _, _)| *i > c.index)
                .take(UPCOMING_IN_NOTICE)
                .map(|(_, e, _)| summarize(e, tz))
                .collect(),
            None => self
                .upcoming(now)
                .take(UPCOMING_IN_NOTICE)
                .map(|e| summarize(e, tz))
                .collect(),
        };

        CurrentEventNotice {
            current: current.map(|c| summarize(c.event, tz)),
            info: current.and_then(|c| c.event.info.clone()),
            upcoming,
        }
    }
}

/// Half-open window search over timed events in schedule order.
fn current_in<'a, I>(timed: I, now: DateTime<Utc>) -> Option<CurrentEvent<'a>>
where
    I: Iterator<Item = (usize, &'a Event, DateTime<Utc>)>,
{
    let mut timed = timed.peekable();
    while let Some((index, event, start)) = timed.next() {
        let (_, _, next_start) = *timed.peek()?;
        if start <= now && now < next_start {
            return Some(CurrentEvent { index, event });
        }
    }
    None
}

fn summarize<Tz: TimeZone>(event: &Event, tz: &Tz) -> EventSummary
where
    Tz::Offset: fmt::Display,
{
    EventSummary {
        game: event.game.clone(),
        start_time_readable: event.start_time_readable_in(tz),
    }
}

/// Time left until `event` starts, floored at zero. `None` without a start.
pub fn delay_until(event: &Event, now: DateTime<Utc>) -> Option<Duration> {
    let start = event.start_instant()?;
    Some((start - now).to_std().unwrap_or(Duration::ZERO))
}

impl Event {
    pub fn reminder(&self, now: DateTime<Utc>) -> Option<ReminderRequest> {
        self.reminder_in(now, &Local)
    }

    pub fn reminder_in<Tz: TimeZone>(&self, now: DateTime<Utc>, tz: &Tz) -> Option<ReminderRequest>
    where
        Tz::Offset: fmt::Display,
    {
        Some(ReminderRequest {
            key: self.key(),
            game: self.game.clone(),
            info: self.info.clone(),
            start_time_readable: self.start_time_readable_in(tz)?,
            delay: delay_until(self, now)?,
        })
    }
}
