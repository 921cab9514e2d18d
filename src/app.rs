use crate::cli::WatchOptions;
use crate::state::app_settings::AppSettings;
use crate::state::reminders::ReminderBook;
use crate::state::store::{ScheduleSource, ScheduleStore};
use chrono::{DateTime, Utc};
use gdq_api::{CurrentEventNotice, Event, EventKey, Schedule};
use log::{info, warn};
use std::collections::HashSet;
use std::sync::Arc;

/// Identity of the run in progress. The start time tells apart back-to-back
/// runs that share a game and category.
type NowPlaying = (EventKey, Option<String>);

pub struct App<S> {
    pub settings: AppSettings,
    pub store: Arc<ScheduleStore<S>>,
    pub reminders: ReminderBook,
    pub options: WatchOptions,
    now_playing: Option<NowPlaying>,
    pub last_error: Option<String>,
}

impl<S: ScheduleSource> App<S> {
    pub fn new(
        settings: AppSettings,
        store: Arc<ScheduleStore<S>>,
        reminders: ReminderBook,
        options: WatchOptions,
    ) -> Self {
        Self {
            settings,
            store,
            reminders,
            options,
            now_playing: None,
            last_error: None,
        }
    }

    // -----------------------------------------------------------------------
    // Network response handlers, called from the watch loop
    // -----------------------------------------------------------------------

    /// A new snapshot was published. Re-registers reminders for every upcoming
    /// run matching a `--remind` title so start times that moved are picked up,
    /// and cancels reminders for runs that no longer match.
    /// Returns the number of reminders registered.
    pub fn on_schedule_loaded(&mut self, schedule: &Schedule, now: DateTime<Utc>) -> usize {
        let requests: Vec<_> = self
            .reminder_matches(schedule, now)
            .filter_map(|event| event.reminder(now))
            .collect();

        let keys: HashSet<EventKey> = requests.iter().map(|r| r.key.clone()).collect();
        let dropped = self.reminders.retain_keys(&keys);
        if dropped > 0 {
            info!("{dropped} reminders cancelled, their runs changed or left the schedule");
        }

        let count = requests.len();
        for request in requests {
            self.reminders.schedule(request);
        }
        if count > 0 {
            info!("{count} reminders registered");
        }
        count
    }

    pub fn on_refresh_succeeded(&mut self) {
        self.last_error = None;
    }

    pub fn on_error(&mut self, message: String) {
        warn!("keeping last schedule: {message}");
        self.last_error = Some(message);
    }

    /// Re-resolve the run in progress. Returns the new current run when it changed.
    pub fn on_clock_tick(&mut self, now: DateTime<Utc>) -> Option<Option<Event>> {
        let current = self.store.current_event(now);
        let playing = current.as_ref().map(|e| (e.key(), e.start_time.clone()));
        if playing == self.now_playing {
            return None;
        }
        self.now_playing = playing;
        Some(current)
    }

    pub fn current_notice(&self, now: DateTime<Utc>) -> CurrentEventNotice {
        self.store.current_snapshot().current_notice(now)
    }

    fn reminder_matches<'a>(
        &'a self,
        schedule: &'a Schedule,
        now: DateTime<Utc>,
    ) -> impl Iterator<Item = &'a Event> + 'a {
        let needles: Vec<String> = self.options.remind.iter().map(|s| s.to_lowercase()).collect();
        schedule.upcoming(now).filter(move |event| {
            let title = event.game.as_deref().unwrap_or_default().to_lowercase();
            needles.iter().any(|needle| title.contains(needle.as_str()))
        })
    }
}
