use gdq_api::client::{SCHEDULE_URL, ScheduleEndpoint};
use log::LevelFilter;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_REFRESH_SECS: u64 = 600;
const MIN_REFRESH_SECS: u64 = 30;
const DEFAULT_CLOCK_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq)]
pub struct AppSettings {
    pub endpoint: ScheduleEndpoint,
    pub refresh_interval: Duration,
    pub clock_interval: Duration,
    pub log_level: LevelFilter,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            endpoint: ScheduleEndpoint::Url(SCHEDULE_URL.to_owned()),
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_SECS),
            clock_interval: Duration::from_secs(DEFAULT_CLOCK_SECS),
            log_level: LevelFilter::Warn,
        }
    }
}

impl AppSettings {
    pub fn load() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from a variable lookup. Unparseable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let present = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let secs = |key: &str| present(key).and_then(|v| v.trim().parse::<u64>().ok());

        let endpoint = match (present("GDQ_SCHEDULE_HTML"), present("GDQ_SCHEDULE_URL")) {
            (Some(path), _) => ScheduleEndpoint::File(PathBuf::from(path)),
            (None, Some(url)) => ScheduleEndpoint::Url(url),
            (None, None) => defaults.endpoint,
        };

        let refresh_interval = secs("GDQ_REFRESH_SECS")
            .map(|s| Duration::from_secs(s.max(MIN_REFRESH_SECS)))
            .unwrap_or(defaults.refresh_interval);

        let clock_interval = secs("GDQ_CLOCK_SECS")
            .filter(|s| *s > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.clock_interval);

        let log_level = present("GDQ_LOG_LEVEL")
            .and_then(|v| v.trim().parse::<LevelFilter>().ok())
            .unwrap_or(defaults.log_level);

        Self { endpoint, refresh_interval, clock_interval, log_level }
    }
}
