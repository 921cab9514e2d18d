use chrono::{DateTime, Utc};
use gdq_api::Schedule;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkRequest {
    LoadSchedule,
    RefreshSchedule,
}

#[derive(Debug)]
pub enum NetworkResponse {
    ScheduleLoaded { schedule: Arc<Schedule> },
    /// Periodic re-fetch finished. Store subscribers see the new snapshot too.
    ScheduleRefreshed { schedule: Arc<Schedule> },
    Error { message: String },
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    AppStarted,
    ClockTick(DateTime<Utc>),
}
