use crate::state::messages::UiEvent;
use chrono::Utc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;

/// Ticking wall clock that drives "what's on now" re-evaluation.
pub struct LiveClock {
    ui_events: mpsc::Sender<UiEvent>,
    period: Duration,
}

impl LiveClock {
    pub fn new(ui_events: mpsc::Sender<UiEvent>, period: Duration) -> Self {
        Self { ui_events, period }
    }

    pub async fn run(self) {
        let mut ticks = interval(self.period);
        loop {
            ticks.tick().await;
            if self.ui_events.send(UiEvent::ClockTick(Utc::now())).await.is_err() {
                break;
            }
        }
    }
}
