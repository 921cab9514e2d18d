use chrono::{DateTime, Utc};
use gdq_api::client::{ApiResult, GdqApi};
use gdq_api::{DayGroup, Event, Schedule};
use log::{debug, warn};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, watch};

/// Anything that can produce a full, reconciled event list.
pub trait ScheduleSource: Send + Sync {
    fn fetch_schedule(&self) -> impl Future<Output = ApiResult<Vec<Event>>> + Send;
}

impl ScheduleSource for GdqApi {
    fn fetch_schedule(&self) -> impl Future<Output = ApiResult<Vec<Event>>> + Send {
        GdqApi::fetch_schedule(self)
    }
}

/// Owns the current schedule snapshot.
///
/// `refresh` is the only writer. Refreshes queue behind each other and publish
/// only after a full fetch, parse and reconcile; a failed refresh publishes
/// nothing. Readers clone the published `Arc` and never wait on the network.
pub struct ScheduleStore<S> {
    source: S,
    snapshot: watch::Sender<Arc<Schedule>>,
    refresh_lock: Mutex<()>,
}

impl<S: ScheduleSource> ScheduleStore<S> {
    pub fn new(source: S) -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Schedule::default()));
        Self { source, snapshot, refresh_lock: Mutex::new(()) }
    }

    pub async fn refresh(&self) -> ApiResult<Arc<Schedule>> {
        let _guard = self.refresh_lock.lock().await;

        let events = match self.source.fetch_schedule().await {
            Ok(events) => events,
            Err(e) => {
                warn!("schedule refresh failed, keeping previous snapshot: {e}");
                return Err(e);
            }
        };

        let schedule = Arc::new(Schedule::new(events));
        debug!("publishing schedule with {} events", schedule.len());
        self.snapshot.send_replace(schedule.clone());
        Ok(schedule)
    }

    /// Latest published snapshot; empty before the first successful refresh.
    pub fn current_snapshot(&self) -> Arc<Schedule> {
        self.snapshot.borrow().clone()
    }

    pub fn grouped_by_day(&self) -> Vec<DayGroup> {
        self.current_snapshot().grouped_by_day()
    }

    pub fn current_event(&self, now: DateTime<Utc>) -> Option<Event> {
        self.current_snapshot()
            .current_event(now)
            .map(|current| current.event.clone())
    }

    /// Notified each time a new snapshot is published.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Schedule>> {
        self.snapshot.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdq_api::client::ApiError;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    type Reply = (Option<Arc<Notify>>, ApiResult<Vec<Event>>);

    /// Hands out scripted replies in call order. A reply with a gate waits for
    /// the gate before resolving.
    struct ScriptedSource {
        replies: std::sync::Mutex<VecDeque<Reply>>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(replies: Vec<Reply>) -> Self {
            Self { replies: std::sync::Mutex::new(replies.into()), calls: AtomicUsize::new(0) }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ScheduleSource for ScriptedSource {
        fn fetch_schedule(&self) -> impl Future<Output = ApiResult<Vec<Event>>> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.replies.lock().unwrap().pop_front();
            async move {
                let (gate, reply) = next.expect("more fetches than scripted replies");
                if let Some(gate) = gate {
                    gate.notified().await;
                }
                reply
            }
        }
    }

    fn event(game: &str, start: &str) -> Event {
        Event {
            time_label: Some("1:00:00".into()),
            info: Some("Any%".into()),
            ..Event::open(game.into(), "Runner".into(), start.into())
        }
    }

    fn games(schedule: &Schedule) -> Vec<String> {
        schedule.events().iter().filter_map(|e| e.game.clone()).collect()
    }

    #[tokio::test]
    async fn empty_before_first_refresh() {
        let store = ScheduleStore::new(ScriptedSource::new(vec![]));
        assert!(store.current_snapshot().is_empty());
        assert!(store.grouped_by_day().is_empty());
        assert!(store.current_event(Utc::now()).is_none());
    }

    #[tokio::test]
    async fn refresh_publishes_snapshot() {
        let store = ScheduleStore::new(ScriptedSource::new(vec![(
            None,
            Ok(vec![event("Mario", "2024-01-01T18:00:00Z"), event("Zelda", "2024-01-01T19:30:00Z")]),
        )]));

        let published = store.refresh().await.unwrap();
        assert_eq!(games(&published), vec!["Mario", "Zelda"]);
        assert!(Arc::ptr_eq(&published, &store.current_snapshot()));

        let now = DateTime::parse_from_rfc3339("2024-01-01T18:30:00Z").unwrap().with_timezone(&Utc);
        assert_eq!(store.current_event(now).and_then(|e| e.game).as_deref(), Some("Mario"));
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_snapshot() {
        let store = ScheduleStore::new(ScriptedSource::new(vec![
            (None, Ok(vec![event("Mario", "2024-01-01T18:00:00Z")])),
            (None, Err(ApiError::Parsing("no table".into()))),
        ]));

        store.refresh().await.unwrap();
        let before = store.current_snapshot();
        let before_events = before.events().to_vec();

        assert!(store.refresh().await.is_err());
        let after = store.current_snapshot();
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(after.events(), before_events.as_slice());
    }

    #[tokio::test]
    async fn failed_first_refresh_leaves_store_empty() {
        let store = ScheduleStore::new(ScriptedSource::new(vec![(
            None,
            Err(ApiError::NotFound("offline".into())),
        )]));
        assert!(store.refresh().await.is_err());
        assert!(store.current_snapshot().is_empty());
    }

    #[tokio::test]
    async fn concurrent_refreshes_run_one_at_a_time() {
        let gate = Arc::new(Notify::new());
        let store = Arc::new(ScheduleStore::new(ScriptedSource::new(vec![
            (Some(gate.clone()), Ok(vec![event("Older", "2024-01-01T18:00:00Z")])),
            (None, Ok(vec![event("Newer", "2024-01-01T18:00:00Z")])),
        ])));

        let first = tokio::spawn({
            let store = store.clone();
            async move { store.refresh().await }
        });
        while store.source.calls() == 0 {
            tokio::task::yield_now().await;
        }

        let second = tokio::spawn({
            let store = store.clone();
            async move { store.refresh().await }
        });
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        // The second refresh is queued behind the first, and reads don't wait.
        assert_eq!(store.source.calls(), 1);
        assert!(store.current_snapshot().is_empty());

        gate.notify_one();
        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();

        assert_eq!(store.source.calls(), 2);
        assert_eq!(games(&store.current_snapshot()), vec!["Newer"]);
    }

    #[tokio::test]
    async fn subscribers_see_new_snapshots() {
        let store = ScheduleStore::new(ScriptedSource::new(vec![(
            None,
            Ok(vec![event("Mario", "2024-01-01T18:00:00Z")]),
        )]));
        let mut updates = store.subscribe();

        store.refresh().await.unwrap();
        updates.changed().await.unwrap();
        assert_eq!(games(&updates.borrow_and_update()), vec!["Mario"]);
    }
}
