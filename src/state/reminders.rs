use gdq_api::{EventKey, ReminderRequest};
use log::{debug, info};
use std::collections::{HashMap, HashSet};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// One-shot reminders keyed by event. Each reminder is a sleeping task that
/// hands its request back on `fired` when the run starts.
pub struct ReminderBook {
    pending: HashMap<EventKey, JoinHandle<()>>,
    fired: mpsc::Sender<ReminderRequest>,
}

impl ReminderBook {
    pub fn new(fired: mpsc::Sender<ReminderRequest>) -> Self {
        Self { pending: HashMap::new(), fired }
    }

    /// Register a reminder, replacing any pending one for the same event.
    /// Returns true when one was replaced.
    pub fn schedule(&mut self, request: ReminderRequest) -> bool {
        self.prune();
        let replaced = self.cancel(&request.key);

        debug!("reminder for {} in {:?}", request.key, request.delay);
        let key = request.key.clone();
        let fired = self.fired.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(request.delay).await;
            let _ = fired.send(request).await;
        });
        self.pending.insert(key, handle);
        replaced
    }

    pub fn cancel(&mut self, key: &EventKey) -> bool {
        match self.pending.remove(key) {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Cancel pending reminders whose event is not in `keys`. Returns how many
    /// were cancelled.
    pub fn retain_keys(&mut self, keys: &HashSet<EventKey>) -> usize {
        self.prune();
        let stale: Vec<EventKey> =
            self.pending.keys().filter(|key| !keys.contains(*key)).cloned().collect();
        for key in &stale {
            debug!("dropping reminder for {key}, no longer scheduled");
            self.cancel(key);
        }
        stale.len()
    }

    /// Drop every pending reminder. Returns how many were still waiting.
    pub fn cancel_all(&mut self) -> usize {
        self.prune();
        let count = self.pending.len();
        for (_, handle) in self.pending.drain() {
            handle.abort();
        }
        if count > 0 {
            info!("cleared {count} pending reminders");
        }
        count
    }

    pub fn len(&self) -> usize {
        self.pending.values().filter(|h| !h.is_finished()).count()
    }

    fn prune(&mut self) {
        self.pending.retain(|_, handle| !handle.is_finished());
    }
}
