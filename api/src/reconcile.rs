//! Folds the game/info row stream into events.
//!
//! Pairing is positional: an info row always lands on the most recently opened
//! event. A dropped or doubled row shifts every later pairing; nothing here
//! tries to resynchronize.
use crate::{Event, RawRow};
use log::debug;

#[derive(Debug, Default)]
enum State {
    /// No game row seen yet. Info rows are dropped.
    #[default]
    Idle,
    /// A game row opened this event; its info row has not arrived.
    AwaitingInfo(Event),
    /// The open event has its info. Another info row overwrites it.
    Filled(Event),
}

#[derive(Debug, Default)]
pub struct Reconciler {
    state: State,
    events: Vec<Event>,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: RawRow) {
        let state = std::mem::take(&mut self.state);
        self.state = match (state, row) {
            (open, RawRow::Game { title, runner, start_time }) => {
                self.close(open);
                State::AwaitingInfo(Event::open(title, runner, start_time))
            }
            (State::Idle, RawRow::Info { time_label, .. }) => {
                debug!("dropping info row ({time_label}) with no open game row");
                State::Idle
            }
            (State::AwaitingInfo(event) | State::Filled(event), RawRow::Info { time_label, description }) => {
                State::Filled(Event {
                    time_label: Some(time_label),
                    info: Some(description),
                    ..event
                })
            }
        };
    }

    /// Close the open event, if any, and return every event in row order.
    pub fn finish(mut self) -> Vec<Event> {
        let state = std::mem::take(&mut self.state);
        self.close(state);
        self.events
    }

    fn close(&mut self, state: State) {
        match state {
            State::Idle => {}
            State::AwaitingInfo(event) | State::Filled(event) => self.events.push(event),
        }
    }
}

pub fn reconcile<I>(rows: I) -> Vec<Event>
where
    I: IntoIterator<Item = RawRow>,
{
    let mut reconciler = Reconciler::new();
    for row in rows {
        reconciler.push(row);
    }
    reconciler.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(title: &str, runner: &str, start: &str) -> RawRow {
        RawRow::Game {
            title: title.into(),
            runner: runner.into(),
            start_time: start.into(),
        }
    }

    fn info(time_label: &str, description: &str) -> RawRow {
        RawRow::Info {
            time_label: time_label.into(),
            description: description.into(),
        }
    }

    #[test]
    fn pairs_games_with_following_info() {
        let events = reconcile([
            game("Mario", "RunnerA", "2024-01-01T18:00:00Z"),
            info("1:30:00", "Any% speedrun"),
            game("Zelda", "RunnerB", "2024-01-01T19:30:00Z"),
            info("2:00:00", "Glitchless"),
        ]);

        assert_eq!(
            events,
            vec![
                Event {
                    game: Some("Mario".into()),
                    runner: Some("RunnerA".into()),
                    start_time: Some("2024-01-01T18:00:00Z".into()),
                    time_label: Some("1:30:00".into()),
                    info: Some("Any% speedrun".into()),
                },
                Event {
                    game: Some("Zelda".into()),
                    runner: Some("RunnerB".into()),
                    start_time: Some("2024-01-01T19:30:00Z".into()),
                    time_label: Some("2:00:00".into()),
                    info: Some("Glitchless".into()),
                },
            ]
        );
    }

    #[test]
    fn n_pairs_make_n_complete_events() {
        for n in [0usize, 1, 7, 50] {
            let rows = (0..n).flat_map(|i| {
                [
                    game(&format!("Game {i}"), "Runner", "2024-01-01T18:00:00Z"),
                    info("0:30:00", &format!("Category {i}")),
                ]
            });
            let events = reconcile(rows);
            assert_eq!(events.len(), n);
            assert!(events.iter().all(Event::is_complete));
        }
    }

    #[test]
    fn leading_info_row_is_dropped() {
        let events = reconcile([
            info("0:10:00", "Pre-show"),
            game("Mario", "RunnerA", "2024-01-01T18:00:00Z"),
            info("1:30:00", "Any% speedrun"),
        ]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].info.as_deref(), Some("Any% speedrun"));
    }

    #[test]
    fn only_info_rows_make_nothing() {
        assert!(reconcile([info("1:00:00", "a"), info("2:00:00", "b")]).is_empty());
    }

    #[test]
    fn trailing_game_row_stays_open() {
        let events = reconcile([
            game("Mario", "RunnerA", "2024-01-01T18:00:00Z"),
            info("1:30:00", "Any% speedrun"),
            game("Zelda", "RunnerB", "2024-01-01T19:30:00Z"),
        ]);
        assert_eq!(events.len(), 2);
        assert!(events[1].info.is_none());
        assert!(events[1].time_label.is_none());
    }

    #[test]
    fn missing_info_row_shifts_later_pairings() {
        let events = reconcile([
            game("Mario", "RunnerA", "2024-01-01T18:00:00Z"),
            game("Zelda", "RunnerB", "2024-01-01T19:30:00Z"),
            info("1:30:00", "Any% speedrun"),
        ]);
        assert_eq!(events.len(), 2);
        assert!(events[0].info.is_none());
        assert_eq!(events[1].game.as_deref(), Some("Zelda"));
        assert_eq!(events[1].info.as_deref(), Some("Any% speedrun"));
    }

    #[test]
    fn doubled_info_row_overwrites_the_open_event() {
        let events = reconcile([
            game("Mario", "RunnerA", "2024-01-01T18:00:00Z"),
            info("1:30:00", "Any% speedrun"),
            info("2:00:00", "Glitchless"),
        ]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].time_label.as_deref(), Some("2:00:00"));
        assert_eq!(events[0].info.as_deref(), Some("Glitchless"));
    }
}
