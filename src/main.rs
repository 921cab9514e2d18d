mod app;
mod cli;
mod report;
mod state;

use crate::app::App;
use crate::cli::{Command, WatchOptions};
use crate::state::app_settings::AppSettings;
use crate::state::clock::LiveClock;
use crate::state::messages::{NetworkRequest, NetworkResponse, UiEvent};
use crate::state::network::NetworkWorker;
use crate::state::refresher::PeriodicRefresher;
use crate::state::reminders::ReminderBook;
use crate::state::store::ScheduleStore;
use chrono::{Local, Utc};
use gdq_api::ReminderRequest;
use gdq_api::client::GdqApi;
use log::{debug, error, info};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let command = match cli::parse_args(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(message) => {
            eprintln!("{message}\n\n{}", cli::usage_text());
            std::process::exit(2);
        }
    };

    match command {
        Command::Help => {
            println!("{}", cli::usage_text());
            return Ok(());
        }
        Command::Version => {
            println!("gdq-schedule {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => {}
    }

    better_panic::install();

    let settings = AppSettings::load();
    setup_logging(&settings);

    let store = Arc::new(ScheduleStore::new(GdqApi::with_endpoint(settings.endpoint.clone())));

    match command {
        Command::List { json } => {
            let schedule = store.refresh().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&store.grouped_by_day())?);
            } else {
                let now = Utc::now();
                println!("{}\n", report::status_line(now, &Local));
                print!("{}", report::schedule_text(&schedule, now, &Local));
            }
        }
        Command::Now => {
            let schedule = store.refresh().await?;
            print!("{}", report::notice_text(&schedule.current_notice(Utc::now())));
        }
        Command::Watch(options) => run_watch(settings, store, options).await,
        Command::Help | Command::Version => {}
    }

    Ok(())
}

fn setup_logging(settings: &AppSettings) {
    let default_directive = settings.log_level.as_str().to_lowercase();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    // The subscriber also picks up `log` records through its tracing-log bridge.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run_watch(settings: AppSettings, store: Arc<ScheduleStore<GdqApi>>, options: WatchOptions) {
    let (ui_event_tx, ui_event_rx) = mpsc::channel::<UiEvent>(100);
    let (network_req_tx, network_req_rx) = mpsc::channel::<NetworkRequest>(100);
    let (network_resp_tx, network_resp_rx) = mpsc::channel::<NetworkResponse>(100);
    let (reminder_tx, reminder_rx) = mpsc::channel::<ReminderRequest>(100);

    let mut app = App::new(settings, store.clone(), ReminderBook::new(reminder_tx), options);

    // Network thread
    let network_worker = NetworkWorker::new(store, network_req_rx, network_resp_tx);
    let network_task = tokio::spawn(network_worker.run());

    // Periodic schedule refresh thread
    let periodic_updater =
        PeriodicRefresher::new(network_req_tx.clone(), app.settings.refresh_interval);
    let periodic_task = tokio::spawn(periodic_updater.run());

    // Live clock thread
    let clock = LiveClock::new(ui_event_tx.clone(), app.settings.clock_interval);
    let clock_task = tokio::spawn(clock.run());

    // Trigger schedule load on startup
    let _ = ui_event_tx.send(UiEvent::AppStarted).await;

    println!("Watching {}  ({})", app.settings.endpoint, report::status_line(Utc::now(), &Local));

    main_loop(&mut app, ui_event_rx, network_req_tx, network_resp_rx, reminder_rx).await;

    app.reminders.cancel_all();
    network_task.abort();
    periodic_task.abort();
    clock_task.abort();
}

async fn main_loop(
    app: &mut App<GdqApi>,
    mut ui_events: mpsc::Receiver<UiEvent>,
    network_requests: mpsc::Sender<NetworkRequest>,
    mut network_responses: mpsc::Receiver<NetworkResponse>,
    mut reminders: mpsc::Receiver<ReminderRequest>,
) {
    let mut snapshots = app.store.subscribe();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            Some(ui_event) = ui_events.recv() => {
                handle_ui_event(ui_event, app, &network_requests).await;
            }

            Some(response) = network_responses.recv() => {
                handle_network_response(response, app);
            }

            Ok(()) = snapshots.changed() => {
                let schedule = snapshots.borrow_and_update().clone();
                app.on_schedule_loaded(&schedule, Utc::now());
                debug!("{} reminders pending", app.reminders.len());
            }

            Some(request) = reminders.recv() => {
                info!("reminder fired for {}", request.key);
                println!("{}", report::reminder_text(&request));
            }

            _ = &mut shutdown => {
                debug!("shutting down");
                break;
            }
        }
    }
}

async fn handle_ui_event(
    ui_event: UiEvent,
    app: &mut App<GdqApi>,
    network_requests: &mpsc::Sender<NetworkRequest>,
) {
    match ui_event {
        UiEvent::AppStarted => {
            let _ = network_requests.send(NetworkRequest::LoadSchedule).await;
        }
        UiEvent::ClockTick(now) => {
            if let Some(current) = app.on_clock_tick(now) {
                println!("{}", report::now_playing_text(current.as_ref()));
            }
        }
    }
}

fn handle_network_response(response: NetworkResponse, app: &mut App<GdqApi>) {
    let now = Utc::now();
    match response {
        NetworkResponse::ScheduleLoaded { schedule } => {
            app.on_refresh_succeeded();
            print!("{}", report::schedule_text(&schedule, now, &Local));
            if let Some(current) = app.on_clock_tick(now) {
                println!("{}", report::now_playing_text(current.as_ref()));
            }
        }
        NetworkResponse::ScheduleRefreshed { schedule } => {
            debug!("schedule refreshed, {} runs", schedule.len());
            app.on_refresh_succeeded();
        }
        NetworkResponse::Error { message } => {
            error!("Network error: {message}");
            app.on_error(message);
        }
    }

    if app.options.notify_current {
        if let Some(stale) = &app.last_error {
            eprintln!("(last refresh failed: {stale})");
        }
        print!("{}", report::notice_text(&app.current_notice(now)));
    }
}
