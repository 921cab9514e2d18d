pub mod app_settings;
pub mod clock;
pub mod messages;
pub mod network;
pub mod refresher;
pub mod reminders;
pub mod store;
