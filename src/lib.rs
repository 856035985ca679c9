//! Break Reminder - recurring break reminders with a full-screen overlay
//!
//! This library provides the reminder scheduling and state engine: a
//! countdown that fires at a configurable interval, a break overlay spanning
//! every display, an auto-reset when the screen was locked long enough to
//! count as a break, and an idempotent keep-awake toggle. The daemon binary
//! wires it to desktop tools and an HTTP control surface.

pub mod api;
pub mod config;
pub mod reminder;
pub mod services;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use reminder::{Command, ReminderEngine, ReminderEvent};
pub use state::{AppState, StatusSnapshot};
pub use utils::signals::shutdown_signal;
