//! Background tasks module
//!
//! The engine loop, its tick sources, and the OS monitors feeding it.

pub mod display_probe;
pub mod reminder_loop;
pub mod screen_monitor;
pub mod ticker;

// Re-export main functions
pub use display_probe::display_probe_task;
pub use reminder_loop::{reminder_loop, QUEUE_CAPACITY};
pub use screen_monitor::screen_monitor_task;
pub use ticker::{TickHandle, TickTarget, Ticker};
