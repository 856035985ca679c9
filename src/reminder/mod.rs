//! Reminder scheduling and state engine
//!
//! Scheduler, auto-reset policy, overlay lifecycle and keep-awake coordinator,
//! owned together by [`ReminderEngine`].

pub mod auto_reset;
pub mod command;
pub mod engine;
pub mod events;
pub mod gate;
pub mod keep_awake;
pub mod overlay;
pub mod scheduler;
pub mod suggestions;

pub use auto_reset::{AutoResetPolicy, LockSource};
pub use command::{Command, EngineRequest};
pub use engine::ReminderEngine;
pub use events::ReminderEvent;
pub use gate::{FirePolicy, WorkHoursPolicy};
pub use keep_awake::KeepAwakeCoordinator;
pub use overlay::{DismissReason, OverlayInput, OverlayLifecycle};
pub use scheduler::{IconState, Scheduler};
