//! State management module
//!
//! Settings, profiles and the work schedule, the published status snapshot,
//! and the shared handle the HTTP layer uses to reach the engine.

pub mod app_state;
pub mod profile;
pub mod schedule;
pub mod settings;
pub mod snapshot;

// Re-export main types
pub use app_state::{AppState, DispatchError};
pub use profile::{ProfileCatalog, WorkProfile};
pub use schedule::WorkSchedule;
pub use settings::{MemorySettingsStore, ReminderSettings, SettingsPatch, SettingsStore};
pub use snapshot::StatusSnapshot;
