//! Point-in-time view of the engine, published after every command

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{
    profile::{Timing, WorkProfile},
    settings::ReminderSettings,
};
use crate::reminder::{
    auto_reset::LockSession,
    scheduler::{IconState, SchedulerState},
    suggestions::BreakSuggestion,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OverlayStatus {
    pub visible: bool,
    pub remaining: u32,
    pub displays: usize,
    pub suggestion: Option<BreakSuggestion>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub enabled: bool,
    pub scheduler: SchedulerState,
    pub remaining_seconds: Option<i64>,
    pub countdown: String,
    pub icon_state: IconState,
    pub progress: f64,
    /// Interval and break duration in effect, after profile resolution
    pub timing: Timing,
    pub active_profile: Option<Uuid>,
    pub lock_session: Option<LockSession>,
    pub overlay: OverlayStatus,
    pub keep_awake_active: bool,
    pub within_work_hours: bool,
    pub settings: ReminderSettings,
    pub profiles: Vec<WorkProfile>,
    pub updated_at: DateTime<Utc>,
}

impl StatusSnapshot {
    /// Whether a reminder cycle is counting down
    pub fn is_running(&self) -> bool {
        self.scheduler.next_fire_at.is_some()
    }
}
