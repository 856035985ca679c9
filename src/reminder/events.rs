//! State-change events published by the engine

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{
    auto_reset::LockSource,
    overlay::{DismissReason, OverlayShown},
    scheduler::IconState,
};
use crate::state::{profile::WorkProfile, settings::ReminderSettings};

/// Broadcast to every subscriber; presentation layers render from these
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReminderEvent {
    SchedulerStarted {
        next_fire_at: DateTime<Utc>,
        interval_seconds: u32,
    },
    SchedulerStopped,
    ReminderFired {
        fired_at: DateTime<Utc>,
        next_fire_at: DateTime<Utc>,
    },
    /// The deadline passed outside work hours; rescheduled without side effects
    ReminderSuppressed {
        at: DateTime<Utc>,
        next_fire_at: DateTime<Utc>,
    },
    Snoozed {
        duration_seconds: u32,
        next_fire_at: DateTime<Utc>,
    },
    Skipped {
        next_fire_at: DateTime<Utc>,
    },
    Tick {
        remaining_seconds: Option<i64>,
        countdown: String,
        icon_state: IconState,
        progress: f64,
    },
    IconStateChanged {
        from: IconState,
        to: IconState,
    },
    LockStarted {
        source: LockSource,
        at: DateTime<Utc>,
    },
    LockEnded {
        source: LockSource,
        away_seconds: i64,
        reset: bool,
    },
    OverlayShown(OverlayShown),
    OverlayCountdown {
        remaining: u32,
    },
    OverlayDismissed {
        reason: DismissReason,
    },
    KeepAwakeChanged {
        active: bool,
    },
    SettingsChanged {
        settings: ReminderSettings,
    },
    ProfilesChanged {
        profiles: Vec<WorkProfile>,
    },
}

impl ReminderEvent {
    /// Event name used for SSE framing
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SchedulerStarted { .. } => "scheduler_started",
            Self::SchedulerStopped => "scheduler_stopped",
            Self::ReminderFired { .. } => "reminder_fired",
            Self::ReminderSuppressed { .. } => "reminder_suppressed",
            Self::Snoozed { .. } => "snoozed",
            Self::Skipped { .. } => "skipped",
            Self::Tick { .. } => "tick",
            Self::IconStateChanged { .. } => "icon_state_changed",
            Self::LockStarted { .. } => "lock_started",
            Self::LockEnded { .. } => "lock_ended",
            Self::OverlayShown(_) => "overlay_shown",
            Self::OverlayCountdown { .. } => "overlay_countdown",
            Self::OverlayDismissed { .. } => "overlay_dismissed",
            Self::KeepAwakeChanged { .. } => "keep_awake_changed",
            Self::SettingsChanged { .. } => "settings_changed",
            Self::ProfilesChanged { .. } => "profiles_changed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_a_type_tag() {
        let value = serde_json::to_value(ReminderEvent::LockEnded {
            source: LockSource::SessionLock,
            away_seconds: 360,
            reset: true,
        })
        .unwrap();
        assert_eq!(value["type"], "lock_ended");
        assert_eq!(value["source"], "session_lock");
        assert_eq!(value["away_seconds"], 360);

        let value = serde_json::to_value(ReminderEvent::SchedulerStopped).unwrap();
        assert_eq!(value["type"], ReminderEvent::SchedulerStopped.kind());
    }
}
