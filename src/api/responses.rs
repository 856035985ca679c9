//! API response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::{
    schedule::{SchedulePreset, SCHEDULE_PRESETS},
    settings::{ReminderSettings, PRESET_INTERVAL_MINUTES, PRESET_OVERLAY_SECONDS},
    StatusSnapshot, WorkProfile,
};

/// API response structure for state change endpoints
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub state: StatusSnapshot,
}

impl ApiResponse {
    /// Create a new API response
    pub fn new(status: String, message: String, state: StatusSnapshot) -> Self {
        Self {
            status,
            message,
            timestamp: Utc::now(),
            state,
        }
    }

    /// "active" while reminders run, "paused" otherwise
    pub fn from_snapshot(message: String, state: StatusSnapshot) -> Self {
        let status = if state.enabled { "active" } else { "paused" };
        Self::new(status.to_string(), message, state)
    }
}

/// Error body for rejected commands
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    pub fn new(message: String) -> Self {
        Self {
            status: "error".to_string(),
            message,
            timestamp: Utc::now(),
        }
    }
}

/// Status response with server metadata
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub state: StatusSnapshot,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SettingsResponse {
    pub settings: ReminderSettings,
    pub schedule_presets: &'static [SchedulePreset],
    pub interval_presets_minutes: &'static [u32],
    pub overlay_presets_seconds: &'static [u32],
}

impl SettingsResponse {
    pub fn new(settings: ReminderSettings) -> Self {
        Self {
            settings,
            schedule_presets: &SCHEDULE_PRESETS,
            interval_presets_minutes: &PRESET_INTERVAL_MINUTES,
            overlay_presets_seconds: &PRESET_OVERLAY_SECONDS,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfilesResponse {
    pub profiles: Vec<WorkProfile>,
    pub active_profile: Option<Uuid>,
}

impl From<StatusSnapshot> for ProfilesResponse {
    fn from(snapshot: StatusSnapshot) -> Self {
        Self {
            profiles: snapshot.profiles,
            active_profile: snapshot.active_profile,
        }
    }
}

/// Body of `POST /profiles`
#[derive(Debug, Clone, Deserialize)]
pub struct NewProfileRequest {
    pub name: String,
    pub interval_seconds: u32,
    pub break_duration_seconds: u32,
    #[serde(default)]
    pub icon: Option<String>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
