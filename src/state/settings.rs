//! Reminder settings and the key/value store they persist through

use std::collections::HashMap;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use super::schedule::{SchedulePreset, WorkSchedule};

/// Narrow durable key/value interface the core reads and writes settings through
pub trait SettingsStore: Send {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&mut self, key: &str, value: Value);
}

/// Volatile store, used when no settings file is configured and in tests
#[derive(Debug, Default, Clone)]
pub struct MemorySettingsStore {
    values: HashMap<String, Value>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
    }
}

/// Persisted setting keys
pub mod keys {
    pub const INTERVAL_SECONDS: &str = "interval_seconds";
    pub const BREAK_DURATION_SECONDS: &str = "break_duration_seconds";
    pub const SNOOZE_DURATION_SECONDS: &str = "snooze_duration_seconds";
    pub const OVERLAY_DURATION_SECONDS: &str = "overlay_duration_seconds";
    pub const ENABLED: &str = "enabled";
    pub const AUTO_RESET_ON_SCREEN_LOCK: &str = "auto_reset_on_screen_lock";
    pub const KEEP_AWAKE: &str = "keep_awake";
    pub const ENABLE_OVERLAY: &str = "enable_overlay";
    pub const ENABLE_SOUND: &str = "enable_sound";
    pub const ENABLE_SCREEN_SAVER: &str = "enable_screen_saver";
    pub const OVERLAY_COLOR: &str = "overlay_color";
    pub const NOTIFICATION_SOUND: &str = "notification_sound";
    pub const WORK_SCHEDULE: &str = "work_schedule";
    pub const ACTIVE_PROFILE: &str = "active_profile";
    pub const CUSTOM_PROFILES: &str = "custom_profiles";
}

pub const INTERVAL_RANGE: (u32, u32) = (5 * 60, 180 * 60);
pub const BREAK_DURATION_RANGE: (u32, u32) = (60, 30 * 60);
pub const SNOOZE_DURATION_RANGE: (u32, u32) = (60, 30 * 60);
pub const OVERLAY_DURATION_RANGE: (u32, u32) = (5, 300);

/// Interval choices offered in the menu, in minutes
pub const PRESET_INTERVAL_MINUTES: [u32; 8] = [15, 20, 25, 30, 45, 60, 90, 120];
/// Overlay duration choices offered in the menu, in seconds
pub const PRESET_OVERLAY_SECONDS: [u32; 6] = [5, 10, 15, 20, 30, 60];

fn clamp(value: u32, (min, max): (u32, u32)) -> u32 {
    value.clamp(min, max)
}

/// Tint of the break overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayColor {
    #[default]
    Blue,
    Teal,
    Green,
    Orange,
    Pink,
    Purple,
    Red,
    Gray,
}

/// Sound played with a reminder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NotificationSound {
    #[default]
    #[serde(rename = "default")]
    Default,
    Glass,
    Ping,
    Pop,
    Purr,
    Submarine,
    Tink,
    Blow,
    Bottle,
    Frog,
    Funk,
    Hero,
    Morse,
    Sosumi,
}

impl NotificationSound {
    /// Identifier handed to the notification sink and sound player
    pub fn id(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Glass => "Glass",
            Self::Ping => "Ping",
            Self::Pop => "Pop",
            Self::Purr => "Purr",
            Self::Submarine => "Submarine",
            Self::Tink => "Tink",
            Self::Blow => "Blow",
            Self::Bottle => "Bottle",
            Self::Frog => "Frog",
            Self::Funk => "Funk",
            Self::Hero => "Hero",
            Self::Morse => "Morse",
            Self::Sosumi => "Sosumi",
        }
    }
}

/// Everything that parameterizes the scheduler and the overlay.
///
/// `interval_seconds` and `break_duration_seconds` are the custom timing. When
/// `active_profile` is set the profile's timing is used instead; the custom
/// values are kept untouched for when the profile is cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderSettings {
    pub interval_seconds: u32,
    pub break_duration_seconds: u32,
    pub snooze_duration_seconds: u32,
    pub overlay_duration_seconds: u32,
    pub enabled: bool,
    pub auto_reset_on_screen_lock: bool,
    pub keep_awake: bool,
    pub enable_overlay: bool,
    pub enable_sound: bool,
    pub enable_screen_saver: bool,
    pub overlay_color: OverlayColor,
    pub notification_sound: NotificationSound,
    pub work_schedule: Option<WorkSchedule>,
    pub active_profile: Option<Uuid>,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            interval_seconds: 25 * 60,
            break_duration_seconds: 5 * 60,
            snooze_duration_seconds: 5 * 60,
            overlay_duration_seconds: 10,
            enabled: true,
            auto_reset_on_screen_lock: true,
            keep_awake: false,
            enable_overlay: true,
            enable_sound: true,
            enable_screen_saver: false,
            overlay_color: OverlayColor::Blue,
            notification_sound: NotificationSound::Default,
            work_schedule: None,
            active_profile: None,
        }
    }
}

fn read<T: DeserializeOwned>(store: &dyn SettingsStore, key: &str) -> Option<T> {
    let value = store.get(key)?;
    match serde_json::from_value(value) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!("Ignoring unreadable setting {}: {}", key, e);
            None
        }
    }
}

fn write<T: Serialize>(store: &mut dyn SettingsStore, key: &str, value: &T) {
    match serde_json::to_value(value) {
        Ok(value) => store.set(key, value),
        Err(e) => warn!("Failed to encode setting {}: {}", key, e),
    }
}

impl ReminderSettings {
    /// Read every field from the store, falling back to defaults per field
    pub fn load(store: &dyn SettingsStore) -> Self {
        let defaults = Self::default();
        Self {
            interval_seconds: read(store, keys::INTERVAL_SECONDS).unwrap_or(defaults.interval_seconds),
            break_duration_seconds: read(store, keys::BREAK_DURATION_SECONDS)
                .unwrap_or(defaults.break_duration_seconds),
            snooze_duration_seconds: read(store, keys::SNOOZE_DURATION_SECONDS)
                .unwrap_or(defaults.snooze_duration_seconds),
            overlay_duration_seconds: read(store, keys::OVERLAY_DURATION_SECONDS)
                .unwrap_or(defaults.overlay_duration_seconds),
            enabled: read(store, keys::ENABLED).unwrap_or(defaults.enabled),
            auto_reset_on_screen_lock: read(store, keys::AUTO_RESET_ON_SCREEN_LOCK)
                .unwrap_or(defaults.auto_reset_on_screen_lock),
            keep_awake: read(store, keys::KEEP_AWAKE).unwrap_or(defaults.keep_awake),
            enable_overlay: read(store, keys::ENABLE_OVERLAY).unwrap_or(defaults.enable_overlay),
            enable_sound: read(store, keys::ENABLE_SOUND).unwrap_or(defaults.enable_sound),
            enable_screen_saver: read(store, keys::ENABLE_SCREEN_SAVER)
                .unwrap_or(defaults.enable_screen_saver),
            overlay_color: read(store, keys::OVERLAY_COLOR).unwrap_or(defaults.overlay_color),
            notification_sound: read(store, keys::NOTIFICATION_SOUND)
                .unwrap_or(defaults.notification_sound),
            work_schedule: read::<Option<WorkSchedule>>(store, keys::WORK_SCHEDULE)
                .flatten()
                .map(WorkSchedule::normalized),
            active_profile: read::<Option<Uuid>>(store, keys::ACTIVE_PROFILE).flatten(),
        }
        .clamped()
    }

    /// Write every field to the store
    pub fn save(&self, store: &mut dyn SettingsStore) {
        write(store, keys::INTERVAL_SECONDS, &self.interval_seconds);
        write(store, keys::BREAK_DURATION_SECONDS, &self.break_duration_seconds);
        write(store, keys::SNOOZE_DURATION_SECONDS, &self.snooze_duration_seconds);
        write(store, keys::OVERLAY_DURATION_SECONDS, &self.overlay_duration_seconds);
        write(store, keys::ENABLED, &self.enabled);
        write(store, keys::AUTO_RESET_ON_SCREEN_LOCK, &self.auto_reset_on_screen_lock);
        write(store, keys::KEEP_AWAKE, &self.keep_awake);
        write(store, keys::ENABLE_OVERLAY, &self.enable_overlay);
        write(store, keys::ENABLE_SOUND, &self.enable_sound);
        write(store, keys::ENABLE_SCREEN_SAVER, &self.enable_screen_saver);
        write(store, keys::OVERLAY_COLOR, &self.overlay_color);
        write(store, keys::NOTIFICATION_SOUND, &self.notification_sound);
        write(store, keys::WORK_SCHEDULE, &self.work_schedule);
        write(store, keys::ACTIVE_PROFILE, &self.active_profile);
    }

    /// Pull every duration into its allowed range
    pub fn clamped(mut self) -> Self {
        self.interval_seconds = clamp(self.interval_seconds, INTERVAL_RANGE);
        self.break_duration_seconds = clamp(self.break_duration_seconds, BREAK_DURATION_RANGE);
        self.snooze_duration_seconds = clamp(self.snooze_duration_seconds, SNOOZE_DURATION_RANGE);
        self.overlay_duration_seconds = clamp(self.overlay_duration_seconds, OVERLAY_DURATION_RANGE);
        self
    }

    /// Apply a partial update and report which scheduling inputs moved
    pub fn apply(&mut self, patch: SettingsPatch) -> SettingsDelta {
        let before = self.clone();

        if let Some(v) = patch.interval_seconds {
            self.interval_seconds = v;
        }
        if let Some(v) = patch.break_duration_seconds {
            self.break_duration_seconds = v;
        }
        if let Some(v) = patch.snooze_duration_seconds {
            self.snooze_duration_seconds = v;
        }
        if let Some(v) = patch.overlay_duration_seconds {
            self.overlay_duration_seconds = v;
        }
        if let Some(v) = patch.enabled {
            self.enabled = v;
        }
        if let Some(v) = patch.auto_reset_on_screen_lock {
            self.auto_reset_on_screen_lock = v;
        }
        if let Some(v) = patch.keep_awake {
            self.keep_awake = v;
        }
        if let Some(v) = patch.enable_overlay {
            self.enable_overlay = v;
        }
        if let Some(v) = patch.enable_sound {
            self.enable_sound = v;
        }
        if let Some(v) = patch.enable_screen_saver {
            self.enable_screen_saver = v;
        }
        if let Some(v) = patch.overlay_color {
            self.overlay_color = v;
        }
        if let Some(v) = patch.notification_sound {
            self.notification_sound = v;
        }
        if let Some(v) = patch.work_schedule {
            self.work_schedule = v.map(WorkSchedule::normalized);
        }
        if let Some(preset) = patch.schedule_preset.as_deref().and_then(SchedulePreset::find) {
            let mut schedule = self.work_schedule.take().unwrap_or_default();
            preset.apply_to(&mut schedule);
            self.work_schedule = Some(schedule);
        }
        // Editing the custom interval switches back to custom timing
        if patch.interval_seconds.is_some() || patch.break_duration_seconds.is_some() {
            self.active_profile = None;
        }

        *self = std::mem::take(self).clamped();

        SettingsDelta {
            timing_changed: before.interval_seconds != self.interval_seconds
                || before.active_profile != self.active_profile,
            enabled_changed: before.enabled != self.enabled,
            keep_awake_changed: before.keep_awake != self.keep_awake,
            changed: before != *self,
        }
    }
}

/// Partial update of [`ReminderSettings`]; `None` leaves a field untouched
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SettingsPatch {
    pub interval_seconds: Option<u32>,
    pub break_duration_seconds: Option<u32>,
    pub snooze_duration_seconds: Option<u32>,
    pub overlay_duration_seconds: Option<u32>,
    pub enabled: Option<bool>,
    pub auto_reset_on_screen_lock: Option<bool>,
    pub keep_awake: Option<bool>,
    pub enable_overlay: Option<bool>,
    pub enable_sound: Option<bool>,
    pub enable_screen_saver: Option<bool>,
    pub overlay_color: Option<OverlayColor>,
    pub notification_sound: Option<NotificationSound>,
    /// `Some(None)` clears the schedule
    #[serde(deserialize_with = "double_option")]
    pub work_schedule: Option<Option<WorkSchedule>>,
    /// Name of a [`SchedulePreset`] whose hours replace the schedule's window
    pub schedule_preset: Option<String>,
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<WorkSchedule>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<WorkSchedule>::deserialize(deserializer).map(Some)
}

/// What an applied [`SettingsPatch`] touched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingsDelta {
    pub timing_changed: bool,
    pub enabled_changed: bool,
    pub keep_awake_changed: bool,
    pub changed: bool,
}
