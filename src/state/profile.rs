//! Work profiles: named presets bundling an interval and a break duration

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::settings::{
    keys, ReminderSettings, SettingsStore, BREAK_DURATION_RANGE, INTERVAL_RANGE,
};

/// A named interval + break duration preset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkProfile {
    pub id: Uuid,
    pub name: String,
    pub interval_seconds: u32,
    pub break_duration_seconds: u32,
    pub icon: String,
    #[serde(default)]
    pub built_in: bool,
}

/// The timing the scheduler and the auto-reset policy actually run with
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Timing {
    pub interval_seconds: u32,
    pub break_duration_seconds: u32,
}

fn built_in(id: u128, name: &str, interval_minutes: u32, break_minutes: u32, icon: &str) -> WorkProfile {
    WorkProfile {
        id: Uuid::from_u128(id),
        name: name.to_string(),
        interval_seconds: interval_minutes * 60,
        break_duration_seconds: break_minutes * 60,
        icon: icon.to_string(),
        built_in: true,
    }
}

/// The four profiles every install ships with
pub fn built_in_profiles() -> Vec<WorkProfile> {
    vec![
        built_in(1, "Pomodoro", 25, 5, "timer"),
        built_in(2, "Deep Work", 50, 10, "brain.head.profile"),
        built_in(3, "Light Work", 15, 3, "leaf"),
        built_in(4, "Long Session", 90, 15, "hourglass"),
    ]
}

/// Built-in plus user-defined profiles
#[derive(Debug, Clone)]
pub struct ProfileCatalog {
    profiles: Vec<WorkProfile>,
}

impl ProfileCatalog {
    /// Built-ins followed by the custom profiles found in the store
    pub fn load(store: &dyn SettingsStore) -> Self {
        let mut profiles = built_in_profiles();

        if let Some(value) = store.get(keys::CUSTOM_PROFILES) {
            match serde_json::from_value::<Vec<WorkProfile>>(value) {
                Ok(custom) => profiles.extend(custom.into_iter().map(|mut p| {
                    p.built_in = false;
                    p
                })),
                Err(e) => warn!("Ignoring unreadable custom profiles: {}", e),
            }
        }

        Self { profiles }
    }

    pub fn all(&self) -> &[WorkProfile] {
        &self.profiles
    }

    pub fn get(&self, id: Uuid) -> Option<&WorkProfile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    /// Add a user-defined profile; durations are clamped to the allowed ranges
    pub fn add_custom(
        &mut self,
        name: String,
        interval_seconds: u32,
        break_duration_seconds: u32,
        icon: Option<String>,
    ) -> Result<WorkProfile, String> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err("Profile name must not be empty".to_string());
        }

        let profile = WorkProfile {
            id: Uuid::new_v4(),
            name,
            interval_seconds: interval_seconds.clamp(INTERVAL_RANGE.0, INTERVAL_RANGE.1),
            break_duration_seconds: break_duration_seconds
                .clamp(BREAK_DURATION_RANGE.0, BREAK_DURATION_RANGE.1),
            icon: icon.unwrap_or_else(|| "star".to_string()),
            built_in: false,
        };
        info!("Adding custom profile {} ({})", profile.name, profile.id);
        self.profiles.push(profile.clone());
        Ok(profile)
    }

    /// Remove a custom profile. Built-ins cannot be deleted.
    pub fn delete(&mut self, id: Uuid) -> Result<WorkProfile, String> {
        let index = self
            .profiles
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| format!("Profile {} not found", id))?;

        if self.profiles[index].built_in {
            return Err(format!("Profile {} is built in and cannot be deleted", self.profiles[index].name));
        }

        let removed = self.profiles.remove(index);
        info!("Deleted custom profile {} ({})", removed.name, removed.id);
        Ok(removed)
    }

    /// Persist the custom profiles only
    pub fn save_custom(&self, store: &mut dyn SettingsStore) {
        let custom: Vec<&WorkProfile> = self.profiles.iter().filter(|p| !p.built_in).collect();
        match serde_json::to_value(custom) {
            Ok(value) => store.set(keys::CUSTOM_PROFILES, value),
            Err(e) => warn!("Failed to encode custom profiles: {}", e),
        }
    }

    /// Resolve the timing in effect: the active profile if it still exists,
    /// otherwise the custom values
    pub fn effective_timing(&self, settings: &ReminderSettings) -> Timing {
        match settings.active_profile.and_then(|id| self.get(id)) {
            Some(profile) => Timing {
                interval_seconds: profile.interval_seconds,
                break_duration_seconds: profile.break_duration_seconds,
            },
            None => Timing {
                interval_seconds: settings.interval_seconds,
                break_duration_seconds: settings.break_duration_seconds,
            },
        }
    }
}
