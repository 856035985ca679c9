//! Work schedule and the work-hours gate

use std::collections::BTreeSet;

use chrono::{Datelike, Timelike};
use serde::{Deserialize, Serialize};

/// Weekday encoding used throughout: 1 = Sunday ... 7 = Saturday
pub const SUNDAY: u8 = 1;
pub const MONDAY: u8 = 2;
pub const FRIDAY: u8 = 6;
pub const SATURDAY: u8 = 7;

/// Days and hours during which reminders are allowed to fire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkSchedule {
    pub enabled: bool,
    /// Inclusive start, minutes after midnight
    pub start_minute_of_day: u16,
    /// Exclusive end, minutes after midnight
    pub end_minute_of_day: u16,
    pub work_days: BTreeSet<u8>,
}

impl WorkSchedule {
    /// Disabled schedule with the default 08:00-18:00, Monday to Friday window
    pub fn new() -> Self {
        Self {
            enabled: false,
            start_minute_of_day: 8 * 60,
            end_minute_of_day: 18 * 60,
            work_days: (MONDAY..=FRIDAY).collect(),
        }
    }

    /// Build an enabled schedule from whole hours
    pub fn hours(start_hour: u16, end_hour: u16, work_days: impl IntoIterator<Item = u8>) -> Self {
        Self {
            enabled: true,
            start_minute_of_day: start_hour * 60,
            end_minute_of_day: end_hour * 60,
            work_days: work_days.into_iter().collect(),
        }
    }

    /// Whether a reminder may fire at `now` (local wall time).
    ///
    /// A disabled schedule allows everything. Otherwise the weekday must be a
    /// work day and the minute of day must fall in `[start, end)`.
    pub fn is_within_work_hours(&self, now: &(impl Datelike + Timelike)) -> bool {
        if !self.enabled {
            return true;
        }

        let weekday = now.weekday().number_from_sunday() as u8;
        if !self.work_days.contains(&weekday) {
            return false;
        }

        let minute_of_day = (now.hour() * 60 + now.minute()) as u16;
        self.start_minute_of_day <= minute_of_day && minute_of_day < self.end_minute_of_day
    }

    /// "HH:MM-HH:MM" rendering of the allowed window
    pub fn window(&self) -> String {
        format!(
            "{}-{}",
            format_minute_of_day(self.start_minute_of_day),
            format_minute_of_day(self.end_minute_of_day)
        )
    }

    /// Clamp boundaries into a single day and drop weekday values outside 1..=7
    pub fn normalized(mut self) -> Self {
        self.start_minute_of_day = self.start_minute_of_day.min(24 * 60);
        self.end_minute_of_day = self.end_minute_of_day.min(24 * 60);
        self.work_days.retain(|day| (SUNDAY..=SATURDAY).contains(day));
        self
    }
}

impl Default for WorkSchedule {
    fn default() -> Self {
        Self::new()
    }
}

fn format_minute_of_day(minutes: u16) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Named quick-pick windows offered to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SchedulePreset {
    pub name: &'static str,
    pub start_hour: u16,
    pub end_hour: u16,
}

pub const SCHEDULE_PRESETS: [SchedulePreset; 4] = [
    SchedulePreset { name: "Office Hours", start_hour: 9, end_hour: 17 },
    SchedulePreset { name: "Early Bird", start_hour: 7, end_hour: 15 },
    SchedulePreset { name: "Extended", start_hour: 8, end_hour: 18 },
    SchedulePreset { name: "Night Owl", start_hour: 14, end_hour: 22 },
];

impl SchedulePreset {
    /// Look a preset up by name, ignoring case
    pub fn find(name: &str) -> Option<&'static SchedulePreset> {
        SCHEDULE_PRESETS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Apply the preset hours, keeping the schedule's days and enabled flag
    pub fn apply_to(&self, schedule: &mut WorkSchedule) {
        schedule.start_minute_of_day = self.start_hour * 60;
        schedule.end_minute_of_day = self.end_hour * 60;
    }
}
