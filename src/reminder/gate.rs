//! Fire-time policy hook backed by the work schedule

use chrono::{DateTime, FixedOffset, Local, Utc};

use crate::state::settings::ReminderSettings;

/// Decides at fire time whether the reminder's side effects may run
pub trait FirePolicy: Send + Sync {
    fn allows_fire(&self, settings: &ReminderSettings, now: DateTime<Utc>) -> bool;
}

/// Gates fires on the configured work schedule, evaluated in local wall time
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkHoursPolicy {
    /// `None` uses the system time zone
    offset: Option<FixedOffset>,
}

impl WorkHoursPolicy {
    pub fn local() -> Self {
        Self { offset: None }
    }

    /// Evaluate the schedule at a fixed UTC offset
    pub fn fixed(offset: FixedOffset) -> Self {
        Self { offset: Some(offset) }
    }
}

impl FirePolicy for WorkHoursPolicy {
    fn allows_fire(&self, settings: &ReminderSettings, now: DateTime<Utc>) -> bool {
        let Some(schedule) = &settings.work_schedule else {
            return true;
        };
        match self.offset {
            Some(offset) => schedule.is_within_work_hours(&now.with_timezone(&offset)),
            None => schedule.is_within_work_hours(&now.with_timezone(&Local)),
        }
    }
}
