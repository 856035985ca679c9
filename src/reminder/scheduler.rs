//! Countdown ownership: next fire time, interval and the derived icon state

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::tasks::ticker::{TickHandle, TickTarget, Ticker};

/// Seconds left at which the countdown turns to a warning
pub const WARNING_THRESHOLD_SECONDS: i64 = 5 * 60;
/// Seconds left at which the countdown turns urgent
pub const URGENT_THRESHOLD_SECONDS: i64 = 60;

/// Presentation state of the countdown, recomputed on every tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IconState {
    Paused,
    #[default]
    Normal,
    Warning,
    Urgent,
}

impl IconState {
    /// Derive the icon state. A disabled reminder is always paused; a running
    /// one goes normal -> warning -> urgent as the deadline approaches.
    pub fn derive(enabled: bool, next_fire_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        if !enabled {
            return Self::Paused;
        }
        match next_fire_at {
            None => Self::Normal,
            Some(at) => Self::for_remaining(remaining_seconds(at, now)),
        }
    }

    pub fn for_remaining(remaining: i64) -> Self {
        if remaining >= WARNING_THRESHOLD_SECONDS {
            Self::Normal
        } else if remaining >= URGENT_THRESHOLD_SECONDS {
            Self::Warning
        } else {
            Self::Urgent
        }
    }
}

/// Whole seconds until `at`, rounded up so a partial second still counts
pub fn remaining_seconds(at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (at - now).num_milliseconds();
    millis.div_euclid(1000) + i64::from(millis.rem_euclid(1000) > 0)
}

/// `mm:ss` below an hour, `h:mm:ss` from an hour up, `00:00` once due
pub fn format_countdown(remaining: i64) -> String {
    if remaining <= 0 {
        return "00:00".to_string();
    }
    let minutes = remaining / 60;
    let seconds = remaining % 60;
    if minutes >= 60 {
        format!("{}:{:02}:{:02}", minutes / 60, minutes % 60, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// Serializable view of the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SchedulerState {
    pub next_fire_at: Option<DateTime<Utc>>,
    pub running: bool,
    pub interval_seconds: u32,
}

/// Result of recomputing the countdown on a tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickReport {
    pub remaining_seconds: Option<i64>,
    pub icon_state: IconState,
    pub countdown: String,
    /// Fraction of the interval still left, 0.0..=1.0
    pub progress: f64,
    /// The deadline has been reached and the reminder must fire
    pub due: bool,
}

/// Owns the next fire timestamp and the single tick timer driving it
#[derive(Debug)]
pub struct Scheduler {
    next_fire_at: Option<DateTime<Utc>>,
    interval_seconds: u32,
    ticker: Ticker,
    timer: Option<TickHandle>,
    generation: u64,
}

impl Scheduler {
    pub fn new(ticker: Ticker, interval_seconds: u32) -> Self {
        Self {
            next_fire_at: None,
            interval_seconds,
            ticker,
            timer: None,
            generation: 0,
        }
    }

    /// Begin a fresh cycle: cancel any timer, fire `interval` from now, arm a new tick
    pub fn start(&mut self, interval_seconds: u32, now: DateTime<Utc>) -> DateTime<Utc> {
        self.cancel_timer();
        self.interval_seconds = interval_seconds;
        let next = now + Duration::seconds(i64::from(interval_seconds));
        self.next_fire_at = Some(next);
        self.arm_timer();
        info!("Reminder cycle started, next reminder at {} ({}s)", next, interval_seconds);
        next
    }

    pub fn stop(&mut self) {
        self.cancel_timer();
        self.next_fire_at = None;
        info!("Reminder cycle stopped");
    }

    /// Push the next fire out to `now + duration` without any fire side effects
    pub fn snooze(&mut self, duration_seconds: u32, now: DateTime<Utc>) -> DateTime<Utc> {
        let next = now + Duration::seconds(i64::from(duration_seconds));
        self.next_fire_at = Some(next);
        if self.timer.is_none() {
            self.arm_timer();
        }
        info!("Reminder snoozed for {}s, next reminder at {}", duration_seconds, next);
        next
    }

    /// Move the deadline by a whole interval past the current one
    pub fn skip(&mut self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let current = self.next_fire_at?;
        let interval = Duration::seconds(i64::from(self.interval_seconds));
        let next = current.max(now) + interval;
        self.next_fire_at = Some(next);
        info!("Upcoming reminder skipped, next reminder at {}", next);
        Some(next)
    }

    /// Recompute remaining time and the derived presentation state
    pub fn on_tick(&self, enabled: bool, now: DateTime<Utc>) -> TickReport {
        let remaining = self.next_fire_at.map(|at| remaining_seconds(at, now));
        let icon_state = IconState::derive(enabled, self.next_fire_at, now);
        let progress = match remaining {
            Some(r) if self.interval_seconds > 0 => {
                (r as f64 / f64::from(self.interval_seconds)).clamp(0.0, 1.0)
            }
            _ => 1.0,
        };

        TickReport {
            remaining_seconds: remaining,
            icon_state,
            countdown: remaining.map(format_countdown).unwrap_or_default(),
            progress,
            due: enabled && self.next_fire_at.is_some_and(|at| now >= at),
        }
    }

    /// Start the next cycle at fire time. The timer keeps running.
    pub fn on_fire(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        let next = now + Duration::seconds(i64::from(self.interval_seconds));
        self.next_fire_at = Some(next);
        debug!("Reminder fired, next reminder at {}", next);
        next
    }

    /// Whether a tick tagged with `generation` comes from the live timer
    pub fn is_current_tick(&self, generation: u64) -> bool {
        self.timer
            .as_ref()
            .is_some_and(|timer| timer.generation() == generation)
    }

    /// Generation of the live tick timer, if one is armed
    pub fn tick_generation(&self) -> Option<u64> {
        self.timer.as_ref().map(TickHandle::generation)
    }

    pub fn next_fire_at(&self) -> Option<DateTime<Utc>> {
        self.next_fire_at
    }

    pub fn interval_seconds(&self) -> u32 {
        self.interval_seconds
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    pub fn state(&self) -> SchedulerState {
        SchedulerState {
            next_fire_at: self.next_fire_at,
            running: self.is_running(),
            interval_seconds: self.interval_seconds,
        }
    }

    fn arm_timer(&mut self) {
        self.generation += 1;
        self.timer = Some(self.ticker.arm(TickTarget::Scheduler, self.generation));
    }

    fn cancel_timer(&mut self) {
        // Dropping the handle aborts the tick task
        self.timer = None;
    }
}
