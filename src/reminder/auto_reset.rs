//! Lock-session tracking and the auto-reset decision

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// OS channel a lock or wake signal arrived on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockSource {
    ScreenSaver,
    SessionLock,
    SystemSleep,
    External,
}

/// An open lock episode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LockSession {
    pub started_at: DateTime<Utc>,
    pub source: LockSource,
}

/// Inputs to the reset decision, read at wake time
#[derive(Debug, Clone, Copy)]
pub struct ResetInputs {
    pub auto_reset_on_screen_lock: bool,
    pub enabled: bool,
    pub break_duration_seconds: u32,
}

/// What a wake signal amounted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockEnd {
    /// No session was open
    Spurious,
    Closed { away_seconds: i64, reset: bool },
}

/// Collapses lock/wake signals from every channel into one session at a time
#[derive(Debug, Default)]
pub struct AutoResetPolicy {
    session: Option<LockSession>,
}

impl AutoResetPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session unless one is already open. Returns whether it opened one.
    pub fn handle_lock_start(&mut self, now: DateTime<Utc>, source: LockSource) -> bool {
        if let Some(open) = &self.session {
            debug!(
                "Lock signal from {:?} ignored, session from {:?} open since {}",
                source, open.source, open.started_at
            );
            return false;
        }

        info!("Screen locked/asleep ({:?}) at {}", source, now);
        self.session = Some(LockSession {
            started_at: now,
            source,
        });
        true
    }

    /// Close the open session, if any, and decide whether the away time counts as a break
    pub fn handle_lock_end(&mut self, now: DateTime<Utc>, source: LockSource, inputs: ResetInputs) -> LockEnd {
        let Some(session) = self.session.take() else {
            debug!("Wake signal from {:?} with no open lock session", source);
            return LockEnd::Spurious;
        };

        // A wall clock that stepped backwards must not produce a negative break
        let away_seconds = (now - session.started_at).num_seconds().max(0);
        let reset = inputs.auto_reset_on_screen_lock
            && inputs.enabled
            && away_seconds >= i64::from(inputs.break_duration_seconds);

        info!(
            "Screen wake ({:?}). Away for {}s, break duration {}s, reset={}",
            source, away_seconds, inputs.break_duration_seconds, reset
        );
        LockEnd::Closed { away_seconds, reset }
    }

    pub fn session(&self) -> Option<&LockSession> {
        self.session.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn t(seconds: i64) -> DateTime<Utc> {
        DateTime::<Utc>::default() + Duration::seconds(seconds)
    }

    fn inputs(break_duration_seconds: u32) -> ResetInputs {
        ResetInputs {
            auto_reset_on_screen_lock: true,
            enabled: true,
            break_duration_seconds,
        }
    }

    #[test]
    fn duplicate_lock_signals_keep_one_session() {
        let mut policy = AutoResetPolicy::new();
        assert!(policy.handle_lock_start(t(10), LockSource::ScreenSaver));
        assert!(!policy.handle_lock_start(t(12), LockSource::SessionLock));
        assert!(!policy.handle_lock_start(t(15), LockSource::SystemSleep));

        let session = policy.session().unwrap();
        assert_eq!(session.started_at, t(10));
        assert_eq!(session.source, LockSource::ScreenSaver);
    }

    #[test]
    fn wake_without_session_is_spurious() {
        let mut policy = AutoResetPolicy::new();
        assert_eq!(policy.handle_lock_end(t(100), LockSource::ScreenSaver, inputs(300)), LockEnd::Spurious);
    }

    #[test]
    fn away_exactly_break_duration_resets() {
        let mut policy = AutoResetPolicy::new();
        policy.handle_lock_start(t(0), LockSource::SessionLock);
        assert_eq!(
            policy.handle_lock_end(t(300), LockSource::SessionLock, inputs(300)),
            LockEnd::Closed { away_seconds: 300, reset: true }
        );
    }

    #[test]
    fn away_one_second_short_does_not_reset() {
        let mut policy = AutoResetPolicy::new();
        policy.handle_lock_start(t(0), LockSource::SessionLock);
        assert_eq!(
            policy.handle_lock_end(t(299), LockSource::SessionLock, inputs(300)),
            LockEnd::Closed { away_seconds: 299, reset: false }
        );
    }

    #[test]
    fn second_wake_after_close_is_spurious() {
        let mut policy = AutoResetPolicy::new();
        policy.handle_lock_start(t(0), LockSource::SystemSleep);
        policy.handle_lock_end(t(400), LockSource::SystemSleep, inputs(300));
        assert_eq!(policy.handle_lock_end(t(401), LockSource::ScreenSaver, inputs(300)), LockEnd::Spurious);
        assert!(policy.session().is_none());
    }

    #[test]
    fn reset_requires_setting_and_enabled() {
        let mut policy = AutoResetPolicy::new();
        policy.handle_lock_start(t(0), LockSource::External);
        let off = ResetInputs { auto_reset_on_screen_lock: false, ..inputs(60) };
        assert_eq!(
            policy.handle_lock_end(t(600), LockSource::External, off),
            LockEnd::Closed { away_seconds: 600, reset: false }
        );

        policy.handle_lock_start(t(0), LockSource::External);
        let disabled = ResetInputs { enabled: false, ..inputs(60) };
        assert_eq!(
            policy.handle_lock_end(t(600), LockSource::External, disabled),
            LockEnd::Closed { away_seconds: 600, reset: false }
        );
    }

    #[test]
    fn backwards_clock_counts_as_zero_away() {
        let mut policy = AutoResetPolicy::new();
        policy.handle_lock_start(t(100), LockSource::ScreenSaver);
        assert_eq!(
            policy.handle_lock_end(t(50), LockSource::ScreenSaver, inputs(0)),
            LockEnd::Closed { away_seconds: 0, reset: true }
        );
    }
}
