//! Keeps one display-sleep-prevention assertion in line with the settings

use tracing::{info, warn};

use crate::services::{PowerAssertionApi, PowerHandle};

pub const KEEP_AWAKE_REASON: &str = "Break Reminder - keeping display awake during work session";

#[derive(Debug, Default)]
pub struct KeepAwakeCoordinator {
    handle: Option<PowerHandle>,
    last_desired: Option<bool>,
}

impl KeepAwakeCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconcile the assertion with `keep_awake && enabled`.
    ///
    /// Nothing happens unless the desired state moved since the last call, so
    /// a failed acquire is retried only on the next desired-state change.
    /// Returns the new `active` value when it changed.
    pub fn sync(&mut self, keep_awake: bool, enabled: bool, power: &mut dyn PowerAssertionApi) -> Option<bool> {
        let desired = keep_awake && enabled;
        if self.last_desired == Some(desired) {
            return None;
        }
        self.last_desired = Some(desired);

        match (desired, self.handle.take()) {
            (true, None) => match power.acquire(KEEP_AWAKE_REASON) {
                Ok(handle) => {
                    info!("Power assertion created, display will stay awake");
                    self.handle = Some(handle);
                    Some(true)
                }
                Err(e) => {
                    warn!("Failed to create power assertion: {}", e);
                    None
                }
            },
            (false, Some(handle)) => {
                power.release(handle);
                info!("Power assertion released, display can sleep normally");
                Some(false)
            }
            (_, handle) => {
                self.handle = handle;
                None
            }
        }
    }

    /// Drop the assertion regardless of settings, used on shutdown
    pub fn release_all(&mut self, power: &mut dyn PowerAssertionApi) {
        if let Some(handle) = self.handle.take() {
            power.release(handle);
            info!("Power assertion released on shutdown");
        }
        self.last_desired = None;
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingPower {
        acquired: u32,
        released: u32,
        fail: bool,
        next_id: u64,
    }

    impl PowerAssertionApi for CountingPower {
        fn acquire(&mut self, _reason: &str) -> Result<PowerHandle, String> {
            if self.fail {
                return Err("denied".to_string());
            }
            self.acquired += 1;
            self.next_id += 1;
            Ok(PowerHandle::new(self.next_id))
        }

        fn release(&mut self, _handle: PowerHandle) {
            self.released += 1;
        }
    }

    #[test]
    fn acquires_only_when_both_inputs_are_set() {
        let mut power = CountingPower::default();
        let mut keep_awake = KeepAwakeCoordinator::new();
        assert_eq!(keep_awake.sync(true, false, &mut power), None);
        assert_eq!(keep_awake.sync(false, true, &mut power), None);
        assert_eq!(power.acquired, 0);

        assert_eq!(keep_awake.sync(true, true, &mut power), Some(true));
        assert!(keep_awake.is_active());
    }

    #[test]
    fn repeated_sync_is_idempotent() {
        let mut power = CountingPower::default();
        let mut keep_awake = KeepAwakeCoordinator::new();
        for _ in 0..5 {
            keep_awake.sync(true, true, &mut power);
        }
        assert_eq!(power.acquired, 1);
        assert_eq!(power.released, 0);
    }

    #[test]
    fn off_on_toggling_nets_one_handle() {
        let mut power = CountingPower::default();
        let mut keep_awake = KeepAwakeCoordinator::new();
        keep_awake.sync(true, true, &mut power);
        for _ in 0..10 {
            keep_awake.sync(false, true, &mut power);
            keep_awake.sync(true, true, &mut power);
        }
        assert_eq!(power.acquired - power.released, 1);
        assert!(keep_awake.is_active());
    }

    #[test]
    fn disabling_reminders_releases() {
        let mut power = CountingPower::default();
        let mut keep_awake = KeepAwakeCoordinator::new();
        keep_awake.sync(true, true, &mut power);
        assert_eq!(keep_awake.sync(true, false, &mut power), Some(false));
        assert_eq!(power.released, 1);
        assert!(!keep_awake.is_active());
    }

    #[test]
    fn failed_acquire_waits_for_next_change() {
        let mut power = CountingPower { fail: true, ..Default::default() };
        let mut keep_awake = KeepAwakeCoordinator::new();
        assert_eq!(keep_awake.sync(true, true, &mut power), None);
        assert!(!keep_awake.is_active());

        power.fail = false;
        // same desired state: no retry
        assert_eq!(keep_awake.sync(true, true, &mut power), None);
        assert_eq!(power.acquired, 0);

        keep_awake.sync(false, true, &mut power);
        assert_eq!(keep_awake.sync(true, true, &mut power), Some(true));
        assert_eq!(power.acquired, 1);
    }

    #[test]
    fn release_all_clears_handle() {
        let mut power = CountingPower::default();
        let mut keep_awake = KeepAwakeCoordinator::new();
        keep_awake.sync(true, true, &mut power);
        keep_awake.release_all(&mut power);
        assert_eq!(power.released, 1);
        assert!(!keep_awake.is_active());
    }
}
