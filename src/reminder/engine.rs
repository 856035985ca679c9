//! The reminder engine: one context object owning every piece of core state
//!
//! The engine is driven exclusively by [`Command`]s drained from a single
//! queue, so nothing in here needs a lock. Collaborators are reached through
//! the traits in [`crate::services`]; state changes go out as
//! [`ReminderEvent`]s on a broadcast channel and as a [`StatusSnapshot`] on a
//! watch channel.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::{rngs::StdRng, SeedableRng};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use super::{
    auto_reset::{AutoResetPolicy, LockEnd, LockSource, ResetInputs},
    command::Command,
    events::ReminderEvent,
    gate::{FirePolicy, WorkHoursPolicy},
    keep_awake::KeepAwakeCoordinator,
    overlay::{CountdownTick, DismissReason, OverlayAction, OverlayLifecycle},
    scheduler::{IconState, Scheduler},
};
use crate::{
    services::Collaborators,
    state::{
        profile::{ProfileCatalog, Timing},
        schedule::{SchedulePreset, WorkSchedule},
        settings::{ReminderSettings, SettingsPatch, SettingsStore},
        snapshot::{OverlayStatus, StatusSnapshot},
    },
    tasks::ticker::{TickTarget, Ticker},
    utils::clock::Clock,
};

const EVENT_CAPACITY: usize = 256;

pub const NOTIFICATION_TITLE: &str = "Time for a break!";

pub struct ReminderEngine {
    settings: ReminderSettings,
    profiles: ProfileCatalog,
    store: Box<dyn SettingsStore>,
    scheduler: Scheduler,
    auto_reset: AutoResetPolicy,
    overlay: OverlayLifecycle,
    keep_awake: KeepAwakeCoordinator,
    collaborators: Collaborators,
    clock: Arc<dyn Clock>,
    fire_policy: Box<dyn FirePolicy>,
    events: broadcast::Sender<ReminderEvent>,
    status: watch::Sender<StatusSnapshot>,
    rng: StdRng,
    icon_state: IconState,
}

impl ReminderEngine {
    /// Load settings and profiles from `store`. Nothing is armed until
    /// [`boot`](Self::boot), which callers run before handing out receivers.
    pub fn new(
        store: Box<dyn SettingsStore>,
        collaborators: Collaborators,
        clock: Arc<dyn Clock>,
        ticker: Ticker,
    ) -> Self {
        let settings = ReminderSettings::load(store.as_ref());
        let profiles = ProfileCatalog::load(store.as_ref());
        let interval = profiles.effective_timing(&settings).interval_seconds;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (status, _) = watch::channel(StatusSnapshot::default());

        let engine = Self {
            settings,
            profiles,
            store,
            scheduler: Scheduler::new(ticker.clone(), interval),
            auto_reset: AutoResetPolicy::new(),
            overlay: OverlayLifecycle::new(ticker),
            keep_awake: KeepAwakeCoordinator::new(),
            collaborators,
            clock,
            fire_policy: Box::new(WorkHoursPolicy::local()),
            events,
            status,
            rng: StdRng::from_entropy(),
            icon_state: IconState::Paused,
        };
        // Watchers see the loaded settings and profiles, never an empty default
        engine.status.send_replace(engine.snapshot());
        engine
    }

    pub fn with_fire_policy(mut self, policy: impl FirePolicy + 'static) -> Self {
        self.fire_policy = Box::new(policy);
        self
    }

    /// Seed the suggestion draw, for reproducible runs
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReminderEvent> {
        self.events.subscribe()
    }

    pub fn event_sender(&self) -> broadcast::Sender<ReminderEvent> {
        self.events.clone()
    }

    pub fn status_receiver(&self) -> watch::Receiver<StatusSnapshot> {
        self.status.subscribe()
    }

    pub fn settings(&self) -> &ReminderSettings {
        &self.settings
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn overlay(&self) -> &OverlayLifecycle {
        &self.overlay
    }

    /// Start the first cycle if enabled and bring keep-awake in line
    pub fn boot(&mut self) {
        info!(
            "Booting reminder engine: enabled={}, interval={}s",
            self.settings.enabled,
            self.timing().interval_seconds
        );
        if self.settings.enabled {
            self.restart();
        }
        self.sync_keep_awake();
        self.publish();
    }

    /// Apply one command, then publish a fresh snapshot
    pub fn handle(&mut self, command: Command) -> Result<(), String> {
        let result = self.dispatch(command);
        self.publish();
        result
    }

    fn dispatch(&mut self, command: Command) -> Result<(), String> {
        match command {
            Command::Tick {
                target: TickTarget::Scheduler,
                generation,
            } => {
                if self.scheduler.is_current_tick(generation) {
                    self.on_scheduler_tick();
                } else {
                    trace!("Dropping stale scheduler tick {}", generation);
                }
                Ok(())
            }
            Command::Tick {
                target: TickTarget::OverlayCountdown,
                generation,
            } => {
                self.on_overlay_tick(generation);
                Ok(())
            }
            Command::LockStart(source) => {
                self.lock_start(source);
                Ok(())
            }
            Command::LockEnd(source) => {
                self.lock_end(source);
                Ok(())
            }
            Command::SetEnabled(enabled) => {
                self.set_enabled(enabled);
                Ok(())
            }
            Command::Toggle => {
                self.set_enabled(!self.settings.enabled);
                Ok(())
            }
            Command::Reset => self.reset(),
            Command::Skip => self.skip(),
            Command::Snooze => self.snooze(),
            Command::ShowOverlay => {
                self.show_overlay();
                Ok(())
            }
            Command::DismissOverlay => {
                self.dismiss_overlay(DismissReason::Button);
                Ok(())
            }
            Command::SnoozeFromOverlay => {
                self.snooze_from_overlay();
                Ok(())
            }
            Command::OverlayInput(input) => {
                match self.overlay.handle_input(input) {
                    Some(OverlayAction::Dismiss(reason)) => self.dismiss_overlay(reason),
                    Some(OverlayAction::Snooze) => self.snooze_from_overlay(),
                    None => debug!("Overlay input {:?} ignored", input),
                }
                Ok(())
            }
            Command::UpdateSettings(patch) => self.update_settings(patch),
            Command::AddProfile {
                name,
                interval_seconds,
                break_duration_seconds,
                icon,
            } => self.add_profile(name, interval_seconds, break_duration_seconds, icon),
            Command::DeleteProfile(id) => self.delete_profile(id),
            Command::SelectProfile(id) => self.select_profile(id),
            Command::ClearProfile => {
                self.set_active_profile(None);
                Ok(())
            }
            Command::Shutdown => {
                self.shutdown();
                Ok(())
            }
        }
    }

    /// Interval and break duration in effect
    pub fn timing(&self) -> Timing {
        self.profiles.effective_timing(&self.settings)
    }

    // Scheduler

    fn restart(&mut self) {
        let now = self.clock.now();
        let interval_seconds = self.timing().interval_seconds;
        let next_fire_at = self.scheduler.start(interval_seconds, now);
        self.emit(ReminderEvent::SchedulerStarted {
            next_fire_at,
            interval_seconds,
        });
    }

    fn stop(&mut self) {
        self.scheduler.stop();
        self.emit(ReminderEvent::SchedulerStopped);
    }

    fn on_scheduler_tick(&mut self) {
        let now = self.clock.now();
        let report = self.scheduler.on_tick(self.settings.enabled, now);
        trace!("Tick: {} ({:?})", report.countdown, report.icon_state);
        self.emit(ReminderEvent::Tick {
            remaining_seconds: report.remaining_seconds,
            countdown: report.countdown.clone(),
            icon_state: report.icon_state,
            progress: report.progress,
        });
        self.track_icon_state(report.icon_state);

        if report.due {
            self.fire(now);
        }
    }

    /// Reschedule from `now`, then run the fire side effects unless the
    /// policy suppresses them
    fn fire(&mut self, now: DateTime<Utc>) {
        let next_fire_at = self.scheduler.on_fire(now);

        if !self.fire_policy.allows_fire(&self.settings, now) {
            let window = self
                .settings
                .work_schedule
                .as_ref()
                .map(WorkSchedule::window)
                .unwrap_or_default();
            info!(
                "Reminder suppressed outside work hours {}, next check at {}",
                window, next_fire_at
            );
            self.emit(ReminderEvent::ReminderSuppressed { at: now, next_fire_at });
            return;
        }

        info!("Break reminder fired at {}, next at {}", now, next_fire_at);
        self.emit(ReminderEvent::ReminderFired {
            fired_at: now,
            next_fire_at,
        });

        let timing = self.timing();
        let sound_id = self
            .settings
            .enable_sound
            .then(|| self.settings.notification_sound.id());
        let body = format!(
            "You've been working for {} minutes. Take a {} minute break.",
            timing.interval_seconds / 60,
            (timing.break_duration_seconds / 60).max(1)
        );
        self.collaborators.notifier.send(NOTIFICATION_TITLE, &body, sound_id);
        if let Some(sound_id) = sound_id {
            self.collaborators.sound.play(sound_id);
        }

        if self.settings.enable_overlay {
            self.show_overlay();
        }
        if self.settings.enable_screen_saver {
            debug!("Activating screensaver");
            self.collaborators.screensaver.activate();
        }
    }

    fn set_enabled(&mut self, enabled: bool) {
        if self.settings.enabled == enabled {
            debug!("Reminders already {}", if enabled { "enabled" } else { "disabled" });
            return;
        }

        info!("Reminders {}", if enabled { "enabled" } else { "disabled" });
        self.settings.enabled = enabled;
        self.persist_settings();
        if enabled {
            self.restart();
        } else {
            self.stop();
        }
        self.sync_keep_awake();
        self.emit_settings_changed();
    }

    fn reset(&mut self) -> Result<(), String> {
        self.require_enabled("reset")?;
        info!("Reminder cycle reset");
        self.restart();
        Ok(())
    }

    fn skip(&mut self) -> Result<(), String> {
        self.require_enabled("skip")?;
        let now = self.clock.now();
        let next_fire_at = self
            .scheduler
            .skip(now)
            .ok_or_else(|| "No reminder is scheduled".to_string())?;
        self.emit(ReminderEvent::Skipped { next_fire_at });
        Ok(())
    }

    fn snooze(&mut self) -> Result<(), String> {
        self.require_enabled("snooze")?;
        let now = self.clock.now();
        let duration_seconds = self.settings.snooze_duration_seconds;
        let next_fire_at = self.scheduler.snooze(duration_seconds, now);
        self.emit(ReminderEvent::Snoozed {
            duration_seconds,
            next_fire_at,
        });
        Ok(())
    }

    fn require_enabled(&self, action: &str) -> Result<(), String> {
        if self.settings.enabled {
            Ok(())
        } else {
            Err(format!("Cannot {} while reminders are disabled", action))
        }
    }

    // Lock sessions

    fn lock_start(&mut self, source: LockSource) {
        let now = self.clock.now();
        if self.auto_reset.handle_lock_start(now, source) {
            self.emit(ReminderEvent::LockStarted { source, at: now });
        }
    }

    fn lock_end(&mut self, source: LockSource) {
        let now = self.clock.now();
        let inputs = ResetInputs {
            auto_reset_on_screen_lock: self.settings.auto_reset_on_screen_lock,
            enabled: self.settings.enabled,
            break_duration_seconds: self.timing().break_duration_seconds,
        };

        match self.auto_reset.handle_lock_end(now, source, inputs) {
            LockEnd::Spurious => {}
            LockEnd::Closed { away_seconds, reset } => {
                self.emit(ReminderEvent::LockEnded {
                    source,
                    away_seconds,
                    reset,
                });
                if reset {
                    info!("Away long enough for a break, restarting the cycle");
                    self.restart();
                }
            }
        }
    }

    // Overlay

    fn show_overlay(&mut self) {
        if self.overlay.is_visible() {
            self.emit(ReminderEvent::OverlayDismissed {
                reason: DismissReason::Replaced,
            });
        }
        let displays = self.collaborators.displays.displays();
        let shown = self.overlay.trigger(
            &displays,
            self.settings.overlay_duration_seconds,
            self.settings.overlay_color,
            &mut self.rng,
        );
        self.emit(ReminderEvent::OverlayShown(shown));
    }

    fn on_overlay_tick(&mut self, generation: u64) {
        match self.overlay.on_countdown_tick(generation) {
            Some(CountdownTick::Counting(remaining)) => {
                self.emit(ReminderEvent::OverlayCountdown { remaining });
            }
            Some(CountdownTick::Expired) => {
                self.emit(ReminderEvent::OverlayCountdown { remaining: 0 });
                self.emit(ReminderEvent::OverlayDismissed {
                    reason: DismissReason::Timeout,
                });
            }
            None => trace!("Dropping stale overlay tick {}", generation),
        }
    }

    fn dismiss_overlay(&mut self, reason: DismissReason) {
        if self.overlay.dismiss(reason) {
            self.emit(ReminderEvent::OverlayDismissed { reason });
        }
    }

    /// Dismiss, then push the next reminder out by the snooze duration
    fn snooze_from_overlay(&mut self) {
        self.dismiss_overlay(DismissReason::Snooze);
        if let Err(e) = self.snooze() {
            debug!("Overlay snooze only dismissed: {}", e);
        }
    }

    // Settings and profiles

    fn update_settings(&mut self, patch: SettingsPatch) -> Result<(), String> {
        if let Some(name) = &patch.schedule_preset {
            if SchedulePreset::find(name).is_none() {
                return Err(format!("Unknown schedule preset '{}'", name));
            }
        }

        let delta = self.settings.apply(patch);
        if !delta.changed {
            debug!("Settings update changed nothing");
            return Ok(());
        }

        info!("Settings updated");
        self.persist_settings();

        if delta.enabled_changed {
            if self.settings.enabled {
                self.restart();
            } else {
                self.stop();
            }
        } else if delta.timing_changed && self.settings.enabled {
            self.restart();
        }
        if delta.enabled_changed || delta.keep_awake_changed {
            self.sync_keep_awake();
        }
        self.emit_settings_changed();
        Ok(())
    }

    fn add_profile(
        &mut self,
        name: String,
        interval_seconds: u32,
        break_duration_seconds: u32,
        icon: Option<String>,
    ) -> Result<(), String> {
        self.profiles
            .add_custom(name, interval_seconds, break_duration_seconds, icon)?;
        self.profiles.save_custom(self.store.as_mut());
        self.emit_profiles_changed();
        Ok(())
    }

    fn delete_profile(&mut self, id: Uuid) -> Result<(), String> {
        self.profiles.delete(id)?;
        self.profiles.save_custom(self.store.as_mut());
        if self.settings.active_profile == Some(id) {
            self.set_active_profile(None);
        }
        self.emit_profiles_changed();
        Ok(())
    }

    fn select_profile(&mut self, id: Uuid) -> Result<(), String> {
        let profile = self
            .profiles
            .get(id)
            .ok_or_else(|| format!("Profile {} not found", id))?;
        info!("Selecting profile {}", profile.name);
        self.set_active_profile(Some(id));
        Ok(())
    }

    fn set_active_profile(&mut self, id: Option<Uuid>) {
        if self.settings.active_profile == id {
            return;
        }
        let before = self.timing();
        self.settings.active_profile = id;
        self.persist_settings();
        if self.settings.enabled && self.timing() != before {
            self.restart();
        }
        self.emit_settings_changed();
    }

    fn persist_settings(&mut self) {
        self.settings.save(self.store.as_mut());
    }

    // Keep-awake

    fn sync_keep_awake(&mut self) {
        let changed = self.keep_awake.sync(
            self.settings.keep_awake,
            self.settings.enabled,
            self.collaborators.power.as_mut(),
        );
        if let Some(active) = changed {
            self.emit(ReminderEvent::KeepAwakeChanged { active });
        }
    }

    fn shutdown(&mut self) {
        info!("Reminder engine shutting down");
        self.dismiss_overlay(DismissReason::Shutdown);
        self.scheduler.stop();
        self.keep_awake.release_all(self.collaborators.power.as_mut());
    }

    // Publication

    fn emit(&self, event: ReminderEvent) {
        // No subscribers is not an error
        let _ = self.events.send(event);
    }

    fn emit_settings_changed(&self) {
        self.emit(ReminderEvent::SettingsChanged {
            settings: self.settings.clone(),
        });
    }

    fn emit_profiles_changed(&self) {
        self.emit(ReminderEvent::ProfilesChanged {
            profiles: self.profiles.all().to_vec(),
        });
    }

    fn track_icon_state(&mut self, icon_state: IconState) {
        if icon_state != self.icon_state {
            debug!("Icon state {:?} -> {:?}", self.icon_state, icon_state);
            self.emit(ReminderEvent::IconStateChanged {
                from: self.icon_state,
                to: icon_state,
            });
            self.icon_state = icon_state;
        }
    }

    fn publish(&mut self) {
        let snapshot = self.snapshot();
        self.track_icon_state(snapshot.icon_state);
        if self.status.send(snapshot).is_err() {
            trace!("No status watchers");
        }
    }

    /// Current state, computed at the clock's now
    pub fn snapshot(&self) -> StatusSnapshot {
        let now = self.clock.now();
        let report = self.scheduler.on_tick(self.settings.enabled, now);

        StatusSnapshot {
            enabled: self.settings.enabled,
            scheduler: self.scheduler.state(),
            remaining_seconds: report.remaining_seconds,
            countdown: report.countdown,
            icon_state: report.icon_state,
            progress: report.progress,
            timing: self.timing(),
            active_profile: self
                .settings
                .active_profile
                .filter(|id| self.profiles.get(*id).is_some()),
            lock_session: self.auto_reset.session().copied(),
            overlay: OverlayStatus {
                visible: self.overlay.is_visible(),
                remaining: self.overlay.remaining(),
                displays: self.overlay.visible_panels(),
                suggestion: self.overlay.suggestion(),
            },
            keep_awake_active: self.keep_awake.is_active(),
            within_work_hours: self.fire_policy.allows_fire(&self.settings, now),
            settings: self.settings.clone(),
            profiles: self.profiles.all().to_vec(),
            updated_at: now,
        }
    }
}

impl Drop for ReminderEngine {
    fn drop(&mut self) {
        if self.keep_awake.is_active() {
            warn!("Reminder engine dropped with a live power assertion, releasing it");
            self.keep_awake.release_all(self.collaborators.power.as_mut());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        services::{
            DisplayInfo, NotificationSink, PowerAssertionApi, PowerHandle, ScreenSaverActivator,
            SoundPlayer, StaticDisplays,
        },
        state::settings::MemorySettingsStore,
        utils::clock::ManualClock,
    };
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Calls(Arc<Mutex<Vec<String>>>);

    impl Calls {
        fn push(&self, call: String) {
            self.0.lock().unwrap().push(call);
        }

        fn count(&self, prefix: &str) -> usize {
            self.0.lock().unwrap().iter().filter(|c| c.starts_with(prefix)).count()
        }
    }

    struct Fake(Calls);

    impl NotificationSink for Fake {
        fn send(&self, title: &str, _body: &str, _sound_id: Option<&str>) {
            self.0.push(format!("notify:{}", title));
        }
    }

    impl SoundPlayer for Fake {
        fn play(&self, sound_id: &str) {
            self.0.push(format!("sound:{}", sound_id));
        }
    }

    impl ScreenSaverActivator for Fake {
        fn activate(&self) {
            self.0.push("screensaver".to_string());
        }
    }

    impl PowerAssertionApi for Fake {
        fn acquire(&mut self, _reason: &str) -> Result<PowerHandle, String> {
            self.0.push("acquire".to_string());
            Ok(PowerHandle::new(1))
        }

        fn release(&mut self, _handle: PowerHandle) {
            self.0.push("release".to_string());
        }
    }

    fn engine() -> (ReminderEngine, Arc<ManualClock>, Calls) {
        let calls = Calls::default();
        let clock = Arc::new(ManualClock::at_epoch());
        let collaborators = Collaborators {
            notifier: Box::new(Fake(calls.clone())),
            sound: Box::new(Fake(calls.clone())),
            screensaver: Box::new(Fake(calls.clone())),
            power: Box::new(Fake(calls.clone())),
            displays: Box::new(StaticDisplays(vec![DisplayInfo::fallback()])),
        };
        let engine = ReminderEngine::new(
            Box::new(MemorySettingsStore::new()),
            collaborators,
            clock.clone(),
            Ticker::detached(),
        )
        .with_rng_seed(1);
        (engine, clock, calls)
    }

    fn tick(engine: &mut ReminderEngine) {
        let generation = engine.scheduler().tick_generation().unwrap();
        engine
            .handle(Command::Tick {
                target: TickTarget::Scheduler,
                generation,
            })
            .unwrap();
    }

    #[test]
    fn boot_starts_an_enabled_cycle() {
        let (mut engine, _clock, _calls) = engine();
        engine.boot();
        let snapshot = engine.snapshot();
        assert!(snapshot.is_running());
        assert_eq!(snapshot.remaining_seconds, Some(1500));
        assert_eq!(snapshot.icon_state, IconState::Normal);
    }

    #[test]
    fn fire_notifies_plays_sound_and_shows_overlay() {
        let (mut engine, clock, calls) = engine();
        engine.boot();
        clock.advance_secs(1500);
        tick(&mut engine);

        assert_eq!(calls.count("notify:"), 1);
        assert_eq!(calls.count("sound:"), 1);
        assert_eq!(calls.count("screensaver"), 0);
        assert!(engine.snapshot().overlay.visible);
        assert_eq!(engine.snapshot().remaining_seconds, Some(1500));
    }

    #[test]
    fn disabling_stops_and_pauses() {
        let (mut engine, _clock, _calls) = engine();
        engine.boot();
        engine.handle(Command::SetEnabled(false)).unwrap();
        let snapshot = engine.snapshot();
        assert!(!snapshot.is_running());
        assert_eq!(snapshot.icon_state, IconState::Paused);
        assert!(engine.handle(Command::Snooze).is_err());
    }

    #[test]
    fn status_watch_is_seeded_before_boot() {
        let (mut engine, _clock, _calls) = engine();
        let status = engine.status_receiver();
        {
            let seeded = status.borrow();
            assert_eq!(seeded.profiles.len(), 4);
            assert!(seeded.settings.enabled);
            assert_eq!(seeded.timing.interval_seconds, 1500);
            assert!(!seeded.is_running());
        }

        engine.boot();
        assert!(status.borrow().is_running());
        assert_eq!(status.borrow().remaining_seconds, Some(1500));
    }

    #[test]
    fn stale_scheduler_ticks_are_dropped() {
        let (mut engine, clock, calls) = engine();
        engine.boot();
        clock.advance_secs(1500);
        engine
            .handle(Command::Tick {
                target: TickTarget::Scheduler,
                generation: 999,
            })
            .unwrap();
        assert_eq!(calls.count("notify:"), 0);
    }
}
