//! Recording fakes shared by the integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use break_reminder::{
    reminder::{Command, ReminderEngine, ReminderEvent, WorkHoursPolicy},
    services::{
        Collaborators, DisplayInfo, NotificationSink, PowerAssertionApi, PowerHandle,
        ScreenSaverActivator, SoundPlayer, StaticDisplays,
    },
    state::{MemorySettingsStore, ReminderSettings, SettingsStore},
    tasks::{TickTarget, Ticker},
    utils::ManualClock,
};
use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde_json::Value;
use tokio::sync::broadcast;

/// Every collaborator call, in order
#[derive(Debug, Clone, Default)]
pub struct Recorder(Arc<Mutex<Vec<String>>>);

impl Recorder {
    fn push(&self, call: impl Into<String>) {
        self.0.lock().unwrap().push(call.into());
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

pub struct RecordingNotifier(pub Recorder);

impl NotificationSink for RecordingNotifier {
    fn send(&self, title: &str, body: &str, sound_id: Option<&str>) {
        self.0.push(format!("notify:{}|{}|{}", title, body, sound_id.unwrap_or("-")));
    }
}

pub struct RecordingSound(pub Recorder);

impl SoundPlayer for RecordingSound {
    fn play(&self, sound_id: &str) {
        self.0.push(format!("sound:{}", sound_id));
    }
}

pub struct RecordingScreenSaver(pub Recorder);

impl ScreenSaverActivator for RecordingScreenSaver {
    fn activate(&self) {
        self.0.push("screensaver");
    }
}

pub struct RecordingPower {
    pub recorder: Recorder,
    pub fail: bool,
    pub next_id: u64,
}

impl PowerAssertionApi for RecordingPower {
    fn acquire(&mut self, _reason: &str) -> Result<PowerHandle, String> {
        if self.fail {
            self.recorder.push("acquire-failed");
            return Err("denied".to_string());
        }
        self.next_id += 1;
        self.recorder.push(format!("acquire:{}", self.next_id));
        Ok(PowerHandle::new(self.next_id))
    }

    fn release(&mut self, handle: PowerHandle) {
        self.recorder.push(format!("release:{}", handle.id()));
    }
}

/// A store the test keeps a handle on after the engine takes ownership
#[derive(Clone, Default)]
pub struct SharedStore(pub Arc<Mutex<MemorySettingsStore>>);

impl SettingsStore for SharedStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.0.lock().unwrap().get(key)
    }

    fn set(&mut self, key: &str, value: Value) {
        self.0.lock().unwrap().set(key, value);
    }
}

pub struct Harness {
    pub engine: ReminderEngine,
    pub clock: Arc<ManualClock>,
    pub calls: Recorder,
    pub store: SharedStore,
    pub events: broadcast::Receiver<ReminderEvent>,
}

pub fn t(seconds: i64) -> DateTime<Utc> {
    DateTime::<Utc>::default() + Duration::seconds(seconds)
}

impl Harness {
    /// Engine over `settings`, two displays, clock at the epoch, booted
    pub fn boot(settings: ReminderSettings) -> Self {
        Self::boot_with(settings, false)
    }

    pub fn boot_with(settings: ReminderSettings, power_fails: bool) -> Self {
        let calls = Recorder::default();
        let store = SharedStore::default();
        settings.save(&mut store.clone());

        let collaborators = Collaborators {
            notifier: Box::new(RecordingNotifier(calls.clone())),
            sound: Box::new(RecordingSound(calls.clone())),
            screensaver: Box::new(RecordingScreenSaver(calls.clone())),
            power: Box::new(RecordingPower {
                recorder: calls.clone(),
                fail: power_fails,
                next_id: 0,
            }),
            displays: Box::new(StaticDisplays(vec![
                DisplayInfo::new("eDP-1", 1920, 1080, 0, 0, true),
                DisplayInfo::new("HDMI-1", 2560, 1440, 1920, 0, false),
            ])),
        };

        let clock = Arc::new(ManualClock::at_epoch());
        let mut engine = ReminderEngine::new(
            Box::new(store.clone()),
            collaborators,
            clock.clone(),
            Ticker::detached(),
        )
        .with_fire_policy(WorkHoursPolicy::fixed(FixedOffset::east_opt(0).unwrap()))
        .with_rng_seed(42);
        let events = engine.subscribe();
        engine.boot();

        Self {
            engine,
            clock,
            calls,
            store,
            events,
        }
    }

    pub fn run(&mut self, command: Command) {
        self.engine.handle(command).unwrap();
    }

    /// Move the clock to `at` and deliver a single scheduler tick there
    pub fn tick_scheduler_at(&mut self, at: DateTime<Utc>) {
        self.clock.set(at);
        let generation = self.engine.scheduler().tick_generation().unwrap();
        self.run(Command::Tick {
            target: TickTarget::Scheduler,
            generation,
        });
    }

    pub fn tick_overlay(&mut self, generation: u64) {
        self.run(Command::Tick {
            target: TickTarget::OverlayCountdown,
            generation,
        });
    }

    pub fn drain_events(&mut self) -> Vec<ReminderEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}
