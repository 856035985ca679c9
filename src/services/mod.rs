//! External collaborators of the reminder engine
//!
//! The engine only talks to the traits below. The implementations wrap the
//! desktop's command-line tools and never block the caller.

pub mod displays;
pub mod notify;
pub mod power;
pub mod process;
pub mod store;

pub use displays::{DisplayInfo, StaticDisplays, WatchedDisplays};
pub use notify::{CanberraSoundPlayer, DesktopNotifier, XdgScreenSaver};
pub use power::{PowerHandle, SystemdInhibitor, UnsupportedPower};
pub use process::check_tool_available;
pub use store::{default_settings_path, JsonFileStore};

/// Fire-and-forget user notification. May silently do nothing when the
/// desktop refuses notifications.
pub trait NotificationSink: Send {
    fn send(&self, title: &str, body: &str, sound_id: Option<&str>);
}

pub trait SoundPlayer: Send {
    fn play(&self, sound_id: &str);
}

/// Starts the screensaver; failures are ignored
pub trait ScreenSaverActivator: Send {
    fn activate(&self);
}

/// Acquire and release display-sleep-prevention assertions
pub trait PowerAssertionApi: Send {
    fn acquire(&mut self, reason: &str) -> Result<PowerHandle, String>;
    fn release(&mut self, handle: PowerHandle);
}

/// Lists the currently connected displays
pub trait DisplayProvider: Send {
    fn displays(&self) -> Vec<DisplayInfo>;
}

/// Every collaborator the engine needs, boxed
pub struct Collaborators {
    pub notifier: Box<dyn NotificationSink>,
    pub sound: Box<dyn SoundPlayer>,
    pub screensaver: Box<dyn ScreenSaverActivator>,
    pub power: Box<dyn PowerAssertionApi>,
    pub displays: Box<dyn DisplayProvider>,
}

impl Collaborators {
    /// Desktop implementations backed by command-line tools
    pub fn desktop(power: Box<dyn PowerAssertionApi>, displays: Box<dyn DisplayProvider>) -> Self {
        Self {
            notifier: Box::new(DesktopNotifier),
            sound: Box::new(CanberraSoundPlayer),
            screensaver: Box::new(XdgScreenSaver),
            power,
            displays,
        }
    }
}
