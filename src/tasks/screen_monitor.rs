//! Screen lock / sleep monitoring over D-Bus
//!
//! Each channel runs `dbus-monitor` and turns its output into lock start and
//! lock end commands for the engine. Several channels usually report the same
//! lock episode; the engine's auto-reset policy collapses them.

use std::{process::Stdio, time::Duration};

use tokio::{
    io::{AsyncBufReadExt, BufReader},
    process::Command as Process,
    sync::mpsc,
    time::sleep,
};
use tracing::{debug, info, warn};

use crate::reminder::{Command, EngineRequest, LockSource};

/// Delay before restarting a channel whose monitor exited
const RESTART_DELAY: Duration = Duration::from_secs(30);

/// A lock-related signal decoded from the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenSignal {
    LockStart(LockSource),
    LockEnd(LockSource),
}

impl ScreenSignal {
    fn into_command(self) -> Command {
        match self {
            Self::LockStart(source) => Command::LockStart(source),
            Self::LockEnd(source) => Command::LockEnd(source),
        }
    }
}

/// One bus subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorChannel {
    /// Session bus `org.freedesktop.ScreenSaver.ActiveChanged`
    ScreenSaver,
    /// System bus logind sleep and session lock signals
    Login,
}

impl MonitorChannel {
    fn args(self) -> &'static [&'static str] {
        match self {
            Self::ScreenSaver => &[
                "--session",
                "type='signal',interface='org.freedesktop.ScreenSaver',member='ActiveChanged'",
            ],
            Self::Login => &[
                "--system",
                "type='signal',interface='org.freedesktop.login1.Manager',member='PrepareForSleep'",
                "type='signal',interface='org.freedesktop.login1.Session',member='Lock'",
                "type='signal',interface='org.freedesktop.login1.Session',member='Unlock'",
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingMember {
    ActiveChanged,
    PrepareForSleep,
}

/// Line-oriented decoder for `dbus-monitor` output.
///
/// Signals with a boolean argument span two lines: the header naming the
/// member and the `boolean true|false` argument line.
#[derive(Debug, Default)]
pub struct SignalParser {
    pending: Option<PendingMember>,
}

impl SignalParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, line: &str) -> Option<ScreenSignal> {
        let line = line.trim();

        if line.starts_with("signal ") {
            self.pending = None;
            let member = field(line, "member=")?;
            let interface = field(line, "interface=")?;
            return match (interface, member) {
                ("org.freedesktop.ScreenSaver", "ActiveChanged") => {
                    self.pending = Some(PendingMember::ActiveChanged);
                    None
                }
                ("org.freedesktop.login1.Manager", "PrepareForSleep") => {
                    self.pending = Some(PendingMember::PrepareForSleep);
                    None
                }
                ("org.freedesktop.login1.Session", "Lock") => {
                    Some(ScreenSignal::LockStart(LockSource::SessionLock))
                }
                ("org.freedesktop.login1.Session", "Unlock") => {
                    Some(ScreenSignal::LockEnd(LockSource::SessionLock))
                }
                _ => None,
            };
        }

        let value = match line.strip_prefix("boolean ")? {
            "true" => true,
            "false" => false,
            _ => return None,
        };
        let source = match self.pending.take()? {
            PendingMember::ActiveChanged => LockSource::ScreenSaver,
            PendingMember::PrepareForSleep => LockSource::SystemSleep,
        };
        Some(if value {
            ScreenSignal::LockStart(source)
        } else {
            ScreenSignal::LockEnd(source)
        })
    }
}

fn field<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let start = line.find(key)? + key.len();
    line[start..].split([';', ' ']).next()
}

/// Background task running every monitor channel until the engine queue closes
pub async fn screen_monitor_task(queue: mpsc::Sender<EngineRequest>) {
    info!("Starting screen activity monitor");
    tokio::join!(
        run_channel(MonitorChannel::ScreenSaver, queue.clone()),
        run_channel(MonitorChannel::Login, queue),
    );
}

async fn run_channel(channel: MonitorChannel, queue: mpsc::Sender<EngineRequest>) {
    loop {
        match monitor_once(channel, &queue).await {
            Ok(()) if queue.is_closed() => break,
            Ok(()) => warn!("{:?} monitor exited, restarting in {:?}", channel, RESTART_DELAY),
            Err(e) => warn!("{:?} monitor failed: {}, retrying in {:?}", channel, e, RESTART_DELAY),
        }
        sleep(RESTART_DELAY).await;
    }
    debug!("{:?} monitor stopped", channel);
}

async fn monitor_once(channel: MonitorChannel, queue: &mpsc::Sender<EngineRequest>) -> Result<(), String> {
    let mut child = Process::new("dbus-monitor")
        .args(channel.args())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| format!("Failed to spawn dbus-monitor: {}", e))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| "Failed to capture dbus-monitor output".to_string())?;
    info!("{:?} monitor running", channel);

    let mut lines = BufReader::new(stdout).lines();
    let mut parser = SignalParser::new();
    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| format!("Failed to read dbus-monitor output: {}", e))?
    {
        if let Some(signal) = parser.feed(&line) {
            debug!("{:?} signal: {:?}", channel, signal);
            if queue.send(EngineRequest::notify(signal.into_command())).await.is_err() {
                return Ok(());
            }
        }
    }

    Ok(())
}
