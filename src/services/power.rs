//! Display-sleep prevention through a held `systemd-inhibit` process

use std::{
    collections::HashMap,
    process::Stdio,
    thread,
    time::{Duration, Instant},
};

use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use super::PowerAssertionApi;

/// Opaque token for one held assertion
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct PowerHandle(u64);

impl PowerHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// How long a freshly spawned inhibitor must stay up to count as held
const STARTUP_GRACE: Duration = Duration::from_millis(100);
const STARTUP_POLL: Duration = Duration::from_millis(10);

/// Holds an idle inhibitor for as long as the child process lives
#[derive(Debug)]
pub struct SystemdInhibitor {
    program: String,
    children: HashMap<u64, Child>,
    next_id: u64,
}

impl SystemdInhibitor {
    pub fn new() -> Self {
        Self::with_program("systemd-inhibit")
    }

    /// Run `program` with the inhibitor arguments instead of `systemd-inhibit`
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            children: HashMap::new(),
            next_id: 0,
        }
    }
}

impl Default for SystemdInhibitor {
    fn default() -> Self {
        Self::new()
    }
}

/// Fail if the inhibitor exits within the startup grace, e.g. without logind
fn confirm_running(child: &mut Child, program: &str) -> Result<(), String> {
    let deadline = Instant::now() + STARTUP_GRACE;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Err(format!("{} exited right away ({})", program, status)),
            Ok(None) if Instant::now() >= deadline => return Ok(()),
            Ok(None) => thread::sleep(STARTUP_POLL),
            Err(e) => return Err(format!("Failed to check on {}: {}", program, e)),
        }
    }
}

impl PowerAssertionApi for SystemdInhibitor {
    fn acquire(&mut self, reason: &str) -> Result<PowerHandle, String> {
        let why = format!("--why={}", reason);
        let mut child = Command::new(&self.program)
            .args([
                "--what=idle",
                "--who=break-reminder",
                why.as_str(),
                "--mode=block",
                "sleep",
                "infinity",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| format!("Failed to spawn {}: {}", self.program, e))?;
        confirm_running(&mut child, &self.program)?;

        self.next_id += 1;
        debug!("{} running as pid {:?}", self.program, child.id());
        self.children.insert(self.next_id, child);
        Ok(PowerHandle::new(self.next_id))
    }

    fn release(&mut self, handle: PowerHandle) {
        match self.children.remove(&handle.id()) {
            Some(mut child) => {
                if let Err(e) = child.start_kill() {
                    warn!("Failed to stop systemd-inhibit: {}", e);
                } else {
                    info!("Idle inhibitor released");
                }
            }
            None => warn!("Release of unknown power handle {}", handle.id()),
        }
    }
}

/// Stand-in when no inhibitor is available; every acquire fails
#[derive(Debug, Default)]
pub struct UnsupportedPower;

impl PowerAssertionApi for UnsupportedPower {
    fn acquire(&mut self, _reason: &str) -> Result<PowerHandle, String> {
        Err("display sleep prevention is not available on this system".to_string())
    }

    fn release(&mut self, _handle: PowerHandle) {}
}
