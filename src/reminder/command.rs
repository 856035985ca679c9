//! Requests marshaled onto the engine's single execution context

use tokio::sync::oneshot;
use uuid::Uuid;

use super::{auto_reset::LockSource, overlay::OverlayInput};
use crate::{
    state::{settings::SettingsPatch, StatusSnapshot},
    tasks::ticker::TickTarget,
};

/// Everything that can change engine state
#[derive(Debug, Clone)]
pub enum Command {
    /// One second elapsed on an armed ticker
    Tick { target: TickTarget, generation: u64 },
    LockStart(LockSource),
    LockEnd(LockSource),
    SetEnabled(bool),
    Toggle,
    /// Restart the cycle from now
    Reset,
    /// Jump past the upcoming reminder
    Skip,
    Snooze,
    /// Preview the overlay outside of a fire
    ShowOverlay,
    DismissOverlay,
    SnoozeFromOverlay,
    OverlayInput(OverlayInput),
    UpdateSettings(SettingsPatch),
    AddProfile {
        name: String,
        interval_seconds: u32,
        break_duration_seconds: u32,
        icon: Option<String>,
    },
    DeleteProfile(Uuid),
    SelectProfile(Uuid),
    ClearProfile,
    Shutdown,
}

impl Command {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tick { .. } => "tick",
            Self::LockStart(_) => "lock_start",
            Self::LockEnd(_) => "lock_end",
            Self::SetEnabled(true) => "enable",
            Self::SetEnabled(false) => "disable",
            Self::Toggle => "toggle",
            Self::Reset => "reset",
            Self::Skip => "skip",
            Self::Snooze => "snooze",
            Self::ShowOverlay => "overlay_show",
            Self::DismissOverlay => "overlay_dismiss",
            Self::SnoozeFromOverlay => "overlay_snooze",
            Self::OverlayInput(_) => "overlay_input",
            Self::UpdateSettings(_) => "update_settings",
            Self::AddProfile { .. } => "add_profile",
            Self::DeleteProfile(_) => "delete_profile",
            Self::SelectProfile(_) => "select_profile",
            Self::ClearProfile => "clear_profile",
            Self::Shutdown => "shutdown",
        }
    }
}

pub type EngineReply = oneshot::Sender<Result<StatusSnapshot, String>>;

/// A command plus an optional reply slot for the resulting snapshot
#[derive(Debug)]
pub struct EngineRequest {
    pub command: Command,
    pub reply: Option<EngineReply>,
}

impl EngineRequest {
    /// Fire-and-forget request
    pub fn notify(command: Command) -> Self {
        Self { command, reply: None }
    }

    pub fn with_reply(command: Command, reply: EngineReply) -> Self {
        Self {
            command,
            reply: Some(reply),
        }
    }
}
