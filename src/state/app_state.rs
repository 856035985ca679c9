//! Shared handle between the HTTP layer and the reminder engine

use std::{
    fmt,
    sync::{Arc, Mutex},
    time::Instant,
};
use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{debug, info};

use super::StatusSnapshot;
use crate::reminder::{Command, EngineRequest, ReminderEvent};

/// Why a dispatched command did not produce a snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The engine loop is gone
    Unavailable(String),
    /// The engine refused the command
    Rejected(String),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(e) => write!(f, "Reminder engine unavailable: {}", e),
            Self::Rejected(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for DispatchError {}

/// Application state shared by every request handler.
///
/// Nothing here owns reminder state: commands go to the engine queue and the
/// latest snapshot is read from the watch channel.
#[derive(Debug)]
pub struct AppState {
    queue: mpsc::Sender<EngineRequest>,
    events: broadcast::Sender<ReminderEvent>,
    status: watch::Receiver<StatusSnapshot>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Arc<Mutex<Option<String>>>,
    pub last_action_time: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl AppState {
    pub fn new(
        port: u16,
        host: String,
        queue: mpsc::Sender<EngineRequest>,
        events: broadcast::Sender<ReminderEvent>,
        status: watch::Receiver<StatusSnapshot>,
    ) -> Self {
        Self {
            queue,
            events,
            status,
            start_time: Instant::now(),
            port,
            host,
            last_action: Arc::new(Mutex::new(None)),
            last_action_time: Arc::new(Mutex::new(None)),
        }
    }

    /// Send a command to the engine and wait for the resulting snapshot
    pub async fn dispatch(&self, action: &str, command: Command) -> Result<StatusSnapshot, DispatchError> {
        debug!("Dispatching {} ({})", action, command.name());
        let (reply_tx, reply_rx) = oneshot::channel();

        self.queue
            .send(EngineRequest::with_reply(command, reply_tx))
            .await
            .map_err(|e| DispatchError::Unavailable(format!("Failed to queue {}: {}", action, e)))?;

        let snapshot = reply_rx
            .await
            .map_err(|e| DispatchError::Unavailable(format!("No reply to {}: {}", action, e)))?
            .map_err(DispatchError::Rejected)?;

        // Update last action tracking
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }

        info!("Action {} applied", action);
        Ok(snapshot)
    }

    /// Latest published snapshot
    pub fn status(&self) -> StatusSnapshot {
        self.status.borrow().clone()
    }

    /// New receiver for the engine's event stream
    pub fn subscribe(&self) -> broadcast::Receiver<ReminderEvent> {
        self.events.subscribe()
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }
}
