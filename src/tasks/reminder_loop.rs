//! Reminder engine background task

use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::reminder::{Command, EngineRequest, ReminderEngine};

/// Capacity of the engine's command queue
pub const QUEUE_CAPACITY: usize = 256;

/// Own a booted engine and apply queued commands one at a time until shutdown
pub async fn reminder_loop(mut engine: ReminderEngine, mut queue: mpsc::Receiver<EngineRequest>) {
    info!("Starting reminder engine task");

    while let Some(request) = queue.recv().await {
        let EngineRequest { command, reply } = request;
        let shutdown = matches!(command, Command::Shutdown);

        if matches!(command, Command::Tick { .. }) {
            trace!("Engine command: {:?}", command);
        } else {
            debug!("Engine command: {}", command.name());
        }

        let result = engine.handle(command).map(|()| engine.snapshot());
        if let Err(e) = &result {
            warn!("Reminder command rejected: {}", e);
        }

        if let Some(reply) = reply {
            if reply.send(result).is_err() {
                debug!("Requester went away before the reply");
            }
        }

        if shutdown {
            break;
        }
    }

    info!("Reminder engine task stopped");
}
