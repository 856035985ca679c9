//! Cancellable 1 Hz tick sources feeding the reminder queue

use std::time::Duration;

use serde::Serialize;
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, warn};

use crate::reminder::{Command, EngineRequest};

/// Which owner a tick belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TickTarget {
    Scheduler,
    OverlayCountdown,
}

/// Arms tick tasks that post [`Command::Tick`] into the engine queue.
///
/// A detached ticker (no queue) hands out inert handles; the owner is then
/// driven by calling its tick methods directly.
#[derive(Debug, Clone, Default)]
pub struct Ticker {
    queue: Option<mpsc::Sender<EngineRequest>>,
}

impl Ticker {
    pub fn new(queue: mpsc::Sender<EngineRequest>) -> Self {
        Self { queue: Some(queue) }
    }

    pub fn detached() -> Self {
        Self { queue: None }
    }

    /// Start ticking every second. Dropping the returned handle stops it.
    pub fn arm(&self, target: TickTarget, generation: u64) -> TickHandle {
        let Some(queue) = self.queue.clone() else {
            return TickHandle { generation, task: None };
        };

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!("No runtime to arm {:?} ticker: {}", target, e);
                return TickHandle { generation, task: None };
            }
        };

        debug!("Arming {:?} ticker (generation {})", target, generation);
        let task = runtime.spawn(async move {
            let mut ticks = interval(Duration::from_secs(1));
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticks.tick().await;

            loop {
                ticks.tick().await;
                let request = EngineRequest::notify(Command::Tick { target, generation });
                if queue.send(request).await.is_err() {
                    debug!("Reminder queue closed, {:?} ticker exiting", target);
                    break;
                }
            }
        });

        TickHandle {
            generation,
            task: Some(task),
        }
    }
}

/// Exclusive handle to one armed tick source
#[derive(Debug)]
pub struct TickHandle {
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl TickHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detached_ticker_hands_out_inert_handles() {
        let handle = Ticker::detached().arm(TickTarget::Scheduler, 7);
        assert_eq!(handle.generation(), 7);
        assert!(handle.task.is_none());
    }

    #[tokio::test]
    async fn armed_ticker_posts_tagged_ticks_until_dropped() {
        let (tx, mut rx) = mpsc::channel(8);
        let handle = Ticker::new(tx).arm(TickTarget::OverlayCountdown, 3);

        let request = rx.recv().await.expect("tick");
        assert!(matches!(
            request.command,
            Command::Tick { target: TickTarget::OverlayCountdown, generation: 3 }
        ));

        drop(handle);
        // Once aborted the task releases its sender and the queue closes
        while rx.recv().await.is_some() {}
    }
}
