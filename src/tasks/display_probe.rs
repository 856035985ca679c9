//! Display probe background task

use std::time::Duration;

use tokio::{sync::watch, time::interval};
use tracing::{debug, info, warn};

use crate::services::displays::{list_monitors, DisplayInfo};

const PROBE_INTERVAL: Duration = Duration::from_secs(30);

/// Poll the connected displays and publish the list whenever it changes
pub async fn display_probe_task(displays: watch::Sender<Vec<DisplayInfo>>) {
    info!("Starting display probe task");

    let mut ticks = interval(PROBE_INTERVAL);
    let mut reported_failure = false;

    loop {
        ticks.tick().await;

        match list_monitors().await {
            Ok(found) if found.is_empty() => debug!("xrandr reported no monitors"),
            Ok(found) => {
                reported_failure = false;
                let changed = displays.send_if_modified(|current| {
                    if *current == found {
                        return false;
                    }
                    *current = found.clone();
                    true
                });
                if changed {
                    let ids: Vec<&str> = found.iter().map(|d| d.id.as_str()).collect();
                    info!("Displays changed: {:?}", ids);
                }
            }
            Err(e) if !reported_failure => {
                warn!("Failed to list displays, using a single fallback display: {}", e);
                reported_failure = true;
            }
            Err(e) => debug!("Display listing still failing: {}", e),
        }

        if displays.is_closed() {
            debug!("No display watchers left, stopping probe");
            break;
        }
    }
}
