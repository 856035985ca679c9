//! Break Reminder - recurring break reminders with a full-screen overlay
//!
//! This is the main entry point for the break-reminder daemon.

use std::sync::Arc;
use tokio::{
    net::TcpListener,
    sync::{mpsc, watch},
};
use tracing::{info, warn};

use break_reminder::{
    api::create_router,
    config::Config,
    reminder::{Command, EngineRequest, ReminderEngine},
    services::{
        check_tool_available, Collaborators, JsonFileStore, PowerAssertionApi, SystemdInhibitor,
        UnsupportedPower, WatchedDisplays,
    },
    state::AppState,
    tasks::{display_probe_task, reminder_loop, screen_monitor_task, Ticker, QUEUE_CAPACITY},
    utils::{shutdown_signal, SystemClock},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("break_reminder={},tower_http=info", config.log_level()))
        .init();

    info!("Starting break-reminder v{}", env!("CARGO_PKG_VERSION"));
    let settings_path = config.settings_path();
    info!(
        "Configuration: host={}, port={}, settings={}",
        config.host,
        config.port,
        settings_path.display()
    );

    let store = JsonFileStore::open(&settings_path).map_err(anyhow::Error::msg)?;

    // Display sleep prevention degrades to a no-op without systemd-inhibit
    let power: Box<dyn PowerAssertionApi> = match check_tool_available("systemd-inhibit", "--version").await {
        Ok(()) => Box::new(SystemdInhibitor::new()),
        Err(e) => {
            warn!("{}, keep-awake will be unavailable", e);
            Box::new(UnsupportedPower)
        }
    };

    let (queue_tx, queue_rx) = mpsc::channel(QUEUE_CAPACITY);
    let (displays_tx, displays_rx) = watch::channel(Vec::new());

    let mut engine = ReminderEngine::new(
        Box::new(store),
        Collaborators::desktop(power, Box::new(WatchedDisplays::new(displays_rx))),
        Arc::new(SystemClock),
        Ticker::new(queue_tx.clone()),
    );
    engine.boot();

    let state = Arc::new(AppState::new(
        config.port,
        config.host.clone(),
        queue_tx.clone(),
        engine.event_sender(),
        engine.status_receiver(),
    ));

    // Start the engine and the OS monitors feeding it
    let engine_task = tokio::spawn(reminder_loop(engine, queue_rx));
    if config.no_display_probe {
        info!("Display probe disabled, overlay uses a single display");
    } else {
        tokio::spawn(display_probe_task(displays_tx));
    }
    if config.no_screen_monitor {
        info!("Screen monitor disabled, lock signals only arrive over HTTP");
    } else {
        tokio::spawn(screen_monitor_task(queue_tx.clone()));
    }

    // Create HTTP router with all endpoints
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /enable | /disable | /toggle   - Turn reminders on or off");
    info!("  POST /reset | /skip | /snooze       - Control the current cycle");
    info!("  POST /overlay/{{show,dismiss,snooze,input}} - Break overlay");
    info!("  POST /screen/{{lock,unlock}}          - External lock signals");
    info!("  GET|PATCH /settings                 - Reminder settings");
    info!("  GET|POST /profiles                  - Work profiles");
    info!("  GET  /events                        - Server-sent event stream");
    info!("  GET  /status                        - Current status");
    info!("  GET  /health                        - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    // Let the engine dismiss the overlay and release the power assertion
    if queue_tx.send(EngineRequest::notify(Command::Shutdown)).await.is_ok() {
        if let Err(e) = engine_task.await {
            warn!("Reminder engine task ended abnormally: {}", e);
        }
    }

    info!("Server shutdown complete");
    Ok(())
}
