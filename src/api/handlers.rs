//! HTTP endpoint handlers
//!
//! Every mutating handler is a thin wrapper around one engine [`Command`].

use std::{convert::Infallible, sync::Arc, time::Duration};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Json, Response,
    },
};
use futures::stream::{self, Stream};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::responses::{
    ApiResponse, ErrorResponse, HealthResponse, NewProfileRequest, ProfilesResponse,
    SettingsResponse, StatusResponse,
};
use crate::{
    reminder::{Command, LockSource, OverlayInput},
    state::{AppState, DispatchError, SettingsPatch},
};

type Shared = State<Arc<AppState>>;

/// Run `command` on the engine and wrap the result
async fn run(state: &AppState, action: &str, command: Command, message: &str) -> Response {
    match state.dispatch(action, command).await {
        Ok(snapshot) => Json(ApiResponse::from_snapshot(message.to_string(), snapshot)).into_response(),
        Err(e) => error_response(action, e),
    }
}

fn error_response(action: &str, e: DispatchError) -> Response {
    let status = match &e {
        DispatchError::Rejected(_) => {
            warn!("{} rejected: {}", action, e);
            StatusCode::BAD_REQUEST
        }
        DispatchError::Unavailable(_) => {
            error!("{} failed: {}", action, e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(ErrorResponse::new(e.to_string()))).into_response()
}

/// Handle POST /enable
pub async fn enable_handler(State(state): Shared) -> Response {
    run(&state, "enable", Command::SetEnabled(true), "Reminders enabled").await
}

/// Handle POST /disable
pub async fn disable_handler(State(state): Shared) -> Response {
    run(&state, "disable", Command::SetEnabled(false), "Reminders disabled").await
}

/// Handle POST /toggle
pub async fn toggle_handler(State(state): Shared) -> Response {
    run(&state, "toggle", Command::Toggle, "Reminders toggled").await
}

/// Handle POST /reset - restart the cycle from now
pub async fn reset_handler(State(state): Shared) -> Response {
    run(&state, "reset", Command::Reset, "Reminder cycle restarted").await
}

/// Handle POST /skip
pub async fn skip_handler(State(state): Shared) -> Response {
    run(&state, "skip", Command::Skip, "Upcoming reminder skipped").await
}

/// Handle POST /snooze
pub async fn snooze_handler(State(state): Shared) -> Response {
    run(&state, "snooze", Command::Snooze, "Reminder snoozed").await
}

/// Handle POST /overlay/show - preview the break overlay
pub async fn overlay_show_handler(State(state): Shared) -> Response {
    run(&state, "overlay-show", Command::ShowOverlay, "Break overlay shown").await
}

/// Handle POST /overlay/dismiss
pub async fn overlay_dismiss_handler(State(state): Shared) -> Response {
    run(&state, "overlay-dismiss", Command::DismissOverlay, "Break overlay dismissed").await
}

/// Handle POST /overlay/snooze
pub async fn overlay_snooze_handler(State(state): Shared) -> Response {
    run(&state, "overlay-snooze", Command::SnoozeFromOverlay, "Break overlay snoozed").await
}

/// Handle POST /overlay/input - key or click captured by an overlay panel
pub async fn overlay_input_handler(State(state): Shared, Json(input): Json<OverlayInput>) -> Response {
    run(&state, "overlay-input", Command::OverlayInput(input), "Overlay input handled").await
}

/// Handle POST /screen/lock - lock reported by an external integration
pub async fn screen_lock_handler(State(state): Shared) -> Response {
    run(&state, "screen-lock", Command::LockStart(LockSource::External), "Screen lock recorded").await
}

/// Handle POST /screen/unlock
pub async fn screen_unlock_handler(State(state): Shared) -> Response {
    run(&state, "screen-unlock", Command::LockEnd(LockSource::External), "Screen unlock recorded").await
}

/// Handle GET /settings
pub async fn get_settings_handler(State(state): Shared) -> Json<SettingsResponse> {
    Json(SettingsResponse::new(state.status().settings))
}

/// Handle PATCH /settings
pub async fn patch_settings_handler(State(state): Shared, Json(patch): Json<SettingsPatch>) -> Response {
    match state.dispatch("settings", Command::UpdateSettings(patch)).await {
        Ok(snapshot) => Json(SettingsResponse::new(snapshot.settings)).into_response(),
        Err(e) => error_response("settings", e),
    }
}

/// Handle GET /profiles
pub async fn list_profiles_handler(State(state): Shared) -> Json<ProfilesResponse> {
    Json(state.status().into())
}

/// Handle POST /profiles
pub async fn add_profile_handler(State(state): Shared, Json(request): Json<NewProfileRequest>) -> Response {
    let command = Command::AddProfile {
        name: request.name,
        interval_seconds: request.interval_seconds,
        break_duration_seconds: request.break_duration_seconds,
        icon: request.icon,
    };
    match state.dispatch("add-profile", command).await {
        Ok(snapshot) => (StatusCode::CREATED, Json(ProfilesResponse::from(snapshot))).into_response(),
        Err(e) => error_response("add-profile", e),
    }
}

/// Handle DELETE /profiles/:id
pub async fn delete_profile_handler(State(state): Shared, Path(id): Path<Uuid>) -> Response {
    profiles_command(&state, "delete-profile", Command::DeleteProfile(id)).await
}

/// Handle POST /profiles/:id/select
pub async fn select_profile_handler(State(state): Shared, Path(id): Path<Uuid>) -> Response {
    profiles_command(&state, "select-profile", Command::SelectProfile(id)).await
}

/// Handle POST /profiles/clear - back to custom timing
pub async fn clear_profile_handler(State(state): Shared) -> Response {
    profiles_command(&state, "clear-profile", Command::ClearProfile).await
}

async fn profiles_command(state: &AppState, action: &str, command: Command) -> Response {
    match state.dispatch(action, command).await {
        Ok(snapshot) => Json(ProfilesResponse::from(snapshot)).into_response(),
        Err(e) => error_response(action, e),
    }
}

/// Handle GET /events - server-sent stream of engine events
pub async fn events_handler(State(state): Shared) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = state.subscribe();

    let events = stream::unfold(receiver, |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    let frame = match Event::default().event(event.kind()).json_data(&event) {
                        Ok(frame) => frame,
                        Err(e) => {
                            warn!("Failed to encode {} event: {}", event.kind(), e);
                            continue;
                        }
                    };
                    return Some((Ok(frame), receiver));
                }
                Err(RecvError::Lagged(missed)) => {
                    debug!("Event stream subscriber lagged, {} event(s) dropped", missed);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(events).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

/// Handle GET /status - Return current reminder status
pub async fn status_handler(State(state): Shared) -> Json<StatusResponse> {
    let (last_action, last_action_time) = state.get_last_action();

    Json(StatusResponse {
        state: state.status(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    })
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
