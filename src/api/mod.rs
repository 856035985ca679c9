//! HTTP API module
//!
//! This module contains all HTTP endpoint handlers and response structures.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/enable", post(enable_handler))
        .route("/disable", post(disable_handler))
        .route("/toggle", post(toggle_handler))
        .route("/reset", post(reset_handler))
        .route("/skip", post(skip_handler))
        .route("/snooze", post(snooze_handler))
        // Overlay
        .route("/overlay/show", post(overlay_show_handler))
        .route("/overlay/dismiss", post(overlay_dismiss_handler))
        .route("/overlay/snooze", post(overlay_snooze_handler))
        .route("/overlay/input", post(overlay_input_handler))
        // Lock signals from other integrations
        .route("/screen/lock", post(screen_lock_handler))
        .route("/screen/unlock", post(screen_unlock_handler))
        .route("/settings", get(get_settings_handler).patch(patch_settings_handler))
        .route("/profiles", get(list_profiles_handler).post(add_profile_handler))
        .route("/profiles/clear", post(clear_profile_handler))
        .route("/profiles/:id", delete(delete_profile_handler))
        .route("/profiles/:id/select", post(select_profile_handler))
        .route("/events", get(events_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
