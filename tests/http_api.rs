mod common;

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use break_reminder::{
    create_router,
    reminder::{Command, EngineRequest, ReminderEngine},
    services::{Collaborators, DisplayInfo, StaticDisplays},
    state::{AppState, MemorySettingsStore},
    tasks::{reminder_loop, Ticker, QUEUE_CAPACITY},
    utils::ManualClock,
};
use common::{Recorder, RecordingNotifier, RecordingPower, RecordingScreenSaver, RecordingSound};
use serde_json::{json, Value};
use tokio::{sync::mpsc, task::JoinHandle};
use tower::ServiceExt;

struct Server {
    app: Router,
    queue: mpsc::Sender<EngineRequest>,
    engine: JoinHandle<()>,
}

impl Server {
    fn start() -> Self {
        let calls = Recorder::default();
        let (queue, queue_rx) = mpsc::channel(QUEUE_CAPACITY);
        let mut engine = ReminderEngine::new(
            Box::new(MemorySettingsStore::new()),
            Collaborators {
                notifier: Box::new(RecordingNotifier(calls.clone())),
                sound: Box::new(RecordingSound(calls.clone())),
                screensaver: Box::new(RecordingScreenSaver(calls.clone())),
                power: Box::new(RecordingPower {
                    recorder: calls.clone(),
                    fail: false,
                    next_id: 0,
                }),
                displays: Box::new(StaticDisplays(vec![DisplayInfo::fallback()])),
            },
            Arc::new(ManualClock::at_epoch()),
            Ticker::detached(),
        );
        engine.boot();
        let state = Arc::new(AppState::new(
            20554,
            "127.0.0.1".to_string(),
            queue.clone(),
            engine.event_sender(),
            engine.status_receiver(),
        ));
        let engine = tokio::spawn(reminder_loop(engine, queue_rx));

        Self {
            app: create_router(state),
            queue,
            engine,
        }
    }

    async fn call(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn stop(self) {
        self.queue
            .send(EngineRequest::notify(Command::Shutdown))
            .await
            .unwrap();
        self.engine.await.unwrap();
    }
}

#[tokio::test]
async fn health_reports_the_crate_version() {
    let server = Server::start();
    let (status, body) = server.call(Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    server.stop().await;
}

#[tokio::test]
async fn reads_before_any_command_see_the_booted_engine() {
    let server = Server::start();

    let (status, body) = server.call(Method::GET, "/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"]["enabled"], true);
    assert_eq!(body["state"]["scheduler"]["running"], true);
    assert_eq!(body["state"]["remaining_seconds"], 1500);

    let (_, body) = server.call(Method::GET, "/settings", None).await;
    assert_eq!(body["settings"]["interval_seconds"], 1500);

    let (_, body) = server.call(Method::GET, "/profiles", None).await;
    assert_eq!(body["profiles"].as_array().unwrap().len(), 4);

    server.stop().await;
}

#[tokio::test]
async fn disable_then_status() {
    let server = Server::start();

    let (status, body) = server.call(Method::POST, "/disable", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "paused");
    assert_eq!(body["state"]["enabled"], false);
    assert_eq!(body["state"]["icon_state"], "paused");

    let (status, body) = server.call(Method::GET, "/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"]["enabled"], false);
    assert_eq!(body["state"]["scheduler"]["next_fire_at"], Value::Null);
    assert_eq!(body["last_action"], "disable");

    // nothing to snooze while disabled
    let (status, body) = server.call(Method::POST, "/snooze", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");

    server.stop().await;
}

#[tokio::test]
async fn settings_patch_is_clamped_and_returned() {
    let server = Server::start();

    let (status, body) = server
        .call(
            Method::PATCH,
            "/settings",
            Some(json!({ "interval_seconds": 60, "overlay_color": "teal" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["settings"]["interval_seconds"], 300);
    assert_eq!(body["settings"]["overlay_color"], "teal");
    assert_eq!(body["schedule_presets"].as_array().unwrap().len(), 4);
    assert_eq!(body["interval_presets_minutes"].as_array().unwrap().len(), 8);
    assert_eq!(body["overlay_presets_seconds"][1], 10);

    let (_, body) = server.call(Method::GET, "/status", None).await;
    assert_eq!(body["state"]["remaining_seconds"], 300);

    server.stop().await;
}

#[tokio::test]
async fn schedule_presets_apply_by_name() {
    let server = Server::start();

    let (status, body) = server
        .call(
            Method::PATCH,
            "/settings",
            Some(json!({ "schedule_preset": "Office Hours" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let schedule = &body["settings"]["work_schedule"];
    assert_eq!(schedule["start_minute_of_day"], 9 * 60);
    assert_eq!(schedule["end_minute_of_day"], 17 * 60);

    let (status, body) = server
        .call(
            Method::PATCH,
            "/settings",
            Some(json!({ "schedule_preset": "Siesta" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");

    server.stop().await;
}

#[tokio::test]
async fn overlay_routes_show_and_dismiss() {
    let server = Server::start();

    let (_, body) = server.call(Method::POST, "/overlay/show", None).await;
    assert_eq!(body["state"]["overlay"]["visible"], true);
    assert_eq!(body["state"]["overlay"]["remaining"], 10);

    let (status, body) = server
        .call(
            Method::POST,
            "/overlay/input",
            Some(json!({ "type": "key", "escape": true })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"]["overlay"]["visible"], false);

    server.stop().await;
}

#[tokio::test]
async fn profile_routes() {
    let server = Server::start();

    let (status, body) = server.call(Method::GET, "/profiles", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profiles"].as_array().unwrap().len(), 4);

    let (status, body) = server
        .call(
            Method::POST,
            "/profiles",
            Some(json!({ "name": "Reading", "interval_seconds": 2400, "break_duration_seconds": 420 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let profiles = body["profiles"].as_array().unwrap();
    let id = profiles[4]["id"].as_str().unwrap().to_string();

    let (status, body) = server
        .call(Method::POST, &format!("/profiles/{}/select", id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active_profile"], id.as_str());

    let builtin = "00000000-0000-0000-0000-000000000001";
    let (status, _) = server
        .call(Method::DELETE, &format!("/profiles/{}", builtin), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = server.call(Method::POST, "/profiles/clear", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active_profile"], Value::Null);

    server.stop().await;
}

#[tokio::test]
async fn external_lock_signals_are_accepted() {
    let server = Server::start();
    let (status, body) = server.call(Method::POST, "/screen/lock", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"]["lock_session"]["source"], "external");

    let (_, body) = server.call(Method::POST, "/screen/unlock", None).await;
    assert_eq!(body["state"]["lock_session"], Value::Null);
    server.stop().await;
}
