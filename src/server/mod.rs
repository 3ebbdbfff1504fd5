//! HTTP surface. Every endpoint answers JSON; handler failures become a
//! `{success:false, error}` body with a 4xx status, never a 500.

use crate::dispatch::Dispatcher;
use crate::models::{Reminder, ReminderKind};
use crate::parser::timeparse;
use crate::registry::Registry;
use axum::extract::{DefaultBodyLimit, FromRequest, Multipart, Path, Request, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use base64::Engine;
use chrono::{Duration, Local};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

const MAX_AUDIO_BYTES: usize = 25 * 1024 * 1024;

struct ApiError(StatusCode, String);

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self(StatusCode::BAD_REQUEST, message.into())
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self(StatusCode::NOT_FOUND, message.into())
    }

    fn unavailable(message: impl Into<String>) -> Self {
        Self(StatusCode::SERVICE_UNAVAILABLE, message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "success": false, "error": self.1 }));
        (self.0, body).into_response()
    }
}

type ApiResult = Result<Json<Value>, ApiError>;

pub fn router(registry: Arc<Registry>) -> Router {
    Router::new()
        .route("/command", post(run_command))
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/reminders", get(list_reminders))
        .route("/reminders/triggered", get(triggered_reminders))
        .route("/reminders/add", post(add_reminder))
        .route("/reminders/{id}", delete(delete_reminder))
        .route("/reminders/clear", post(clear_reminders))
        .route("/tasks", get(list_tasks))
        .route("/tasks/run/{id}", post(run_task))
        .route("/tasks/run-by-name", post(run_task_by_name))
        .route("/schedules", get(list_schedules))
        .route("/schedules/add", post(add_schedule))
        .route("/schedules/{id}", delete(delete_schedule))
        .route("/schedules/enable/{id}", post(enable_schedule))
        .route("/schedules/disable/{id}", post(disable_schedule))
        .route("/schedules/run/{id}", post(run_schedule))
        .route("/schedules/clear", post(clear_schedules))
        .route("/system/info", get(system_info))
        .route("/voice/transcribe", post(transcribe))
        .layer(DefaultBodyLimit::max(MAX_AUDIO_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(registry)
}

pub async fn run(registry: Arc<Registry>) -> anyhow::Result<()> {
    let addr = format!(
        "{}:{}",
        registry.settings.server.host, registry.settings.server.port
    );
    let app = router(registry.clone());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("listening on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    registry.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("could not listen for ctrl-c: {}", e);
    }
    log::info!("shutdown requested");
}

#[derive(Deserialize)]
struct CommandRequest {
    command: String,
}

async fn run_command(
    State(registry): State<Arc<Registry>>,
    Json(req): Json<CommandRequest>,
) -> ApiResult {
    let text = req.command.trim();
    if text.is_empty() {
        return Err(ApiError::bad_request("command must not be empty"));
    }
    let result = registry.dispatcher.dispatch(text).await;
    serde_json::to_value(result)
        .map(Json)
        .map_err(|e| ApiError::bad_request(e.to_string()))
}

async fn health(State(registry): State<Arc<Registry>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": registry.settings.version,
    }))
}

async fn status(State(registry): State<Arc<Registry>>) -> ApiResult {
    let reminders = lock(&registry.reminders)?.active().len();
    let tasks = lock(&registry.tasks)?.all().len();
    let schedules = lock(&registry.scheduler)?.all().len();
    Ok(Json(json!({
        "status": "ok",
        "version": registry.settings.version,
        "desktop_enabled": registry.desktop.is_enabled(),
        "llm_enabled": registry.settings.llm.enabled,
        "voice_configured": registry.transcriber.is_configured(),
        "active_reminders": reminders,
        "tasks": tasks,
        "schedules": schedules,
    })))
}

fn lock<T>(mutex: &std::sync::Mutex<T>) -> Result<std::sync::MutexGuard<'_, T>, ApiError> {
    mutex
        .lock()
        .map_err(|_| ApiError::unavailable("internal state unavailable"))
}

fn to_json<T: serde::Serialize>(value: T) -> ApiResult {
    serde_json::to_value(value)
        .map(Json)
        .map_err(|e| ApiError::bad_request(e.to_string()))
}

async fn list_reminders(State(registry): State<Arc<Registry>>) -> ApiResult {
    let guard = lock(&registry.reminders)?;
    let items: Vec<Reminder> = guard.active().into_iter().cloned().collect();
    to_json(json!({ "reminders": items }))
}

async fn triggered_reminders(State(registry): State<Arc<Registry>>) -> ApiResult {
    let triggered = lock(&registry.reminders)?.take_triggered();
    to_json(json!({ "triggered": triggered }))
}

#[derive(Deserialize)]
struct AddReminderRequest {
    message: String,
    #[serde(default)]
    minutes: Option<i64>,
    #[serde(default)]
    at: Option<String>,
    #[serde(default)]
    recurring: bool,
}

async fn add_reminder(
    State(registry): State<Arc<Registry>>,
    Json(req): Json<AddReminderRequest>,
) -> ApiResult {
    if req.message.trim().is_empty() {
        return Err(ApiError::bad_request("message must not be empty"));
    }
    let now = Local::now();
    let mut guard = lock(&registry.reminders)?;
    let reminder = match (req.minutes, req.at.as_deref()) {
        (Some(minutes), _) if minutes > 0 => guard.add_relative(
            req.message.trim(),
            now,
            Duration::minutes(minutes),
            ReminderKind::Reminder,
        ),
        (_, Some(at)) => {
            let (hour, minute) = timeparse::parse_clock(at)
                .ok_or_else(|| ApiError::bad_request(format!("could not parse time '{}'", at)))?;
            guard
                .add_at_time(
                    req.message.trim(),
                    now,
                    hour,
                    minute,
                    ReminderKind::Reminder,
                    req.recurring,
                )
                .ok_or_else(|| ApiError::bad_request(format!("invalid time '{}'", at)))?
        }
        _ => return Err(ApiError::bad_request("provide 'minutes' or 'at'")),
    };
    to_json(json!({ "success": true, "reminder": reminder }))
}

async fn delete_reminder(
    State(registry): State<Arc<Registry>>,
    Path(id): Path<String>,
) -> ApiResult {
    if lock(&registry.reminders)?.delete(&id) {
        Ok(Json(json!({ "success": true })))
    } else {
        Err(ApiError::not_found(format!("no reminder with id '{}'", id)))
    }
}

async fn clear_reminders(State(registry): State<Arc<Registry>>) -> ApiResult {
    let count = lock(&registry.reminders)?.clear_all();
    Ok(Json(json!({ "success": true, "cleared": count })))
}

async fn list_tasks(State(registry): State<Arc<Registry>>) -> ApiResult {
    let guard = lock(&registry.tasks)?;
    to_json(json!({ "tasks": guard.all() }))
}

async fn run_task(State(registry): State<Arc<Registry>>, Path(id): Path<String>) -> ApiResult {
    match registry.dispatcher.run_task_by_id(&id).await {
        Ok((response, data)) => {
            to_json(json!({ "success": true, "response": response, "result": data }))
        }
        Err(message) => Err(ApiError::not_found(message)),
    }
}

#[derive(Deserialize)]
struct RunByNameRequest {
    name: String,
}

async fn run_task_by_name(
    State(registry): State<Arc<Registry>>,
    Json(req): Json<RunByNameRequest>,
) -> ApiResult {
    match registry.dispatcher.run_task_by_name(req.name.trim()).await {
        Ok((response, data)) => {
            to_json(json!({ "success": true, "response": response, "result": data }))
        }
        Err(message) => Err(ApiError::not_found(message)),
    }
}

async fn list_schedules(State(registry): State<Arc<Registry>>) -> ApiResult {
    let guard = lock(&registry.scheduler)?;
    to_json(json!({ "schedules": guard.all(), "recent_runs": guard.run_log() }))
}

#[derive(Deserialize)]
struct AddScheduleRequest {
    task: String,
    when: String,
}

async fn add_schedule(
    State(registry): State<Arc<Registry>>,
    Json(req): Json<AddScheduleRequest>,
) -> ApiResult {
    let task = {
        let guard = lock(&registry.tasks)?;
        guard
            .get(req.task.trim())
            .or_else(|| guard.get_by_name(req.task.trim()))
            .cloned()
    };
    let task = task.ok_or_else(|| ApiError::not_found(format!("no task '{}'", req.task)))?;
    let (cadence, _) = timeparse::parse_cadence(&req.when)
        .ok_or_else(|| ApiError::bad_request(format!("could not parse cadence '{}'", req.when)))?;
    let schedule = lock(&registry.scheduler)?.add_from_spec(&task.id, &task.name, &cadence);
    to_json(json!({ "success": true, "schedule": schedule }))
}

async fn delete_schedule(
    State(registry): State<Arc<Registry>>,
    Path(id): Path<String>,
) -> ApiResult {
    if lock(&registry.scheduler)?.delete(&id) {
        Ok(Json(json!({ "success": true })))
    } else {
        Err(ApiError::not_found(format!("no schedule with id '{}'", id)))
    }
}

async fn enable_schedule(
    State(registry): State<Arc<Registry>>,
    Path(id): Path<String>,
) -> ApiResult {
    set_schedule_enabled(&registry, &id, true)
}

async fn disable_schedule(
    State(registry): State<Arc<Registry>>,
    Path(id): Path<String>,
) -> ApiResult {
    set_schedule_enabled(&registry, &id, false)
}

fn set_schedule_enabled(registry: &Registry, id: &str, enabled: bool) -> ApiResult {
    if lock(&registry.scheduler)?.set_enabled(id, enabled) {
        Ok(Json(json!({ "success": true, "enabled": enabled })))
    } else {
        Err(ApiError::not_found(format!("no schedule with id '{}'", id)))
    }
}

async fn run_schedule(
    State(registry): State<Arc<Registry>>,
    Path(id): Path<String>,
) -> ApiResult {
    let task_id = lock(&registry.scheduler)?
        .get(&id)
        .map(|s| s.task_id.clone())
        .ok_or_else(|| ApiError::not_found(format!("no schedule with id '{}'", id)))?;

    let outcome = registry.dispatcher.run_task_by_id(&task_id).await;
    let (status, message) = match &outcome {
        Ok((response, _)) => ("completed", response.clone()),
        Err(message) => ("failed", message.clone()),
    };
    lock(&registry.scheduler)?.record_run(&id, Local::now(), status, &message);

    match outcome {
        Ok((response, data)) => {
            to_json(json!({ "success": true, "response": response, "result": data }))
        }
        Err(message) => Err(ApiError::bad_request(message)),
    }
}

async fn clear_schedules(State(registry): State<Arc<Registry>>) -> ApiResult {
    let count = lock(&registry.scheduler)?.clear_all();
    Ok(Json(json!({ "success": true, "cleared": count })))
}

async fn system_info(State(_registry): State<Arc<Registry>>) -> ApiResult {
    let (message, data) = crate::services::info::system_info();
    to_json(json!({ "message": message, "data": data }))
}

/// Accepts multipart (field `audio`), JSON `{audio_base64}`, or raw bytes.
async fn transcribe(State(registry): State<Arc<Registry>>, request: Request) -> ApiResult {
    if !registry.transcriber.is_configured() {
        return Err(ApiError::unavailable("no transcriber command configured"));
    }

    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let audio = if content_type.starts_with("multipart/") {
        let mut multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| ApiError::bad_request(e.to_string()))?;
        let mut audio = None;
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request(e.to_string()))?
        {
            if field.name() == Some("audio") {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(e.to_string()))?;
                audio = Some(bytes.to_vec());
                break;
            }
        }
        audio.ok_or_else(|| ApiError::bad_request("multipart field 'audio' missing"))?
    } else {
        let bytes = axum::body::to_bytes(request.into_body(), MAX_AUDIO_BYTES)
            .await
            .map_err(|e| ApiError::bad_request(e.to_string()))?;
        if content_type.contains("json") {
            #[derive(Deserialize)]
            struct AudioBody {
                audio_base64: String,
            }
            let body: AudioBody = serde_json::from_slice(&bytes)
                .map_err(|e| ApiError::bad_request(format!("invalid json body: {}", e)))?;
            base64::engine::general_purpose::STANDARD
                .decode(body.audio_base64.trim())
                .map_err(|e| ApiError::bad_request(format!("invalid base64 audio: {}", e)))?
        } else {
            bytes.to_vec()
        }
    };

    if audio.is_empty() {
        return Err(ApiError::bad_request("no audio data received"));
    }

    let transcriber = registry.transcriber.clone();
    let transcript = tokio::task::spawn_blocking(move || transcriber.transcribe(&audio))
        .await
        .map_err(|e| ApiError::bad_request(format!("transcription crashed: {}", e)))?
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    Ok(Json(json!({ "success": true, "text": transcript })))
}
