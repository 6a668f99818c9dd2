use axum::extract::State;
use axum::http::StatusCode;
use axum::{Json, Router};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use textpilot_common::{ActionResponse, RequestEnvelope};

use crate::dispatch::Origin;
use crate::state::SharedState;
use crate::ws;

/// Build the application router with all routes.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ws", get(ws::ws_handler))
        .route("/api/ask", post(quick_ask))
        .route("/api/actions", post(writing_action))
        .route("/api/validate", post(validate_config))
        .route("/api/history", get(list_history))
        .route("/api/history/reset", post(reset_history))
        .route("/api/stats", get(usage_stats))
        .route("/api/settings", get(get_settings).post(set_setting))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

#[derive(Deserialize)]
struct QuickAskRequest {
    query: String,
    preset: Option<String>,
    surface: Option<String>,
    site: Option<String>,
}

/// POST /api/ask — popup free-form question.
async fn quick_ask(
    State(state): State<SharedState>,
    Json(body): Json<QuickAskRequest>,
) -> Json<ActionResponse> {
    let origin = Origin {
        surface: body.surface,
        site: body.site,
    };
    let envelope = RequestEnvelope::QuickAsk {
        query: body.query,
        preset: body.preset,
    };
    Json(state.router.submit(envelope, origin).await)
}

#[derive(Deserialize)]
struct WritingActionRequest {
    action: String,
    preset: Option<String>,
    text: String,
    surface: Option<String>,
    site: Option<String>,
}

/// POST /api/actions — templated transformation of page text.
async fn writing_action(
    State(state): State<SharedState>,
    Json(body): Json<WritingActionRequest>,
) -> Json<ActionResponse> {
    let origin = Origin {
        surface: body.surface,
        site: body.site,
    };
    let envelope = RequestEnvelope::WritingAction {
        action: body.action,
        preset: body.preset,
        text: body.text,
    };
    Json(state.router.submit(envelope, origin).await)
}

#[derive(Deserialize)]
struct ValidateConfigRequest {
    provider: String,
    model: String,
    key: String,
}

/// POST /api/validate — settings-surface credential check.
async fn validate_config(
    State(state): State<SharedState>,
    Json(body): Json<ValidateConfigRequest>,
) -> Json<ActionResponse> {
    let envelope = RequestEnvelope::ValidateConfig {
        provider: body.provider,
        model: body.model,
        key: body.key,
    };
    Json(state.router.submit(envelope, Origin::default()).await)
}

/// GET /api/history — full usage log, newest-last.
async fn list_history(State(state): State<SharedState>) -> impl IntoResponse {
    match state.history.list() {
        Ok(history) => Json(serde_json::json!({ "history": history })).into_response(),
        Err(e) => store_error(e).into_response(),
    }
}

/// POST /api/history/reset — clear the log and the aggregate counters.
async fn reset_history(State(state): State<SharedState>) -> impl IntoResponse {
    match state.history.reset() {
        Ok(()) => Json(serde_json::json!({ "status": "ok" })).into_response(),
        Err(e) => store_error(e).into_response(),
    }
}

/// GET /api/stats — aggregate usage counters.
async fn usage_stats(State(state): State<SharedState>) -> impl IntoResponse {
    match state.history.stats() {
        Ok(stats) => Json(serde_json::json!(stats)).into_response(),
        Err(e) => store_error(e).into_response(),
    }
}

/// GET /api/settings — all persisted settings.
async fn get_settings(State(state): State<SharedState>) -> impl IntoResponse {
    match state.settings.all() {
        Ok(settings) => Json(serde_json::Value::Object(settings)).into_response(),
        Err(e) => store_error(e).into_response(),
    }
}

#[derive(Deserialize)]
struct SetSettingRequest {
    key: String,
    value: serde_json::Value,
}

/// POST /api/settings — write one setting.
async fn set_setting(
    State(state): State<SharedState>,
    Json(body): Json<SetSettingRequest>,
) -> impl IntoResponse {
    match state.settings.set(&body.key, body.value) {
        Ok(()) => Json(serde_json::json!({ "status": "ok" })).into_response(),
        Err(e) => store_error(e).into_response(),
    }
}

fn store_error(e: textpilot_common::Error) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "status": "error", "message": e.to_string() })),
    )
}
