/// Axum handlers for the relay server
///
/// Handlers translate between JSON bodies and the relay's [`RelayOutcome`]; the relay itself
/// never sees HTTP.
use crate::AppState;
use crate::client::HttpClient;
use crate::outcome::{FailureKind, RelayOutcome};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, instrument};

pub const SERVICE_NAME: &str = "ollama-relay";

/// Body accepted by `/sendMessage` and `/chat`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PromptBody {
    pub prompt: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct MessageBody {
    pub message: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (status, Json(json!({ "error": error.into() }))).into_response()
}

/// Map a relay outcome onto a status code and JSON body.
///
/// An unreachable backend is a 503; any attempted-and-failed call is a 502.
pub fn outcome_response(outcome: RelayOutcome) -> Response {
    match outcome {
        RelayOutcome::Success(message) => (StatusCode::OK, Json(MessageBody { message })).into_response(),
        RelayOutcome::Failure(kind) => {
            let status = match kind {
                FailureKind::BackendUnreachable => StatusCode::SERVICE_UNAVAILABLE,
                FailureKind::GenerationFailed | FailureKind::AllBackendsFailed => {
                    StatusCode::BAD_GATEWAY
                }
            };
            (status, Json(json!({ "error": kind.message(), "kind": kind }))).into_response()
        }
    }
}

/// Pull a non-blank prompt out of the request, or produce the 400 to send back.
fn extract_prompt(body: Result<Json<PromptBody>, JsonRejection>) -> Result<String, Response> {
    let Json(body) = body.map_err(|rejection| {
        debug!("Rejected prompt body: {}", rejection);
        error_response(StatusCode::BAD_REQUEST, rejection.body_text())
    })?;

    if body.prompt.trim().is_empty() {
        return Err(error_response(StatusCode::BAD_REQUEST, "Prompt must not be empty"));
    }
    Ok(body.prompt)
}

#[instrument]
pub async fn root() -> impl IntoResponse {
    Json(json!({
        "message": "Welcome to the ollama-relay API!",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "/health",
            "status": "/status",
            "ping": "/ping",
            "sendMessage": "/sendMessage",
            "chat": "/chat",
            "root": "/"
        }
    }))
}

/// Re-probe the backend. Always 200: this reports that the relay itself is up.
#[instrument(skip(state))]
pub async fn health<T: HttpClient + 'static>(State(state): State<AppState<T>>) -> impl IntoResponse {
    let reachable = state.relay.health_check().await;
    info!("Health check: backend reachable = {}", reachable);

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();

    Json(json!({
        "status": "healthy",
        "timestamp": timestamp,
        "service": SERVICE_NAME,
        "backend_reachable": reachable,
    }))
}

/// Cached reachability, without probing.
#[instrument(skip(state))]
pub async fn status<T: HttpClient + 'static>(State(state): State<AppState<T>>) -> impl IntoResponse {
    Json(json!({
        "backend_reachable": state.relay.is_reachable(),
        "alternate_configured": state.fallback.is_some(),
    }))
}

#[instrument(skip(state))]
pub async fn ping<T: HttpClient + 'static>(State(state): State<AppState<T>>) -> Response {
    outcome_response(state.relay.ping().await)
}

/// Relay a prompt straight to the inference backend.
#[instrument(skip(state, body))]
pub async fn send_message<T: HttpClient + 'static>(
    State(state): State<AppState<T>>,
    body: Result<Json<PromptBody>, JsonRejection>,
) -> Response {
    let prompt = match extract_prompt(body) {
        Ok(prompt) => prompt,
        Err(response) => return response,
    };
    outcome_response(state.relay.send_message(&prompt).await)
}

/// Relay a prompt, preferring the retrieval service when one is configured.
#[instrument(skip(state, body))]
pub async fn chat<T: HttpClient + 'static>(
    State(state): State<AppState<T>>,
    body: Result<Json<PromptBody>, JsonRejection>,
) -> Response {
    let prompt = match extract_prompt(body) {
        Ok(prompt) => prompt,
        Err(response) => return response,
    };
    let outcome = match &state.fallback {
        Some(router) => router.route(&prompt).await,
        None => state.relay.send_message(&prompt).await,
    };
    outcome_response(outcome)
}

pub async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "Route not found")
}
