//! ollama-relay - a health-gated relay in front of a local Ollama server
//!
//! This library decides, for every prompt a chat client sends, which backend to try and in what
//! order, tracks whether the inference server is reachable, and folds every backend failure into
//! a single [`RelayOutcome`].
//!
//! Components are built once at startup and passed explicitly:
//! [`backend::BackendClient`] → [`relay::Relay`] → optional [`fallback::FallbackRouter`] →
//! [`AppState`] → [`build_router`].

use axum::Router;
use axum::routing::{get, post};
use axum_prometheus::{
    GenericMetricLayer, Handle, PrometheusMetricLayerBuilder,
    metrics_exporter_prometheus::PrometheusHandle,
};
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{info, instrument};

pub mod alternate;
pub mod backend;
pub mod client;
pub mod config;
pub mod errors;
pub mod fallback;
pub mod handlers;
pub mod health;
pub mod models;
pub mod outcome;
pub mod relay;

use alternate::AlternateClient;
use backend::BackendClient;
use client::{HttpClient, HyperClient};
use config::Config;
use fallback::FallbackRouter;
use relay::Relay;

pub use outcome::{FailureKind, RelayOutcome};

/// Shared state for the HTTP layer: one relay, and a fallback router when a retrieval service
/// is configured. Both point at the same relay, so they share its health state.
#[derive(Debug)]
pub struct AppState<T: HttpClient> {
    pub relay: Arc<Relay<T>>,
    pub fallback: Option<Arc<FallbackRouter<T>>>,
}

impl<T: HttpClient> Clone for AppState<T> {
    fn clone(&self) -> Self {
        Self {
            relay: Arc::clone(&self.relay),
            fallback: self.fallback.clone(),
        }
    }
}

impl<T: HttpClient> AppState<T> {
    /// State that relays straight to the inference backend.
    pub fn new(relay: Relay<T>) -> Self {
        Self {
            relay: Arc::new(relay),
            fallback: None,
        }
    }

    /// Route `/chat` through `alternate` first, falling back to this state's relay.
    pub fn with_alternate(mut self, alternate: AlternateClient<T>) -> Self {
        let router = FallbackRouter::new(alternate, Arc::clone(&self.relay));
        self.fallback = Some(Arc::new(router));
        self
    }
}

impl AppState<HyperClient> {
    /// Build the production state from configuration, running the startup health probe.
    pub async fn from_config(config: &Config) -> Self {
        let http_client =
            client::create_hyper_client(config.pool_max_idle_per_host, config.pool_idle_timeout());

        let backend = BackendClient::new(http_client.clone(), config.backend.backend_config());
        let state = Self::new(Relay::connect(backend).await);

        match config.alternate_config() {
            Some(alternate) => {
                info!("Retrieval service configured at {}", alternate.base_url);
                state.with_alternate(AlternateClient::new(http_client, alternate))
            }
            None => state,
        }
    }
}

/// Build the main router for the relay
/// This creates routes for:
/// - `/` - Service banner
/// - `/health` - Re-probes the backend
/// - `/status` - Cached reachability
/// - `/ping` - Fixed prompt through the relay
/// - `/sendMessage` - Prompt straight to the inference backend
/// - `/chat` - Prompt through the fallback router
#[instrument(skip(state))]
pub fn build_router<T: HttpClient + 'static>(state: AppState<T>) -> Router {
    info!("Building router");
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/status", get(handlers::status))
        .route("/ping", get(handlers::ping))
        .route("/sendMessage", post(handlers::send_message))
        .route("/chat", post(handlers::chat))
        .fallback(handlers::not_found)
        .with_state(state)
}

/// Builds a router for the metrics endpoint.
#[instrument(skip(handle))]
pub fn build_metrics_router(handle: PrometheusHandle) -> Router {
    info!("Building metrics router");
    Router::new().route(
        "/metrics",
        axum::routing::get(move || async move { handle.render() }),
    )
}

type MetricsLayerAndHandle = (
    GenericMetricLayer<'static, PrometheusHandle, Handle>,
    PrometheusHandle,
);

/// Builds a layer and handle for prometheus metrics collection.
pub fn build_metrics_layer_and_handle(
    prefix: impl Into<Cow<'static, str>>,
) -> MetricsLayerAndHandle {
    info!("Building metrics layer");
    PrometheusMetricLayerBuilder::new()
        .with_prefix(prefix)
        .with_endpoint_label_type(axum_prometheus::EndpointLabel::Exact)
        .with_default_metrics()
        .build_pair()
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockHttpClient, alternate_config, backend_config};
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::json;
    use std::time::Duration;

    const PONG: &str = r#"{"model": "qwen2.5-coder", "response": "pong", "done": true}"#;

    async fn connected_state(mock: &MockHttpClient) -> AppState<MockHttpClient> {
        let backend = BackendClient::new(mock.clone(), backend_config(Duration::from_secs(1)));
        AppState::new(Relay::connect(backend).await)
    }

    #[tokio::test]
    async fn test_send_message_returns_backend_text() {
        let mock = MockHttpClient::new(StatusCode::OK, PONG);
        let server = TestServer::new(build_router(connected_state(&mock).await)).unwrap();

        let response = server
            .post("/sendMessage")
            .json(&json!({"prompt": "ping"}))
            .await;

        assert_eq!(response.status_code(), 200);
        assert_eq!(response.json::<serde_json::Value>(), json!({"message": "pong"}));
    }

    #[tokio::test]
    async fn test_unreachable_backend_maps_to_503() {
        let mock = MockHttpClient::refusing();
        let server = TestServer::new(build_router(connected_state(&mock).await)).unwrap();

        let response = server
            .post("/sendMessage")
            .json(&json!({"prompt": "ping"}))
            .await;

        assert_eq!(response.status_code(), 503);
        let body: serde_json::Value = response.json();
        assert_eq!(body["kind"], "backend_unreachable");
        // only the startup probe went out
        assert_eq!(mock.request_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_generation_maps_to_502() {
        let mock = MockHttpClient::new(StatusCode::OK, "{}")
            .with_route("/api/generate", StatusCode::INTERNAL_SERVER_ERROR, "");
        let server = TestServer::new(build_router(connected_state(&mock).await)).unwrap();

        let response = server
            .post("/sendMessage")
            .json(&json!({"prompt": "ping"}))
            .await;

        assert_eq!(response.status_code(), 502);
        assert_eq!(response.json::<serde_json::Value>()["kind"], "generation_failed");
    }

    #[tokio::test]
    async fn test_blank_and_malformed_prompts_are_rejected() {
        let mock = MockHttpClient::new(StatusCode::OK, PONG);
        let server = TestServer::new(build_router(connected_state(&mock).await)).unwrap();

        let blank = server
            .post("/sendMessage")
            .json(&json!({"prompt": "   "}))
            .await;
        assert_eq!(blank.status_code(), 400);

        let missing = server.post("/chat").json(&json!({"text": "hi"})).await;
        assert_eq!(missing.status_code(), 400);

        let not_json = server.post("/sendMessage").text("ping").await;
        assert_eq!(not_json.status_code(), 400);

        // nothing beyond the startup probe
        assert_eq!(mock.requests_to("/api/generate"), 0);
    }

    #[tokio::test]
    async fn test_health_reprobes_and_status_does_not() {
        let mock = MockHttpClient::refusing();
        let state = connected_state(&mock).await;
        let server = TestServer::new(build_router(state.clone())).unwrap();

        let status = server.get("/status").await;
        assert_eq!(status.json::<serde_json::Value>()["backend_reachable"], false);
        assert_eq!(mock.request_count(), 1);

        // backend comes up; only /health notices
        mock.set_route("/api/tags", StatusCode::OK, "{}");
        let status = server.get("/status").await;
        assert_eq!(status.json::<serde_json::Value>()["backend_reachable"], false);

        let health = server.get("/health").await;
        assert_eq!(health.status_code(), 200);
        let body: serde_json::Value = health.json();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["backend_reachable"], true);
        assert!(state.relay.is_reachable());
        assert_eq!(mock.request_count(), 2);
    }

    #[tokio::test]
    async fn test_health_is_ok_even_when_backend_is_down() {
        let mock = MockHttpClient::new(StatusCode::SERVICE_UNAVAILABLE, "");
        let server = TestServer::new(build_router(connected_state(&mock).await)).unwrap();

        let health = server.get("/health").await;
        assert_eq!(health.status_code(), 200);
        assert_eq!(health.json::<serde_json::Value>()["backend_reachable"], false);
    }

    #[tokio::test]
    async fn test_chat_prefers_alternate_then_falls_back() {
        let direct = MockHttpClient::new(StatusCode::OK, PONG);
        let alternate = MockHttpClient::new(StatusCode::INTERNAL_SERVER_ERROR, "");
        let state = connected_state(&direct)
            .await
            .with_alternate(AlternateClient::new(
                alternate.clone(),
                alternate_config(Duration::from_secs(1)),
            ));
        let server = TestServer::new(build_router(state)).unwrap();

        let response = server.post("/chat").json(&json!({"prompt": "ping"})).await;

        assert_eq!(response.status_code(), 200);
        assert_eq!(response.json::<serde_json::Value>()["message"], "pong");
        assert_eq!(alternate.requests_to("/query"), 1);
        assert_eq!(direct.requests_to("/api/generate"), 1);
    }

    #[tokio::test]
    async fn test_chat_without_alternate_uses_relay() {
        let mock = MockHttpClient::new(StatusCode::OK, PONG);
        let server = TestServer::new(build_router(connected_state(&mock).await)).unwrap();

        let response = server.post("/chat").json(&json!({"prompt": "ping"})).await;
        assert_eq!(response.status_code(), 200);
        assert_eq!(mock.requests_to("/query"), 0);
    }

    #[tokio::test]
    async fn test_chat_reports_all_backends_failed() {
        let direct = MockHttpClient::refusing();
        let state = connected_state(&direct).await.with_alternate(AlternateClient::new(
            MockHttpClient::refusing(),
            alternate_config(Duration::from_secs(1)),
        ));
        let server = TestServer::new(build_router(state)).unwrap();

        let response = server.post("/chat").json(&json!({"prompt": "ping"})).await;
        assert_eq!(response.status_code(), 502);
        assert_eq!(response.json::<serde_json::Value>()["kind"], "all_backends_failed");
    }

    #[tokio::test]
    async fn test_ping_and_root() {
        let mock = MockHttpClient::new(StatusCode::OK, PONG);
        let server = TestServer::new(build_router(connected_state(&mock).await)).unwrap();

        let ping = server.get("/ping").await;
        assert_eq!(ping.json::<serde_json::Value>(), json!({"message": "pong"}));

        let root = server.get("/").await;
        assert_eq!(root.status_code(), 200);
        assert_eq!(
            root.json::<serde_json::Value>()["endpoints"]["health"],
            "/health"
        );
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let mock = MockHttpClient::new(StatusCode::OK, PONG);
        let server = TestServer::new(build_router(connected_state(&mock).await)).unwrap();

        let response = server.get("/nope").await;
        assert_eq!(response.status_code(), 404);
        assert_eq!(
            response.json::<serde_json::Value>(),
            json!({"error": "Route not found"})
        );
    }
}
