//! Typed client for one Ollama-style inference server.
//!
//! Two operations matter to the relay: a cheap reachability probe against `GET /api/tags` and a
//! non-streaming `POST /api/generate`. Every call is bounded by the backend's configured timeout
//! and no call is retried here; retry policy belongs to whoever calls the client.
use crate::client::{self, HttpClient};
use crate::errors::TransportError;
use crate::models::{GenerationRequest, GenerationResponse, ModelInfo, TagsResponse};
use bon::Builder;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

const TAGS_PATH: &str = "api/tags";
const GENERATE_PATH: &str = "api/generate";

/// Where an inference server lives and how long to wait for it. Fixed at startup.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct BackendConfig {
    pub base_url: Url,
    #[builder(into)]
    pub default_model: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct BackendClient<T: HttpClient> {
    http: T,
    config: BackendConfig,
}

impl<T: HttpClient> BackendClient<T> {
    pub fn new(http: T, config: BackendConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Whether the listing endpoint answers with a success status in time.
    ///
    /// All failure modes collapse to `false`.
    #[instrument(skip(self), fields(base_url = %self.config.base_url))]
    pub async fn probe(&self) -> bool {
        match self.fetch_tags().await {
            Ok(_) => {
                debug!("Backend answered health probe");
                true
            }
            Err(e) => {
                warn!("Health probe failed: {}", e);
                false
            }
        }
    }

    /// Models the server currently has available.
    #[instrument(skip(self), fields(base_url = %self.config.base_url))]
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, TransportError> {
        let (url, bytes) = self.fetch_tags().await?;
        let tags: TagsResponse = client::decode(&url, &bytes)?;
        debug!("Backend lists {} models", tags.models.len());
        Ok(tags.models)
    }

    /// Whether any listed model name contains `name` (so `qwen2.5-coder` matches
    /// `qwen2.5-coder:latest`).
    pub async fn has_model(&self, name: &str) -> Result<bool, TransportError> {
        let models = self.list_models().await?;
        Ok(models.iter().any(|m| m.name.contains(name)))
    }

    /// Request a single, non-streamed completion.
    #[instrument(skip(self, prompt), fields(base_url = %self.config.base_url, prompt_len = prompt.len()))]
    pub async fn generate(
        &self,
        model: &str,
        prompt: &str,
    ) -> Result<GenerationResponse, TransportError> {
        let url = client::endpoint(&self.config.base_url, GENERATE_PATH)?;
        let req = client::json_request(&url, &GenerationRequest::new(model, prompt))?;

        let bytes = client::exchange(&self.http, req, self.config.timeout).await?;
        let response: GenerationResponse = client::decode(&url, &bytes)?;

        debug!(
            "Generation finished: model={}, done={}, {} bytes",
            response.model,
            response.done,
            response.response.len()
        );
        Ok(response)
    }

    async fn fetch_tags(&self) -> Result<(Url, axum::body::Bytes), TransportError> {
        let url = client::endpoint(&self.config.base_url, TAGS_PATH)?;
        let req = client::get_request(&url)?;
        let bytes = client::exchange(&self.http, req, self.config.timeout).await?;
        Ok((url, bytes))
    }
}
