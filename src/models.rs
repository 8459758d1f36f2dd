//! Wire types for the upstream backends.
//!
//! The inference server speaks the Ollama `/api/tags` and `/api/generate` dialect; the
//! alternate retrieval service exposes a single `/query` endpoint.

use serde::{Deserialize, Serialize};

/// Body of `POST /api/generate`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    /// Streaming is never requested; the relay needs the whole answer in one body.
    pub stream: bool,
}

impl GenerationRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            stream: false,
        }
    }
}

/// Non-streaming reply from `POST /api/generate`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GenerationResponse {
    pub model: String,
    /// The generated text.
    pub response: String,
    pub done: bool,
}

/// One entry of the `/api/tags` listing. Only the name is relied on.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ModelInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// Reply from `GET /api/tags`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct TagsResponse {
    #[serde(default)]
    pub models: Vec<ModelInfo>,
}

/// Body of `POST /query` on the alternate service.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub query: String,
}

/// Reply from `POST /query`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct QueryResponse {
    pub response: String,
}
