//! Client for the optional retrieval-augmented query service.
use crate::client::{self, HttpClient};
use crate::errors::TransportError;
use crate::models::{QueryRequest, QueryResponse};
use bon::Builder;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

const QUERY_PATH: &str = "query";

#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct AlternateConfig {
    pub base_url: Url,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AlternateClient<T: HttpClient> {
    http: T,
    config: AlternateConfig,
}

impl<T: HttpClient> AlternateClient<T> {
    pub fn new(http: T, config: AlternateConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &AlternateConfig {
        &self.config
    }

    /// Ask the retrieval service to answer `query`.
    #[instrument(skip(self, query), fields(base_url = %self.config.base_url))]
    pub async fn query(&self, query: &str) -> Result<String, TransportError> {
        let url = client::endpoint(&self.config.base_url, QUERY_PATH)?;
        let req = client::json_request(
            &url,
            &QueryRequest {
                query: query.to_string(),
            },
        )?;

        let bytes = client::exchange(&self.http, req, self.config.timeout).await?;
        let response: QueryResponse = client::decode(&url, &bytes)?;
        debug!("Retrieval service answered with {} bytes", response.response.len());
        Ok(response.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockHttpClient, alternate_config};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_query_posts_json_body() {
        let mock = MockHttpClient::new(StatusCode::OK, r#"{"response": "grounded answer"}"#);
        let client = AlternateClient::new(mock.clone(), alternate_config(Duration::from_secs(1)));

        assert_eq!(client.query("what is rust").await.unwrap(), "grounded answer");

        let requests = mock.get_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].uri, "http://rag:8000/query");
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body, serde_json::json!({"query": "what is rust"}));
    }

    #[tokio::test]
    async fn test_query_keeps_base_path_prefix() {
        let mock = MockHttpClient::new(StatusCode::OK, r#"{"response": "ok"}"#);
        let config = AlternateConfig::builder()
            .base_url("http://gateway:8080/rag".parse().unwrap())
            .timeout(Duration::from_secs(1))
            .build();
        let client = AlternateClient::new(mock.clone(), config);

        assert_eq!(client.query("hi").await.unwrap(), "ok");

        let requests = mock.get_requests();
        assert_eq!(requests[0].uri, "http://gateway:8080/rag/query");
        assert_eq!(requests[0].header("content-type"), Some("application/json"));
        assert_eq!(requests[0].header("accept"), Some("application/json"));
    }

    #[tokio::test]
    async fn test_query_surfaces_server_errors() {
        let mock = MockHttpClient::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"detail": "RAG system not initialized"}"#,
        );
        let client = AlternateClient::new(mock, alternate_config(Duration::from_secs(1)));

        let err = client.query("anything").await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    }
}
