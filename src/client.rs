//! HTTP client abstraction for talking to upstream backends
//!
//! Every backend call goes through [`HttpClient`], so the hyper client used in production and
//! the recording mock used in tests are interchangeable. [`exchange`] wraps a single call in a
//! deadline that covers connecting, waiting for headers and reading the body.
use crate::errors::TransportError;
use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{Method, Request, header};
use axum::response::IntoResponse;
use hyper_util::{client::legacy::Client, rt::TokioExecutor};
use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;
use url::Url;

/// Upper bound on a buffered backend response body.
pub(crate) const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

pub type HyperClient = Client<
    hyper_tls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>,
    axum::body::Body,
>;

#[async_trait]
pub trait HttpClient: std::fmt::Debug + Send + Sync {
    async fn request(
        &self,
        req: axum::extract::Request,
    ) -> Result<axum::response::Response, Box<dyn std::error::Error + Send + Sync>>;
}

#[async_trait]
impl HttpClient for HyperClient {
    async fn request(
        &self,
        req: axum::extract::Request,
    ) -> Result<axum::response::Response, Box<dyn std::error::Error + Send + Sync>> {
        self.request(req)
            .await
            .map(|res| res.into_response())
            .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)
    }
}

pub fn create_hyper_client(pool_max_idle_per_host: usize, pool_idle_timeout: Duration) -> HyperClient {
    let https = hyper_tls::HttpsConnector::new();

    tracing::debug!(
        "HTTP client pool config: idle_timeout={:?}, max_idle_per_host={}",
        pool_idle_timeout,
        pool_max_idle_per_host
    );

    Client::builder(TokioExecutor::new())
        .pool_idle_timeout(pool_idle_timeout)
        .pool_max_idle_per_host(pool_max_idle_per_host)
        .pool_timer(hyper_util::rt::TokioTimer::new())
        .build(https)
}

/// Append `path` to a backend base URL, keeping any path prefix the base carries.
pub(crate) fn endpoint(base: &Url, path: &str) -> Result<Url, TransportError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| TransportError::InvalidRequest {
            url: format!("{base}{path}"),
            reason: "base URL cannot carry a path".to_string(),
        })?
        .pop_if_empty()
        .extend(path.split('/'));
    Ok(url)
}

pub(crate) fn get_request(url: &Url) -> Result<axum::extract::Request, TransportError> {
    Request::builder()
        .method(Method::GET)
        .uri(url.as_str())
        .header(header::ACCEPT, "application/json")
        .body(Body::empty())
        .map_err(|e| TransportError::InvalidRequest {
            url: url.to_string(),
            reason: e.to_string(),
        })
}

pub(crate) fn json_request<B: Serialize>(
    url: &Url,
    body: &B,
) -> Result<axum::extract::Request, TransportError> {
    let invalid = |reason: String| TransportError::InvalidRequest {
        url: url.to_string(),
        reason,
    };
    let bytes = serde_json::to_vec(body).map_err(|e| invalid(e.to_string()))?;

    Request::builder()
        .method(Method::POST)
        .uri(url.as_str())
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ACCEPT, "application/json")
        .header(header::CONTENT_LENGTH, bytes.len())
        .body(Body::from(bytes))
        .map_err(|e| invalid(e.to_string()))
}

/// Send `req` and buffer a successful response body, all within `timeout`.
///
/// Non-success statuses are errors. Dropping the inner future on expiry cancels the call.
pub(crate) async fn exchange<T: HttpClient + ?Sized>(
    http: &T,
    req: axum::extract::Request,
    timeout: Duration,
) -> Result<Bytes, TransportError> {
    let url = req.uri().to_string();

    let call = async {
        let response = http
            .request(req)
            .await
            .map_err(|source| TransportError::Connect {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.clone(),
                status,
            });
        }

        axum::body::to_bytes(response.into_body(), MAX_BODY_BYTES)
            .await
            .map_err(|e| TransportError::Body {
                url: url.clone(),
                reason: e.to_string(),
            })
    };

    let result = tokio::time::timeout(timeout, call).await;
    match result {
        Ok(result) => result,
        Err(_) => Err(TransportError::Timeout { url, timeout }),
    }
}

pub(crate) fn decode<R: DeserializeOwned>(url: &Url, bytes: &[u8]) -> Result<R, TransportError> {
    serde_json::from_slice(bytes).map_err(|source| TransportError::Decode {
        url: url.to_string(),
        source,
    })
}
