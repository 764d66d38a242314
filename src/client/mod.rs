//! Monitoring Backend Client
//!
//! HTTP client for the logistics-park carbon-emission monitoring API.
//! This module holds the transport plumbing: bearer-token decoration,
//! the error taxonomy, and per-request tracing. Resource endpoints live
//! in the sibling modules, one per REST resource.

mod auth;
mod devices;
mod emissions;
mod mock_iot;
mod predictions;
mod session;
mod users;

pub use devices::DeviceListParams;
pub use emissions::ExportFormat;
pub use mock_iot::TaskSubmission;
pub use predictions::PredictionAccuracy;
pub use session::{Session, SessionError, SessionStore};

use crate::config::ApiConfig;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Client for the monitoring backend REST API.
///
/// Cheap to share behind an [`Arc`]; every request is decorated with
/// the bearer token held by the session store, and an unauthorized
/// response tears that session down.
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    session: Arc<SessionStore>,
}

impl ApiClient {
    /// Create a new client from API configuration and a session store.
    pub fn new(config: &ApiConfig, session: Arc<SessionStore>) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(ApiError::Request)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    /// Session store backing this client.
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self.client.request(method, self.url(path));
        if let Some(token) = self.session.token() {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    /// Send a request and decode a JSON body from the response.
    async fn dispatch<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        builder: RequestBuilder,
    ) -> ApiResult<T> {
        let response = self.send(method, path, builder).await?;
        response.json().await.map_err(|e| {
            tracing::warn!(path, "Response body did not match the expected shape: {}", e);
            ApiError::UnexpectedPayload(e.to_string())
        })
    }

    /// Send a request, discarding any response body.
    async fn dispatch_empty(
        &self,
        method: Method,
        path: &str,
        builder: RequestBuilder,
    ) -> ApiResult<()> {
        self.send(method, path, builder).await?;
        Ok(())
    }

    /// Send a request and return the raw response bytes (blob downloads).
    async fn dispatch_bytes(
        &self,
        method: Method,
        path: &str,
        builder: RequestBuilder,
    ) -> ApiResult<Vec<u8>> {
        let response = self.send(method, path, builder).await?;
        let bytes = response.bytes().await.map_err(ApiError::Request)?;
        Ok(bytes.to_vec())
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        builder: RequestBuilder,
    ) -> ApiResult<reqwest::Response> {
        let request_id = uuid::Uuid::new_v4();
        tracing::debug!(%request_id, %method, path, "Sending request");

        let response = builder.send().await.map_err(|e| {
            tracing::warn!(%request_id, %method, path, "Request failed: {}", e);
            if e.is_timeout() {
                ApiError::Timeout
            } else if e.is_connect() {
                ApiError::Unreachable
            } else {
                ApiError::Request(e)
            }
        })?;

        let status = response.status();
        tracing::debug!(%request_id, %method, path, status = status.as_u16(), "Received response");

        if status.is_success() {
            return Ok(response);
        }

        Err(self.error_for_status(status, response).await)
    }

    /// Map a non-success HTTP status onto the error taxonomy.
    ///
    /// An unauthorized response is the one place the persisted session
    /// is torn down outside an explicit logout.
    async fn error_for_status(&self, status: StatusCode, response: reqwest::Response) -> ApiError {
        match status {
            StatusCode::UNAUTHORIZED => {
                tracing::warn!("Unauthorized response, clearing session");
                self.session.clear();
                ApiError::Unauthorized
            }
            StatusCode::FORBIDDEN => ApiError::Forbidden,
            StatusCode::NOT_FOUND => ApiError::NotFound,
            s if s.is_server_error() => ApiError::Server {
                status: s.as_u16(),
            },
            s => {
                let message = response
                    .json::<ServerMessage>()
                    .await
                    .ok()
                    .and_then(|m| m.message)
                    .unwrap_or_else(|| "request rejected".to_string());
                ApiError::Rejected {
                    status: s.as_u16(),
                    message,
                }
            }
        }
    }

    // ---- verb helpers used by the resource modules ----

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        let mut builder = self.request(Method::GET, path);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        self.dispatch(Method::GET, path, builder).await
    }

    pub(crate) async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let builder = self.request(Method::POST, path).json(body);
        self.dispatch(Method::POST, path, builder).await
    }

    pub(crate) async fn post_empty<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<()> {
        let builder = self.request(Method::POST, path).json(body);
        self.dispatch_empty(Method::POST, path, builder).await
    }

    pub(crate) async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let builder = self.request(Method::PUT, path).json(body);
        self.dispatch(Method::PUT, path, builder).await
    }

    pub(crate) async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let builder = self.request(Method::PATCH, path).json(body);
        self.dispatch(Method::PATCH, path, builder).await
    }

    pub(crate) async fn delete(&self, path: &str) -> ApiResult<()> {
        let builder = self.request(Method::DELETE, path);
        self.dispatch_empty(Method::DELETE, path, builder).await
    }

    pub(crate) async fn get_bytes(&self, path: &str, query: &[(&str, String)]) -> ApiResult<Vec<u8>> {
        let mut builder = self.request(Method::GET, path);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        self.dispatch_bytes(Method::GET, path, builder).await
    }
}

/// Error body shape used by the backend for rejected requests.
#[derive(Debug, Deserialize)]
struct ServerMessage {
    #[serde(default)]
    message: Option<String>,
}

/// Errors from the monitoring backend boundary
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection could not be established
    #[error("Backend unreachable")]
    Unreachable,

    /// The request timed out
    #[error("Request timeout")]
    Timeout,

    /// 401: the session has been torn down, log in again
    #[error("Unauthorized, session expired")]
    Unauthorized,

    /// 403
    #[error("Operation not permitted")]
    Forbidden,

    /// 404
    #[error("Resource not found")]
    NotFound,

    /// 5xx
    #[error("Server error ({status})")]
    Server { status: u16 },

    /// Remaining 4xx, with the server-provided message verbatim
    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The response decoded but did not match the expected shape
    #[error("Unrecognized response format: {0}")]
    UnexpectedPayload(String),

    /// Any other transport failure
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The session could not be persisted locally
    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

impl ApiError {
    /// Whether the payload itself was unusable, as opposed to the
    /// request failing. Stores clear their collections only for this
    /// case.
    pub fn is_unparseable(&self) -> bool {
        matches!(self, ApiError::UnexpectedPayload(_))
    }
}

/// Result type for backend operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;

    fn test_client() -> ApiClient {
        let dir = std::env::temp_dir().join("carbonpark-client-test");
        let session = Arc::new(SessionStore::open(dir.join("session.json")));
        ApiClient::new(&ApiConfig::default(), session).unwrap()
    }

    #[test]
    fn test_url_joining() {
        let client = test_client();
        assert_eq!(client.url("/devices"), "http://localhost:3000/devices");
        assert_eq!(client.url("devices/1"), "http://localhost:3000/devices/1");
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let dir = std::env::temp_dir().join("carbonpark-client-test");
        let session = Arc::new(SessionStore::open(dir.join("session.json")));
        let config = ApiConfig {
            base_url: "http://park.example:8080/".into(),
            ..Default::default()
        };
        let client = ApiClient::new(&config, session).unwrap();
        assert_eq!(client.url("/users"), "http://park.example:8080/users");
    }

    #[test]
    fn test_unparseable_classification() {
        assert!(ApiError::UnexpectedPayload("bad".into()).is_unparseable());
        assert!(!ApiError::NotFound.is_unparseable());
        assert!(!ApiError::Server { status: 502 }.is_unparseable());
    }
}
