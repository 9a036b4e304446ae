//! HTTP client adapter: bearer credentials and centralized 401 handling.

use std::fmt;
use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};
use crate::session::SessionStore;

/// Thin wrapper over `reqwest::Client` bound to one backend and one session
/// store. Cloning is cheap; clones share the connection pool and the store.
#[derive(Clone)]
pub struct HttpClient {
    base_url: String,
    http: reqwest::Client,
    store: Arc<dyn SessionStore>,
}

impl HttpClient {
    /// Creates a client for `base_url` (e.g. `http://localhost:8080`).
    pub fn new(base_url: impl Into<String>, store: Arc<dyn SessionStore>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            http: reqwest::Client::new(),
            store,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Sends a request and returns the decoded JSON body.
    ///
    /// An empty success body is returned as `Value::Null`. A 401 clears the
    /// session store before `AuthRejected` is returned.
    ///
    /// # Errors
    /// Returns `AuthRejected`, `Server`, `Network` or `Decode`.
    pub async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> ApiResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.request(method.clone(), &url);

        if let Some(session) = self.store.get() {
            request = request.bearer_auth(&session.token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(%method, path, "sending request");
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        debug!(%method, path, status = status.as_u16(), "received response");

        // The session is torn down before the body is read; a broken body
        // must not leave a rejected token behind.
        if status == StatusCode::UNAUTHORIZED {
            self.teardown_session(path);
            let text = response.text().await.unwrap_or_default();
            return Err(ApiError::auth_rejected(&text));
        }

        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(ApiError::server(status.as_u16(), &text));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Like [`HttpClient::send`], deserializing the body into `T`.
    ///
    /// # Errors
    /// Same as `send`, plus `Decode` if the body does not match `T`.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> ApiResult<T> {
        let value = self.send(method, path, body).await?;
        serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
    }

    fn teardown_session(&self, path: &str) {
        warn!(path, "authentication rejected; clearing session");
        if let Err(err) = self.store.clear() {
            warn!(error = %format!("{err:#}"), "failed to clear session after 401");
        }
    }
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
