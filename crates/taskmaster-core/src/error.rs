//! Error taxonomy for session and gateway operations.

use std::fmt;

use serde_json::Value;

/// Message shown when a request never produced a response.
const GENERIC_FAILURE: &str = "Request failed, please try again";

/// Message used when a 401 carries no usable body.
const DEFAULT_AUTH_REJECTED: &str = "Authentication required";

/// Client-side, field-level validation failure. Never reaches the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Form field that failed validation (e.g. `email`).
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Errors surfaced by the HTTP adapter, gateways and dashboard controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Input rejected before any request was made.
    Validation(ValidationError),
    /// Server answered 401. The session store has already been cleared.
    AuthRejected(String),
    /// Server answered with any other non-success status.
    Server { status: u16, message: String },
    /// No response (connection refused, DNS, TLS, reset).
    Network(String),
    /// Successful response whose body could not be decoded.
    Decode(String),
    /// Session could not be persisted.
    Storage(String),
    /// Another action is still in flight.
    Busy,
}

impl ApiError {
    /// Builds a server error, extracting the most useful message from `body`.
    ///
    /// Looks for a JSON `error` field, then `message`; falls back to the raw
    /// body, or `HTTP <status>` when the body is empty.
    pub fn server(status: u16, body: &str) -> Self {
        Self::Server {
            status,
            message: extract_message(body).unwrap_or_else(|| format!("HTTP {status}")),
        }
    }

    /// Builds an authentication-rejected error from a 401 body.
    pub fn auth_rejected(body: &str) -> Self {
        Self::AuthRejected(
            extract_message(body).unwrap_or_else(|| DEFAULT_AUTH_REJECTED.to_string()),
        )
    }

    pub fn is_auth_rejected(&self) -> bool {
        matches!(self, Self::AuthRejected(_))
    }

    /// HTTP status associated with the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::AuthRejected(_) => Some(401),
            Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Text suitable for showing to the user.
    ///
    /// Server messages are shown verbatim; transport failures collapse to a
    /// generic message.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(err) => err.message.clone(),
            Self::AuthRejected(message) | Self::Server { message, .. } => message.clone(),
            Self::Network(_) | Self::Decode(_) => GENERIC_FAILURE.to_string(),
            Self::Storage(message) => format!("Could not save session: {message}"),
            Self::Busy => "Another request is still in progress".to_string(),
        }
    }
}

fn extract_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    if let Ok(json) = serde_json::from_str::<Value>(body) {
        let from_json = ["error", "message"]
            .iter()
            .find_map(|key| json.get(key).and_then(Value::as_str))
            .filter(|msg| !msg.trim().is_empty());
        if let Some(msg) = from_json {
            return Some(msg.to_string());
        }
    }

    Some(body.to_string())
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "invalid {err}"),
            Self::AuthRejected(message) => write!(f, "authentication rejected: {message}"),
            Self::Server { status, message } => write!(f, "HTTP {status}: {message}"),
            Self::Network(message) => write!(f, "network error: {message}"),
            Self::Decode(message) => write!(f, "invalid response: {message}"),
            Self::Storage(message) => write!(f, "session storage error: {message}"),
            Self::Busy => write!(f, "another request is in flight"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

/// Result type for gateway and controller operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_prefers_error_field() {
        let err = ApiError::server(409, r#"{"error":"email already registered"}"#);
        assert_eq!(
            err,
            ApiError::Server {
                status: 409,
                message: "email already registered".to_string()
            }
        );
        assert_eq!(err.user_message(), "email already registered");
    }

    #[test]
    fn test_server_error_falls_back_to_message_field() {
        let err = ApiError::server(404, r#"{"message":"project not found"}"#);
        assert_eq!(err.user_message(), "project not found");
    }

    #[test]
    fn test_server_error_uses_raw_body_when_not_json() {
        let err = ApiError::server(502, "Bad Gateway");
        assert_eq!(err.to_string(), "HTTP 502: Bad Gateway");
    }

    #[test]
    fn test_server_error_empty_body() {
        let err = ApiError::server(500, "  ");
        assert_eq!(err.user_message(), "HTTP 500");
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn test_auth_rejected_default_message() {
        let err = ApiError::auth_rejected("");
        assert!(err.is_auth_rejected());
        assert_eq!(err.user_message(), DEFAULT_AUTH_REJECTED);
        assert_eq!(err.status(), Some(401));
    }

    #[test]
    fn test_network_error_is_generic_for_users() {
        let err = ApiError::Network("connection refused".to_string());
        assert_eq!(err.user_message(), GENERIC_FAILURE);
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_validation_display() {
        let err: ApiError = ValidationError::new("name", "project name is required").into();
        assert_eq!(err.to_string(), "invalid name: project name is required");
        assert_eq!(err.user_message(), "project name is required");
    }
}
