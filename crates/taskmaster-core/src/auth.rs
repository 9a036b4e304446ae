//! Login and registration exchanges.
//!
//! Only presence and shape are checked locally; everything else (wrong
//! password, duplicate email) is decided by the server and surfaces as its
//! error message.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use crate::error::{ApiError, ApiResult, ValidationError};
use crate::http::HttpClient;
use crate::session::{Session, User};

const LOGIN_PATH: &str = "/api/v1/auth/login";
const REGISTER_PATH: &str = "/api/v1/auth/register";

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}$").expect("invalid email pattern")
});

/// Body of a successful login or register response.
#[derive(Debug, Deserialize)]
struct AuthResponse {
    #[serde(default)]
    message: Option<String>,
    token: String,
    user: User,
}

/// Validates an email address.
///
/// # Errors
/// Returns a `ValidationError` for empty or malformed addresses.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.trim().is_empty() {
        return Err(ValidationError::new("email", "email is required"));
    }
    if !EMAIL_PATTERN.is_match(email) {
        return Err(ValidationError::new(
            "email",
            "please enter a valid email address",
        ));
    }
    Ok(())
}

/// Validates a password.
///
/// # Errors
/// Returns a `ValidationError` for empty or too-short passwords.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::new("password", "password is required"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::new(
            "password",
            format!("password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    Ok(())
}

/// Validates a display name for registration.
///
/// # Errors
/// Returns a `ValidationError` when the name is blank.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::new("name", "name is required"));
    }
    Ok(())
}

/// Performs credential exchanges and populates the session store.
#[derive(Debug, Clone)]
pub struct AuthGateway {
    client: HttpClient,
}

impl AuthGateway {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// Logs in and stores the returned session before resolving.
    ///
    /// # Errors
    /// `Validation` for malformed input (no request is made); otherwise any
    /// error from the HTTP adapter, or `Storage` if the session can't be saved.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<Session> {
        validate_email(email)?;
        validate_password(password)?;

        let body = json!({ "email": email, "password": password });
        self.exchange(LOGIN_PATH, &body).await
    }

    /// Registers a new account and stores the returned session.
    ///
    /// # Errors
    /// Same as [`AuthGateway::login`].
    pub async fn register(&self, email: &str, password: &str, name: &str) -> ApiResult<Session> {
        validate_name(name)?;
        validate_email(email)?;
        validate_password(password)?;

        let body = json!({ "email": email, "password": password, "name": name });
        self.exchange(REGISTER_PATH, &body).await
    }

    /// Clears the stored session.
    ///
    /// # Errors
    /// Returns `Storage` if persisted state cannot be removed.
    pub fn logout(&self) -> ApiResult<()> {
        self.client
            .store()
            .clear()
            .map_err(|e| ApiError::Storage(format!("{e:#}")))?;
        info!("logged out");
        Ok(())
    }

    pub fn current_session(&self) -> Option<Session> {
        self.client.store().get()
    }

    async fn exchange(&self, path: &str, body: &Value) -> ApiResult<Session> {
        let response: AuthResponse = self.client.send_json(Method::POST, path, Some(body)).await?;

        let session = Session {
            token: response.token,
            user: response.user,
        };
        if !session.is_valid() {
            return Err(ApiError::Decode("server returned an empty token".to_string()));
        }

        self.client
            .store()
            .set(&session)
            .map_err(|e| ApiError::Storage(format!("{e:#}")))?;

        info!(
            user_id = session.user.id,
            message = response.message.as_deref().unwrap_or_default(),
            "session established"
        );
        Ok(session)
    }
}
