//! CLI command handlers.

use taskmaster_core::ApiError;

pub mod auth;
pub mod config;
pub mod projects;

/// Converts an API error into what the user should see.
///
/// Authentication failures point back to the entry command; everything else
/// shows the server's message verbatim, keeping transport details as context.
pub(crate) fn report(err: ApiError) -> anyhow::Error {
    match err {
        ApiError::AuthRejected(message) => {
            anyhow::anyhow!("{message}. Please run `taskmaster login` to sign in again.")
        }
        err @ (ApiError::Network(_) | ApiError::Decode(_)) => {
            let message = err.user_message();
            anyhow::Error::new(err).context(message)
        }
        err => anyhow::anyhow!(err.user_message()),
    }
}

/// Like [`report`], for the commands that establish a session. A rejection
/// there means bad credentials, so the message is shown alone.
pub(crate) fn report_credentials(err: ApiError) -> anyhow::Error {
    match err {
        ApiError::AuthRejected(message) => anyhow::anyhow!(message),
        err => report(err),
    }
}
