//! gbridge Google - Google API adapters
//!
//! Provides async clients for:
//! - OAuth2 credential acquisition (cached tokens, platform credentials,
//!   installed-app consent with PKCE)
//! - Google Drive v3 as a remote file store, including batched copies
//! - Google Docs v1 as a document service
//!
//! ## Modules
//!
//! - [`auth`] - Token stores, OAuth flows and the credential resolver
//! - [`client`] - Authenticated HTTP client with 429/503 retry
//! - [`drive`] - Drive file store and folder exploration
//! - [`batch`] - `multipart/mixed` batch request encoding and response parsing
//! - [`docs`] - Docs document service

pub mod auth;
pub mod batch;
pub mod client;
pub mod docs;
pub mod drive;

use std::time::Duration;

use thiserror::Error;

use gbridge_core::domain::errors::RemoteError;

/// Errors that can occur when communicating with Google APIs
#[derive(Debug, Error)]
pub enum GoogleError {
    /// The request was rejected as malformed (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Authentication credentials are invalid or expired
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Insufficient permissions for the requested operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded; retry after the specified duration
    #[error("Too many requests, retry after {retry_after:?}")]
    TooManyRequests {
        /// Duration to wait before retrying
        retry_after: Duration,
    },

    /// A server-side error occurred (5xx)
    #[error("Server error: {0}")]
    ServerError(String),

    /// Any other unexpected status
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// A network-level error occurred
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// The API response could not be parsed or was malformed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<GoogleError> for RemoteError {
    fn from(err: GoogleError) -> Self {
        match err {
            GoogleError::NotFound(msg) => RemoteError::NotFound(msg),
            GoogleError::BadRequest(msg) => RemoteError::ValidationFault(msg),
            GoogleError::InvalidResponse(msg) => {
                RemoteError::ValidationFault(format!("invalid response: {msg}"))
            }
            other => RemoteError::RemoteFault(other.to_string()),
        }
    }
}

/// Errors of the credential resolver
#[derive(Debug, Error)]
pub enum AuthError {
    /// No usable cached token and interaction is disabled
    #[error("Interactive authorization is disabled and no valid token is cached at {location}")]
    InteractionRequired { location: String },

    /// Consent is needed but no OAuth client is configured
    #[error(
        "No OAuth client configured: set GOOGLE_OAUTH_CLIENT_INFO or auth.client_file"
    )]
    ClientSecretsMissing,

    /// The client secrets could not be read or parsed
    #[error("Invalid client secrets: {0}")]
    InvalidClientSecrets(String),

    /// The consent flow or the token cache failed
    #[error("Authorization failed: {0:#}")]
    Flow(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_google_error_to_remote_error() {
        let e: RemoteError = GoogleError::NotFound("file abc".into()).into();
        assert_eq!(e, RemoteError::NotFound("file abc".into()));

        let e: RemoteError = GoogleError::BadRequest("bad q".into()).into();
        assert_eq!(e.kind(), "validation_fault");

        let e: RemoteError = GoogleError::ServerError("boom".into()).into();
        assert_eq!(e, RemoteError::RemoteFault("Server error: boom".into()));

        let e: RemoteError = GoogleError::TooManyRequests {
            retry_after: Duration::from_secs(1),
        }
        .into();
        assert_eq!(e.kind(), "remote_fault");
    }

    #[test]
    fn test_auth_error_messages() {
        let e = AuthError::InteractionRequired {
            location: "/tmp/t.json".into(),
        };
        assert!(e.to_string().contains("/tmp/t.json"));
        assert!(AuthError::ClientSecretsMissing
            .to_string()
            .contains("GOOGLE_OAUTH_CLIENT_INFO"));
    }
}
