//! Google API HTTP client
//!
//! Wraps `reqwest::Client` with bearer authentication, bounded retry on
//! throttling and status-to-error mapping. API-specific adapters
//! ([`DriveFileStore`](crate::drive::DriveFileStore),
//! [`DocsClient`](crate::docs::DocsClient)) build absolute URLs from their
//! own base URL and share one client.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use gbridge_google::client::GoogleClient;
//! use reqwest::Method;
//!
//! # async fn example() -> Result<(), gbridge_google::GoogleError> {
//! let client = GoogleClient::new("access-token-here");
//! let response = client
//!     .execute_with_retry(|| client.request(Method::GET, "https://www.googleapis.com/drive/v3/about?fields=user"))
//!     .await?;
//! println!("{}", response.status());
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::GoogleError;

/// Default retry-after duration when the header is missing
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(2);

/// Longest wait honoured from a Retry-After header
const MAX_RETRY_AFTER: Duration = Duration::from_secs(3600);

/// Default number of retries for 429 and 503 responses
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Authenticated HTTP client for Google APIs
pub struct GoogleClient {
    /// The underlying HTTP client
    client: Client,
    /// Current OAuth2 access token
    access_token: String,
    /// Retries after a throttled response before giving up
    max_retries: u32,
}

impl GoogleClient {
    /// Creates a new client with the given access token
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            access_token: access_token.into(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Sets the retry budget for throttled responses
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Updates the access token (e.g., after a token refresh)
    pub fn set_access_token(&mut self, token: impl Into<String>) {
        self.access_token = token.into();
        debug!("Updated GoogleClient access token");
    }

    /// Returns a reference to the current access token
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Creates an authenticated request builder for an absolute URL
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.access_token)
    }

    /// Sends a request, retrying on 429 and 503, and maps error statuses
    ///
    /// `build` is called once per attempt because a sent request cannot be
    /// reused.
    ///
    /// # Returns
    /// The successful (2xx) response, or the mapped error of the last attempt.
    pub async fn execute_with_retry<F>(&self, build: F) -> Result<Response, GoogleError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            let response = build().send().await?;
            let status = response.status();

            if is_retryable(status) {
                let retry_after = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .map(|v| parse_retry_after(v, DEFAULT_RETRY_AFTER))
                    .unwrap_or(DEFAULT_RETRY_AFTER);

                if attempt >= self.max_retries {
                    warn!(
                        url = %response.url(),
                        attempts = attempt + 1,
                        status = status.as_u16(),
                        "Retry limit exhausted"
                    );
                    return Err(check_status(response).await.err().unwrap_or(
                        GoogleError::TooManyRequests { retry_after },
                    ));
                }

                info!(
                    url = %response.url(),
                    attempt,
                    status = status.as_u16(),
                    retry_after_ms = retry_after.as_millis() as u64,
                    "Throttled, backing off"
                );
                tokio::time::sleep(retry_after).await;
                attempt += 1;
                continue;
            }

            if attempt > 0 {
                debug!(attempt, "Request succeeded after retry");
            }
            return check_status(response).await;
        }
    }

    /// GET a JSON resource
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, GoogleError> {
        let response = self
            .execute_with_retry(|| self.request(Method::GET, url))
            .await?;
        parse_json(response).await
    }

    /// POST a JSON body and parse the JSON answer
    pub async fn post_json<B, T>(&self, url: &str, body: &B) -> Result<T, GoogleError>
    where
        B: serde::Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .execute_with_retry(|| self.request(Method::POST, url).json(body))
            .await?;
        parse_json(response).await
    }

    /// DELETE a resource, ignoring the (empty) body
    pub async fn delete(&self, url: &str) -> Result<(), GoogleError> {
        self.execute_with_retry(|| self.request(Method::DELETE, url))
            .await?;
        Ok(())
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::SERVICE_UNAVAILABLE
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, GoogleError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| GoogleError::InvalidResponse(e.to_string()))
}

/// Maps a non-2xx response to a [`GoogleError`]
///
/// Uses the `error.message` field of Google's JSON error body when present.
pub async fn check_status(response: Response) -> Result<Response, GoogleError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let retry_after = response
        .headers()
        .get("Retry-After")
        .and_then(|v| v.to_str().ok())
        .map(|v| parse_retry_after(v, DEFAULT_RETRY_AFTER))
        .unwrap_or(DEFAULT_RETRY_AFTER);
    let body = response.text().await.unwrap_or_default();
    Err(error_for_status(status.as_u16(), &body, retry_after))
}

/// Maps a status code and error body to a [`GoogleError`]
pub fn error_for_status(status: u16, body: &str, retry_after: Duration) -> GoogleError {
    let message = error_message(body);
    match status {
        400 => GoogleError::BadRequest(message),
        401 => GoogleError::Unauthorized(message),
        403 => GoogleError::Forbidden(message),
        404 => GoogleError::NotFound(message),
        429 => GoogleError::TooManyRequests { retry_after },
        500..=599 => GoogleError::ServerError(format!("HTTP {status}: {message}")),
        _ => GoogleError::Status { status, message },
    }
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().chars().take(200).collect())
}

/// Parses a Retry-After header value
///
/// Accepts delay-seconds or an HTTP date; anything else yields `default`.
pub fn parse_retry_after(value: &str, default: Duration) -> Duration {
    if let Ok(seconds) = value.trim().parse::<u64>() {
        return Duration::from_secs(seconds).min(MAX_RETRY_AFTER);
    }

    if let Ok(date) = chrono::DateTime::parse_from_rfc2822(value.trim()) {
        let now = chrono::Utc::now();
        let target = date.with_timezone(&chrono::Utc);
        if target > now {
            if let Ok(diff) = (target - now).to_std() {
                return diff.min(MAX_RETRY_AFTER);
            }
        }
        return Duration::ZERO;
    }

    warn!(value, "Could not parse Retry-After header, using default");
    default
}
