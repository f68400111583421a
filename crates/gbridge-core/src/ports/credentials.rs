//! Credential ports (driven/secondary ports)
//!
//! Two collaborators of the credential resolver:
//! - [`ITokenStore`] caches authorized user credentials between runs
//! - [`IOAuthBackend`] talks to the authorization server
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because errors at these boundaries are
//!   adapter-specific; the resolver treats any failure as "try the next
//!   source".
//! - [`Credentials`] serializes to the same JSON layout as the token files
//!   written by Google's own client libraries, so existing token files can
//!   be reused.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Default token endpoint of the authorization server
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Authorized user credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Bearer token for API requests
    #[serde(rename = "token")]
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    /// Granted scopes
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Expiry of `access_token`; `None` means unknown and treated as valid
    #[serde(default, rename = "expiry", skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl Credentials {
    /// Returns true if the access token has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|t| Utc::now() >= t)
    }

    /// Returns true if the access token will expire within the given duration
    pub fn expires_within(&self, duration: Duration) -> bool {
        self.expires_at.is_some_and(|t| Utc::now() + duration >= t)
    }

    pub fn is_valid(&self) -> bool {
        !self.access_token.is_empty() && !self.is_expired()
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Returns true if the granted scopes include every required scope
    pub fn covers<S: AsRef<str>>(&self, required: &[S]) -> bool {
        let granted: BTreeSet<&str> = self.scopes.iter().map(String::as_str).collect();
        required.iter().all(|s| granted.contains(s.as_ref()))
    }
}

/// OAuth client registration of an installed application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

#[derive(Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    /// Parse a client secrets document as downloaded from the cloud console
    ///
    /// Accepts both the `{"installed": {...}}` and `{"web": {...}}` layouts.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let file: ClientSecretsFile = serde_json::from_str(json)?;
        file.installed
            .or(file.web)
            .ok_or_else(|| anyhow::anyhow!("client secrets must contain an 'installed' or 'web' section"))
    }
}

/// Port trait for the credential cache
///
/// Credentials are keyed by a stem (one stem per account or scope set).
pub trait ITokenStore: Send + Sync {
    /// Load cached credentials, `Ok(None)` if nothing is stored
    fn load(&self, stem: &str) -> anyhow::Result<Option<Credentials>>;

    /// Persist credentials, replacing any previous entry
    fn save(&self, stem: &str, credentials: &Credentials) -> anyhow::Result<()>;

    /// Remove cached credentials; succeeds if nothing is stored
    fn clear(&self, stem: &str) -> anyhow::Result<()>;

    /// Human-readable location of the cache entry, for error messages
    fn location(&self, stem: &str) -> String;
}

/// Port trait for authorization server interactions
#[async_trait::async_trait]
pub trait IOAuthBackend: Send + Sync {
    /// Exchange the refresh token for a new access token
    async fn refresh(&self, credentials: &Credentials) -> anyhow::Result<Credentials>;

    /// Obtain credentials from the platform without user interaction
    ///
    /// Returns `Ok(None)` if the platform provides no credentials.
    async fn silent(&self, scopes: &[String]) -> anyhow::Result<Option<Credentials>>;

    /// Run the interactive consent flow
    async fn interactive(&self, secrets: &ClientSecrets, scopes: &[String]) -> anyhow::Result<Credentials>;
}
