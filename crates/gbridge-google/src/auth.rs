//! OAuth2 credential acquisition for Google APIs
//!
//! Implements the installed-application Authorization Code flow with PKCE
//! (RFC 7636) against Google's identity platform, token caching, and a
//! resolver that decides between cached, refreshed, platform and freshly
//! consented credentials.
//!
//! ## Components
//!
//! - [`OAuth2Config`] - Client and endpoint settings for one flow
//! - [`FileTokenStore`] / [`KeyringTokenStore`] - Credential caches
//! - [`PKCEFlow`] - OAuth2 PKCE challenge/exchange logic
//! - [`LocalCallbackServer`] - Minimal HTTP server for the OAuth redirect
//! - [`GoogleOAuthBackend`] - Refresh, metadata-server and consent flows
//! - [`CredentialResolver`] - Picks the first usable credential source

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use oauth2::basic::{BasicClient, BasicTokenResponse};
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, RefreshToken, Scope, TokenResponse,
    TokenUrl,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use gbridge_core::config::{AuthConfig, TokenStorage, CLIENT_INFO_ENV};
use gbridge_core::ports::credentials::{ClientSecrets, Credentials, IOAuthBackend, ITokenStore};

use crate::AuthError;

/// Google OAuth2 authorization endpoint
pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";

/// Keyring service name for storing tokens
const KEYRING_SERVICE: &str = "gbridge";

/// Lifetime assumed when the token endpoint omits `expires_in`
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// Timeout for metadata server probes
const METADATA_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(3);

// ============================================================================
// OAuth2Config
// ============================================================================

/// Configuration for one OAuth2 client
#[derive(Debug, Clone)]
pub struct OAuth2Config {
    pub client_id: String,
    /// Installed-app clients may carry a (non-confidential) secret
    pub client_secret: Option<String>,
    pub auth_uri: String,
    pub token_uri: String,
    /// Redirect URI for receiving the authorization code
    pub redirect_uri: String,
    /// OAuth scopes to request
    pub scopes: Vec<String>,
}

impl OAuth2Config {
    /// Builds a config from downloaded client secrets
    pub fn from_secrets(secrets: &ClientSecrets, scopes: &[String]) -> Self {
        Self {
            client_id: secrets.client_id.clone(),
            client_secret: secrets.client_secret.clone(),
            auth_uri: secrets.auth_uri.clone(),
            token_uri: secrets.token_uri.clone(),
            redirect_uri: "http://127.0.0.1/".to_string(),
            scopes: scopes.to_vec(),
        }
    }

    /// Builds a refresh-capable config from cached credentials
    pub fn from_credentials(credentials: &Credentials) -> Self {
        Self {
            client_id: credentials.client_id.clone(),
            client_secret: credentials.client_secret.clone(),
            auth_uri: GOOGLE_AUTH_URL.to_string(),
            token_uri: credentials.token_uri.clone(),
            redirect_uri: "http://127.0.0.1/".to_string(),
            scopes: credentials.scopes.clone(),
        }
    }

    /// Creates a config with a custom redirect URI
    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = uri.into();
        self
    }
}

// ============================================================================
// Token stores
// ============================================================================

/// Caches credentials as `<dir>/<stem>.json`
///
/// The file layout matches the authorized-user token files written by
/// Google's client libraries, so existing caches can be reused.
pub struct FileTokenStore {
    dir: PathBuf,
}

impl FileTokenStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self, stem: &str) -> PathBuf {
        self.dir.join(format!("{stem}.json"))
    }
}

impl ITokenStore for FileTokenStore {
    fn load(&self, stem: &str) -> Result<Option<Credentials>> {
        let path = self.path(stem);
        if !path.exists() {
            debug!(path = %path.display(), "No cached token file");
            return Ok(None);
        }
        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read token file {}", path.display()))?;
        let credentials = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse token file {}", path.display()))?;
        debug!(path = %path.display(), "Loaded cached token");
        Ok(Some(credentials))
    }

    fn save(&self, stem: &str, credentials: &Credentials) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create token directory {}", self.dir.display()))?;
        let path = self.path(stem);
        let json =
            serde_json::to_string_pretty(credentials).context("Failed to serialize token")?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write token file {}", path.display()))?;
        restrict_permissions(&path)?;
        info!(path = %path.display(), "Saved token");
        Ok(())
    }

    fn clear(&self, stem: &str) -> Result<()> {
        let path = self.path(stem);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                info!(path = %path.display(), "Removed token file");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(anyhow::Error::new(e)
                .context(format!("Failed to remove token file {}", path.display()))),
        }
    }

    fn location(&self, stem: &str) -> String {
        self.path(stem).display().to_string()
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .with_context(|| format!("Failed to restrict permissions on {}", path.display()))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

/// Stores credentials in the system keyring
///
/// Uses the `keyring` crate to store tokens in the OS credential store
/// (e.g., GNOME Keyring, KDE Wallet, macOS Keychain). Credentials are
/// serialized as JSON under the service name "gbridge" with the token stem
/// as the username.
pub struct KeyringTokenStore {
    service: String,
}

impl KeyringTokenStore {
    pub fn new() -> Self {
        Self {
            service: KEYRING_SERVICE.to_string(),
        }
    }

    fn entry(&self, stem: &str) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service, stem).context("Failed to create keyring entry")
    }
}

impl Default for KeyringTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ITokenStore for KeyringTokenStore {
    fn load(&self, stem: &str) -> Result<Option<Credentials>> {
        match self.entry(stem)?.get_password() {
            Ok(json) => {
                let credentials = serde_json::from_str(&json)
                    .context("Failed to deserialize token from keyring")?;
                debug!(stem, "Loaded token from keyring");
                Ok(Some(credentials))
            }
            Err(keyring::Error::NoEntry) => {
                debug!(stem, "No token found in keyring");
                Ok(None)
            }
            Err(e) => Err(anyhow::Error::new(e).context("Failed to read from keyring")),
        }
    }

    fn save(&self, stem: &str, credentials: &Credentials) -> Result<()> {
        let json = serde_json::to_string(credentials).context("Failed to serialize token")?;
        self.entry(stem)?
            .set_password(&json)
            .context("Failed to store token in keyring")?;
        debug!(stem, "Stored token in keyring");
        Ok(())
    }

    fn clear(&self, stem: &str) -> Result<()> {
        match self.entry(stem)?.delete_credential() {
            Ok(()) => {
                info!(stem, "Cleared token from keyring");
                Ok(())
            }
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(anyhow::Error::new(e).context("Failed to delete from keyring")),
        }
    }

    fn location(&self, stem: &str) -> String {
        format!("keyring:{}/{stem}", self.service)
    }
}

/// Token store selected by the auth configuration
pub fn token_store_for(config: &AuthConfig) -> Arc<dyn ITokenStore> {
    match config.token_storage {
        TokenStorage::File => Arc::new(FileTokenStore::new(config.effective_token_dir())),
        TokenStorage::Keyring => Arc::new(KeyringTokenStore::new()),
    }
}

// ============================================================================
// PKCEFlow
// ============================================================================

/// OAuth2 PKCE flow implementation using the `oauth2` crate
///
/// Handles generating authorization URLs with PKCE challenges,
/// exchanging authorization codes for tokens, and refreshing tokens.
pub struct PKCEFlow {
    client: BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>,
    config: OAuth2Config,
}

impl PKCEFlow {
    /// Creates a new PKCEFlow with the given configuration
    pub fn new(config: &OAuth2Config) -> Result<Self> {
        let mut client = BasicClient::new(ClientId::new(config.client_id.clone()))
            .set_auth_uri(AuthUrl::new(config.auth_uri.clone()).context("Invalid authorization URL")?)
            .set_token_uri(TokenUrl::new(config.token_uri.clone()).context("Invalid token URL")?)
            .set_redirect_uri(
                RedirectUrl::new(config.redirect_uri.clone()).context("Invalid redirect URI")?,
            );
        if let Some(secret) = &config.client_secret {
            client = client.set_client_secret(ClientSecret::new(secret.clone()));
        }

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Generates an authorization URL with a PKCE challenge
    ///
    /// Requests offline access so the consent yields a refresh token, and
    /// incremental authorization so earlier grants are kept.
    ///
    /// # Returns
    /// A tuple of `(authorization_url, csrf_token, pkce_verifier)`.
    /// The `pkce_verifier` must be kept until the code exchange step.
    pub fn generate_auth_url(&self) -> (String, CsrfToken, PkceCodeVerifier) {
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let mut auth_request = self
            .client
            .authorize_url(CsrfToken::new_random)
            .add_extra_param("access_type", "offline")
            .add_extra_param("include_granted_scopes", "true");

        for scope in &self.config.scopes {
            auth_request = auth_request.add_scope(Scope::new(scope.clone()));
        }

        let (auth_url, csrf_token) = auth_request.set_pkce_challenge(pkce_challenge).url();

        debug!("Generated authorization URL");
        (auth_url.to_string(), csrf_token, pkce_verifier)
    }

    /// Exchanges an authorization code for credentials
    pub async fn exchange_code(
        &self,
        code: String,
        pkce_verifier: PkceCodeVerifier,
    ) -> Result<Credentials> {
        info!("Exchanging authorization code for tokens");

        let http_client = reqwest::Client::new();
        let token_result = self
            .client
            .exchange_code(AuthorizationCode::new(code))
            .set_pkce_verifier(pkce_verifier)
            .request_async(&http_client)
            .await
            .context("Failed to exchange authorization code")?;

        info!("Successfully obtained OAuth tokens");
        Ok(self.to_credentials(&token_result, None))
    }

    /// Refreshes an access token
    ///
    /// Google usually omits the refresh token from refresh responses; the
    /// one passed in is kept in that case.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<Credentials> {
        info!("Refreshing access token");

        let http_client = reqwest::Client::new();
        let token_result = self
            .client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(&http_client)
            .await
            .context("Failed to refresh token")?;

        info!("Successfully refreshed access token");
        Ok(self.to_credentials(&token_result, Some(refresh_token)))
    }

    fn to_credentials(
        &self,
        token_result: &BasicTokenResponse,
        previous_refresh: Option<&str>,
    ) -> Credentials {
        let expires_at = token_result
            .expires_in()
            .map(|d| Utc::now() + Duration::seconds(d.as_secs() as i64))
            .unwrap_or_else(|| Utc::now() + Duration::seconds(DEFAULT_TOKEN_LIFETIME_SECS));

        let scopes = token_result
            .scopes()
            .map(|granted| granted.iter().map(|s| s.as_str().to_owned()).collect())
            .unwrap_or_else(|| self.config.scopes.clone());

        Credentials {
            access_token: token_result.access_token().secret().to_string(),
            refresh_token: token_result
                .refresh_token()
                .map(|t| t.secret().to_string())
                .or_else(|| previous_refresh.map(str::to_string)),
            token_uri: self.config.token_uri.clone(),
            client_id: self.config.client_id.clone(),
            client_secret: self.config.client_secret.clone(),
            scopes,
            expires_at: Some(expires_at),
        }
    }
}

// ============================================================================
// LocalCallbackServer
// ============================================================================

/// Minimal HTTP server that listens on localhost for the OAuth2 redirect
///
/// Binds an ephemeral port on `127.0.0.1`, serves connections until the
/// browser is redirected back with a code or an error, answers with an HTML
/// page and stops.
pub struct LocalCallbackServer {
    listener: tokio::net::TcpListener,
    port: u16,
}

/// Parameters extracted from the OAuth2 callback
#[derive(Debug, PartialEq, Eq)]
pub struct CallbackParams {
    /// The authorization code
    pub code: String,
    /// The CSRF state parameter
    pub state: String,
}

/// What the redirect carried
#[derive(Debug, PartialEq, Eq)]
enum CallbackOutcome {
    Code(CallbackParams),
    Denied(String),
}

impl LocalCallbackServer {
    /// Binds the callback listener on an ephemeral loopback port
    pub async fn bind() -> Result<Self> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .context("Failed to bind callback server on 127.0.0.1")?;
        let port = listener
            .local_addr()
            .context("Failed to read callback server address")?
            .port();
        info!(port, "Local OAuth callback server listening");
        Ok(Self { listener, port })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Redirect URI to register in the authorization request
    pub fn redirect_uri(&self) -> String {
        format!("http://127.0.0.1:{}/", self.port)
    }

    /// Waits for the OAuth redirect and checks its CSRF state
    pub async fn wait_for_code(self, expected_state: &str) -> Result<String> {
        use http_body_util::Full;
        use hyper::body::Bytes;
        use hyper::server::conn::http1;
        use hyper::service::service_fn;
        use hyper::{Request, StatusCode};
        use hyper_util::rt::TokioIo;
        use tokio::sync::{oneshot, Mutex};

        let (tx, rx) = oneshot::channel::<CallbackOutcome>();
        let tx = Arc::new(Mutex::new(Some(tx)));
        let listener = self.listener;

        let accept_loop = tokio::spawn(async move {
            loop {
                let stream = match listener.accept().await {
                    Ok((stream, _addr)) => stream,
                    Err(e) => {
                        warn!("Callback server accept error: {}", e);
                        break;
                    }
                };
                let tx = tx.clone();
                let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                    let tx = tx.clone();
                    async move {
                        let uri = req.uri().to_string();
                        debug!("Callback server received request: {}", uri);

                        let response = match parse_callback(&uri) {
                            Some(outcome) => {
                                let page = match &outcome {
                                    CallbackOutcome::Code(_) => {
                                        html_response(StatusCode::OK, success_html())
                                    }
                                    CallbackOutcome::Denied(reason) => {
                                        html_response(StatusCode::BAD_REQUEST, error_html(reason))
                                    }
                                };
                                if let Some(sender) = tx.lock().await.take() {
                                    let _ = sender.send(outcome);
                                }
                                page
                            }
                            None => html_response(
                                StatusCode::NOT_FOUND,
                                error_html("Missing authorization code in callback"),
                            ),
                        };
                        Ok::<_, hyper::Error>(response)
                    }
                });

                tokio::spawn(async move {
                    if let Err(e) = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await
                    {
                        warn!("Callback server connection error: {}", e);
                    }
                });
            }
        });

        let outcome = rx.await;
        accept_loop.abort();

        match outcome.context("Callback server stopped without receiving a redirect")? {
            CallbackOutcome::Code(params) => {
                if params.state != expected_state {
                    anyhow::bail!("OAuth state mismatch in callback");
                }
                info!("Received OAuth callback with authorization code");
                Ok(params.code)
            }
            CallbackOutcome::Denied(reason) => {
                anyhow::bail!("Authorization was denied: {reason}")
            }
        }
    }
}

fn html_response(
    status: hyper::StatusCode,
    html: String,
) -> hyper::Response<http_body_util::Full<hyper::body::Bytes>> {
    let mut response = hyper::Response::new(http_body_util::Full::new(hyper::body::Bytes::from(html)));
    *response.status_mut() = status;
    response.headers_mut().insert(
        hyper::header::CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("text/html; charset=utf-8"),
    );
    response
}

/// Parses the redirect target; `None` for unrelated requests
fn parse_callback(uri: &str) -> Option<CallbackOutcome> {
    let url = url::Url::parse(&format!("http://localhost{}", uri)).ok()?;
    let mut code = None;
    let mut state = None;
    let mut error = None;

    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.to_string()),
            "state" => state = Some(value.to_string()),
            "error" => error = Some(value.to_string()),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Some(CallbackOutcome::Denied(error));
    }
    Some(CallbackOutcome::Code(CallbackParams {
        code: code?,
        state: state.unwrap_or_default(),
    }))
}

/// Returns the HTML for a successful authentication page
fn success_html() -> String {
    r#"<!DOCTYPE html>
<html>
<head><title>gbridge - Authorization Complete</title></head>
<body style="font-family: sans-serif; text-align: center; padding-top: 50px;">
    <h1>Authorization Complete</h1>
    <p>gbridge can now access your Google account.</p>
    <p>You can close this window and return to the terminal.</p>
    <script>setTimeout(function() { window.close(); }, 3000);</script>
</body>
</html>"#
        .to_string()
}

/// Returns the HTML for an authentication error page
fn error_html(message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>gbridge - Authorization Error</title></head>
<body style="font-family: sans-serif; text-align: center; padding-top: 50px;">
    <h1>Authorization Error</h1>
    <p>{}</p>
    <p>Please close this window and try again.</p>
</body>
</html>"#,
        message
    )
}

// ============================================================================
// Metadata server
// ============================================================================

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
    expires_in: Option<i64>,
}

/// Fetches a platform token from a GCE-style metadata server
///
/// Returns `Ok(None)` when no metadata server answers, which is the normal
/// case off Google Cloud.
pub async fn fetch_metadata_token(
    http: &reqwest::Client,
    metadata_url: &str,
    scopes: &[String],
) -> Result<Option<Credentials>> {
    let response = match http
        .get(metadata_url)
        .header("Metadata-Flavor", "Google")
        .query(&[("scopes", scopes.join(","))])
        .timeout(METADATA_TIMEOUT)
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            debug!(error = %e, "Metadata server unreachable");
            return Ok(None);
        }
    };

    if !response.status().is_success() {
        debug!(status = response.status().as_u16(), "Metadata server refused token");
        return Ok(None);
    }

    let token: MetadataToken = response
        .json()
        .await
        .context("Failed to parse metadata server token")?;
    let expires_at: Option<DateTime<Utc>> = token
        .expires_in
        .map(|secs| Utc::now() + Duration::seconds(secs));

    info!("Obtained platform credentials from metadata server");
    Ok(Some(Credentials {
        access_token: token.access_token,
        refresh_token: None,
        token_uri: metadata_url.to_string(),
        client_id: String::new(),
        client_secret: None,
        scopes: scopes.to_vec(),
        expires_at,
    }))
}

// ============================================================================
// GoogleOAuthBackend
// ============================================================================

/// Talks to Google's token endpoints, the metadata server and the browser
pub struct GoogleOAuthBackend {
    http: reqwest::Client,
    metadata_url: String,
}

impl GoogleOAuthBackend {
    pub fn new(metadata_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            metadata_url: metadata_url.into(),
        }
    }
}

#[async_trait::async_trait]
impl IOAuthBackend for GoogleOAuthBackend {
    async fn refresh(&self, credentials: &Credentials) -> Result<Credentials> {
        let refresh_token = credentials
            .refresh_token
            .as_deref()
            .context("Cached credentials have no refresh token")?;
        let flow = PKCEFlow::new(&OAuth2Config::from_credentials(credentials))?;
        flow.refresh_token(refresh_token).await
    }

    async fn silent(&self, scopes: &[String]) -> Result<Option<Credentials>> {
        fetch_metadata_token(&self.http, &self.metadata_url, scopes).await
    }

    /// Performs the full interactive OAuth2 PKCE consent flow
    ///
    /// 1. Binds the local callback server on an ephemeral port
    /// 2. Generates a PKCE-secured authorization URL
    /// 3. Opens the user's default browser to the consent page
    /// 4. Waits for the redirect and checks its state
    /// 5. Exchanges the authorization code for credentials
    async fn interactive(&self, secrets: &ClientSecrets, scopes: &[String]) -> Result<Credentials> {
        info!("Starting OAuth2 PKCE consent flow");

        let server = LocalCallbackServer::bind().await?;
        let config = OAuth2Config::from_secrets(secrets, scopes).with_redirect_uri(server.redirect_uri());
        let flow = PKCEFlow::new(&config)?;

        let (auth_url, csrf_token, pkce_verifier) = flow.generate_auth_url();

        info!(url = %auth_url, "Open this URL to authorize gbridge");
        if let Err(e) = webbrowser::open(&auth_url) {
            warn!("Failed to open browser, visit the URL manually: {}", e);
        }

        let code = server.wait_for_code(csrf_token.secret()).await?;
        let credentials = flow.exchange_code(code, pkce_verifier).await?;

        info!("OAuth2 PKCE consent completed successfully");
        Ok(credentials)
    }
}

// ============================================================================
// CredentialResolver
// ============================================================================

/// Inputs of [`CredentialResolver`]
#[derive(Debug, Clone, Default)]
pub struct ResolverSettings {
    /// Token file stem (or keyring username)
    pub stem: String,
    /// Scopes every returned credential must cover
    pub scopes: Vec<String>,
    /// `Some(false)` forbids the consent flow
    pub interactive: Option<bool>,
    /// Allow platform credentials when no client is configured
    pub silent_auth: bool,
    /// Client secrets JSON supplied inline
    pub client_info_json: Option<String>,
    /// Client secrets file
    pub client_file: Option<PathBuf>,
}

impl ResolverSettings {
    /// Settings from the auth configuration and `GOOGLE_OAUTH_CLIENT_INFO`
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            stem: config.token_stem.clone(),
            scopes: config.scopes.clone(),
            interactive: config.interactive,
            silent_auth: config.silent_auth,
            client_info_json: std::env::var(CLIENT_INFO_ENV)
                .ok()
                .filter(|v| !v.trim().is_empty()),
            client_file: config.client_file.clone(),
        }
    }

    fn has_client_info(&self) -> bool {
        self.client_info_json.is_some() || self.client_file.is_some()
    }
}

/// Summary of the cached credentials
#[derive(Debug, Clone, Serialize)]
pub struct AuthStatus {
    pub location: String,
    pub cached: bool,
    pub valid: bool,
    pub refreshable: bool,
    pub covers_scopes: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Picks the first usable credential source
pub struct CredentialResolver {
    store: Arc<dyn ITokenStore>,
    backend: Arc<dyn IOAuthBackend>,
    settings: ResolverSettings,
}

impl CredentialResolver {
    pub fn new(
        store: Arc<dyn ITokenStore>,
        backend: Arc<dyn IOAuthBackend>,
        settings: ResolverSettings,
    ) -> Self {
        Self {
            store,
            backend,
            settings,
        }
    }

    /// Resolves credentials covering the configured scopes
    ///
    /// Tries, in order: the cached token (refreshed when expired), platform
    /// credentials when no client is configured, then the consent flow
    /// unless interaction is disabled.
    #[tracing::instrument(skip(self), fields(stem = %self.settings.stem))]
    pub async fn resolve(&self) -> Result<Credentials, AuthError> {
        if let Some(credentials) = self.cached_credentials().await {
            return Ok(credentials);
        }

        if !self.settings.has_client_info() && self.settings.silent_auth {
            match self.backend.silent(&self.settings.scopes).await {
                Ok(Some(credentials)) if credentials.covers(&self.settings.scopes) => {
                    info!("Using platform credentials");
                    return Ok(credentials);
                }
                Ok(Some(_)) => debug!("Platform credentials lack required scopes"),
                Ok(None) => debug!("No platform credentials available"),
                Err(e) => warn!("Platform credential lookup failed: {:#}", e),
            }
        }

        if self.settings.interactive == Some(false) {
            return Err(AuthError::InteractionRequired {
                location: self.store.location(&self.settings.stem),
            });
        }

        self.consent().await
    }

    /// Runs the consent flow regardless of the cache
    pub async fn login(&self) -> Result<Credentials, AuthError> {
        self.consent().await
    }

    /// Removes the cached credentials
    pub fn logout(&self) -> Result<(), AuthError> {
        self.store.clear(&self.settings.stem)?;
        Ok(())
    }

    /// Describes the cached credentials without contacting any server
    pub fn status(&self) -> Result<AuthStatus, AuthError> {
        let cached = self.store.load(&self.settings.stem)?;
        Ok(AuthStatus {
            location: self.store.location(&self.settings.stem),
            cached: cached.is_some(),
            valid: cached.as_ref().is_some_and(Credentials::is_valid),
            refreshable: cached.as_ref().is_some_and(Credentials::can_refresh),
            covers_scopes: cached
                .as_ref()
                .is_some_and(|c| c.covers(&self.settings.scopes)),
            expires_at: cached.and_then(|c| c.expires_at),
        })
    }

    async fn cached_credentials(&self) -> Option<Credentials> {
        let cached = match self.store.load(&self.settings.stem) {
            Ok(cached) => cached?,
            Err(e) => {
                warn!("Ignoring unreadable token cache: {:#}", e);
                return None;
            }
        };

        if !cached.covers(&self.settings.scopes) {
            debug!("Cached token lacks required scopes");
            return None;
        }
        if cached.is_valid() {
            debug!("Using cached token");
            return Some(cached);
        }
        if !cached.can_refresh() {
            debug!("Cached token expired and cannot be refreshed");
            return None;
        }

        match self.backend.refresh(&cached).await {
            Ok(refreshed) => {
                self.persist(&refreshed);
                Some(refreshed)
            }
            Err(e) => {
                warn!("Token refresh failed: {:#}", e);
                None
            }
        }
    }

    async fn consent(&self) -> Result<Credentials, AuthError> {
        let secrets = self.client_secrets()?;
        let credentials = self
            .backend
            .interactive(&secrets, &self.settings.scopes)
            .await?;
        self.persist(&credentials);
        Ok(credentials)
    }

    fn persist(&self, credentials: &Credentials) {
        if let Err(e) = self.store.save(&self.settings.stem, credentials) {
            warn!("Failed to cache token: {:#}", e);
        }
    }

    fn client_secrets(&self) -> Result<ClientSecrets, AuthError> {
        if let Some(json) = &self.settings.client_info_json {
            return ClientSecrets::from_json(json)
                .map_err(|e| AuthError::InvalidClientSecrets(format!("{CLIENT_INFO_ENV}: {e}")));
        }
        let path = self
            .settings
            .client_file
            .as_ref()
            .ok_or(AuthError::ClientSecretsMissing)?;
        let json = std::fs::read_to_string(path)
            .map_err(|e| AuthError::InvalidClientSecrets(format!("{}: {e}", path.display())))?;
        ClientSecrets::from_json(&json)
            .map_err(|e| AuthError::InvalidClientSecrets(format!("{}: {e}", path.display())))
    }
}
