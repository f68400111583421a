//! Configuration module for gbridge.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Environment variable holding the OAuth client secrets JSON inline.
pub const CLIENT_INFO_ENV: &str = "GOOGLE_OAUTH_CLIENT_INFO";

/// Environment variable overriding `auth.token_dir`.
pub const TOKEN_DIR_ENV: &str = "GOOGLE_OAUTH_TOKEN_DIR";

/// Scopes requested when the configuration does not list any.
pub const DEFAULT_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/gmail.send",
    "https://www.googleapis.com/auth/drive",
    "https://www.googleapis.com/auth/documents",
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/calendar",
    "https://www.googleapis.com/auth/tasks",
    "https://www.googleapis.com/auth/forms",
];

/// Largest number of requests the batch endpoint accepts in one call.
pub const MAX_BATCH_SIZE_LIMIT: usize = 100;

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for gbridge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub auth: AuthConfig,
    pub api: ApiConfig,
    pub logging: LoggingConfig,
}

/// Where cached credentials live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStorage {
    /// JSON file under `auth.token_dir`
    File,
    /// System keyring (Secret Service on Linux)
    Keyring,
}

/// Authentication / OAuth settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Path to the client secrets JSON. `None` falls back to `GOOGLE_OAUTH_CLIENT_INFO`.
    pub client_file: Option<PathBuf>,
    /// Directory holding token files.
    pub token_dir: PathBuf,
    /// Token file stem (and keyring username).
    pub token_stem: String,
    pub token_storage: TokenStorage,
    /// `Some(false)` forbids the browser consent flow.
    pub interactive: Option<bool>,
    /// Try platform credentials (metadata server) when no client is configured.
    pub silent_auth: bool,
    /// URL of the metadata server token endpoint used for silent auth.
    pub metadata_url: String,
    /// OAuth scopes to request.
    pub scopes: Vec<String>,
}

/// Remote API endpoints and request shaping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub drive_base_url: String,
    pub docs_base_url: String,
    /// Drive batch endpoint.
    pub batch_url: String,
    /// Retries after a 429 or 503 response.
    pub max_retries: u32,
    /// Copies per batch request (1..=100).
    pub max_batch_size: usize,
    /// Items per listing page (1..=1000).
    pub page_size: u32,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    pub format: LogFormat,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/gbridge/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("gbridge")
            .join("config.yaml")
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> anyhow::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

impl AuthConfig {
    /// Token directory, with `GOOGLE_OAUTH_TOKEN_DIR` taking precedence.
    pub fn effective_token_dir(&self) -> PathBuf {
        std::env::var_os(TOKEN_DIR_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| self.token_dir.clone())
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            client_file: None,
            token_dir: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("~/.local/share"))
                .join("gbridge"),
            token_stem: "gbridge_token".to_string(),
            token_storage: TokenStorage::File,
            interactive: None,
            silent_auth: false,
            metadata_url:
                "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token"
                    .to_string(),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            drive_base_url: "https://www.googleapis.com/drive/v3".to_string(),
            docs_base_url: "https://docs.googleapis.com/v1".to_string(),
            batch_url: "https://www.googleapis.com/batch/drive/v3".to_string(),
            max_retries: 3,
            max_batch_size: MAX_BATCH_SIZE_LIMIT,
            page_size: 1000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"api.max_batch_size"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

fn is_http_url(s: &str) -> bool {
    s.starts_with("https://") || s.starts_with("http://")
}

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- auth ---
        if self.auth.token_stem.trim().is_empty() {
            errors.push(ValidationError {
                field: "auth.token_stem".into(),
                message: "must not be empty".into(),
            });
        } else if self.auth.token_stem.contains(['/', '\\']) {
            errors.push(ValidationError {
                field: "auth.token_stem".into(),
                message: "must not contain path separators".into(),
            });
        }
        if self.auth.scopes.is_empty() {
            errors.push(ValidationError {
                field: "auth.scopes".into(),
                message: "at least one scope is required".into(),
            });
        }
        if let Some(client_file) = &self.auth.client_file {
            let s = client_file.to_string_lossy();
            if !s.starts_with('~') && !client_file.exists() {
                errors.push(ValidationError {
                    field: "auth.client_file".into(),
                    message: format!("file does not exist: {}", client_file.display()),
                });
            }
        }
        if self.auth.silent_auth && !is_http_url(&self.auth.metadata_url) {
            errors.push(ValidationError {
                field: "auth.metadata_url".into(),
                message: format!("not an http(s) URL: '{}'", self.auth.metadata_url),
            });
        }

        // --- api ---
        for (field, url) in [
            ("api.drive_base_url", &self.api.drive_base_url),
            ("api.docs_base_url", &self.api.docs_base_url),
            ("api.batch_url", &self.api.batch_url),
        ] {
            if !is_http_url(url) {
                errors.push(ValidationError {
                    field: field.into(),
                    message: format!("not an http(s) URL: '{url}'"),
                });
            }
        }
        if self.api.max_batch_size == 0 || self.api.max_batch_size > MAX_BATCH_SIZE_LIMIT {
            errors.push(ValidationError {
                field: "api.max_batch_size".into(),
                message: format!("must be in range 1..={MAX_BATCH_SIZE_LIMIT}"),
            });
        }
        if self.api.page_size == 0 || self.api.page_size > 1000 {
            errors.push(ValidationError {
                field: "api.page_size".into(),
                message: "must be in range 1..=1000".into(),
            });
        }
        if self.api.max_retries > 10 {
            errors.push(ValidationError {
                field: "api.max_retries".into(),
                message: "must not exceed 10".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use gbridge_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .token_stem("work_account")
///     .max_batch_size(50)
///     .logging_level("debug")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- auth ---

    pub fn client_file(mut self, path: PathBuf) -> Self {
        self.config.auth.client_file = Some(path);
        self
    }

    pub fn token_dir(mut self, dir: PathBuf) -> Self {
        self.config.auth.token_dir = dir;
        self
    }

    pub fn token_stem(mut self, stem: impl Into<String>) -> Self {
        self.config.auth.token_stem = stem.into();
        self
    }

    pub fn token_storage(mut self, storage: TokenStorage) -> Self {
        self.config.auth.token_storage = storage;
        self
    }

    pub fn interactive(mut self, interactive: bool) -> Self {
        self.config.auth.interactive = Some(interactive);
        self
    }

    pub fn silent_auth(mut self, enabled: bool) -> Self {
        self.config.auth.silent_auth = enabled;
        self
    }

    pub fn scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.auth.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    // --- api ---

    pub fn drive_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api.drive_base_url = url.into();
        self
    }

    pub fn docs_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api.docs_base_url = url.into();
        self
    }

    pub fn batch_url(mut self, url: impl Into<String>) -> Self {
        self.config.api.batch_url = url.into();
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.api.max_retries = n;
        self
    }

    pub fn max_batch_size(mut self, n: usize) -> Self {
        self.config.api.max_batch_size = n;
        self
    }

    pub fn page_size(mut self, n: u32) -> Self {
        self.config.api.page_size = n;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn logging_format(mut self, format: LogFormat) -> Self {
        self.config.logging.format = format;
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
