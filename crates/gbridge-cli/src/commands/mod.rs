//! CLI subcommands

pub mod auth;
pub mod completions;
pub mod config;
pub mod docs;
pub mod drive;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use gbridge_core::config::Config;
use gbridge_core::domain::ItemId;
use gbridge_google::auth::{
    token_store_for, CredentialResolver, GoogleOAuthBackend, ResolverSettings,
};
use gbridge_google::client::GoogleClient;

use crate::output::{get_formatter, OutputFormat, OutputFormatter};

/// Settings shared by every subcommand
pub struct CliContext {
    pub config: Config,
    pub config_path: PathBuf,
    pub format: OutputFormat,
    pub quiet: bool,
}

impl CliContext {
    pub fn formatter(&self) -> Box<dyn OutputFormatter> {
        get_formatter(self.format, self.quiet)
    }

    /// Credential resolver for the configured account
    pub fn resolver(&self, settings: ResolverSettings) -> CredentialResolver {
        CredentialResolver::new(
            token_store_for(&self.config.auth),
            Arc::new(GoogleOAuthBackend::new(self.config.auth.metadata_url.clone())),
            settings,
        )
    }

    /// An API client carrying resolved credentials
    pub async fn client(&self) -> Result<Arc<GoogleClient>> {
        let resolver = self.resolver(ResolverSettings::from_config(&self.config.auth));
        let credentials = resolver
            .resolve()
            .await
            .context("Could not obtain Google credentials")?;
        debug!(expires_at = ?credentials.expires_at, "Resolved credentials");
        Ok(Arc::new(
            GoogleClient::new(credentials.access_token)
                .with_max_retries(self.config.api.max_retries),
        ))
    }
}

/// Parses a remote id given on the command line
pub fn parse_item_id(value: &str) -> Result<ItemId> {
    ItemId::new(value).with_context(|| format!("Invalid id '{value}'"))
}
