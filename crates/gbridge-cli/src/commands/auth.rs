//! Auth commands - Login, Logout, and Status for the Google account
//!
//! 1. `login`  - Runs the browser consent flow and caches the token.
//! 2. `logout` - Removes the cached token.
//! 3. `status` - Shows whether the cached token is usable.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use tracing::info;

use gbridge_google::auth::ResolverSettings;

use super::CliContext;
use crate::output::OutputFormat;

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Authorize gbridge through the browser
    Login {
        /// Client secrets JSON downloaded from the Cloud console
        #[arg(long)]
        client_file: Option<PathBuf>,
    },
    /// Remove stored credentials
    Logout,
    /// Check authorization status
    Status,
}

impl AuthCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        match self {
            AuthCommand::Login { client_file } => self.execute_login(ctx, client_file.clone()).await,
            AuthCommand::Logout => self.execute_logout(ctx),
            AuthCommand::Status => self.execute_status(ctx),
        }
    }

    async fn execute_login(&self, ctx: &CliContext, client_file: Option<PathBuf>) -> Result<()> {
        let fmt = ctx.formatter();
        let mut settings = ResolverSettings::from_config(&ctx.config.auth);
        if let Some(path) = client_file {
            settings.client_file = Some(path);
            settings.client_info_json = None;
        }
        let resolver = ctx.resolver(settings);

        info!("Starting OAuth2 login");
        fmt.info("Opening browser for Google consent...");
        let credentials = resolver.login().await.context("OAuth2 login failed")?;

        let status = resolver.status()?;
        fmt.success(&format!("Authorized; token cached at {}", status.location));
        if let Some(expires_at) = credentials.expires_at {
            fmt.info(&format!("Access token expires at {}", expires_at.to_rfc3339()));
        }
        fmt.info(&format!("Scopes: {}", credentials.scopes.join(" ")));
        Ok(())
    }

    fn execute_logout(&self, ctx: &CliContext) -> Result<()> {
        let fmt = ctx.formatter();
        let resolver = ctx.resolver(ResolverSettings::from_config(&ctx.config.auth));
        let status = resolver.status()?;
        if !status.cached {
            fmt.info("No cached token. Nothing to log out.");
            return Ok(());
        }
        resolver.logout().context("Failed to remove cached token")?;
        fmt.success(&format!("Removed cached token at {}", status.location));
        Ok(())
    }

    fn execute_status(&self, ctx: &CliContext) -> Result<()> {
        let fmt = ctx.formatter();
        let resolver = ctx.resolver(ResolverSettings::from_config(&ctx.config.auth));
        let status = resolver.status()?;

        if ctx.format == OutputFormat::Json {
            fmt.print_json(&serde_json::to_value(&status)?);
            return Ok(());
        }

        if !status.cached {
            fmt.warn("Not authorized. Run 'gbridge auth login'.");
            fmt.info(&format!("Token location: {}", status.location));
            return Ok(());
        }

        if status.valid && status.covers_scopes {
            fmt.success("Authorized");
        } else if status.refreshable && status.covers_scopes {
            fmt.success("Authorized (access token will be refreshed on next use)");
        } else if !status.covers_scopes {
            fmt.warn("Cached token lacks required scopes. Run 'gbridge auth login'.");
        } else {
            fmt.warn("Cached token expired. Run 'gbridge auth login'.");
        }
        fmt.info(&format!("Token location: {}", status.location));
        if let Some(expires_at) = status.expires_at {
            fmt.info(&format!("Expires: {}", expires_at.to_rfc3339()));
        }
        Ok(())
    }
}
