//! CLI command implementations

pub mod check;
pub mod config;
pub mod groups;
pub mod members;
pub mod resolve;

use std::path::PathBuf;

use dialoguer::Confirm;
use groupctl_graph::GraphClient;

use crate::config::{Config, ConfigPaths};
use crate::error::{CliError, CliResult};

/// Settings shared by every command for one run
#[derive(Debug, Clone)]
pub struct Context {
    pub paths: ConfigPaths,
    /// File holding the client secret
    pub secret_file: Option<PathBuf>,
    /// Suppress progress bars and informational output
    pub quiet: bool,
}

impl Context {
    pub fn new(secret_file: Option<PathBuf>, quiet: bool) -> CliResult<Self> {
        Ok(Self {
            paths: ConfigPaths::new()?,
            secret_file,
            quiet,
        })
    }

    /// Effective configuration (file plus environment)
    pub fn config(&self) -> CliResult<Config> {
        Config::load(&self.paths)
    }

    /// Graph client for the configured tenant. Fails before any remote call
    /// when tenant, client id or secret are missing.
    pub fn client(&self) -> CliResult<GraphClient> {
        let config = self.config()?;
        let graph_config = config.graph_config()?;
        let credentials = config.credentials(self.secret_file.as_deref())?;
        GraphClient::new(&graph_config, credentials).map_err(CliError::from)
    }

    /// Progress bars go to stderr; only draw them on a terminal
    pub fn show_progress(&self) -> bool {
        !self.quiet && atty::is(atty::Stream::Stderr)
    }
}

/// Ask before a destructive action unless `force` is set.
///
/// Returns `Ok(false)` when the user declines.
pub fn confirm(prompt: &str, force: bool) -> CliResult<bool> {
    if force {
        return Ok(true);
    }

    if !atty::is(atty::Stream::Stdin) {
        return Err(CliError::Validation(
            "Cannot confirm in non-interactive mode. Use --force to skip confirmation.".to_string(),
        ));
    }

    let confirmed = Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?;
    Ok(confirmed)
}
