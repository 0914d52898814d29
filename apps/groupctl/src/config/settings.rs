//! Persistent CLI settings and the Graph connection they describe

use std::path::Path;
use std::time::Duration;

use groupctl_graph::{CloudEnvironment, GraphConfig, GraphCredentials};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use super::ConfigPaths;
use crate::error::{CliError, CliResult};

pub const TENANT_ID_ENV: &str = "GROUPCTL_TENANT_ID";
pub const CLIENT_ID_ENV: &str = "GROUPCTL_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "GROUPCTL_CLIENT_SECRET";
pub const CLIENT_SECRET_FILE_ENV: &str = "GROUPCTL_CLIENT_SECRET_FILE";
pub const CLOUD_ENV: &str = "GROUPCTL_CLOUD";
pub const GRAPH_URL_ENV: &str = "GROUPCTL_GRAPH_URL";
pub const LOGIN_URL_ENV: &str = "GROUPCTL_LOGIN_URL";

/// Contents of `config.json`. The client secret is never stored here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub cloud: CloudEnvironment,
    pub api_version: String,
    pub timeout_secs: u64,
    pub page_size: u32,
    pub max_retries: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tenant_id: None,
            client_id: None,
            cloud: CloudEnvironment::Commercial,
            api_version: "v1.0".to_string(),
            timeout_secs: 30,
            page_size: 100,
            max_retries: 3,
            graph_url: None,
            login_url: None,
        }
    }
}

impl Config {
    /// Load the config file (defaults when absent) with environment overrides applied
    pub fn load(paths: &ConfigPaths) -> CliResult<Self> {
        let mut config = Self::load_file(paths)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load the config file alone
    pub fn load_file(paths: &ConfigPaths) -> CliResult<Self> {
        if !paths.config_file.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&paths.config_file)?;
        serde_json::from_str(&content).map_err(|e| {
            CliError::Config(format!(
                "Invalid config file {}: {}",
                paths.config_file.display(),
                e
            ))
        })
    }

    /// Write the config file, creating the directory if needed
    pub fn save(&self, paths: &ConfigPaths) -> CliResult<()> {
        paths.ensure_dir_exists()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&paths.config_file, content)?;
        Ok(())
    }

    /// Apply `GROUPCTL_*` overrides read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> CliResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(tenant_id) = get(TENANT_ID_ENV) {
            self.tenant_id = Some(tenant_id);
        }
        if let Some(client_id) = get(CLIENT_ID_ENV) {
            self.client_id = Some(client_id);
        }
        if let Some(cloud) = get(CLOUD_ENV) {
            self.cloud = cloud.parse()?;
        }
        if let Some(url) = get(GRAPH_URL_ENV) {
            self.graph_url = Some(url);
        }
        if let Some(url) = get(LOGIN_URL_ENV) {
            self.login_url = Some(url);
        }
        Ok(())
    }

    /// Validated Graph settings
    pub fn graph_config(&self) -> CliResult<GraphConfig> {
        let tenant_id = self
            .tenant_id
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| CliError::NotConfigured("tenant id is not set".to_string()))?;

        GraphConfig::builder()
            .tenant_id(tenant_id)
            .cloud(self.cloud)
            .api_version(self.api_version.clone())
            .page_size(self.page_size)
            .max_retries(self.max_retries)
            .timeout(Duration::from_secs(self.timeout_secs))
            .graph_url(self.graph_url.clone())
            .login_url(self.login_url.clone())
            .build()
            .map_err(CliError::from)
    }

    /// App credentials; the secret comes from the environment or `secret_file`
    pub fn credentials(&self, secret_file: Option<&Path>) -> CliResult<GraphCredentials> {
        let client_id = self
            .client_id
            .clone()
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| CliError::NotConfigured("client id is not set".to_string()))?;

        let client_secret = load_client_secret(|key| std::env::var(key).ok(), secret_file)?
            .ok_or_else(|| {
                CliError::NotConfigured(format!(
                    "client secret is not set (use {CLIENT_SECRET_ENV} or --secret-file)"
                ))
            })?;

        Ok(GraphCredentials {
            client_id,
            client_secret,
        })
    }
}

/// Reads the client secret: the environment variable wins over the file.
pub fn load_client_secret<F>(lookup: F, secret_file: Option<&Path>) -> CliResult<Option<SecretString>>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(secret) = lookup(CLIENT_SECRET_ENV).filter(|s| !s.is_empty()) {
        return Ok(Some(secret.into()));
    }

    let Some(path) = secret_file else {
        return Ok(None);
    };
    let content = std::fs::read_to_string(path).map_err(|e| {
        CliError::Config(format!("Cannot read secret file {}: {}", path.display(), e))
    })?;
    let secret = content.trim();
    if secret.is_empty() {
        return Err(CliError::Config(format!(
            "Secret file {} is empty",
            path.display()
        )));
    }
    Ok(Some(secret.to_string().into()))
}
