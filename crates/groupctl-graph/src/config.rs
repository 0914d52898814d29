//! Connection settings for Microsoft Graph.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::{GraphError, GraphResult};

/// Sovereign cloud the tenant lives in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloudEnvironment {
    /// Worldwide commercial cloud.
    #[default]
    Commercial,
    /// US Government (GCC High / DoD).
    UsGovernment,
    /// China (operated by 21Vianet).
    China,
    /// Germany.
    Germany,
}

impl CloudEnvironment {
    /// Azure AD login endpoint, without trailing slash.
    #[must_use]
    pub fn login_endpoint(&self) -> &'static str {
        match self {
            Self::Commercial => "https://login.microsoftonline.com",
            Self::UsGovernment => "https://login.microsoftonline.us",
            Self::China => "https://login.chinacloudapi.cn",
            Self::Germany => "https://login.microsoftonline.de",
        }
    }

    /// Graph API endpoint, without trailing slash.
    #[must_use]
    pub fn graph_endpoint(&self) -> &'static str {
        match self {
            Self::Commercial => "https://graph.microsoft.com",
            Self::UsGovernment => "https://graph.microsoft.us",
            Self::China => "https://microsoftgraph.chinacloudapi.cn",
            Self::Germany => "https://graph.microsoft.de",
        }
    }
}

impl fmt::Display for CloudEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Commercial => "commercial",
            Self::UsGovernment => "us_government",
            Self::China => "china",
            Self::Germany => "germany",
        };
        f.write_str(name)
    }
}

impl FromStr for CloudEnvironment {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "commercial" | "global" | "public" => Ok(Self::Commercial),
            "us_government" | "usgov" | "gcchigh" => Ok(Self::UsGovernment),
            "china" => Ok(Self::China),
            "germany" => Ok(Self::Germany),
            other => Err(GraphError::Config(format!(
                "Unknown cloud environment '{other}'. Expected commercial, us_government, china or germany"
            ))),
        }
    }
}

/// App registration used for the client-credentials flow.
#[derive(Debug, Clone)]
pub struct GraphCredentials {
    pub client_id: String,
    pub client_secret: SecretString,
}

/// Validated Graph connection settings.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub tenant_id: String,
    pub cloud: CloudEnvironment,
    pub api_version: String,
    pub page_size: u32,
    pub max_retries: u32,
    pub timeout: Duration,
    /// Replaces the cloud's Graph endpoint (proxies, test doubles).
    pub graph_url: Option<String>,
    /// Replaces the cloud's login endpoint.
    pub login_url: Option<String>,
}

impl GraphConfig {
    /// Starts a builder with defaults for everything but the tenant.
    #[must_use]
    pub fn builder() -> GraphConfigBuilder {
        GraphConfigBuilder::default()
    }

    /// Graph endpoint in effect, without trailing slash.
    #[must_use]
    pub fn graph_endpoint(&self) -> String {
        self.graph_url
            .as_deref()
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| self.cloud.graph_endpoint().to_string())
    }

    /// Login endpoint in effect, without trailing slash.
    #[must_use]
    pub fn login_endpoint(&self) -> String {
        self.login_url
            .as_deref()
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| self.cloud.login_endpoint().to_string())
    }

    /// Versioned API root, e.g. `https://graph.microsoft.com/v1.0`.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("{}/{}", self.graph_endpoint(), self.api_version)
    }

    /// Token endpoint for the configured tenant.
    #[must_use]
    pub fn token_url(&self) -> String {
        format!("{}/{}/oauth2/v2.0/token", self.login_endpoint(), self.tenant_id)
    }

    /// Client-credentials scope. Always the cloud's canonical Graph resource.
    #[must_use]
    pub fn scope(&self) -> String {
        format!("{}/.default", self.cloud.graph_endpoint())
    }
}

/// Builder for [`GraphConfig`].
#[derive(Debug, Clone)]
pub struct GraphConfigBuilder {
    tenant_id: Option<String>,
    cloud: CloudEnvironment,
    api_version: String,
    page_size: u32,
    max_retries: u32,
    timeout: Duration,
    graph_url: Option<String>,
    login_url: Option<String>,
}

impl Default for GraphConfigBuilder {
    fn default() -> Self {
        Self {
            tenant_id: None,
            cloud: CloudEnvironment::Commercial,
            api_version: "v1.0".to_string(),
            page_size: 100,
            max_retries: 3,
            timeout: Duration::from_secs(30),
            graph_url: None,
            login_url: None,
        }
    }
}

impl GraphConfigBuilder {
    #[must_use]
    pub fn tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    #[must_use]
    pub fn cloud(mut self, cloud: CloudEnvironment) -> Self {
        self.cloud = cloud;
        self
    }

    #[must_use]
    pub fn api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    #[must_use]
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    #[must_use]
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn graph_url(mut self, url: Option<String>) -> Self {
        self.graph_url = url;
        self
    }

    #[must_use]
    pub fn login_url(mut self, url: Option<String>) -> Self {
        self.login_url = url;
        self
    }

    /// Validates and builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::Config` when the tenant is missing, the page size
    /// is outside 1..=999, or an endpoint override is not an absolute URL.
    pub fn build(self) -> GraphResult<GraphConfig> {
        let tenant_id = self
            .tenant_id
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| GraphError::Config("tenant_id is required".into()))?;

        if !(1..=999).contains(&self.page_size) {
            return Err(GraphError::Config(format!(
                "page_size must be between 1 and 999, got {}",
                self.page_size
            )));
        }

        if self.api_version.trim().is_empty() {
            return Err(GraphError::Config("api_version must not be empty".into()));
        }

        for endpoint in [&self.graph_url, &self.login_url].into_iter().flatten() {
            url::Url::parse(endpoint)?;
        }

        Ok(GraphConfig {
            tenant_id,
            cloud: self.cloud,
            api_version: self.api_version,
            page_size: self.page_size,
            max_retries: self.max_retries,
            timeout: self.timeout,
            graph_url: self.graph_url,
            login_url: self.login_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = GraphConfig::builder().tenant_id("contoso").build().unwrap();
        assert_eq!(config.base_url(), "https://graph.microsoft.com/v1.0");
        assert_eq!(
            config.token_url(),
            "https://login.microsoftonline.com/contoso/oauth2/v2.0/token"
        );
        assert_eq!(config.scope(), "https://graph.microsoft.com/.default");
        assert_eq!(config.page_size, 100);
    }

    #[test]
    fn test_builder_requires_tenant() {
        assert!(GraphConfig::builder().build().is_err());
        assert!(GraphConfig::builder().tenant_id("  ").build().is_err());
    }

    #[test]
    fn test_builder_rejects_page_size() {
        let result = GraphConfig::builder()
            .tenant_id("t")
            .page_size(1000)
            .build();
        assert!(matches!(result, Err(GraphError::Config(_))));
    }

    #[test]
    fn test_endpoint_overrides() {
        let config = GraphConfig::builder()
            .tenant_id("t")
            .cloud(CloudEnvironment::China)
            .graph_url(Some("http://127.0.0.1:8080/".into()))
            .login_url(Some("http://127.0.0.1:8081".into()))
            .build()
            .unwrap();
        assert_eq!(config.base_url(), "http://127.0.0.1:8080/v1.0");
        assert_eq!(
            config.token_url(),
            "http://127.0.0.1:8081/t/oauth2/v2.0/token"
        );
        assert_eq!(config.scope(), "https://microsoftgraph.chinacloudapi.cn/.default");
    }

    #[test]
    fn test_invalid_override_rejected() {
        let result = GraphConfig::builder()
            .tenant_id("t")
            .graph_url(Some("not a url".into()))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_cloud_from_str() {
        assert_eq!(
            "US-Government".parse::<CloudEnvironment>().unwrap(),
            CloudEnvironment::UsGovernment
        );
        assert_eq!("china".parse::<CloudEnvironment>().unwrap(), CloudEnvironment::China);
        assert!("mars".parse::<CloudEnvironment>().is_err());
    }

    #[test]
    fn test_cloud_display_matches_serde() {
        let json = serde_json::to_string(&CloudEnvironment::UsGovernment).unwrap();
        assert_eq!(json, "\"us_government\"");
        assert_eq!(CloudEnvironment::UsGovernment.to_string(), "us_government");
    }
}
