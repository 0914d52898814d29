//! Tenant organization details.

use serde::{Deserialize, Serialize};

use crate::odata::ODataResponse;
use crate::{GraphClient, GraphError, GraphResult};

/// A verified domain of the tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedDomain {
    pub name: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub is_initial: bool,
}

/// The tenant organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: String,
    pub display_name: Option<String>,
    #[serde(default)]
    pub verified_domains: Vec<VerifiedDomain>,
}

impl Organization {
    /// The default verified domain, if any.
    #[must_use]
    pub fn default_domain(&self) -> Option<&str> {
        self.verified_domains
            .iter()
            .find(|d| d.is_default)
            .map(|d| d.name.as_str())
    }
}

impl GraphClient {
    /// Fetches the tenant organization; doubles as a credentials check.
    pub async fn organization(&self) -> GraphResult<Organization> {
        let url = self.url("/organization?$select=id,displayName,verifiedDomains");
        let mut response: ODataResponse<Organization> = self.get(&url).await?;
        if response.value.is_empty() {
            return Err(GraphError::NotFound("organization".into()));
        }
        Ok(response.value.remove(0))
    }
}
