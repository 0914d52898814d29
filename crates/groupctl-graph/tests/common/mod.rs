//! Common test utilities for groupctl-graph integration tests.

#![allow(dead_code)]

use groupctl_graph::{GraphClient, GraphConfig, GraphCredentials};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TENANT: &str = "test-tenant";

/// Test data factory for directory users.
pub fn create_test_user(id: &str, email_prefix: &str) -> Value {
    json!({
        "id": id,
        "displayName": format!("Test User {}", email_prefix),
        "mail": format!("{}@contoso.com", email_prefix),
        "userPrincipalName": format!("{}@contoso.onmicrosoft.com", email_prefix),
        "mailNickname": email_prefix,
        "otherMails": [],
        "proxyAddresses": [format!("SMTP:{}@contoso.com", email_prefix)],
        "accountEnabled": true
    })
}

/// Test data factory for member listings (carry an `@odata.type`).
pub fn create_test_member(id: &str, email_prefix: &str) -> Value {
    let mut user = create_test_user(id, email_prefix);
    user["@odata.type"] = json!("#microsoft.graph.user");
    user
}

/// Test data factory for Microsoft 365 groups.
pub fn create_m365_group(id: &str, nickname: &str) -> Value {
    json!({
        "id": id,
        "displayName": format!("{} Team", nickname),
        "mail": format!("{}@contoso.com", nickname),
        "mailNickname": nickname,
        "groupTypes": ["Unified"],
        "securityEnabled": false,
        "mailEnabled": true,
        "proxyAddresses": [format!("SMTP:{}@contoso.com", nickname)],
        "hideFromAddressLists": false
    })
}

/// Test data factory for security groups.
pub fn create_security_group(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "displayName": name,
        "mailNickname": name.to_lowercase(),
        "groupTypes": [],
        "securityEnabled": true,
        "mailEnabled": false
    })
}

/// Wraps items in an OData collection.
pub fn create_odata_response(items: Vec<Value>, next_link: Option<&str>) -> Value {
    let mut response = json!({ "value": items });
    if let Some(link) = next_link {
        response["@odata.nextLink"] = json!(link);
    }
    response
}

/// Creates an OData error response.
pub fn create_odata_error(code: &str, message: &str) -> Value {
    json!({
        "error": {
            "code": code,
            "message": message
        }
    })
}

/// Mock server standing in for both the token endpoint and Graph.
pub struct MockGraphServer {
    pub server: MockServer,
}

impl MockGraphServer {
    pub async fn new() -> Self {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/{TENANT}/oauth2/v2.0/token")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "test-token",
                "token_type": "Bearer",
                "expires_in": 3600
            })))
            .mount(&server)
            .await;
        Self { server }
    }

    pub fn url(&self) -> String {
        self.server.uri()
    }

    pub fn config(&self) -> GraphConfig {
        GraphConfig::builder()
            .tenant_id(TENANT)
            .max_retries(2)
            .graph_url(Some(self.url()))
            .login_url(Some(self.url()))
            .build()
            .expect("valid test config")
    }

    pub fn client(&self) -> GraphClient {
        GraphClient::new(&self.config(), credentials()).expect("client")
    }
}

pub fn credentials() -> GraphCredentials {
    GraphCredentials {
        client_id: "client-id".to_string(),
        client_secret: "client-secret".to_string().into(),
    }
}
