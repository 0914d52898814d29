//! Shared harness for end-to-end CLI tests.
//!
//! Each test gets a mock server standing in for both the token endpoint and
//! Graph, plus an isolated configuration directory. The binary is pointed at
//! both through `GROUPCTL_*` environment variables.

#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Command, Output};

use groupctl_graph::{user_filter, Identifier};
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TENANT: &str = "test-tenant";

pub struct TestContext {
    pub server: MockServer,
    pub dir: TempDir,
}

impl TestContext {
    /// Server with a working token endpoint
    pub async fn new() -> Self {
        let ctx = Self::without_token().await;
        Mock::given(method("POST"))
            .and(path(format!("/{TENANT}/oauth2/v2.0/token")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "test-token",
                "token_type": "Bearer",
                "expires_in": 3600
            })))
            .mount(&ctx.server)
            .await;
        ctx
    }

    /// Server with nothing mounted
    pub async fn without_token() -> Self {
        Self {
            server: MockServer::start().await,
            dir: TempDir::new().expect("temp dir"),
        }
    }

    pub fn config_dir(&self) -> PathBuf {
        self.dir.path().join("config")
    }

    /// `groupctl` with a clean, fully configured environment
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_groupctl"));
        cmd.env("GROUPCTL_CONFIG_DIR", self.config_dir())
            .env("GROUPCTL_TENANT_ID", TENANT)
            .env("GROUPCTL_CLIENT_ID", "client-id")
            .env("GROUPCTL_CLIENT_SECRET", "client-secret")
            .env("GROUPCTL_GRAPH_URL", self.server.uri())
            .env("GROUPCTL_LOGIN_URL", self.server.uri())
            .env("NO_COLOR", "1")
            .env_remove("GROUPCTL_CLIENT_SECRET_FILE")
            .env_remove("GROUPCTL_CLOUD")
            .env_remove("GROUPCTL_LOG");
        cmd
    }

    /// Run the binary off the async runtime so the mock server keeps serving
    pub async fn run(&self, args: &[&str]) -> Output {
        let mut cmd = self.command();
        cmd.args(args);
        run_command(cmd).await
    }

    /// Write a file into the test directory
    pub fn write_file(&self, name: &str, content: &str) -> PathBuf {
        let file = self.dir.path().join(name);
        std::fs::write(&file, content).expect("write test file");
        file
    }

    pub fn path_in_dir(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Number of requests the server saw, token requests included
    pub async fn request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|r| r.len())
            .unwrap_or_default()
    }

    /// Every `GET /groups` lookup answers with `groups`
    pub async fn mock_group_search(&self, groups: Vec<Value>) {
        Mock::given(method("GET"))
            .and(path("/v1.0/groups"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(create_odata_response(groups, None)),
            )
            .mount(&self.server)
            .await;
    }

    /// Direct members of `group_id`
    pub async fn mock_members(&self, group_id: &str, members: Vec<Value>) {
        Mock::given(method("GET"))
            .and(path(format!("/v1.0/groups/{group_id}/members")))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(create_odata_response(members, None)),
            )
            .mount(&self.server)
            .await;
    }

    /// User search for one identifier
    pub async fn mock_user_lookup(&self, identifier: &str, users: Vec<Value>) {
        let identifier = Identifier::parse(identifier).expect("valid identifier");
        let filter = user_filter(&identifier).expect("filterable identifier");
        Mock::given(method("GET"))
            .and(path("/v1.0/users"))
            .and(query_param("$filter", filter.as_str()))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(create_odata_response(users, None)),
            )
            .mount(&self.server)
            .await;
    }

    /// Any other user search finds nothing
    pub async fn mock_no_other_users(&self) {
        Mock::given(method("GET"))
            .and(path("/v1.0/users"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(create_odata_response(vec![], None)),
            )
            .with_priority(10)
            .mount(&self.server)
            .await;
    }
}

pub async fn run_command(mut cmd: Command) -> Output {
    tokio::task::spawn_blocking(move || cmd.output().expect("Failed to execute command"))
        .await
        .expect("command task")
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

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

pub fn create_test_member(id: &str, email_prefix: &str) -> Value {
    let mut user = create_test_user(id, email_prefix);
    user["@odata.type"] = json!("#microsoft.graph.user");
    user
}

pub fn create_m365_group(id: &str, nickname: &str, hidden: bool) -> Value {
    json!({
        "id": id,
        "displayName": format!("{} Team", nickname),
        "mail": format!("{}@contoso.com", nickname),
        "mailNickname": nickname,
        "groupTypes": ["Unified"],
        "securityEnabled": false,
        "mailEnabled": true,
        "proxyAddresses": [format!("SMTP:{}@contoso.com", nickname)],
        "hideFromAddressLists": hidden,
        "createdDateTime": "2024-03-01T09:30:00Z"
    })
}

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

pub fn create_odata_response(items: Vec<Value>, next_link: Option<&str>) -> Value {
    let mut response = json!({ "value": items });
    if let Some(link) = next_link {
        response["@odata.nextLink"] = json!(link);
    }
    response
}

pub fn create_odata_error(code: &str, message: &str) -> Value {
    json!({
        "error": {
            "code": code,
            "message": message
        }
    })
}
