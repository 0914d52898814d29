//! End-to-end tests for adding, importing and exporting group members.

mod common;

use common::*;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, ResponseTemplate};

async fn mock_add_member(ctx: &TestContext, group_id: &str, response: ResponseTemplate, times: u64) {
    Mock::given(method("POST"))
        .and(path(format!("/v1.0/groups/{group_id}/members/$ref")))
        .respond_with(response)
        .expect(times)
        .mount(&ctx.server)
        .await;
}

#[tokio::test]
async fn test_add_member_strict_rejects_alias_without_remote_call() {
    let ctx = TestContext::new().await;

    let output = ctx
        .run(&["group", "add-member", "sales@contoso.com", "jdoe", "--strict"])
        .await;

    assert_eq!(output.status.code(), Some(4));
    assert!(stderr(&output).contains("strict"));
    assert_eq!(ctx.request_count().await, 0);
}

#[tokio::test]
async fn test_add_member_malformed_address_without_remote_call() {
    let ctx = TestContext::new().await;

    let output = ctx
        .run(&["group", "add-member", "sales@contoso.com", "jane@"])
        .await;

    assert_eq!(output.status.code(), Some(4));
    assert_eq!(ctx.request_count().await, 0);
}

#[tokio::test]
async fn test_add_member() {
    let ctx = TestContext::new().await;
    ctx.mock_group_search(vec![create_m365_group("g1", "sales", false)])
        .await;
    ctx.mock_user_lookup("new@contoso.com", vec![create_test_user("u2", "new")])
        .await;

    Mock::given(method("POST"))
        .and(path("/v1.0/groups/g1/members/$ref"))
        .and(body_partial_json(json!({
            "@odata.id": format!("{}/v1.0/directoryObjects/u2", ctx.server.uri())
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let output = ctx
        .run(&["group", "add-member", "sales", "New@Contoso.com", "--strict"])
        .await;

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("Added Test User new <new@contoso.com>"));
}

#[tokio::test]
async fn test_add_existing_member_is_noop() {
    let ctx = TestContext::new().await;
    ctx.mock_group_search(vec![create_m365_group("g1", "sales", false)])
        .await;
    ctx.mock_user_lookup("jane@contoso.com", vec![create_test_user("u1", "jane")])
        .await;
    mock_add_member(
        &ctx,
        "g1",
        ResponseTemplate::new(400).set_body_json(create_odata_error(
            "Request_BadRequest",
            "One or more added object references already exist for the following modified properties: 'members'.",
        )),
        1,
    )
    .await;

    let output = ctx
        .run(&["group", "add-member", "sales", "jane@contoso.com"])
        .await;

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("already a member"));
}

#[tokio::test]
async fn test_add_member_not_found_exits_6() {
    let ctx = TestContext::new().await;
    ctx.mock_group_search(vec![create_m365_group("g1", "sales", false)])
        .await;
    ctx.mock_no_other_users().await;
    mock_add_member(&ctx, "g1", ResponseTemplate::new(204), 0).await;

    let output = ctx
        .run(&["group", "add-member", "sales", "ghost@contoso.com"])
        .await;

    assert_eq!(output.status.code(), Some(6));
}

#[tokio::test]
async fn test_add_member_to_dynamic_group_rejected() {
    let ctx = TestContext::new().await;
    let mut group = create_security_group("g2", "All Staff");
    group["groupTypes"] = json!(["DynamicMembership"]);
    ctx.mock_group_search(vec![group]).await;
    mock_add_member(&ctx, "g2", ResponseTemplate::new(204), 0).await;

    let output = ctx
        .run(&["group", "add-member", "All Staff", "jane@contoso.com"])
        .await;

    assert_eq!(output.status.code(), Some(4));
    assert!(stderr(&output).contains("dynamic membership"));
}

#[tokio::test]
async fn test_import_members_statuses_and_report() {
    let ctx = TestContext::new().await;
    ctx.mock_group_search(vec![create_m365_group("g1", "sales", false)])
        .await;
    ctx.mock_members("g1", vec![create_test_member("u1", "jane")])
        .await;
    ctx.mock_user_lookup("new@contoso.com", vec![create_test_user("u2", "new")])
        .await;
    ctx.mock_no_other_users().await;
    mock_add_member(&ctx, "g1", ResponseTemplate::new(204), 1).await;

    let csv = ctx.write_file(
        "members.csv",
        "Name,Email\n\
         Jane,jane@contoso.com\n\
         New,new@contoso.com\n\
         New again,SMTP:NEW@contoso.com\n\
         Alias only,jdoe\n\
         Ghost,ghost@contoso.com\n\
         Blank,\n",
    );
    let report = ctx.path_in_dir("report.csv");

    let output = ctx
        .run(&[
            "group",
            "import-members",
            "sales",
            csv.to_str().unwrap(),
            "--strict",
            "--report",
            report.to_str().unwrap(),
        ])
        .await;

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("Rows: 5"));
    assert!(out.contains("Added: 1"));
    assert!(out.contains("NotFound: 1"));

    let report = std::fs::read_to_string(report).unwrap();
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(lines[0], "Row,Input,Status,ObjectId,Detail");
    assert_eq!(lines[1], "2,jane@contoso.com,AlreadyMember,,address already in the group");
    assert_eq!(lines[2], "3,new@contoso.com,Added,u2,");
    assert_eq!(lines[3], "4,SMTP:NEW@contoso.com,Duplicate,,appears earlier in the file");
    assert!(lines[4].starts_with("5,jdoe,Invalid,,"));
    assert!(lines[5].starts_with("6,ghost@contoso.com,NotFound,,"));
    assert_eq!(lines.len(), 6);
}

#[tokio::test]
async fn test_import_members_rerun_adds_nothing() {
    let ctx = TestContext::new().await;
    ctx.mock_group_search(vec![create_m365_group("g1", "sales", false)])
        .await;
    ctx.mock_members(
        "g1",
        vec![create_test_member("u1", "jane"), create_test_member("u2", "new")],
    )
    .await;
    mock_add_member(&ctx, "g1", ResponseTemplate::new(204), 0).await;

    let csv = ctx.write_file("members.csv", "Email\njane@contoso.com\nnew@contoso.com\n");

    let output = ctx
        .run(&["group", "import-members", "sales", csv.to_str().unwrap(), "--json"])
        .await;

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let body: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(body["total"], 2);
    assert_eq!(body["items"][0]["status"], "already_member");
    assert_eq!(body["items"][1]["status"], "already_member");
}

#[tokio::test]
async fn test_import_members_dry_run_does_not_add() {
    let ctx = TestContext::new().await;
    ctx.mock_group_search(vec![create_m365_group("g1", "sales", false)])
        .await;
    ctx.mock_members("g1", vec![]).await;
    ctx.mock_user_lookup("new@contoso.com", vec![create_test_user("u2", "new")])
        .await;
    mock_add_member(&ctx, "g1", ResponseTemplate::new(204), 0).await;

    let csv = ctx.write_file("members.csv", "UserPrincipalName\nnew@contoso.com\n");

    let output = ctx
        .run(&[
            "group",
            "import-members",
            "sales",
            csv.to_str().unwrap(),
            "--dry-run",
            "--json",
        ])
        .await;

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let body: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(body["dry_run"], true);
    assert_eq!(body["items"][0]["status"], "would_add");
    assert_eq!(body["items"][0]["object_id"], "u2");
}

#[tokio::test]
async fn test_import_members_failure_exits_1_without_retry() {
    let ctx = TestContext::new().await;
    ctx.mock_group_search(vec![create_m365_group("g1", "sales", false)])
        .await;
    ctx.mock_members("g1", vec![]).await;
    ctx.mock_user_lookup("new@contoso.com", vec![create_test_user("u2", "new")])
        .await;
    mock_add_member(
        &ctx,
        "g1",
        ResponseTemplate::new(503).set_body_json(create_odata_error(
            "ServiceUnavailable",
            "Try again later",
        )),
        1,
    )
    .await;

    let csv = ctx.write_file("members.csv", "Email\nnew@contoso.com\n");

    let output = ctx
        .run(&["group", "import-members", "sales", csv.to_str().unwrap()])
        .await;

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("Failed: 1"));
    assert!(stderr(&output).contains("1 of 1 operations failed"));
}

#[tokio::test]
async fn test_import_members_missing_column_before_remote_call() {
    let ctx = TestContext::new().await;
    let csv = ctx.write_file("members.csv", "Name,Department\nJane,Sales\n");

    let output = ctx
        .run(&["group", "import-members", "sales", csv.to_str().unwrap()])
        .await;

    assert_eq!(output.status.code(), Some(4));
    assert_eq!(ctx.request_count().await, 0);
}

#[tokio::test]
async fn test_export_members_csv_file() {
    let ctx = TestContext::new().await;
    ctx.mock_group_search(vec![create_m365_group("g1", "sales", false)])
        .await;
    ctx.mock_members(
        "g1",
        vec![create_test_member("u1", "jane"), create_test_member("u2", "new")],
    )
    .await;
    let file = ctx.path_in_dir("export.csv");

    let output = ctx
        .run(&[
            "group",
            "export-members",
            "sales",
            "--output",
            file.to_str().unwrap(),
        ])
        .await;

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let content = std::fs::read_to_string(file).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], "DisplayName,Email,UserPrincipalName,Id,Type");
    assert_eq!(
        lines[1],
        "Test User jane,jane@contoso.com,jane@contoso.onmicrosoft.com,u1,User"
    );
    assert_eq!(lines.len(), 3);
}

#[tokio::test]
async fn test_export_transitive_members_json() {
    let ctx = TestContext::new().await;
    ctx.mock_group_search(vec![create_m365_group("g1", "sales", false)])
        .await;
    let mut nested = create_security_group("g9", "Nested");
    nested["@odata.type"] = json!("#microsoft.graph.group");
    Mock::given(method("GET"))
        .and(path("/v1.0/groups/g1/transitiveMembers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(create_odata_response(
            vec![create_test_member("u1", "jane"), nested],
            None,
        )))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let output = ctx
        .run(&["group", "export-members", "sales", "--transitive", "--json"])
        .await;

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let body: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(body[1]["kind"], "group");
}
