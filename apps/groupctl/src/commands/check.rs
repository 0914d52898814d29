//! Credential and connectivity check

use clap::Args;
use serde::Serialize;

use super::Context;
use crate::error::CliResult;
use crate::output::{or_dash, print_json, print_key_value, print_success};

/// Arguments for the check command
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct CheckReport<'a> {
    tenant_id: &'a str,
    organization: Option<&'a str>,
    default_domain: Option<&'a str>,
}

/// Acquire a token and read the tenant organization
pub async fn execute(ctx: &Context, args: CheckArgs) -> CliResult<()> {
    let config = ctx.config()?;
    let client = ctx.client()?;

    client.authenticate().await?;
    let organization = client.organization().await?;

    let report = CheckReport {
        tenant_id: config.tenant_id.as_deref().unwrap_or_default(),
        organization: organization.display_name.as_deref(),
        default_domain: organization.default_domain(),
    };

    if args.json {
        return print_json(&report);
    }

    print_success("Authenticated to Microsoft Graph");
    print_key_value("Tenant", report.tenant_id);
    print_key_value("Organization", or_dash(report.organization));
    print_key_value("Default domain", or_dash(report.default_domain));
    print_key_value("Cloud", &config.cloud.to_string());
    Ok(())
}
