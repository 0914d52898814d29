//! Configuration commands

use clap::{Args, Subcommand};
use groupctl_graph::CloudEnvironment;
use serde::Serialize;

use super::Context;
use crate::config::{load_client_secret, Config};
use crate::error::{CliError, CliResult};
use crate::output::{or_dash, print_json, print_key_value, print_section, print_success};

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Write tenant and app registration settings
    Init(InitArgs),
    /// Show the effective configuration
    Show(ShowArgs),
    /// Print the configuration file location
    Path,
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Tenant id or primary domain
    #[arg(long)]
    pub tenant_id: String,

    /// Application (client) id of the app registration
    #[arg(long)]
    pub client_id: String,

    /// Cloud environment: commercial, us_government, china, germany
    #[arg(long, default_value = "commercial")]
    pub cloud: String,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(ctx: &Context, args: ConfigArgs) -> CliResult<()> {
    match args.command {
        ConfigCommands::Init(a) => execute_init(ctx, a),
        ConfigCommands::Show(a) => execute_show(ctx, a),
        ConfigCommands::Path => {
            println!("{}", ctx.paths.config_file.display());
            Ok(())
        }
    }
}

fn execute_init(ctx: &Context, args: InitArgs) -> CliResult<()> {
    let tenant_id = args.tenant_id.trim();
    let client_id = args.client_id.trim();
    if tenant_id.is_empty() || client_id.is_empty() {
        return Err(CliError::Validation(
            "Tenant id and client id cannot be empty.".to_string(),
        ));
    }
    let cloud: CloudEnvironment = args.cloud.parse()?;

    // Keep tuning settings from an existing file.
    let mut config = Config::load_file(&ctx.paths)?;
    config.tenant_id = Some(tenant_id.to_string());
    config.client_id = Some(client_id.to_string());
    config.cloud = cloud;
    config.graph_config()?;
    config.save(&ctx.paths)?;

    print_success(&format!(
        "Configuration written to {}",
        ctx.paths.config_file.display()
    ));
    println!("Set GROUPCTL_CLIENT_SECRET or pass --secret-file before running commands.");
    Ok(())
}

#[derive(Serialize)]
struct ShowOutput<'a> {
    config_file: String,
    #[serde(flatten)]
    config: &'a Config,
    base_url: Option<String>,
    client_secret: &'static str,
}

fn execute_show(ctx: &Context, args: ShowArgs) -> CliResult<()> {
    let config = ctx.config()?;
    let secret_set = matches!(
        load_client_secret(|key| std::env::var(key).ok(), ctx.secret_file.as_deref()),
        Ok(Some(_))
    );
    let output = ShowOutput {
        config_file: ctx.paths.config_file.display().to_string(),
        config: &config,
        base_url: config.graph_config().ok().map(|c| c.base_url()),
        client_secret: if secret_set { "set" } else { "not set" },
    };

    if args.json {
        return print_json(&output);
    }

    print_section("Configuration");
    print_key_value("File", &output.config_file);
    print_key_value("Tenant", or_dash(config.tenant_id.as_deref()));
    print_key_value("Client ID", or_dash(config.client_id.as_deref()));
    print_key_value("Client secret", output.client_secret);
    print_key_value("Cloud", &config.cloud.to_string());
    print_key_value("Graph API", or_dash(output.base_url.as_deref()));
    print_key_value("Timeout", &format!("{}s", config.timeout_secs));
    print_key_value("Page size", &config.page_size.to_string());
    print_key_value("Max retries", &config.max_retries.to_string());
    Ok(())
}
