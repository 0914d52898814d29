//! groupctl - administer directory groups and recipients from the command line
//!
//! - Look up, list, create and delete groups
//! - Add members one at a time or in bulk from CSV
//! - Export membership to CSV
//! - Resolve aliases and addresses to directory objects
//! - Toggle global address list visibility

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use groupctl::commands::{self, Context};
use groupctl::config::CLIENT_SECRET_FILE_ENV;
use groupctl::error::CliResult;
use groupctl::logging::{self, LogLevel};

/// groupctl - group and recipient administration for Microsoft Graph
#[derive(Parser)]
#[command(name = "groupctl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase diagnostic output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Read the client secret from this file
    #[arg(long, global = true, env = CLIENT_SECRET_FILE_ENV)]
    secret_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage groups and their membership
    Group(commands::groups::GroupArgs),

    /// Resolve an identifier (or a CSV of them) to directory objects
    Resolve(commands::resolve::ResolveArgs),

    /// Manage local configuration
    Config(commands::config::ConfigArgs),

    /// Verify credentials and connectivity
    Check(commands::check::CheckArgs),
}

#[tokio::main]
async fn main() {
    // Usage errors share the validation exit code; exit 2 means authentication.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(if e.use_stderr() { 4 } else { 0 });
        }
    };

    logging::init(LogLevel::from_flags(cli.verbose, cli.quiet));

    let result = run(cli).await;

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            e.print();
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let ctx = Context::new(cli.secret_file, cli.quiet)?;

    match cli.command {
        Commands::Group(args) => commands::groups::execute(&ctx, args).await,
        Commands::Resolve(args) => commands::resolve::execute(&ctx, args).await,
        Commands::Config(args) => commands::config::execute(&ctx, args).await,
        Commands::Check(args) => commands::check::execute(&ctx, args).await,
    }
}
