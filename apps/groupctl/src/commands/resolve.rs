//! Recipient resolution command

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use clap::Args;
use groupctl_graph::{Candidate, GraphError, Resolution, ResolveOptions};
use serde::Serialize;
use tracing::warn;

use super::Context;
use crate::batch::BatchProgress;
use crate::error::{CliError, CliResult};
use crate::formats::{read_identifiers, write_resolve_report, ResolveRecord};
use crate::output::{
    or_dash, print_candidate_table, print_json, print_key_value, print_section, print_success,
};

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Object id, email address, proxy address, UPN or alias
    #[arg(required_unless_present = "input", conflicts_with = "input")]
    pub identifier: Option<String>,

    /// Resolve every row of a CSV file instead
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Column to read from the input file
    #[arg(long, requires = "input")]
    pub column: Option<String>,

    /// Write bulk results to this CSV file (default: stdout)
    #[arg(long, short = 'o', requires = "input")]
    pub output: Option<PathBuf>,

    /// Never pick a preferred match out of several
    #[arg(long)]
    pub strict: bool,

    /// Also search mail-enabled groups
    #[arg(long)]
    pub include_groups: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(ctx: &Context, args: ResolveArgs) -> CliResult<()> {
    let options = ResolveOptions {
        strict: args.strict,
        include_groups: args.include_groups,
    };
    match (&args.identifier, &args.input) {
        (Some(identifier), _) => resolve_one(ctx, identifier, options, args.json).await,
        (None, Some(input)) => resolve_file(ctx, &args, input, options).await,
        (None, None) => Err(CliError::Validation(
            "Pass an identifier or --input FILE.".to_string(),
        )),
    }
}

#[derive(Serialize)]
struct AmbiguousOutput<'a> {
    input: &'a str,
    candidates: &'a [Candidate],
}

async fn resolve_one(
    ctx: &Context,
    identifier: &str,
    options: ResolveOptions,
    json: bool,
) -> CliResult<()> {
    let client = ctx.client()?;
    match client.resolve_recipient(identifier, options).await? {
        Resolution::Unique(candidate) => {
            if json {
                return print_json(&candidate);
            }
            let recipient = &candidate.recipient;
            print_section(&format!("Recipient: {}", recipient.display_name));
            print_key_value("ID", &recipient.id);
            print_key_value("Type", &recipient.kind.to_string());
            print_key_value("Mail", or_dash(recipient.mail.as_deref()));
            print_key_value("UPN", or_dash(recipient.user_principal_name.as_deref()));
            print_key_value("Alias", or_dash(recipient.mail_nickname.as_deref()));
            print_key_value("Match", &candidate.match_kind.to_string());
            Ok(())
        }
        Resolution::Ambiguous(candidates) => {
            if json {
                print_json(&AmbiguousOutput {
                    input: identifier,
                    candidates: &candidates,
                })?;
            } else {
                print_candidate_table(&candidates);
                println!();
            }
            Err(CliError::Ambiguous {
                input: identifier.trim().to_string(),
                candidates: candidates.iter().map(|c| c.recipient.label()).collect(),
            })
        }
        Resolution::NotFound => Err(CliError::NotFound(format!(
            "no recipient matches '{}'",
            identifier.trim()
        ))),
    }
}

async fn resolve_file(
    ctx: &Context,
    args: &ResolveArgs,
    input: &Path,
    options: ResolveOptions,
) -> CliResult<()> {
    let content = std::fs::read_to_string(input)
        .map_err(|e| CliError::Io(format!("Failed to read {}: {}", input.display(), e)))?;
    let identifiers = read_identifiers(&content, args.column.as_deref())?;

    let client = ctx.client()?;
    let progress = BatchProgress::new(
        identifiers.rows.len() as u64,
        "Resolving",
        false,
        ctx.show_progress() && args.output.is_some(),
    );

    let mut records = Vec::with_capacity(identifiers.rows.len());
    for row in &identifiers.rows {
        let record = match client.resolve_recipient(&row.value, options).await {
            Ok(Resolution::Unique(candidate)) => {
                ResolveRecord::resolved(&row.value, &candidate.recipient)
            }
            Ok(Resolution::NotFound) => ResolveRecord::unresolved(&row.value, "NotFound"),
            Ok(Resolution::Ambiguous(_)) => ResolveRecord::unresolved(&row.value, "Ambiguous"),
            Err(GraphError::InvalidIdentifier(_)) => {
                ResolveRecord::unresolved(&row.value, "Invalid")
            }
            Err(e) if e.status().is_some_and(|s| s < 500 && s != 401 && s != 403) => {
                warn!(row = row.row, error = %e, "Lookup rejected");
                ResolveRecord::unresolved(&row.value, "Error")
            }
            Err(e) => {
                progress.finish_and_clear();
                return Err(e.into());
            }
        };
        records.push(record);
        progress.inc();
    }
    progress.finish_and_clear();

    let resolved = records.iter().filter(|r| r.status == "Resolved").count();
    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .map_err(|e| CliError::Io(format!("Failed to create {}: {}", path.display(), e)))?;
            write_resolve_report(&records, BufWriter::new(file))?;
            if !ctx.quiet {
                print_success(&format!(
                    "Resolved {} of {} identifier(s); results written to {}",
                    resolved,
                    records.len(),
                    path.display()
                ));
            }
        }
        None if args.json => print_json(&records)?,
        None => write_resolve_report(&records, std::io::stdout().lock())?,
    }
    Ok(())
}
