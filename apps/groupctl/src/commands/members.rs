//! Group membership commands: single add, CSV import, export

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use groupctl_graph::odata::{is_email_shaped, strip_smtp_prefix};
use groupctl_graph::{
    AddOutcome, GraphClient, GraphError, Group, Identifier, MembershipSnapshot, Resolution,
    ResolveOptions,
};
use tracing::{debug, info, warn};

use super::Context;
use crate::batch::{BatchProgress, ImportItem, ImportPlanner, ImportResult, ImportStatus, Precheck};
use crate::error::{CliError, CliResult};
use crate::formats::{export_members_csv, read_identifiers, write_import_report};
use crate::output::{
    print_info, print_json, print_key_value, print_member_table, print_section, print_success,
    truncate,
};

#[derive(Args, Debug)]
pub struct AddMemberArgs {
    /// Group object id, mail, mail nickname or display name
    pub group: String,

    /// Member object id, address, UPN or alias
    pub member: String,

    /// Only accept an email address that matches exactly one recipient
    #[arg(long)]
    pub strict: bool,

    /// Allow mail-enabled groups as members
    #[arg(long)]
    pub include_groups: bool,
}

#[derive(Args, Debug)]
pub struct ImportMembersArgs {
    /// Group object id, mail, mail nickname or display name
    pub group: String,

    /// CSV file with a header row
    pub file: PathBuf,

    /// Column holding member identifiers (default: Email, then UserPrincipalName)
    #[arg(long)]
    pub column: Option<String>,

    /// Only accept email addresses that match exactly one recipient
    #[arg(long)]
    pub strict: bool,

    /// Resolve and compare without adding anyone
    #[arg(long)]
    pub dry_run: bool,

    /// Print the full result as JSON
    #[arg(long)]
    pub json: bool,

    /// Write a per-row CSV report to this file
    #[arg(long)]
    pub report: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ExportMembersArgs {
    /// Group object id, mail, mail nickname or display name
    pub group: String,

    /// Include members of nested groups
    #[arg(long)]
    pub transitive: bool,

    /// Write CSV to this file ("-" for stdout)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

fn ensure_assignable(group: &Group) -> CliResult<()> {
    if group.is_dynamic() {
        return Err(CliError::Validation(format!(
            "'{}' has dynamic membership; members cannot be added directly.",
            group.display_name
        )));
    }
    Ok(())
}

pub async fn execute_add(ctx: &Context, args: AddMemberArgs) -> CliResult<()> {
    let value = strip_smtp_prefix(args.member.trim()).trim();
    if args.strict && !is_email_shaped(value) {
        return Err(CliError::Validation(format!(
            "'{}' is not an email address (strict mode).",
            args.member.trim()
        )));
    }
    Identifier::parse(&args.member)?;

    let client = ctx.client()?;
    let group = client.lookup_group(&args.group).await?;
    ensure_assignable(&group)?;

    let options = ResolveOptions {
        strict: args.strict,
        include_groups: args.include_groups,
    };
    let member = client
        .resolve_recipient(&args.member, options)
        .await?
        .into_unique(&args.member)?
        .recipient;

    match client.add_member(&group.id, &member.id).await? {
        AddOutcome::Added => {
            print_success(&format!("Added {} to '{}'.", member.label(), group.display_name));
        }
        AddOutcome::AlreadyMember => {
            print_info(&format!(
                "{} is already a member of '{}'; nothing to do.",
                member.label(),
                group.display_name
            ));
        }
    }
    Ok(())
}

pub async fn execute_import(ctx: &Context, args: ImportMembersArgs) -> CliResult<()> {
    let content = std::fs::read_to_string(&args.file).map_err(|e| {
        CliError::Io(format!("Failed to read {}: {}", args.file.display(), e))
    })?;
    let identifiers = read_identifiers(&content, args.column.as_deref())?;
    debug!(
        column = %identifiers.column,
        rows = identifiers.rows.len(),
        "Read member file"
    );

    let client = ctx.client()?;
    let group = client.lookup_group(&args.group).await?;
    ensure_assignable(&group)?;

    let members = client.list_members(&group.id, false).await?;
    let mut snapshot = MembershipSnapshot::from_members(&members);
    info!(group_id = %group.id, members = snapshot.len(), "Membership snapshot taken");

    let started = Instant::now();
    let total = identifiers.rows.len();
    let mut result = ImportResult::new(&group.id, &group.display_name, total, args.dry_run);
    let mut planner = ImportPlanner::new(args.strict);
    let progress = BatchProgress::new(
        total as u64,
        "Importing members",
        args.dry_run,
        ctx.show_progress() && !args.json,
    );
    let importer = RowImporter {
        client: &client,
        group_id: &group.id,
        options: ResolveOptions {
            strict: args.strict,
            include_groups: false,
        },
        dry_run: args.dry_run,
    };

    for row in &identifiers.rows {
        let item = match planner.precheck(&row.value, &snapshot) {
            Precheck::Skip(status, reason) => {
                ImportItem::new(row.row, &row.value, status).with_detail(reason)
            }
            Precheck::Resolve(value) => {
                importer
                    .import(row.row, &row.value, &value, &mut snapshot)
                    .await
            }
        };
        if item.status == ImportStatus::Failed {
            progress.println(&format!(
                "Row {}: {} failed: {}",
                item.row,
                item.input,
                item.detail.as_deref().unwrap_or_default()
            ));
        }
        result.record(item);
        progress.inc();
    }

    progress.finish_and_clear();
    result.set_duration(started.elapsed().as_millis() as u64);

    if let Some(path) = &args.report {
        let file = File::create(path)
            .map_err(|e| CliError::Io(format!("Failed to create {}: {}", path.display(), e)))?;
        write_import_report(&result.items, BufWriter::new(file))?;
    }

    if args.json {
        print_json(&result)?;
    } else {
        print_import_summary(&result, args.report.as_deref());
    }

    if result.has_failures() {
        return Err(CliError::PartialFailure {
            failed: result.count(ImportStatus::Failed),
            total: result.total,
        });
    }
    Ok(())
}

/// Resolves and adds one row that passed the prechecks
struct RowImporter<'a> {
    client: &'a GraphClient,
    group_id: &'a str,
    options: ResolveOptions,
    dry_run: bool,
}

impl RowImporter<'_> {
    async fn import(
        &self,
        row: usize,
        input: &str,
        value: &str,
        snapshot: &mut MembershipSnapshot,
    ) -> ImportItem {
        let client = self.client;
        let item = ImportItem::new(row, input, ImportStatus::Failed);

        let candidate = match client.resolve_recipient(value, self.options).await {
            Ok(Resolution::Unique(candidate)) => candidate,
            Ok(Resolution::NotFound) => {
                return ImportItem {
                    status: ImportStatus::NotFound,
                    ..item
                }
                .with_detail(format!("no recipient matches '{value}'"));
            }
            Ok(Resolution::Ambiguous(candidates)) => {
                let labels: Vec<String> = candidates.iter().map(|c| c.recipient.label()).collect();
                return ImportItem {
                    status: ImportStatus::Ambiguous,
                    ..item
                }
                .with_detail(format!("matches {}", labels.join("; ")));
            }
            Err(GraphError::InvalidIdentifier(msg)) => {
                return ImportItem {
                    status: ImportStatus::Invalid,
                    ..item
                }
                .with_detail(msg);
            }
            Err(e) => {
                warn!(row, input, error = %e, "Lookup failed");
                return item.with_detail(e.to_string());
            }
        };

        let member = candidate.recipient;
        let item = item.with_object_id(member.id.clone());

        if snapshot.contains_id(&member.id) {
            return ImportItem {
                status: ImportStatus::AlreadyMember,
                ..item
            };
        }

        if self.dry_run {
            snapshot.insert(&member);
            return ImportItem {
                status: ImportStatus::WouldAdd,
                ..item
            };
        }

        match client.add_member(self.group_id, &member.id).await {
            Ok(outcome) => {
                snapshot.insert(&member);
                let status = match outcome {
                    AddOutcome::Added => ImportStatus::Added,
                    AddOutcome::AlreadyMember => ImportStatus::AlreadyMember,
                };
                ImportItem { status, ..item }
            }
            Err(e) => {
                warn!(row, member_id = %member.id, error = %e, "Add failed");
                item.with_detail(e.to_string())
            }
        }
    }
}

fn print_import_summary(result: &ImportResult, report: Option<&Path>) {
    let title = if result.dry_run {
        format!("Import into '{}' (dry run)", result.group_name)
    } else {
        format!("Import into '{}'", result.group_name)
    };
    print_section(&title);
    print_key_value("Rows", &result.total.to_string());
    for count in result.counts() {
        print_key_value(count.status.as_str(), &count.count.to_string());
    }
    print_key_value(
        "Duration",
        &format!("{:.1}s", result.duration_ms as f64 / 1000.0),
    );

    let attention: Vec<&ImportItem> = result.needs_attention().collect();
    if !attention.is_empty() {
        println!();
        println!("{:<6} {:<36} {:<14} DETAIL", "ROW", "INPUT", "STATUS");
        for item in attention {
            println!(
                "{:<6} {:<36} {:<14} {}",
                item.row,
                truncate(&item.input, 36),
                item.status.as_str(),
                item.detail.as_deref().unwrap_or_default()
            );
        }
    }

    if let Some(path) = report {
        println!();
        println!("Report written to {}", path.display());
    }
}

pub async fn execute_export(ctx: &Context, args: ExportMembersArgs) -> CliResult<()> {
    let client = ctx.client()?;
    let group = client.lookup_group(&args.group).await?;
    let members = client.list_members(&group.id, args.transitive).await?;
    info!(group_id = %group.id, count = members.len(), "Members listed");

    match args.output.as_deref() {
        Some(path) if path == Path::new("-") => {
            export_members_csv(&members, std::io::stdout().lock())?;
        }
        Some(path) => {
            let file = File::create(path)
                .map_err(|e| CliError::Io(format!("Failed to create {}: {}", path.display(), e)))?;
            export_members_csv(&members, BufWriter::new(file))?;
            if !ctx.quiet {
                print_success(&format!(
                    "Exported {} member(s) of '{}' to {}",
                    members.len(),
                    group.display_name,
                    path.display()
                ));
            }
        }
        None if args.json => print_json(&members)?,
        None => {
            if members.is_empty() {
                println!("'{}' has no members.", group.display_name);
                return Ok(());
            }
            print_member_table(&members);
            println!();
            println!(
                "{} {} member(s)",
                members.len(),
                if args.transitive { "transitive" } else { "direct" }
            );
        }
    }
    Ok(())
}
