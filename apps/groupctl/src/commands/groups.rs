//! Group management CLI commands

use clap::{ArgGroup, Args, Subcommand, ValueEnum};
use groupctl_graph::{
    derive_mail_nickname, validate_mail_nickname, CreateGroupRequest, GraphClient, Group,
    GroupKind, NewGroupKind, RecipientKind, ResolveOptions,
};
use serde::Serialize;
use tracing::info;

use super::members::{self, AddMemberArgs, ExportMembersArgs, ImportMembersArgs};
use super::{confirm, Context};
use crate::error::{CliError, CliResult};
use crate::output::{
    or_dash, print_group_table, print_info, print_json, print_key_value, print_section,
    print_success, print_warning, validate_limit,
};

/// Group management commands
#[derive(Args, Debug)]
pub struct GroupArgs {
    #[command(subcommand)]
    pub command: GroupCommands,
}

#[derive(Subcommand, Debug)]
pub enum GroupCommands {
    /// Show a group by id, address, alias or display name
    Get(GetArgs),
    /// List groups
    List(ListArgs),
    /// Create a Microsoft 365 or security group
    Create(CreateArgs),
    /// Delete a group
    Delete(DeleteArgs),
    /// Add one member to a group
    AddMember(AddMemberArgs),
    /// Add members listed in a CSV file
    ImportMembers(ImportMembersArgs),
    /// List or export a group's members
    ExportMembers(ExportMembersArgs),
    /// Show or hide a Microsoft 365 group in the global address list
    Gal(GalArgs),
}

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Group object id, mail, proxy address, mail nickname or display name
    pub identity: String,

    /// Include the direct member count
    #[arg(long)]
    pub members: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only groups whose display name starts with this prefix
    #[arg(long)]
    pub search: Option<String>,

    /// Maximum number of groups to return
    #[arg(long, default_value = "100")]
    pub limit: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKindArg {
    /// Microsoft 365 group
    M365,
    /// Security group
    Security,
}

impl From<GroupKindArg> for NewGroupKind {
    fn from(kind: GroupKindArg) -> Self {
        match kind {
            GroupKindArg::M365 => NewGroupKind::Microsoft365,
            GroupKindArg::Security => NewGroupKind::Security,
        }
    }
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Display name of the new group
    pub name: String,

    /// Mail nickname (derived from the display name when omitted)
    #[arg(long)]
    pub alias: Option<String>,

    /// Kind of group
    #[arg(long, value_enum, default_value = "m365")]
    pub kind: GroupKindArg,

    /// Group description
    #[arg(long)]
    pub description: Option<String>,

    /// Owner (user id, address or alias); repeat for several
    #[arg(long = "owner")]
    pub owners: Vec<String>,

    /// Hide the new group from the global address list
    #[arg(long)]
    pub hidden: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Group object id, mail, mail nickname or display name
    pub identity: String,

    /// Skip confirmation prompt
    #[arg(long, short = 'f')]
    pub force: bool,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("visibility").required(true).args(["hide", "show"])))]
pub struct GalArgs {
    /// Group object id, mail, mail nickname or display name
    pub group: String,

    /// Hide the group from address lists
    #[arg(long)]
    pub hide: bool,

    /// Show the group in address lists
    #[arg(long)]
    pub show: bool,
}

/// Execute group commands
pub async fn execute(ctx: &Context, args: GroupArgs) -> CliResult<()> {
    match args.command {
        GroupCommands::Get(a) => execute_get(ctx, a).await,
        GroupCommands::List(a) => execute_list(ctx, a).await,
        GroupCommands::Create(a) => execute_create(ctx, a).await,
        GroupCommands::Delete(a) => execute_delete(ctx, a).await,
        GroupCommands::AddMember(a) => members::execute_add(ctx, a).await,
        GroupCommands::ImportMembers(a) => members::execute_import(ctx, a).await,
        GroupCommands::ExportMembers(a) => members::execute_export(ctx, a).await,
        GroupCommands::Gal(a) => execute_gal(ctx, a).await,
    }
}

#[derive(Serialize)]
struct GroupDetails<'a> {
    #[serde(flatten)]
    group: &'a Group,
    kind: GroupKind,
    is_dynamic: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    member_count: Option<u64>,
}

impl<'a> GroupDetails<'a> {
    fn new(group: &'a Group, member_count: Option<u64>) -> Self {
        Self {
            group,
            kind: group.kind(),
            is_dynamic: group.is_dynamic(),
            member_count,
        }
    }
}

async fn execute_get(ctx: &Context, args: GetArgs) -> CliResult<()> {
    let client = ctx.client()?;
    let group = client.lookup_group(&args.identity).await?;

    let member_count = if args.members {
        Some(client.member_count(&group.id, false).await?)
    } else {
        None
    };

    if args.json {
        print_json(&GroupDetails::new(&group, member_count))?;
    } else {
        print_group_details(&group, member_count);
    }
    Ok(())
}

async fn execute_list(ctx: &Context, args: ListArgs) -> CliResult<()> {
    validate_limit(args.limit)?;
    let client = ctx.client()?;
    let groups = client
        .list_groups(args.search.as_deref(), args.limit)
        .await?;

    if args.json {
        return print_json(&groups);
    }

    if groups.is_empty() {
        println!("No groups found.");
        return Ok(());
    }
    print_group_table(&groups);
    println!();
    println!("Showing {} group(s)", groups.len());
    Ok(())
}

async fn execute_create(ctx: &Context, args: CreateArgs) -> CliResult<()> {
    let display_name = args.name.trim();
    if display_name.is_empty() {
        return Err(CliError::Validation("Group name cannot be empty.".to_string()));
    }
    if args.hidden && args.kind != GroupKindArg::M365 {
        return Err(CliError::Validation(
            "--hidden applies only to Microsoft 365 groups.".to_string(),
        ));
    }

    let nickname = match args.alias.as_deref() {
        Some(alias) => alias.trim().to_string(),
        None => derive_mail_nickname(display_name),
    };
    validate_mail_nickname(&nickname)?;

    let client = ctx.client()?;

    let conflicts = client
        .find_conflicting_groups(&nickname, display_name)
        .await?;
    if !conflicts.is_empty() {
        let names: Vec<String> = conflicts.iter().map(Group::label).collect();
        return Err(CliError::Conflict(format!(
            "A group named '{}' or with alias '{}' already exists: {}",
            display_name,
            nickname,
            names.join(", ")
        )));
    }

    let mut request = CreateGroupRequest::new(display_name, &nickname, args.kind.into());
    request.description = args
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(String::from);
    for owner in &args.owners {
        let owner_id = resolve_owner(&client, owner).await?;
        request.add_owner(client.base_url(), &owner_id);
    }

    let mut group = client.create_group(&request).await?;
    info!(group_id = %group.id, "Group created");

    if args.hidden {
        match client.set_hidden_from_address_lists(&group, true).await {
            Ok(_) => group.hide_from_address_lists = Some(true),
            Err(e) => {
                print_warning(&format!(
                    "Group '{}' was created but could not be hidden from address lists.",
                    group.display_name
                ));
                return Err(e.into());
            }
        }
    }

    if args.json {
        print_json(&GroupDetails::new(&group, None))?;
    } else {
        print_success(&format!("Group created: {}", group.label()));
        print_key_value("ID", &group.id);
        print_key_value("Alias", or_dash(group.mail_nickname.as_deref()));
        print_key_value("Type", &group.kind().to_string());
    }
    Ok(())
}

async fn resolve_owner(client: &GraphClient, owner: &str) -> CliResult<String> {
    let candidate = client
        .resolve_recipient(owner, ResolveOptions::default())
        .await?
        .into_unique(owner)?;
    if candidate.recipient.kind != RecipientKind::User {
        return Err(CliError::Validation(format!(
            "Owner '{}' is a {}, not a user.",
            owner, candidate.recipient.kind
        )));
    }
    Ok(candidate.recipient.id)
}

async fn execute_delete(ctx: &Context, args: DeleteArgs) -> CliResult<()> {
    let client = ctx.client()?;
    let group = client.lookup_group(&args.identity).await?;

    let prompt = format!(
        "Delete group '{}' ({})? It moves to the recycle bin.",
        group.display_name,
        group.kind()
    );
    if !confirm(&prompt, args.force)? {
        println!("Cancelled.");
        return Ok(());
    }

    client.delete_group(&group.id).await?;
    print_success(&format!("Group deleted: {}", group.label()));
    Ok(())
}

async fn execute_gal(ctx: &Context, args: GalArgs) -> CliResult<()> {
    let hidden = args.hide;
    let client = ctx.client()?;
    let group = client.lookup_group(&args.group).await?;

    let changed = client.set_hidden_from_address_lists(&group, hidden).await?;
    let state = if hidden { "hidden from" } else { "shown in" };
    if changed {
        print_success(&format!("'{}' is now {} address lists.", group.display_name, state));
    } else {
        print_info(&format!(
            "'{}' is already {} address lists; nothing to change.",
            group.display_name, state
        ));
    }
    Ok(())
}

fn print_group_details(group: &Group, member_count: Option<u64>) {
    print_section(&format!("Group: {}", group.display_name));
    print_key_value("ID", &group.id);
    print_key_value("Type", &group.kind().to_string());
    print_key_value("Mail", or_dash(group.mail.as_deref()));
    print_key_value("Alias", or_dash(group.mail_nickname.as_deref()));
    print_key_value("Description", or_dash(group.description.as_deref()));
    print_key_value(
        "Membership",
        if group.is_dynamic() { "dynamic" } else { "assigned" },
    );
    if let Some(hidden) = group.hide_from_address_lists {
        print_key_value("Hidden from GAL", if hidden { "yes" } else { "no" });
    }
    if let Some(created) = group.created_date_time {
        print_key_value("Created", &created.format("%Y-%m-%d %H:%M:%S UTC").to_string());
    }
    if let Some(count) = member_count {
        print_key_value("Members", &count.to_string());
    }

    let aliases: Vec<&str> = group
        .proxy_addresses
        .iter()
        .filter_map(|p| p.strip_prefix("smtp:"))
        .collect();
    if !aliases.is_empty() {
        print_key_value("Other addresses", &aliases.join(", "));
    }
}
