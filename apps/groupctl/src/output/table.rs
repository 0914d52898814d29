//! Table display helpers for CLI commands

use groupctl_graph::{Candidate, Group, Recipient};

use super::printer::or_dash;
use crate::error::{CliError, CliResult};

/// Largest page a single `list` call may request.
pub const MAX_LIST_LIMIT: usize = 999;

/// Truncate a string for table display, handling Unicode safely.
///
/// If the string exceeds `max_len` characters, it is truncated with "..." appended.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}

/// Validate a `--limit` value.
pub fn validate_limit(limit: usize) -> CliResult<()> {
    if !(1..=MAX_LIST_LIMIT).contains(&limit) {
        return Err(CliError::Validation(format!(
            "Limit must be between 1 and {MAX_LIST_LIMIT}."
        )));
    }
    Ok(())
}

/// Print groups as a table
pub fn print_group_table(groups: &[Group]) {
    println!(
        "{:<38} {:<30} {:<22} {:<30}",
        "ID", "NAME", "TYPE", "MAIL"
    );
    println!("{}", "-".repeat(122));

    for group in groups {
        println!(
            "{:<38} {:<30} {:<22} {:<30}",
            group.id,
            truncate(&group.display_name, 30),
            group.kind().to_string(),
            truncate(or_dash(group.mail.as_deref()), 30)
        );
    }
}

/// Print directory members as a table
pub fn print_member_table(members: &[Recipient]) {
    println!(
        "{:<38} {:<28} {:<8} {:<36}",
        "ID", "NAME", "TYPE", "ADDRESS"
    );
    println!("{}", "-".repeat(112));

    for member in members {
        println!(
            "{:<38} {:<28} {:<8} {:<36}",
            member.id,
            truncate(&member.display_name, 28),
            member.kind.to_string(),
            truncate(or_dash(member.primary_address()), 36)
        );
    }
}

/// Print resolution candidates with their match strength
pub fn print_candidate_table(candidates: &[Candidate]) {
    println!(
        "{:<38} {:<28} {:<8} {:<8} {:<36}",
        "ID", "NAME", "TYPE", "MATCH", "ADDRESS"
    );
    println!("{}", "-".repeat(121));

    for candidate in candidates {
        let recipient = &candidate.recipient;
        println!(
            "{:<38} {:<28} {:<8} {:<8} {:<36}",
            recipient.id,
            truncate(&recipient.display_name, 28),
            recipient.kind.to_string(),
            candidate.match_kind.to_string(),
            truncate(or_dash(recipient.primary_address()), 36)
        );
    }
}
