//! Output formatting helpers

pub mod printer;
pub mod table;

pub use printer::{or_dash, print_info, print_key_value, print_section, print_success, print_warning};
pub use table::{
    print_candidate_table, print_group_table, print_member_table, truncate, validate_limit,
    MAX_LIST_LIMIT,
};

use crate::error::CliResult;
use serde::Serialize;

/// Print a value as pretty JSON on stdout
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
