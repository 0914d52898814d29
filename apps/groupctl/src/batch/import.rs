//! Row checks that run before any lookup

use std::collections::HashSet;

use groupctl_graph::odata::{is_email_shaped, strip_smtp_prefix};
use groupctl_graph::{Identifier, MembershipSnapshot};

use super::result::ImportStatus;

/// Decision for one row before resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precheck {
    /// Resolve this (normalized) value
    Resolve(String),
    /// Record the row with this status and reason; no remote call
    Skip(ImportStatus, String),
}

/// Tracks values seen so far in one file
#[derive(Debug, Default)]
pub struct ImportPlanner {
    strict: bool,
    seen: HashSet<String>,
}

impl ImportPlanner {
    pub fn new(strict: bool) -> Self {
        Self {
            strict,
            seen: HashSet::new(),
        }
    }

    /// Lowercase, trimmed, `smtp:` stripped
    pub fn normalize(raw: &str) -> String {
        strip_smtp_prefix(raw.trim()).trim().to_ascii_lowercase()
    }

    /// Checks one row: validity, duplicates within the file, then the
    /// address side of the membership snapshot.
    pub fn precheck(&mut self, raw: &str, snapshot: &MembershipSnapshot) -> Precheck {
        let value = Self::normalize(raw);

        if self.strict && !is_email_shaped(&value) {
            return Precheck::Skip(
                ImportStatus::Invalid,
                "not an email address (strict mode)".to_string(),
            );
        }
        if let Err(e) = Identifier::parse(&value) {
            return Precheck::Skip(ImportStatus::Invalid, e.to_string());
        }

        if !self.seen.insert(value.clone()) {
            return Precheck::Skip(
                ImportStatus::Duplicate,
                "appears earlier in the file".to_string(),
            );
        }

        if snapshot.contains_address(&value) {
            return Precheck::Skip(
                ImportStatus::AlreadyMember,
                "address already in the group".to_string(),
            );
        }

        Precheck::Resolve(value)
    }
}
