//! Bulk membership result types
//!
//! Types for tracking per-row outcomes of a member import.

use serde::Serialize;
use std::fmt;

/// Outcome of a single import row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStatus {
    /// Member was added
    Added,
    /// Member would be added (dry run)
    WouldAdd,
    /// Already a member, nothing to do
    AlreadyMember,
    /// Same value appeared earlier in the file
    Duplicate,
    /// Value rejected before any lookup
    Invalid,
    /// No recipient matches
    NotFound,
    /// Several recipients match
    Ambiguous,
    /// The add operation failed
    Failed,
}

impl ImportStatus {
    /// Every status in report order
    pub const ALL: [ImportStatus; 8] = [
        Self::Added,
        Self::WouldAdd,
        Self::AlreadyMember,
        Self::Duplicate,
        Self::Invalid,
        Self::NotFound,
        Self::Ambiguous,
        Self::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "Added",
            Self::WouldAdd => "WouldAdd",
            Self::AlreadyMember => "AlreadyMember",
            Self::Duplicate => "Duplicate",
            Self::Invalid => "Invalid",
            Self::NotFound => "NotFound",
            Self::Ambiguous => "Ambiguous",
            Self::Failed => "Failed",
        }
    }
}

impl fmt::Display for ImportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result for a single row of the input file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportItem {
    /// Line number in the CSV file (header is line 1)
    pub row: usize,
    /// Value as read from the file
    pub input: String,
    pub status: ImportStatus,
    /// Resolved member id, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    /// Reason for skips and failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ImportItem {
    pub fn new(row: usize, input: &str, status: ImportStatus) -> Self {
        Self {
            row,
            input: input.to_string(),
            status,
            object_id: None,
            detail: None,
        }
    }

    pub fn with_object_id(mut self, id: impl Into<String>) -> Self {
        self.object_id = Some(id.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Status with its count, for summaries
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: ImportStatus,
    pub count: usize,
}

/// Summary of a completed import
#[derive(Debug, Clone, Serialize)]
pub struct ImportResult {
    /// Target group id
    pub group_id: String,
    /// Target group display name
    pub group_name: String,
    pub dry_run: bool,
    /// Rows read from the file
    pub total: usize,
    /// Per-row results
    pub items: Vec<ImportItem>,
    /// Total operation duration in milliseconds
    pub duration_ms: u64,
}

impl ImportResult {
    pub fn new(group_id: &str, group_name: &str, total: usize, dry_run: bool) -> Self {
        Self {
            group_id: group_id.to_string(),
            group_name: group_name.to_string(),
            dry_run,
            total,
            items: Vec::with_capacity(total),
            duration_ms: 0,
        }
    }

    pub fn record(&mut self, item: ImportItem) {
        self.items.push(item);
    }

    pub fn set_duration(&mut self, duration_ms: u64) {
        self.duration_ms = duration_ms;
    }

    /// Number of rows with `status`
    pub fn count(&self, status: ImportStatus) -> usize {
        self.items.iter().filter(|i| i.status == status).count()
    }

    /// Non-zero counts in report order
    pub fn counts(&self) -> Vec<StatusCount> {
        ImportStatus::ALL
            .iter()
            .map(|&status| StatusCount {
                status,
                count: self.count(status),
            })
            .filter(|c| c.count > 0)
            .collect()
    }

    /// Only failed adds affect the exit status; skips never do
    pub fn has_failures(&self) -> bool {
        self.count(ImportStatus::Failed) > 0
    }

    /// Rows the operator has to look at: bad input, no match, or a failed add
    pub fn needs_attention(&self) -> impl Iterator<Item = &ImportItem> {
        self.items.iter().filter(|i| {
            matches!(
                i.status,
                ImportStatus::Invalid
                    | ImportStatus::NotFound
                    | ImportStatus::Ambiguous
                    | ImportStatus::Failed
            )
        })
    }
}
