//! CSV input and output
//!
//! - Identifier input: any CSV with a header row; one column is read
//! - Member export: DisplayName, Email, UserPrincipalName, Id, Type
//! - Import report: Row, Input, Status, ObjectId, Detail
//! - Resolve report: Input, Status, ObjectId, UserPrincipalName, Email, DisplayName

use std::io::Write;

use groupctl_graph::Recipient;
use serde::Serialize;

use crate::batch::ImportItem;
use crate::error::{CliError, CliResult};

/// Header names tried, in order, when no column is given
const DEFAULT_COLUMNS: [&str; 2] = ["Email", "UserPrincipalName"];

/// One non-blank identifier cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvIdentifier {
    /// Line number in the file (header is line 1)
    pub row: usize,
    pub value: String,
}

/// Identifiers read from a CSV file
#[derive(Debug, Clone)]
pub struct CsvIdentifiers {
    /// Header of the column that was read
    pub column: String,
    pub rows: Vec<CsvIdentifier>,
}

/// Read a single identifier column from CSV content.
///
/// The column is `column` when given, else `Email`, else `UserPrincipalName`
/// (header match is case-insensitive), else the only column of a
/// single-column file. Blank cells are skipped.
pub fn read_identifiers(content: &str, column: Option<&str>) -> CliResult<CsvIdentifiers> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = rdr.headers()?.clone();
    if headers.is_empty() || headers.iter().all(str::is_empty) {
        return Err(CliError::Csv("CSV file has no header row".to_string()));
    }

    let index = select_column(&headers, column)?;
    let column_name = headers.get(index).unwrap_or_default().to_string();

    let mut rows = Vec::new();
    for (idx, record) in rdr.records().enumerate() {
        let record = record.map_err(|e| CliError::Csv(format!("Line {}: {}", idx + 2, e)))?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(idx + 2);
        if let Some(value) = record.get(index).filter(|v| !v.is_empty()) {
            rows.push(CsvIdentifier {
                row: line,
                value: value.to_string(),
            });
        }
    }

    Ok(CsvIdentifiers {
        column: column_name,
        rows,
    })
}

fn select_column(headers: &csv::StringRecord, column: Option<&str>) -> CliResult<usize> {
    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name.trim()))
    };

    if let Some(name) = column {
        return find(name).ok_or_else(|| {
            CliError::Csv(format!(
                "Column '{}' not found. Available columns: {}",
                name,
                headers.iter().collect::<Vec<_>>().join(", ")
            ))
        });
    }

    if let Some(index) = DEFAULT_COLUMNS.iter().find_map(|name| find(name)) {
        return Ok(index);
    }

    if headers.len() == 1 {
        return Ok(0);
    }

    Err(CliError::Csv(format!(
        "No Email or UserPrincipalName column; pass --column. Available columns: {}",
        headers.iter().collect::<Vec<_>>().join(", ")
    )))
}

/// CSV record for an exported member
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct MemberRecord {
    pub display_name: String,
    pub email: String,
    pub user_principal_name: String,
    pub id: String,
    #[serde(rename = "Type")]
    pub kind: String,
}

impl From<&Recipient> for MemberRecord {
    fn from(member: &Recipient) -> Self {
        Self {
            display_name: member.display_name.clone(),
            email: member.mail.clone().unwrap_or_default(),
            user_principal_name: member.user_principal_name.clone().unwrap_or_default(),
            id: member.id.clone(),
            kind: member.kind.to_string(),
        }
    }
}

/// Export members to CSV
pub fn export_members_csv<W: Write>(members: &[Recipient], writer: W) -> CliResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    if members.is_empty() {
        wtr.write_record(["DisplayName", "Email", "UserPrincipalName", "Id", "Type"])?;
    }
    for member in members {
        wtr.serialize(MemberRecord::from(member))?;
    }
    wtr.flush()
        .map_err(|e| CliError::Io(format!("Failed to flush CSV: {}", e)))?;
    Ok(())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ReportRecord<'a> {
    row: usize,
    input: &'a str,
    status: &'a str,
    object_id: &'a str,
    detail: &'a str,
}

/// Write the per-row import report
pub fn write_import_report<W: Write>(items: &[ImportItem], writer: W) -> CliResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    if items.is_empty() {
        wtr.write_record(["Row", "Input", "Status", "ObjectId", "Detail"])?;
    }
    for item in items {
        wtr.serialize(ReportRecord {
            row: item.row,
            input: &item.input,
            status: item.status.as_str(),
            object_id: item.object_id.as_deref().unwrap_or_default(),
            detail: item.detail.as_deref().unwrap_or_default(),
        })?;
    }
    wtr.flush()
        .map_err(|e| CliError::Io(format!("Failed to flush CSV: {}", e)))?;
    Ok(())
}

/// One row of a bulk resolve
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct ResolveRecord {
    pub input: String,
    /// Resolved, NotFound, Ambiguous or Invalid
    pub status: String,
    pub object_id: String,
    pub user_principal_name: String,
    pub email: String,
    pub display_name: String,
}

impl ResolveRecord {
    pub fn resolved(input: &str, recipient: &Recipient) -> Self {
        Self {
            input: input.to_string(),
            status: "Resolved".to_string(),
            object_id: recipient.id.clone(),
            user_principal_name: recipient.user_principal_name.clone().unwrap_or_default(),
            email: recipient.mail.clone().unwrap_or_default(),
            display_name: recipient.display_name.clone(),
        }
    }

    pub fn unresolved(input: &str, status: &str) -> Self {
        Self {
            input: input.to_string(),
            status: status.to_string(),
            object_id: String::new(),
            user_principal_name: String::new(),
            email: String::new(),
            display_name: String::new(),
        }
    }
}

/// Write bulk resolve results
pub fn write_resolve_report<W: Write>(records: &[ResolveRecord], writer: W) -> CliResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    if records.is_empty() {
        wtr.write_record([
            "Input",
            "Status",
            "ObjectId",
            "UserPrincipalName",
            "Email",
            "DisplayName",
        ])?;
    }
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()
        .map_err(|e| CliError::Io(format!("Failed to flush CSV: {}", e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::ImportStatus;
    use groupctl_graph::RecipientKind;

    fn values(ids: &CsvIdentifiers) -> Vec<(usize, &str)> {
        ids.rows.iter().map(|r| (r.row, r.value.as_str())).collect()
    }

    #[test]
    fn test_email_column_preferred() {
        let csv = "Name,email,UserPrincipalName\nJane,jane@x.com,jane@x.onmicrosoft.com\n";
        let ids = read_identifiers(csv, None).unwrap();
        assert_eq!(ids.column, "email");
        assert_eq!(values(&ids), vec![(2, "jane@x.com")]);
    }

    #[test]
    fn test_upn_column_fallback() {
        let csv = "Name,UserPrincipalName\nJane,jane@x.onmicrosoft.com\n";
        let ids = read_identifiers(csv, None).unwrap();
        assert_eq!(ids.column, "UserPrincipalName");
    }

    #[test]
    fn test_explicit_column() {
        let csv = "Alias,Email\njdoe,jane@x.com\n";
        let ids = read_identifiers(csv, Some("alias")).unwrap();
        assert_eq!(values(&ids), vec![(2, "jdoe")]);
    }

    #[test]
    fn test_single_column_file() {
        let csv = "Member\njane@x.com\njohn@x.com\n";
        let ids = read_identifiers(csv, None).unwrap();
        assert_eq!(values(&ids), vec![(2, "jane@x.com"), (3, "john@x.com")]);
    }

    #[test]
    fn test_blank_cells_skipped_rows_keep_line_numbers() {
        let csv = "Email,Name\njane@x.com,Jane\n  ,Nobody\n,\njohn@x.com,John\n";
        let ids = read_identifiers(csv, None).unwrap();
        assert_eq!(values(&ids), vec![(2, "jane@x.com"), (5, "john@x.com")]);
    }

    #[test]
    fn test_bom_stripped() {
        let csv = "\u{feff}Email\njane@x.com\n";
        let ids = read_identifiers(csv, None).unwrap();
        assert_eq!(ids.column, "Email");
        assert_eq!(ids.rows.len(), 1);
    }

    #[test]
    fn test_missing_column_errors() {
        let csv = "Name,Dept\nJane,Sales\n";
        let err = read_identifiers(csv, None).unwrap_err();
        assert_eq!(err.exit_code(), 4);
        assert!(err.to_string().contains("--column"));

        let err = read_identifiers(csv, Some("Email")).unwrap_err();
        assert!(err.to_string().contains("Available columns: Name, Dept"));
    }

    #[test]
    fn test_export_members_csv() {
        let members = vec![Recipient {
            id: "u1".into(),
            kind: RecipientKind::User,
            display_name: "Doe, Jane".into(),
            mail: Some("jane@x.com".into()),
            user_principal_name: Some("jane@x.onmicrosoft.com".into()),
            mail_nickname: None,
            secondary_addresses: vec![],
        }];
        let mut out = Vec::new();
        export_members_csv(&members, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "DisplayName,Email,UserPrincipalName,Id,Type\n\"Doe, Jane\",jane@x.com,jane@x.onmicrosoft.com,u1,User\n"
        );
    }

    #[test]
    fn test_empty_export_has_header() {
        let mut out = Vec::new();
        export_members_csv(&[], &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "DisplayName,Email,UserPrincipalName,Id,Type\n"
        );
    }

    #[test]
    fn test_import_report() {
        let items = vec![
            ImportItem::new(2, "jane@x.com", ImportStatus::Added).with_object_id("u1"),
            ImportItem::new(3, "ghost@x.com", ImportStatus::NotFound)
                .with_detail("no recipient matches 'ghost@x.com'"),
        ];
        let mut out = Vec::new();
        write_import_report(&items, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Row,Input,Status,ObjectId,Detail");
        assert_eq!(lines[1], "2,jane@x.com,Added,u1,");
        assert_eq!(lines[2], "3,ghost@x.com,NotFound,,no recipient matches 'ghost@x.com'");
    }

    #[test]
    fn test_resolve_report() {
        let records = vec![ResolveRecord::unresolved("nobody", "NotFound")];
        let mut out = Vec::new();
        write_resolve_report(&records, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "Input,Status,ObjectId,UserPrincipalName,Email,DisplayName\nnobody,NotFound,,,,\n"
        );
    }
}
