//! File formats for bulk input and reports

pub mod csv;

pub use self::csv::{
    export_members_csv, read_identifiers, write_import_report, write_resolve_report,
    CsvIdentifier, CsvIdentifiers, MemberRecord, ResolveRecord,
};
