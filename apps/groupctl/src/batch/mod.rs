//! Bulk membership operations
//!
//! Per-row prechecks, result tracking, and progress reporting for
//! `group import-members`.

pub mod import;
pub mod progress;
pub mod result;

pub use import::{ImportPlanner, Precheck};
pub use progress::BatchProgress;
pub use result::{ImportItem, ImportResult, ImportStatus, StatusCount};
