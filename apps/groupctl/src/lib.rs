//! groupctl library
//!
//! Modules behind the `groupctl` binary, exposed for integration testing.
//! Argument parsing and process exit live in main.rs.

pub mod batch;
pub mod commands;
pub mod config;
pub mod error;
pub mod formats;
pub mod logging;
pub mod output;
