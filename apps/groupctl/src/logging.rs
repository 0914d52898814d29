//! Diagnostic logging to stderr
//!
//! Verbosity comes from `-v`/`--quiet`; `GROUPCTL_LOG` takes an `EnvFilter`
//! directive and wins over the flags. Stdout stays reserved for command output.

use std::fmt;

use tracing_subscriber::EnvFilter;

/// Environment variable holding an `EnvFilter` directive
pub const LOG_ENV: &str = "GROUPCTL_LOG";

/// Verbosity level for diagnostics
///
/// Levels are ordered: Quiet < Normal < Verbose < Debug < Trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    /// Errors only
    Quiet,
    /// Warnings and errors (default)
    #[default]
    Normal,
    /// Progress of each operation
    Verbose,
    /// HTTP method, URL, status code, timing
    Debug,
    /// Everything
    Trace,
}

impl LogLevel {
    /// Create LogLevel from CLI flags; `--quiet` wins over `-v`
    pub fn from_flags(verbose: u8, quiet: bool) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            2 => Self::Debug,
            _ => Self::Trace,
        }
    }

    /// `EnvFilter` directive for this level
    pub fn directive(&self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "warn,groupctl=info,groupctl_graph=info",
            Self::Debug => "warn,groupctl=debug,groupctl_graph=debug",
            Self::Trace => "info,groupctl=trace,groupctl_graph=trace",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Quiet => "QUIET",
            Self::Normal => "NORMAL",
            Self::Verbose => "VERBOSE",
            Self::Debug => "DEBUG",
            Self::Trace => "TRACE",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Install the global subscriber. Safe to call more than once.
pub fn init(level: LogLevel) {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level.directive()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(level >= LogLevel::Debug)
        .without_time()
        .try_init();
}
