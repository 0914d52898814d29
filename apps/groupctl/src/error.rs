//! CLI error types and exit codes

use groupctl_graph::GraphError;
use thiserror::Error;

/// Exit codes for the CLI
/// - 0: Success
/// - 1: General error, or a bulk run with failed operations
/// - 2: Authentication failed
/// - 3: Network error
/// - 4: Validation error (bad input, ambiguous identifier, conflict)
/// - 5: Server error
/// - 6: Not found
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Not configured: {0}")]
    NotConfigured(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Connection failed: {0}\n\nTroubleshooting:\n  - Check your internet connection\n  - Verify the Graph and login endpoints are reachable\n  - Try again in a few moments")]
    ConnectionFailed(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("'{input}' is ambiguous, it matches:\n{}", candidates.iter().map(|c| format!("  - {c}")).collect::<Vec<_>>().join("\n"))]
    Ambiguous {
        input: String,
        candidates: Vec<String>,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("{failed} of {total} operations failed")]
    PartialFailure { failed: usize, total: usize },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::AuthenticationFailed(_) => 2,
            CliError::Network(_) | CliError::ConnectionFailed(_) => 3,
            CliError::Validation(_)
            | CliError::Ambiguous { .. }
            | CliError::Conflict(_)
            | CliError::Csv(_) => 4,
            CliError::Server(_) => 5,
            CliError::NotFound(_) => 6,
            CliError::Api { status, .. } => match *status {
                s if s >= 500 => 5,
                401 | 403 => 2,
                404 => 6,
                _ => 4,
            },
            CliError::NotConfigured(_)
            | CliError::Config(_)
            | CliError::Io(_)
            | CliError::PartialFailure { .. } => 1,
        }
    }

    /// Print the error to stderr with appropriate formatting
    pub fn print(&self) {
        let use_color = std::env::var("NO_COLOR").is_err();

        if use_color {
            eprintln!("\x1b[31mError:\x1b[0m {}", self);
        } else {
            eprintln!("Error: {}", self);
        }

        if let Some(suggestion) = self.suggestion() {
            if use_color {
                eprintln!("\n\x1b[33mSuggestion:\x1b[0m {}", suggestion);
            } else {
                eprintln!("\nSuggestion: {}", suggestion);
            }
        }
    }

    /// Get a suggested action for this error
    fn suggestion(&self) -> Option<&'static str> {
        match self {
            CliError::NotConfigured(_) => Some(
                "Run 'groupctl config init --tenant-id <TENANT> --client-id <APP_ID>' and set GROUPCTL_CLIENT_SECRET.",
            ),
            CliError::AuthenticationFailed(_) => {
                Some("Check the client secret and that the app has admin-consented Graph permissions.")
            }
            CliError::Ambiguous { .. } => {
                Some("Pass the object id or the full primary address instead.")
            }
            CliError::ConnectionFailed(_) => Some("Check your network connection and try again."),
            _ => None,
        }
    }
}

impl From<GraphError> for CliError {
    fn from(e: GraphError) -> Self {
        match e {
            GraphError::Config(msg) => CliError::Config(msg),
            GraphError::Auth(msg) => CliError::AuthenticationFailed(msg),
            GraphError::GraphApi {
                status,
                code,
                message,
            } => match status {
                404 => CliError::NotFound(message),
                _ => CliError::Api {
                    status,
                    message: format!("{code}: {message}"),
                },
            },
            GraphError::Http(e) => e.into(),
            GraphError::Json(e) => CliError::Server(format!("Unexpected response body: {e}")),
            GraphError::Url(e) => CliError::Config(format!("Invalid endpoint URL: {e}")),
            GraphError::NotFound(msg) => CliError::NotFound(msg),
            GraphError::Ambiguous { input, candidates } => CliError::Ambiguous { input, candidates },
            GraphError::InvalidIdentifier(msg) | GraphError::Unsupported(msg) => {
                CliError::Validation(msg)
            }
            GraphError::Throttled { retry_after_secs } => CliError::Server(format!(
                "Throttled by the service, retry after {retry_after_secs} seconds"
            )),
        }
    }
}

impl From<reqwest::Error> for CliError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() {
            CliError::ConnectionFailed(e.to_string())
        } else if e.is_timeout() {
            CliError::Network("Request timed out".to_string())
        } else {
            CliError::Network(e.to_string())
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Config(format!("JSON error: {}", e))
    }
}

impl From<csv::Error> for CliError {
    fn from(e: csv::Error) -> Self {
        CliError::Csv(e.to_string())
    }
}

impl From<dialoguer::Error> for CliError {
    fn from(e: dialoguer::Error) -> Self {
        CliError::Io(format!("Prompt error: {}", e))
    }
}
