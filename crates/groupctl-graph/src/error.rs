//! Error types for the Graph directory client.

use thiserror::Error;

/// Result type alias using `GraphError`.
pub type GraphResult<T> = Result<T, GraphError>;

/// Errors that can occur when talking to the directory service.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// `OAuth2` authentication error.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Microsoft Graph API error.
    #[error("Graph API error ({status}): {code} - {message}")]
    GraphApi {
        status: u16,
        code: String,
        message: String,
    },

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// No object matched the identifier.
    #[error("Not found: {0}")]
    NotFound(String),

    /// More than one object matched and none could be preferred.
    #[error("'{input}' matches {} objects: {}", candidates.len(), candidates.join(", "))]
    Ambiguous {
        input: String,
        candidates: Vec<String>,
    },

    /// The identifier was rejected before any remote call.
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// The operation does not apply to this kind of object.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Throttling persisted past the retry budget.
    #[error("Throttled by the service, retry after {retry_after_secs} seconds")]
    Throttled { retry_after_secs: u64 },
}

impl GraphError {
    /// HTTP status of the failed call, when one was received.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            GraphError::GraphApi { status, .. } => Some(*status),
            GraphError::Http(e) => e.status().map(|s| s.as_u16()),
            GraphError::Throttled { .. } => Some(429),
            _ => None,
        }
    }

    /// True for local not-found results and remote 404 replies.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, GraphError::NotFound(_)) || self.status() == Some(404)
    }

    /// True when the service rejected an add because the reference already exists.
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        match self {
            GraphError::GraphApi {
                status, message, ..
            } => *status == 400 && message.to_ascii_lowercase().contains("already exist"),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_from_status() {
        let err = GraphError::GraphApi {
            status: 404,
            code: "Request_ResourceNotFound".into(),
            message: "Resource 'x' does not exist".into(),
        };
        assert!(err.is_not_found());
        assert!(GraphError::NotFound("x".into()).is_not_found());
        assert!(!GraphError::Config("x".into()).is_not_found());
    }

    #[test]
    fn test_already_exists_detection() {
        let err = GraphError::GraphApi {
            status: 400,
            code: "Request_BadRequest".into(),
            message: "One or more added object references already exist for the following modified properties: 'members'.".into(),
        };
        assert!(err.is_already_exists());

        let other = GraphError::GraphApi {
            status: 400,
            code: "Request_BadRequest".into(),
            message: "Invalid object identifier".into(),
        };
        assert!(!other.is_already_exists());
    }

    #[test]
    fn test_ambiguous_display() {
        let err = GraphError::Ambiguous {
            input: "jdoe".into(),
            candidates: vec!["a@x.com".into(), "b@x.com".into()],
        };
        assert_eq!(err.to_string(), "'jdoe' matches 2 objects: a@x.com, b@x.com");
    }
}
