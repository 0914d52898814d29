//! `OData` query construction and input shape checks.

use serde::Deserialize;

/// `OData` error response from Microsoft Graph.
#[derive(Debug, Deserialize)]
pub struct ODataError {
    pub error: ODataErrorBody,
}

/// `OData` error body.
#[derive(Debug, Deserialize)]
pub struct ODataErrorBody {
    pub code: String,
    pub message: String,
}

/// Response wrapper for paginated collection responses.
#[derive(Debug, Deserialize)]
pub struct ODataResponse<T> {
    pub value: Vec<T>,
    #[serde(rename = "@odata.nextLink")]
    pub next_link: Option<String>,
}

/// Quotes a value as an `OData` string literal.
#[must_use]
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Strips a leading `smtp:` (any case) from a proxy address.
#[must_use]
pub fn strip_smtp_prefix(value: &str) -> &str {
    match value.get(..5) {
        Some(prefix) if prefix.eq_ignore_ascii_case("smtp:") => &value[5..],
        _ => value,
    }
}

/// Loose check for `local@domain.tld` shaped strings.
#[must_use]
pub fn is_email_shaped(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = value.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}

/// Directory object ids are GUIDs.
#[must_use]
pub fn looks_like_object_id(value: &str) -> bool {
    uuid::Uuid::parse_str(value.trim()).is_ok()
}

/// A collection query: path plus `$select`, `$filter`, `$top`, `$count`.
#[derive(Debug, Clone, Default)]
pub struct Query {
    path: String,
    select: Option<String>,
    filter: Option<String>,
    top: Option<u32>,
    count: bool,
}

impl Query {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn select(mut self, fields: &str) -> Self {
        self.select = Some(fields.to_string());
        self
    }

    #[must_use]
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    #[must_use]
    pub fn top(mut self, top: u32) -> Self {
        self.top = Some(top);
        self
    }

    /// Marks the query as an advanced query (`$count=true`, needs `ConsistencyLevel: eventual`).
    #[must_use]
    pub fn count(mut self) -> Self {
        self.count = true;
        self
    }

    /// Whether the request must carry `ConsistencyLevel: eventual`.
    #[must_use]
    pub fn is_advanced(&self) -> bool {
        self.count
    }

    /// Renders the full URL under `base_url`.
    #[must_use]
    pub fn to_url(&self, base_url: &str) -> String {
        let mut params = Vec::new();
        if let Some(ref select) = self.select {
            params.push(format!("$select={select}"));
        }
        if let Some(ref filter) = self.filter {
            params.push(format!("$filter={}", urlencoding::encode(filter)));
        }
        if let Some(top) = self.top {
            params.push(format!("$top={top}"));
        }
        if self.count {
            params.push("$count=true".to_string());
        }

        if params.is_empty() {
            format!("{base_url}{}", self.path)
        } else {
            format!("{base_url}{}?{}", self.path, params.join("&"))
        }
    }
}
