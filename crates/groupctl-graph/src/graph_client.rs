//! Microsoft Graph API HTTP client with pagination and read retries.

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

use crate::odata::{ODataError, ODataResponse, Query};
use crate::{GraphConfig, GraphCredentials, GraphError, GraphResult, TokenCache};

/// Longest `Retry-After` a read waits out; longer delays fail as `Throttled`.
pub const MAX_RETRY_AFTER_SECS: u64 = 60;

/// Microsoft Graph API client.
///
/// Only GET requests are retried (429 and 502/503/504). Mutations surface
/// their first failure to the caller.
#[derive(Debug)]
pub struct GraphClient {
    http_client: reqwest::Client,
    token_cache: TokenCache,
    base_url: String,
    page_size: u32,
    max_retries: u32,
}

impl GraphClient {
    /// Creates a new Graph client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &GraphConfig, credentials: GraphCredentials) -> GraphResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("groupctl/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GraphError::Config(format!("Failed to create HTTP client: {e}")))?;

        let token_cache = TokenCache::new(config, credentials, http_client.clone());

        Ok(Self {
            http_client,
            token_cache,
            base_url: config.base_url(),
            page_size: config.page_size,
            max_retries: config.max_retries,
        })
    }

    /// Versioned API root.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Page size used for collection queries.
    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Absolute URL for a path under the API root.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Forces token acquisition; used to verify credentials.
    pub async fn authenticate(&self) -> GraphResult<()> {
        self.token_cache.get_token().await.map(|_| ())
    }

    /// Performs a GET and deserializes the JSON body.
    #[instrument(skip(self))]
    pub async fn get<T: DeserializeOwned>(&self, url: &str) -> GraphResult<T> {
        let response = self.send(Method::GET, url, None::<&()>, false).await?;
        parse_json(response).await
    }

    /// Performs a GET, mapping 404 to `None`.
    pub async fn get_optional<T: DeserializeOwned>(&self, url: &str) -> GraphResult<Option<T>> {
        match self.get(url).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Performs an advanced-query GET returning a plain-text body (`/$count`).
    pub async fn get_count(&self, url: &str) -> GraphResult<u64> {
        let response = self.send(Method::GET, url, None::<&()>, true).await?;
        let text = response.text().await?;
        text.trim().parse::<u64>().map_err(|_| GraphError::GraphApi {
            status: 200,
            code: "InvalidCount".into(),
            message: format!("Unexpected count response: {text}"),
        })
    }

    /// Fetches a collection, following `@odata.nextLink` until exhausted or
    /// `limit` items have been collected.
    #[instrument(skip(self, query))]
    pub async fn collect<T: DeserializeOwned>(
        &self,
        query: &Query,
        limit: Option<usize>,
    ) -> GraphResult<Vec<T>> {
        let advanced = query.is_advanced();
        let mut url = query.to_url(&self.base_url);
        let mut items = Vec::new();

        loop {
            debug!("Fetching page: {}", url);
            let response = self.send(Method::GET, &url, None::<&()>, advanced).await?;
            let page: ODataResponse<T> = parse_json(response).await?;
            items.extend(page.value);

            if let Some(max) = limit {
                if items.len() >= max {
                    items.truncate(max);
                    return Ok(items);
                }
            }

            match page.next_link {
                Some(next) => url = next,
                None => return Ok(items),
            }
        }
    }

    /// Performs a POST and deserializes the created entity.
    #[instrument(skip(self, body))]
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, url: &str, body: &B) -> GraphResult<T> {
        let response = self.send(Method::POST, url, Some(body), false).await?;
        parse_json(response).await
    }

    /// Performs a POST that answers 204 No Content.
    #[instrument(skip(self, body))]
    pub async fn post_no_content<B: Serialize>(&self, url: &str, body: &B) -> GraphResult<()> {
        self.send(Method::POST, url, Some(body), false).await?;
        Ok(())
    }

    /// Performs a PATCH; Graph answers 204 No Content.
    #[instrument(skip(self, body))]
    pub async fn patch<B: Serialize>(&self, url: &str, body: &B) -> GraphResult<()> {
        self.send(Method::PATCH, url, Some(body), false).await?;
        Ok(())
    }

    /// Performs a DELETE.
    #[instrument(skip(self))]
    pub async fn delete(&self, url: &str) -> GraphResult<()> {
        self.send(Method::DELETE, url, None::<&()>, false).await?;
        Ok(())
    }

    async fn send<B: Serialize>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
        advanced: bool,
    ) -> GraphResult<reqwest::Response> {
        let retryable = method == Method::GET;
        let mut attempts = 0u32;
        let mut token_refreshed = false;
        let mut delay = Duration::from_millis(500);

        loop {
            let token = self.token_cache.get_token().await?;

            let mut request = self
                .http_client
                .request(method.clone(), url)
                .bearer_auth(&token);
            if advanced {
                request = request.header("ConsistencyLevel", "eventual");
            }
            if let Some(b) = body {
                request = request.json(b);
            }

            let started = Instant::now();
            let response = request.send().await?;
            let status = response.status();
            debug!(
                method = %method,
                url = %url,
                status = status.as_u16(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Graph request"
            );

            if status.is_success() {
                return Ok(response);
            }

            // An expired token is rejected before the request takes effect.
            if status == StatusCode::UNAUTHORIZED && !token_refreshed {
                token_refreshed = true;
                self.token_cache.invalidate().await;
                continue;
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                let retry_after = retry_after_secs(&response).unwrap_or(delay.as_secs().max(1));
                if retryable
                    && attempts < self.max_retries
                    && retry_after <= MAX_RETRY_AFTER_SECS
                {
                    attempts += 1;
                    warn!(
                        "Throttled, retry {}/{} after {}s",
                        attempts, self.max_retries, retry_after
                    );
                    tokio::time::sleep(Duration::from_secs(retry_after)).await;
                    delay *= 2;
                    continue;
                }
                return Err(GraphError::Throttled {
                    retry_after_secs: retry_after,
                });
            }

            if matches!(
                status,
                StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
            ) && retryable
                && attempts < self.max_retries
            {
                attempts += 1;
                warn!(
                    "Transient error {}, retry {}/{} after {:?}",
                    status, attempts, self.max_retries, delay
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
                continue;
            }

            let error_body = response.text().await.unwrap_or_default();
            return Err(error_from_body(status, &error_body));
        }
    }
}

async fn parse_json<T: DeserializeOwned>(response: reqwest::Response) -> GraphResult<T> {
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(GraphError::from)
}

fn retry_after_secs(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get("Retry-After")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}

/// Converts a failed reply into a `GraphError`, preferring the `OData` error body.
pub(crate) fn error_from_body(status: StatusCode, body: &str) -> GraphError {
    match serde_json::from_str::<ODataError>(body) {
        Ok(odata) => GraphError::GraphApi {
            status: status.as_u16(),
            code: odata.error.code,
            message: odata.error.message,
        },
        Err(_) => GraphError::GraphApi {
            status: status.as_u16(),
            code: status.canonical_reason().unwrap_or("Unknown").to_string(),
            message: body.to_string(),
        },
    }
}
