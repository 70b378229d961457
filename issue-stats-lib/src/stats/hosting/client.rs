//! GitHub API client
//!
//! Minimal GitHub API client for listing repository issues with a per-user token.

use super::resilient_http::{RetryPolicy, resilient_get};
use crate::Result;
use chrono::{DateTime, Utc};
use core::time::Duration;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};

const USER_AGENT: &str = concat!("issue-stats/", env!("CARGO_PKG_VERSION"));

/// Rate limit information from response headers
#[derive(Debug, Clone, Copy)]
pub struct RateLimitInfo {
    pub remaining: usize,
    pub reset_at: DateTime<Utc>,
}

/// Result of a hosting API call
#[derive(Debug)]
pub enum HostingApiResult<T> {
    /// Request succeeded
    Success(T),

    /// Rate limited - should retry after reset time
    RateLimited(RateLimitInfo),

    /// The requested resource was not found (404)
    NotFound,

    /// Request failed permanently - should NOT retry
    Failed(ohno::AppError),
}

/// Hosting API client
#[derive(Debug, Clone)]
#[expect(clippy::struct_field_names, reason = "client field stores the underlying HTTP client")]
pub struct Client {
    client: reqwest::Client,
    base_url: String,
    request_timeout: Duration,
    retry: RetryPolicy,
}

impl Client {
    /// Create a new hosting API client for the given base URL
    ///
    /// `request_timeout` bounds each attempt; `retry` governs how transient failures are retried.
    pub fn new(base_url: impl Into<String>, request_timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            request_timeout,
            retry,
        })
    }

    /// Get the base URL for this client
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Make an authenticated API call and classify the result
    pub async fn api_call(&self, url: &str, token: &str) -> HostingApiResult<reqwest::Response> {
        let mut auth_val = match HeaderValue::from_str(&format!("token {token}")) {
            Ok(v) => v,
            Err(e) => return HostingApiResult::Failed(ohno::AppError::from(e)),
        };
        auth_val.set_sensitive(true);

        let resp = match resilient_get(&self.client, url, &auth_val, self.request_timeout, self.retry).await {
            Ok(r) => r,
            Err(e) => return HostingApiResult::Failed(e),
        };

        let status = resp.status();
        if status.is_success() {
            return HostingApiResult::Success(resp);
        }

        if let Some(rate_limit) = rate_limit_of(status, resp.headers(), Utc::now()) {
            return HostingApiResult::RateLimited(rate_limit);
        }

        if status == StatusCode::NOT_FOUND {
            return HostingApiResult::NotFound;
        }

        // Any other HTTP error is a permanent failure
        match resp.error_for_status() {
            Ok(resp) => HostingApiResult::Failed(ohno::app_err!("unexpected HTTP status {}", resp.status())),
            Err(e) => HostingApiResult::Failed(e.into()),
        }
    }
}

/// Decide whether a failed response signals rate limiting.
///
/// 429 always does. 403 does only when the quota is exhausted or the server asks for a
/// retry; otherwise it is a plain authorization failure.
fn rate_limit_of(status: StatusCode, headers: &HeaderMap, now: DateTime<Utc>) -> Option<RateLimitInfo> {
    let from_headers = extract_rate_limit_from_headers(headers);
    let retry_after = parse_retry_after(headers).map(|secs| RateLimitInfo {
        remaining: 0,
        reset_at: now + chrono::Duration::seconds(secs),
    });

    let limited = match status {
        StatusCode::TOO_MANY_REQUESTS => true,
        StatusCode::FORBIDDEN => retry_after.is_some() || from_headers.is_some_and(|rl| rl.remaining == 0),
        _ => false,
    };

    limited.then(|| {
        retry_after.or(from_headers).unwrap_or_else(|| RateLimitInfo {
            remaining: 0,
            reset_at: now + chrono::Duration::hours(1),
        })
    })
}

/// Parse the `Retry-After` header value as seconds.
fn parse_retry_after(headers: &HeaderMap) -> Option<i64> {
    headers.get(reqwest::header::RETRY_AFTER)?.to_str().ok()?.parse::<i64>().ok()
}

/// Extract rate limit information from API response headers
fn extract_rate_limit_from_headers(headers: &HeaderMap) -> Option<RateLimitInfo> {
    let remaining = headers.get("x-ratelimit-remaining")?.to_str().ok()?.parse::<usize>().ok()?;

    let reset_timestamp = headers.get("x-ratelimit-reset")?.to_str().ok()?.parse::<i64>().ok()?;

    let reset_at = DateTime::from_timestamp(reset_timestamp, 0)?;

    Some(RateLimitInfo { remaining, reset_at })
}
