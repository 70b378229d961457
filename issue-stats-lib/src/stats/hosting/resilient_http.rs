//! Retry and timeout middleware for GitHub API requests.
//!
//! Each GET runs through a [`seatbelt`] stack: a per-attempt timeout wrapped in an
//! exponential-backoff retry, so connection drops and 5xx responses are masked.
//! Rate limiting is not retried here; the fetcher waits those out itself.

use crate::Result;
use core::time::Duration;
use layered::{Execute, Service, Stack};
use ohno::app_err;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use seatbelt::retry::{Backoff, Retry};
use seatbelt::timeout::Timeout;
use seatbelt::{RecoveryInfo, ResilienceContext};
use tick::Clock;

const LOG_TARGET: &str = "      http";

/// How often and how patiently to retry a request that failed transiently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retry attempts on top of the original request.
    pub max_retry_attempts: u32,
    /// Delay before the first retry, doubled for each subsequent one.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retry_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_retry_attempts: 0,
            base_delay: Duration::ZERO,
        }
    }
}

/// Classify an HTTP outcome for retry purposes.
fn should_retry_response(result: &Result<reqwest::Response>) -> RecoveryInfo {
    match result {
        // Network errors and per-attempt timeouts are transient.
        Err(_) => RecoveryInfo::retry(),

        Ok(resp) if resp.status().is_server_error() => RecoveryInfo::retry(),

        // Success, rate limits and other client errors are left to the caller.
        Ok(_) => RecoveryInfo::never(),
    }
}

/// Send an authenticated GET with a per-attempt timeout and retries on transient failures.
///
/// Once retries run out the last response is returned as-is, so callers still get to
/// classify a final 5xx themselves.
pub async fn resilient_get(
    client: &reqwest::Client,
    url: &str,
    authorization: &HeaderValue,
    request_timeout: Duration,
    policy: RetryPolicy,
) -> Result<reqwest::Response> {
    let clock = Clock::new_tokio();
    let context = ResilienceContext::new(&clock).name("github_get");

    let client = client.clone();
    let authorization = authorization.clone();
    let service = (
        Retry::layer("retry", &context)
            .clone_input()
            .recovery_with(|result: &Result<reqwest::Response>, _| should_retry_response(result))
            .max_retry_attempts(policy.max_retry_attempts)
            .base_delay(policy.base_delay)
            .backoff(Backoff::Exponential)
            .on_retry(|_output, args| {
                log::debug!(
                    target: LOG_TARGET,
                    "Retrying GitHub request (attempt {}, delay {}ms)",
                    args.attempt().index() + 1,
                    args.retry_delay().as_millis(),
                );
            }),
        Timeout::layer("timeout", &context)
            .timeout_error(move |_| app_err!("GitHub request timed out after {}s", request_timeout.as_secs()))
            .timeout(request_timeout),
        Execute::new(move |url: String| {
            let client = client.clone();
            let authorization = authorization.clone();
            async move {
                client
                    .get(&url)
                    .header(AUTHORIZATION, authorization)
                    .send()
                    .await
                    .map_err(ohno::AppError::from)
            }
        }),
    )
        .into_service();

    service.execute(url.to_string()).await
}
