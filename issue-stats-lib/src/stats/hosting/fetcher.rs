use super::client::{Client, HostingApiResult, RateLimitInfo};
use crate::Result;
use crate::stats::{ActivityItem, RepoRef};
use chrono::{DateTime, SecondsFormat, Utc};
use core::time::Duration;
use ohno::{EnrichableExt, IntoAppError, bail};
use reqwest::header::LINK;
use url::Url;

const LOG_TARGET: &str = "   hosting";
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Produces the activity of a repository since a point in time.
pub trait ActivitySource {
    /// Fetch every issue and pull request in `repo` updated at or after `since`.
    ///
    /// The whole sequence is retrieved before returning; any failure fails the call.
    fn fetch_activity(&self, repo: &RepoRef, token: &str, since: DateTime<Utc>) -> impl Future<Output = Result<Vec<ActivityItem>>>;
}

/// Fetches repository activity from the GitHub issue-listing endpoint.
#[derive(Debug, Clone)]
pub struct GitHubFetcher {
    client: Client,
    page_size: u8,
    max_pages: u32,
    max_rate_limit_wait: Duration,
}

impl GitHubFetcher {
    #[must_use]
    pub const fn new(client: Client, page_size: u8, max_pages: u32, max_rate_limit_wait: Duration) -> Self {
        Self {
            client,
            page_size,
            max_pages,
            max_rate_limit_wait,
        }
    }

    /// Start paging through the issues of `repo` updated since `since`.
    pub fn pager<'a>(&'a self, repo: &'a RepoRef, token: &'a str, since: DateTime<Utc>) -> IssuePager<'a> {
        IssuePager {
            fetcher: self,
            repo,
            token,
            since: since.to_rfc3339_opts(SecondsFormat::Secs, true),
            next_page: Some(1),
            request_count: 0,
        }
    }

    /// Wait out a rate limit, bounded by the configured maximum.
    async fn wait_for_reset(&self, repo: &RepoRef, rate_limit: RateLimitInfo) {
        let now = Utc::now();
        let wait = (rate_limit.reset_at - now).to_std().unwrap_or(Duration::ZERO).min(self.max_rate_limit_wait);

        log::warn!(
            target: LOG_TARGET,
            "Hit GitHub rate limit while fetching '{repo}' ({} remaining), waiting {}s",
            rate_limit.remaining,
            wait.as_secs()
        );

        tokio::time::sleep(wait).await;
    }
}

impl ActivitySource for GitHubFetcher {
    async fn fetch_activity(&self, repo: &RepoRef, token: &str, since: DateTime<Utc>) -> Result<Vec<ActivityItem>> {
        log::info!(target: LOG_TARGET, "Querying GitHub for issues and pull requests in '{repo}'");
        self.pager(repo, token, since).drain().await
    }
}

/// A single pass over the pages of a repository's issue listing.
///
/// Pages are requested lazily and the pager cannot be rewound; [`IssuePager::drain`]
/// consumes it and yields the complete sequence.
#[derive(Debug)]
pub struct IssuePager<'a> {
    fetcher: &'a GitHubFetcher,
    repo: &'a RepoRef,
    token: &'a str,
    since: String,
    next_page: Option<u32>,
    request_count: u32,
}

impl IssuePager<'_> {
    /// Fetch the next page, or `None` once the listing is exhausted.
    pub async fn next_page(&mut self) -> Result<Option<Vec<ActivityItem>>> {
        let Some(page) = self.next_page else {
            return Ok(None);
        };

        if page > self.fetcher.max_pages {
            bail!(
                "'{}' has more than {} pages of recent issues; refusing to compute statistics from a partial listing",
                self.repo,
                self.fetcher.max_pages
            );
        }

        let url = self.page_url(page)?;
        let mut rate_limit_retries = 0;

        let resp = loop {
            self.request_count += 1;
            match self.fetcher.client.api_call(url.as_str(), self.token).await {
                HostingApiResult::Success(resp) => break resp,
                HostingApiResult::RateLimited(rate_limit) => {
                    rate_limit_retries += 1;
                    if rate_limit_retries > MAX_RATE_LIMIT_RETRIES {
                        bail!("GitHub rate limit still exceeded after {MAX_RATE_LIMIT_RETRIES} waits while fetching '{}'", self.repo);
                    }
                    self.fetcher.wait_for_reset(self.repo, rate_limit).await;
                }
                HostingApiResult::NotFound => bail!("repository '{}' not found", self.repo),
                HostingApiResult::Failed(e) => {
                    return Err(e.enrich_with(|| format!("fetching page {page} of issues for '{}'", self.repo)));
                }
            }
        };

        let has_next_page = resp
            .headers()
            .get(LINK)
            .and_then(|h| h.to_str().ok())
            .is_some_and(|link| link.contains(r#"rel="next""#));

        let items: Vec<ActivityItem> = resp
            .json()
            .await
            .into_app_err_with(|| format!("decoding page {page} of issues for '{}'", self.repo))?;

        self.next_page = (has_next_page && !items.is_empty()).then_some(page + 1);
        Ok(Some(items))
    }

    /// Follow every page and return the concatenated items in listing order.
    pub async fn drain(mut self) -> Result<Vec<ActivityItem>> {
        let mut all_items = Vec::with_capacity(usize::from(self.fetcher.page_size));
        while let Some(items) = self.next_page().await? {
            all_items.extend(items);
        }

        log::debug!(
            target: LOG_TARGET,
            "Completed {} GitHub API request(s) for '{}', {} item(s)",
            self.request_count,
            self.repo,
            all_items.len()
        );

        Ok(all_items)
    }

    fn page_url(&self, page: u32) -> Result<Url> {
        let base = format!(
            "{}/repos/{}/{}/issues",
            self.fetcher.client.base_url(),
            self.repo.owner(),
            self.repo.name()
        );
        let mut url = Url::parse(&base).into_app_err_with(|| format!("building issues URL for '{}'", self.repo))?;

        let _ = url
            .query_pairs_mut()
            .append_pair("state", "all")
            .append_pair("since", &self.since)
            .append_pair("per_page", &self.fetcher.page_size.to_string())
            .append_pair("page", &page.to_string());

        Ok(url)
    }
}
