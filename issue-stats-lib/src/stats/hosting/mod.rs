mod client;
mod fetcher;
mod resilient_http;

pub use client::{Client, HostingApiResult, RateLimitInfo};
pub use fetcher::{ActivitySource, GitHubFetcher, IssuePager};
pub use resilient_http::RetryPolicy;
