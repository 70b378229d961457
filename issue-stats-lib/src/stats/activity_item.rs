use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One issue or pull request as returned by the provider's issue-listing endpoint.
///
/// Only the fields needed for classification are kept; everything else in the
/// provider's payload is ignored during deserialization.
#[derive(Debug, Clone, Deserialize)]
pub struct ActivityItem {
    pub state: ItemState,
    pub pull_request: Option<PullRequestMarker>,
    pub updated_at: DateTime<Utc>,
}

/// Issue state: open or closed
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ItemState {
    Open,
    Closed,
}

/// Marker type to detect if an issue is actually a pull request.
/// The `merged_at` field is populated by GitHub's issues endpoint when the PR has been merged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PullRequestMarker {
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
}

impl ActivityItem {
    #[must_use]
    pub const fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }

    #[must_use]
    pub fn is_merged(&self) -> bool {
        self.pull_request.as_ref().is_some_and(|pr| pr.merged_at.is_some())
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == ItemState::Open
    }
}
