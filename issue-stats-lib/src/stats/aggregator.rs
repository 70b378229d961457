//! Reduction of a repository's activity into nested rolling-window counts.

use super::{ActivityItem, Window, Windows};
use strum::IntoEnumIterator;

/// The counter an activity item contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    OpenIssues,
    ClosedIssues,
    OpenPulls,
    MergedPulls,
}

impl Counter {
    /// Pick the counter for an item, or `None` for closed pull requests that were never merged.
    #[must_use]
    pub fn classify(item: &ActivityItem) -> Option<Self> {
        match (item.is_pull_request(), item.is_open()) {
            (true, _) if item.is_merged() => Some(Self::MergedPulls),
            (true, true) => Some(Self::OpenPulls),
            (true, false) => None,
            (false, true) => Some(Self::OpenIssues),
            (false, false) => Some(Self::ClosedIssues),
        }
    }
}

/// Counts for a single window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowCounts {
    pub open_issues: u64,
    pub closed_issues: u64,
    pub open_pulls: u64,
    pub merged_pulls: u64,
}

impl WindowCounts {
    const fn increment(&mut self, counter: Counter) {
        let slot = match counter {
            Counter::OpenIssues => &mut self.open_issues,
            Counter::ClosedIssues => &mut self.closed_issues,
            Counter::OpenPulls => &mut self.open_pulls,
            Counter::MergedPulls => &mut self.merged_pulls,
        };
        *slot += 1;
    }
}

/// Counts for every tracked window, owned by a single aggregation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowTotals {
    counts: [WindowCounts; Window::COUNT],
}

impl WindowTotals {
    #[must_use]
    pub const fn get(&self, window: Window) -> &WindowCounts {
        &self.counts[window.index()]
    }

    /// Windows with their counts, widest first.
    pub fn iter(&self) -> impl Iterator<Item = (Window, &WindowCounts)> {
        Window::iter().zip(self.counts.iter())
    }
}

/// Classify each item and count it in every window it reaches.
///
/// The widest window always counts the item, since fetching never returns anything
/// older than its threshold. Narrower windows count the item only when it was updated
/// strictly after their threshold, and evaluation stops at the first window it misses.
#[must_use]
pub fn aggregate<'a>(items: impl IntoIterator<Item = &'a ActivityItem>, windows: &Windows) -> WindowTotals {
    let mut totals = WindowTotals::default();

    for item in items {
        let Some(counter) = Counter::classify(item) else {
            continue;
        };

        for (window, threshold) in windows.iter() {
            if window != Window::WIDEST && item.updated_at <= threshold {
                break;
            }
            totals.counts[window.index()].increment(counter);
        }
    }

    totals
}
