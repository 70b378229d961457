use chrono::{DateTime, Duration, Utc};
use strum::{Display, EnumIter, IntoEnumIterator};

/// A trailing time window over which activity is counted.
///
/// Variants are declared widest first. Every narrower window's item set is a subset
/// of every wider window's, which is what lets aggregation stop at the first window
/// an item fails to reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter)]
pub enum Window {
    #[strum(to_string = "30d")]
    Days30,
    #[strum(to_string = "7d")]
    Days7,
    #[strum(to_string = "3d")]
    Days3,
    #[strum(to_string = "1d")]
    Days1,
}

impl Window {
    /// Number of windows tracked per package.
    pub const COUNT: usize = 4;

    /// The widest window; every fetched item falls inside it.
    pub const WIDEST: Self = Self::Days30;

    #[must_use]
    pub const fn days(self) -> u32 {
        match self {
            Self::Days30 => 30,
            Self::Days7 => 7,
            Self::Days3 => 3,
            Self::Days1 => 1,
        }
    }

    /// Position in widest-first order.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Look up a window by its length in days, as stored in the snapshot table.
    #[must_use]
    pub fn from_days(days: u32) -> Option<Self> {
        Self::iter().find(|w| w.days() == days)
    }
}

/// The tracked windows with their thresholds computed against one instant.
#[derive(Debug, Clone, Copy)]
pub struct Windows {
    now: DateTime<Utc>,
    thresholds: [(Window, DateTime<Utc>); Window::COUNT],
}

impl Windows {
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        let threshold = |w: Window| (w, now - Duration::days(i64::from(w.days())));
        Self {
            now,
            thresholds: [
                threshold(Window::Days30),
                threshold(Window::Days7),
                threshold(Window::Days3),
                threshold(Window::Days1),
            ],
        }
    }

    #[must_use]
    pub const fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Start of the widest window, used as the `since` bound when fetching activity.
    #[must_use]
    pub const fn since(&self) -> DateTime<Utc> {
        self.thresholds[0].1
    }

    #[must_use]
    pub const fn threshold(&self, window: Window) -> DateTime<Utc> {
        self.thresholds[window.index()].1
    }

    /// Windows paired with their thresholds, widest first.
    pub fn iter(&self) -> impl Iterator<Item = (Window, DateTime<Utc>)> + '_ {
        self.thresholds.iter().copied()
    }
}
