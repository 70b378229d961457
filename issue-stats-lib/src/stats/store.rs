use super::{Window, WindowCounts, WindowTotals};
use crate::Result;
use chrono::{DateTime, Utc};

/// The persisted counts for one package and one window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatSnapshot {
    pub package_id: i64,
    pub window: Window,
    pub counts: WindowCounts,
    /// When the counts were computed; kept to the nanosecond.
    pub computed_at: DateTime<Utc>,
}

/// Durable storage for the latest snapshot of each `(package, window)` pair.
pub trait SnapshotStore {
    /// Write one snapshot per window, replacing whatever was stored for the same key.
    fn save(&self, package_id: i64, totals: &WindowTotals, computed_at: DateTime<Utc>) -> Result<()>;

    /// Read the current snapshots for a package, widest window first.
    fn load(&self, package_id: i64) -> Result<Vec<StatSnapshot>>;
}
