use super::category::{DayBucket, DayCounts};
use super::window::Window;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The derived metrics for one window. Built by [`aggregate`](super::aggregate).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub(super) window: Window,
    pub(super) days: Vec<DayBucket>,
    pub(super) totals: DayCounts,
    pub(super) total_contributions: u64,
    pub(super) best_day: NaiveDate,
    pub(super) best_day_count: u64,
    pub(super) best_streak: u32,
    pub(super) current_streak: u32,
    pub(super) active_days: u32,
    pub(super) consistency: u32,
    pub(super) avg_contributions_per_day: f64,
}

impl MetricsSnapshot {
    #[must_use]
    pub const fn window(&self) -> &Window {
        &self.window
    }

    /// One bucket per window day, oldest first.
    #[must_use]
    pub fn days(&self) -> &[DayBucket] {
        &self.days
    }

    /// Bucket for a given day, if it lies in the window.
    #[must_use]
    pub fn day(&self, day: NaiveDate) -> Option<&DayBucket> {
        self.window.index_of(day).and_then(|i| self.days.get(i))
    }

    /// Per-category totals over the whole window.
    #[must_use]
    pub const fn totals(&self) -> &DayCounts {
        &self.totals
    }

    #[must_use]
    pub const fn total_contributions(&self) -> u64 {
        self.total_contributions
    }

    /// Earliest day with the highest contribution count.
    #[must_use]
    pub const fn best_day(&self) -> NaiveDate {
        self.best_day
    }

    #[must_use]
    pub const fn best_day_count(&self) -> u64 {
        self.best_day_count
    }

    /// Longest run of consecutive active days anywhere in the window.
    #[must_use]
    pub const fn best_streak(&self) -> u32 {
        self.best_streak
    }

    /// Run of consecutive active days ending on the last day of the window.
    #[must_use]
    pub const fn current_streak(&self) -> u32 {
        self.current_streak
    }

    #[must_use]
    pub const fn active_days(&self) -> u32 {
        self.active_days
    }

    /// Percentage of active days, rounded half up.
    #[must_use]
    pub const fn consistency(&self) -> u32 {
        self.consistency
    }

    #[must_use]
    pub const fn avg_contributions_per_day(&self) -> f64 {
        self.avg_contributions_per_day
    }
}
