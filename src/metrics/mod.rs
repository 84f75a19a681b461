//! Contribution metrics over a fixed window of days.
//!
//! A [`Window`] is built from the reference day and a [`DayCount`]. The [`Classifier`] reduces
//! each feed record to at most one [`ClassifiedEvent`] dated inside the window, and
//! [`aggregate`] folds those into a [`MetricsSnapshot`]: one [`DayBucket`] per window day plus
//! best day, streaks, consistency and averages.

mod aggregator;
mod category;
mod classifier;
mod snapshot;
mod window;

pub use aggregator::aggregate;
pub use category::{Category, DayBucket, DayCounts};
pub use classifier::{ClassifiedEvent, Classifier, ClassifierMode};
pub use snapshot::MetricsSnapshot;
pub use window::{DayCount, Window};
