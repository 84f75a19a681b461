use chrono::NaiveDate;
use core::fmt;
use serde::{Deserialize, Serialize};

/// What kind of activity a classified event represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    Commit,
    PullRequest,
    Issue,
    Review,
    Comment,
    Star,
    Release,
    /// A contribution whose kind is unknown, as reported by the contribution calendar.
    Unclassified,
}

impl Category {
    pub const ALL: [Self; 8] = [
        Self::Commit,
        Self::PullRequest,
        Self::Issue,
        Self::Review,
        Self::Comment,
        Self::Star,
        Self::Release,
        Self::Unclassified,
    ];

    /// Whether this category adds to a day's contribution total.
    #[must_use]
    pub const fn counts_as_contribution(self) -> bool {
        !matches!(self, Self::Star | Self::Release)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Commit => "commits",
            Self::PullRequest => "pull requests",
            Self::Issue => "issues",
            Self::Review => "reviews",
            Self::Comment => "comments",
            Self::Star => "stars",
            Self::Release => "releases",
            Self::Unclassified => "unclassified",
        };
        f.write_str(name)
    }
}

/// Per-category counts with a derived contribution total.
///
/// Counts only ever grow through [`DayCounts::add`], which keeps `contributions` equal to the sum
/// of the counting categories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayCounts {
    commits: u64,
    pull_requests: u64,
    issues: u64,
    reviews: u64,
    comments: u64,
    stars: u64,
    releases: u64,
    unclassified: u64,
    contributions: u64,
}

impl DayCounts {
    pub fn add(&mut self, category: Category, weight: u64) {
        let slot = match category {
            Category::Commit => &mut self.commits,
            Category::PullRequest => &mut self.pull_requests,
            Category::Issue => &mut self.issues,
            Category::Review => &mut self.reviews,
            Category::Comment => &mut self.comments,
            Category::Star => &mut self.stars,
            Category::Release => &mut self.releases,
            Category::Unclassified => &mut self.unclassified,
        };
        *slot = slot.saturating_add(weight);

        if category.counts_as_contribution() {
            self.contributions = self.contributions.saturating_add(weight);
        }
    }

    /// Fold another set of counts into this one.
    pub fn merge(&mut self, other: &Self) {
        for category in Category::ALL {
            self.add(category, other.get(category));
        }
    }

    #[must_use]
    pub const fn get(&self, category: Category) -> u64 {
        match category {
            Category::Commit => self.commits,
            Category::PullRequest => self.pull_requests,
            Category::Issue => self.issues,
            Category::Review => self.reviews,
            Category::Comment => self.comments,
            Category::Star => self.stars,
            Category::Release => self.releases,
            Category::Unclassified => self.unclassified,
        }
    }

    #[must_use]
    pub const fn contributions(&self) -> u64 {
        self.contributions
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.contributions > 0
    }
}

/// Counts for one day of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayBucket {
    pub day: NaiveDate,
    #[serde(flatten)]
    pub counts: DayCounts,
}

impl DayBucket {
    #[must_use]
    pub fn empty(day: NaiveDate) -> Self {
        Self {
            day,
            counts: DayCounts::default(),
        }
    }
}
