//! Mapping of feed records onto contribution categories.

use super::category::Category;
use super::window::Window;
use crate::feed::{CommitAuthor, EventBody, RawEvent};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// How pushed commits are attributed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClassifierMode {
    /// Every commit of a push counts.
    #[default]
    Simple,

    /// Only commits whose declared author matches the user count.
    AuthorMatch,
}

/// A feed record reduced to what the aggregator needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifiedEvent {
    pub day: NaiveDate,
    pub category: Category,
    pub weight: u64,
}

#[derive(Debug, Clone)]
pub struct Classifier<'a> {
    mode: ClassifierMode,
    username: String,
    window: &'a Window,
}

impl<'a> Classifier<'a> {
    #[must_use]
    pub fn new(mode: ClassifierMode, username: &str, window: &'a Window) -> Self {
        Self {
            mode,
            username: username.to_lowercase(),
            window,
        }
    }

    /// Classify one record. Records that do not count, or fall outside the window, yield `None`.
    #[must_use]
    pub fn classify(&self, event: &RawEvent) -> Option<ClassifiedEvent> {
        let day = event.created_at?.with_timezone(&Local).date_naive();
        if !self.window.contains(day) {
            return None;
        }

        let (category, weight) = match &event.body {
            EventBody::Push { commits } => (Category::Commit, self.push_weight(commits.as_deref())),
            EventBody::PullRequest { action } if is_action(action.as_ref(), "opened") => (Category::PullRequest, 1),
            EventBody::Issue { action } if is_action(action.as_ref(), "opened") => (Category::Issue, 1),
            EventBody::Review => (Category::Review, 1),
            EventBody::Comment => (Category::Comment, 1),
            EventBody::Star { action } if is_action(action.as_ref(), "started") => (Category::Star, 1),
            EventBody::Release { action } if is_action(action.as_ref(), "published") => (Category::Release, 1),
            _ => return None,
        };

        Some(ClassifiedEvent { day, category, weight })
    }

    /// Classify a batch of records, dropping those that do not count.
    pub fn classify_all<'e>(&'e self, events: &'e [RawEvent]) -> impl Iterator<Item = ClassifiedEvent> + 'e {
        events.iter().filter_map(|e| self.classify(e))
    }

    fn push_weight(&self, commits: Option<&[CommitAuthor]>) -> u64 {
        match (self.mode, commits) {
            (ClassifierMode::Simple, None) => 1,
            (ClassifierMode::AuthorMatch, None) => 0,
            (ClassifierMode::Simple, Some(commits)) => commits.len() as u64,
            (ClassifierMode::AuthorMatch, Some(commits)) => commits.iter().filter(|c| self.is_own(c)).count() as u64,
        }
    }

    fn is_own(&self, author: &CommitAuthor) -> bool {
        let user = self.username.as_str();

        if author.name.as_deref().is_some_and(|name| name.eq_ignore_ascii_case(user)) {
            return true;
        }

        let Some(email) = author.email.as_deref() else {
            return false;
        };

        if email.eq_ignore_ascii_case(user) {
            return true;
        }

        let local = email.split('@').next().unwrap_or_default();
        // noreply addresses look like `12345+login@users.noreply.github.com`
        let login = local.rsplit('+').next().unwrap_or(local);
        local.eq_ignore_ascii_case(user) || login.eq_ignore_ascii_case(user)
    }
}

fn is_action(action: Option<&String>, expected: &str) -> bool {
    action.is_some_and(|a| a == expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::DayCount;
    use chrono::{TimeZone, Utc};

    fn window() -> Window {
        Window::ending_on(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(), DayCount::Seven)
    }

    fn at_local_noon(y: i32, m: u32, d: u32) -> Option<chrono::DateTime<Utc>> {
        Local.with_ymd_and_hms(y, m, d, 12, 0, 0).single().map(|t| t.with_timezone(&Utc))
    }

    fn event(body: EventBody) -> RawEvent {
        RawEvent {
            created_at: at_local_noon(2024, 3, 8),
            body,
        }
    }

    fn author(name: &str, email: &str) -> CommitAuthor {
        CommitAuthor {
            name: Some(name.into()),
            email: Some(email.into()),
        }
    }

    #[test]
    fn push_counts_commits() {
        let window = window();
        let classifier = Classifier::new(ClassifierMode::Simple, "alice", &window);
        let push = event(EventBody::Push {
            commits: Some(vec![author("a", "a@x"), author("b", "b@x"), author("c", "c@x")]),
        });

        let classified = classifier.classify(&push).unwrap();
        assert_eq!(classified.category, Category::Commit);
        assert_eq!(classified.weight, 3);
        assert_eq!(classified.day, NaiveDate::from_ymd_opt(2024, 3, 8).unwrap());
    }

    #[test]
    fn push_without_commit_list_depends_on_mode() {
        let window = window();
        let push = event(EventBody::Push { commits: None });

        let simple = Classifier::new(ClassifierMode::Simple, "alice", &window);
        assert_eq!(simple.classify(&push).unwrap().weight, 1);

        let strict = Classifier::new(ClassifierMode::AuthorMatch, "alice", &window);
        assert_eq!(strict.classify(&push).unwrap().weight, 0);
    }

    #[test]
    fn author_match_filters_foreign_commits() {
        let window = window();
        let classifier = Classifier::new(ClassifierMode::AuthorMatch, "Alice", &window);
        let push = event(EventBody::Push {
            commits: Some(vec![
                author("ALICE", "someone@example.com"),
                author("Alice Liddell", "alice@example.com"),
                author("A. L.", "1234+alice@users.noreply.github.com"),
                author("bob", "bob@example.com"),
                CommitAuthor::default(),
            ]),
        });

        assert_eq!(classifier.classify(&push).unwrap().weight, 3);
    }

    #[test]
    fn only_specific_actions_count() {
        let window = window();
        let classifier = Classifier::new(ClassifierMode::Simple, "alice", &window);
        let action = |a: &str| Some(a.to_string());

        let cases = [
            (EventBody::PullRequest { action: action("opened") }, Some(Category::PullRequest)),
            (EventBody::PullRequest { action: action("closed") }, None),
            (EventBody::Issue { action: action("opened") }, Some(Category::Issue)),
            (EventBody::Issue { action: None }, None),
            (EventBody::Review, Some(Category::Review)),
            (EventBody::Comment, Some(Category::Comment)),
            (EventBody::Star { action: action("started") }, Some(Category::Star)),
            (EventBody::Release { action: action("published") }, Some(Category::Release)),
            (EventBody::Release { action: action("created") }, None),
            (EventBody::Other, None),
        ];

        for (body, expected) in cases {
            let got = classifier.classify(&event(body.clone())).map(|c| c.category);
            assert_eq!(got, expected, "{body:?}");
        }
    }

    #[test]
    fn outside_window_or_undated_is_dropped() {
        let window = window();
        let classifier = Classifier::new(ClassifierMode::Simple, "alice", &window);

        let old = RawEvent {
            created_at: at_local_noon(2024, 3, 3),
            body: EventBody::Review,
        };
        assert!(classifier.classify(&old).is_none());

        let future = RawEvent {
            created_at: at_local_noon(2024, 3, 11),
            body: EventBody::Review,
        };
        assert!(classifier.classify(&future).is_none());

        let undated = RawEvent {
            created_at: None,
            body: EventBody::Review,
        };
        assert!(classifier.classify(&undated).is_none());
    }
}
