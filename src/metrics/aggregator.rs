use super::category::{DayBucket, DayCounts};
use super::classifier::ClassifiedEvent;
use super::snapshot::MetricsSnapshot;
use super::window::Window;

/// Fold classified events into a snapshot of the window.
///
/// Events dated outside the window are ignored. The result depends only on the inputs.
#[must_use]
pub fn aggregate<I>(events: I, window: &Window) -> MetricsSnapshot
where
    I: IntoIterator<Item = ClassifiedEvent>,
{
    let mut days: Vec<DayBucket> = window.days().iter().copied().map(DayBucket::empty).collect();

    for event in events {
        if let Some(bucket) = window.index_of(event.day).and_then(|i| days.get_mut(i)) {
            bucket.counts.add(event.category, event.weight);
        }
    }

    let mut totals = DayCounts::default();
    for bucket in &days {
        totals.merge(&bucket.counts);
    }

    let (best_day, best_day_count) = best_day(&days, window);
    let active_days = count_u32(days.iter().filter(|b| b.counts.is_active()).count());
    let len = count_u32(days.len());
    let total_contributions = totals.contributions();

    MetricsSnapshot {
        best_day,
        best_day_count,
        best_streak: best_streak(&days),
        current_streak: current_streak(&days),
        active_days,
        consistency: consistency(active_days, len),
        avg_contributions_per_day: average(total_contributions, len),
        total_contributions,
        totals,
        days,
        window: window.clone(),
    }
}

/// The first day holding the maximum; later days only win on a strictly greater count.
fn best_day(days: &[DayBucket], window: &Window) -> (chrono::NaiveDate, u64) {
    let mut best = (window.start(), 0);
    for bucket in days {
        if bucket.counts.contributions() > best.1 {
            best = (bucket.day, bucket.counts.contributions());
        }
    }
    best
}

fn best_streak(days: &[DayBucket]) -> u32 {
    let mut best = 0;
    let mut run = 0;
    for bucket in days {
        if bucket.counts.is_active() {
            run += 1;
            best = best.max(run);
        } else {
            run = 0;
        }
    }
    best
}

fn current_streak(days: &[DayBucket]) -> u32 {
    count_u32(days.iter().rev().take_while(|b| b.counts.is_active()).count())
}

/// `round(active / len * 100)` in integer arithmetic, halves rounding up.
fn consistency(active: u32, len: u32) -> u32 {
    if len == 0 {
        return 0;
    }
    (active * 200 + len) / (2 * len)
}

#[expect(clippy::cast_precision_loss, reason = "contribution totals are far below 2^52")]
fn average(total: u64, len: u32) -> f64 {
    if len == 0 {
        return 0.0;
    }
    total as f64 / f64::from(len)
}

fn count_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{Category, DayCount};
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
    }

    /// An event of `weight` on the 1-based `n`th day of the window.
    fn on_day(window: &Window, n: usize, category: Category, weight: u64) -> ClassifiedEvent {
        ClassifiedEvent {
            day: window.days()[n - 1],
            category,
            weight,
        }
    }

    #[test]
    fn empty_window_is_all_zero() {
        let window = Window::ending_on(today(), DayCount::Fourteen);
        let snapshot = aggregate(Vec::new(), &window);

        assert_eq!(snapshot.days().len(), 14);
        assert!(snapshot.days().iter().all(|b| b.counts == DayCounts::default()));
        assert_eq!(snapshot.best_day(), window.start());
        assert_eq!(snapshot.best_day_count(), 0);
        assert_eq!(snapshot.best_streak(), 0);
        assert_eq!(snapshot.current_streak(), 0);
        assert_eq!(snapshot.active_days(), 0);
        assert_eq!(snapshot.consistency(), 0);
        assert!(snapshot.avg_contributions_per_day().abs() < f64::EPSILON);
    }

    #[test]
    fn single_push_day() {
        let window = Window::ending_on(today(), DayCount::Seven);
        let snapshot = aggregate([on_day(&window, 5, Category::Commit, 3)], &window);

        let day = window.days()[4];
        let bucket = snapshot.day(day).unwrap();
        assert_eq!(bucket.counts.get(Category::Commit), 3);
        assert_eq!(bucket.counts.contributions(), 3);
        assert_eq!(snapshot.best_day(), day);
        assert_eq!(snapshot.best_day_count(), 3);
        assert_eq!(snapshot.best_streak(), 1);
        assert_eq!(snapshot.total_contributions(), 3);
    }

    #[test]
    fn streak_and_consistency() {
        let window = Window::ending_on(today(), DayCount::Seven);
        let events: Vec<_> = [1, 2, 3, 5, 6].into_iter().map(|n| on_day(&window, n, Category::Review, 1)).collect();
        let snapshot = aggregate(events, &window);

        assert_eq!(snapshot.best_streak(), 3);
        assert_eq!(snapshot.current_streak(), 0);
        assert_eq!(snapshot.active_days(), 5);
        assert_eq!(snapshot.consistency(), 71);
    }

    #[test]
    fn trailing_run_is_current_streak() {
        let window = Window::ending_on(today(), DayCount::Seven);
        let events: Vec<_> = [1, 2, 3, 6, 7].into_iter().map(|n| on_day(&window, n, Category::Comment, 1)).collect();
        let snapshot = aggregate(events, &window);

        assert_eq!(snapshot.best_streak(), 3);
        assert_eq!(snapshot.current_streak(), 2);
    }

    #[test]
    fn full_activity_is_full_consistency() {
        let window = Window::ending_on(today(), DayCount::Thirty);
        let events: Vec<_> = (1..=30).map(|n| on_day(&window, n, Category::Issue, 1)).collect();
        let snapshot = aggregate(events, &window);

        assert_eq!(snapshot.best_streak(), 30);
        assert_eq!(snapshot.consistency(), 100);
        assert!((snapshot.avg_contributions_per_day() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn ties_keep_earliest_best_day() {
        let window = Window::ending_on(today(), DayCount::Seven);
        let snapshot = aggregate(
            [
                on_day(&window, 2, Category::Commit, 4),
                on_day(&window, 4, Category::PullRequest, 4),
                on_day(&window, 6, Category::Commit, 2),
            ],
            &window,
        );

        assert_eq!(snapshot.best_day(), window.days()[1]);
        assert_eq!(snapshot.best_day_count(), 4);
    }

    #[test]
    fn non_counting_categories_do_not_make_active_days() {
        let window = Window::ending_on(today(), DayCount::Seven);
        let snapshot = aggregate(
            [on_day(&window, 3, Category::Star, 2), on_day(&window, 4, Category::Release, 1)],
            &window,
        );

        assert_eq!(snapshot.active_days(), 0);
        assert_eq!(snapshot.best_streak(), 0);
        assert_eq!(snapshot.totals().get(Category::Star), 2);
        assert_eq!(snapshot.totals().get(Category::Release), 1);
        assert_eq!(snapshot.total_contributions(), 0);
    }

    #[test]
    fn buckets_match_their_counting_categories() {
        let window = Window::ending_on(today(), DayCount::Fourteen);
        let events: Vec<_> = Category::ALL
            .into_iter()
            .enumerate()
            .map(|(i, c)| on_day(&window, i % 5 + 1, c, i as u64 + 1))
            .collect();
        let snapshot = aggregate(events, &window);

        for bucket in snapshot.days() {
            let sum: u64 = Category::ALL
                .into_iter()
                .filter(|c| c.counts_as_contribution())
                .map(|c| bucket.counts.get(c))
                .sum();
            assert_eq!(bucket.counts.contributions(), sum);
        }
    }

    #[test]
    fn out_of_window_events_are_ignored() {
        let window = Window::ending_on(today(), DayCount::Seven);
        let stray = ClassifiedEvent {
            day: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            category: Category::Commit,
            weight: 10,
        };
        let snapshot = aggregate([stray], &window);
        assert_eq!(snapshot.total_contributions(), 0);
    }

    #[test]
    fn aggregation_is_repeatable() {
        let window = Window::ending_on(today(), DayCount::Fourteen);
        let events = vec![
            on_day(&window, 1, Category::Commit, 2),
            on_day(&window, 9, Category::Issue, 1),
            on_day(&window, 14, Category::Comment, 1),
        ];

        assert_eq!(aggregate(events.clone(), &window), aggregate(events, &window));
    }
}
