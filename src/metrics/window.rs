use chrono::{DateTime, Days, Local, NaiveDate, TimeZone, Utc};
use core::fmt;
use ohno::bail;
use serde::{Deserialize, Serialize};

/// Length of an analytics window. Only these three lengths are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum DayCount {
    Seven,
    #[default]
    Fourteen,
    Thirty,
}

impl DayCount {
    pub const ALL: [Self; 3] = [Self::Seven, Self::Fourteen, Self::Thirty];

    #[must_use]
    pub const fn get(self) -> u32 {
        match self {
            Self::Seven => 7,
            Self::Fourteen => 14,
            Self::Thirty => 30,
        }
    }
}

impl From<DayCount> for u32 {
    fn from(value: DayCount) -> Self {
        value.get()
    }
}

impl TryFrom<i64> for DayCount {
    type Error = ohno::AppError;

    fn try_from(value: i64) -> crate::Result<Self> {
        match value {
            7 => Ok(Self::Seven),
            14 => Ok(Self::Fourteen),
            30 => Ok(Self::Thirty),
            _ => bail!("day count must be 7, 14 or 30, got {value}"),
        }
    }
}

impl TryFrom<u32> for DayCount {
    type Error = ohno::AppError;

    fn try_from(value: u32) -> crate::Result<Self> {
        Self::try_from(i64::from(value))
    }
}

impl fmt::Display for DayCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// Consecutive calendar days, oldest first, ending on the reference day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Window {
    days: Vec<NaiveDate>,
}

impl Window {
    /// The `count` days ending on (and including) `today`.
    #[must_use]
    pub fn ending_on(today: NaiveDate, count: DayCount) -> Self {
        let len = u64::from(count.get());
        let days = (0..len)
            .rev()
            .map(|back| today.checked_sub_days(Days::new(back)).unwrap_or(NaiveDate::MIN))
            .collect();
        Self { days }
    }

    #[must_use]
    pub fn days(&self) -> &[NaiveDate] {
        &self.days
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.days.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Oldest day.
    #[must_use]
    pub fn start(&self) -> NaiveDate {
        self.days.first().copied().unwrap_or_default()
    }

    /// Newest day, i.e. the reference day.
    #[must_use]
    pub fn end(&self) -> NaiveDate {
        self.days.last().copied().unwrap_or_default()
    }

    /// Position of `day` in the window.
    #[must_use]
    pub fn index_of(&self, day: NaiveDate) -> Option<usize> {
        let offset = day.signed_duration_since(self.start()).num_days();
        usize::try_from(offset).ok().filter(|&i| i < self.days.len())
    }

    #[must_use]
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.index_of(day).is_some()
    }

    /// Local midnight at the start of the window, as an absolute instant.
    ///
    /// Feed records older than this lie before the window.
    #[must_use]
    pub fn start_instant(&self) -> DateTime<Utc> {
        let midnight = self.start().and_hms_opt(0, 0, 0).unwrap_or_default();
        Local
            .from_local_datetime(&midnight)
            .earliest()
            .map_or_else(|| midnight.and_utc(), |local| local.with_timezone(&Utc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn windows_are_contiguous_and_end_today() {
        let today = date(2024, 3, 10);
        for count in DayCount::ALL {
            let window = Window::ending_on(today, count);
            assert_eq!(window.len(), count.get() as usize);
            assert_eq!(window.end(), today);
            for pair in window.days().windows(2) {
                assert_eq!(pair[1].signed_duration_since(pair[0]).num_days(), 1);
            }
        }
    }

    #[test]
    fn window_crosses_month_boundary() {
        let window = Window::ending_on(date(2024, 3, 3), DayCount::Seven);
        assert_eq!(window.start(), date(2024, 2, 26));
        assert!(window.contains(date(2024, 2, 29)));
        assert!(!window.contains(date(2024, 2, 25)));
        assert!(!window.contains(date(2024, 3, 4)));
        assert_eq!(window.index_of(date(2024, 3, 1)), Some(4));
    }

    #[test]
    fn day_count_accepts_only_supported_lengths() {
        assert_eq!(DayCount::try_from(7_i64).unwrap(), DayCount::Seven);
        assert_eq!(DayCount::try_from(14_i64).unwrap(), DayCount::Fourteen);
        assert_eq!(DayCount::try_from(30_i64).unwrap(), DayCount::Thirty);
        for bad in [0_i64, -7, 1, 15, 31, 365] {
            let _ = DayCount::try_from(bad).unwrap_err();
        }
    }

    #[test]
    fn day_count_serde() {
        assert_eq!(serde_json::to_string(&DayCount::Thirty).unwrap(), "30");
        assert_eq!(serde_json::from_str::<DayCount>("7").unwrap(), DayCount::Seven);
        let _ = serde_json::from_str::<DayCount>("8").unwrap_err();
    }

    #[test]
    fn window_serializes_as_dates() {
        let window = Window::ending_on(date(2024, 3, 10), DayCount::Seven);
        let json = serde_json::to_value(&window).unwrap();
        assert_eq!(json[0], "2024-03-04");
        assert_eq!(json[6], "2024-03-10");
    }

    #[test]
    fn start_instant_is_local_midnight() {
        let window = Window::ending_on(date(2024, 3, 10), DayCount::Seven);
        let local = window.start_instant().with_timezone(&Local);
        assert_eq!(local.date_naive(), date(2024, 3, 4));
        assert_eq!(local.time(), chrono::NaiveTime::MIN);
    }
}
