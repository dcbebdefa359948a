//! Calendar helpers for sites that print dates without a year.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveTime, Utc};

/// Source of "today" for a provider. Stores publish by their local date, so
/// the default reads the host's local clock.
#[derive(Clone)]
pub struct Today(Arc<dyn Fn() -> NaiveDate + Send + Sync>);

impl Today {
    #[must_use]
    pub fn local() -> Self {
        Self(Arc::new(|| chrono::Local::now().date_naive()))
    }

    #[must_use]
    pub fn fixed(date: NaiveDate) -> Self {
        Self(Arc::new(move || date))
    }

    #[must_use]
    pub fn get(&self) -> NaiveDate {
        (self.0)()
    }
}

impl Default for Today {
    fn default() -> Self {
        Self::local()
    }
}

impl std::fmt::Debug for Today {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Today").field(&self.get()).finish()
    }
}

/// Midnight UTC of `date`, used as `available_date` for scheduled flavors.
#[must_use]
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Month number for English names: full ("September"), short ("Sep") or
/// the "Sept" variant. Case-insensitive.
#[must_use]
pub fn month_from_name(name: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "january",
        "february",
        "march",
        "april",
        "may",
        "june",
        "july",
        "august",
        "september",
        "october",
        "november",
        "december",
    ];
    let lower = name.trim().trim_end_matches('.').to_ascii_lowercase();
    if lower.len() < 3 {
        return None;
    }
    if lower == "sept" {
        return Some(9);
    }
    MONTHS
        .iter()
        .position(|m| *m == lower || (lower.len() == 3 && m.starts_with(&lower)))
        .and_then(|i| u32::try_from(i + 1).ok())
}

/// Resolves a year-less month/day to the candidate date nearest `today`.
///
/// A calendar seen on Dec 30 listing "Jan 2" means next year; one listing
/// "Sep 1" on Sep 27 means this year.
#[must_use]
pub fn infer_date(today: NaiveDate, month: u32, day: u32) -> Option<NaiveDate> {
    let year = today.year();
    [year - 1, year, year + 1]
        .into_iter()
        .filter_map(|y| NaiveDate::from_ymd_opt(y, month, day))
        .min_by_key(|d| (*d - today).num_days().abs())
}

/// Resolves a bare day-of-month to the nearest date in the previous, current
/// or next month.
#[must_use]
pub fn infer_day_of_month(today: NaiveDate, day: u32) -> Option<NaiveDate> {
    let this_month = today.with_day(1)?;
    [
        this_month.checked_sub_months(Months::new(1)),
        Some(this_month),
        this_month.checked_add_months(Months::new(1)),
    ]
    .into_iter()
    .flatten()
    .filter_map(|first| first.with_day(day))
    .min_by_key(|d| (*d - today).num_days().abs())
}
