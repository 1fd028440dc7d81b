//! Date range scheduling.
//!
//! Turns a [`RunMode`] into the ordered, ascending sequence of [`CrawlDate`]s
//! a run will visit. Every date in the requested span is retained — weekend
//! days are kept in the sequence but classified as non-publication so the
//! run driver can count and skip them without ever touching the browser.
//!
//! Scheduling is a pure function of its calendar inputs. "Month to date"
//! takes today's date as an explicit parameter instead of reading the clock,
//! which keeps the schedule reproducible in tests.

use chrono::{Datelike, NaiveDate, Weekday};

use crate::models::CrawlDate;

/// How the span of dates for one run is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// A single date, typically used for testing a site change.
    Single(NaiveDate),
    /// An explicit inclusive range.
    Range { from: NaiveDate, to: NaiveDate },
    /// From the first of `today`'s month through `today`.
    MonthToDate { today: NaiveDate },
}

/// `true` on days the paper publishes (Monday through Friday).
pub fn is_publication_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Build the ordered, ascending date sequence for a run.
///
/// The range is inclusive on both ends; an inverted range yields an empty
/// schedule. Each date carries its publication classification.
pub fn build(mode: &RunMode) -> Vec<CrawlDate> {
    let (from, to) = match *mode {
        RunMode::Single(date) => (date, date),
        RunMode::Range { from, to } => (from, to),
        RunMode::MonthToDate { today } => (today.with_day(1).unwrap(), today),
    };

    let mut schedule = Vec::new();
    let mut current = from;
    while current <= to {
        schedule.push(CrawlDate {
            date: current,
            publication: is_publication_day(current),
        });
        match current.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }
    schedule
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn weekdays_are_publication_days() {
        // 2025-01-03 is a Friday, 01-04 Saturday, 01-05 Sunday, 01-06 Monday.
        assert!(is_publication_day(d(2025, 1, 3)));
        assert!(!is_publication_day(d(2025, 1, 4)));
        assert!(!is_publication_day(d(2025, 1, 5)));
        assert!(is_publication_day(d(2025, 1, 6)));
    }

    #[test]
    fn single_mode_yields_one_classified_date() {
        let schedule = build(&RunMode::Single(d(2025, 1, 4)));
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule[0].date, d(2025, 1, 4));
        assert!(!schedule[0].publication);
    }

    #[test]
    fn range_is_inclusive_and_ascending() {
        let schedule = build(&RunMode::Range {
            from: d(2025, 1, 1),
            to: d(2025, 1, 10),
        });
        assert_eq!(schedule.len(), 10);
        assert_eq!(schedule[0].date, d(2025, 1, 1));
        assert_eq!(schedule[9].date, d(2025, 1, 10));
        assert!(schedule.windows(2).all(|w| w[0].date < w[1].date));
        // 4th, 5th are the weekend of that week.
        assert!(!schedule[3].publication);
        assert!(!schedule[4].publication);
        assert!(schedule[5].publication);
    }

    #[test]
    fn inverted_range_is_empty() {
        let schedule = build(&RunMode::Range {
            from: d(2025, 1, 10),
            to: d(2025, 1, 1),
        });
        assert!(schedule.is_empty());
    }

    #[test]
    fn month_to_date_starts_on_the_first() {
        let schedule = build(&RunMode::MonthToDate {
            today: d(2025, 1, 15),
        });
        assert_eq!(schedule.len(), 15);
        assert_eq!(schedule[0].date, d(2025, 1, 1));
        assert_eq!(schedule[14].date, d(2025, 1, 15));
    }

    #[test]
    fn month_to_date_on_the_first_is_one_day() {
        let schedule = build(&RunMode::MonthToDate {
            today: d(2025, 2, 1),
        });
        assert_eq!(schedule.len(), 1);
    }
}
