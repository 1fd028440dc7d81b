//! Data models for the crawl.
//!
//! This module defines the core data structures used throughout the crawler:
//! - [`CrawlDate`]: a calendar date plus its publication classification
//! - [`Edition`]: an edition code discovered for one date
//! - [`ArticleRef`]: a discovered, not-yet-fetched article pointer
//! - [`Article`]: fully extracted title + content, ready to persist
//! - [`DateReport`] / [`RunStatistics`]: per-date and run-wide counters
//!
//! All of these are transient: nothing here is ever persisted. The archive
//! files themselves are the only durable state of a run.

use chrono::NaiveDate;

/// A calendar date plus its publication classification.
///
/// The paper does not publish on weekends. Non-publication dates stay in the
/// schedule so the run can count them, but the orchestrator is never invoked
/// for them and the browser receives zero calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlDate {
    /// The calendar date.
    pub date: NaiveDate,
    /// `true` if the paper publishes on this date (a workday).
    pub publication: bool,
}

impl CrawlDate {
    /// The compact `YYYYMMDD` form used in file names and log lines.
    pub fn compact(&self) -> String {
        self.date.format("%Y%m%d").to_string()
    }
}

/// One edition (section) of a single day's paper, e.g. `A01`.
///
/// The ordinal is the edition's position in discovery order. The site's
/// edition list is indexed by position, not by code, so the ordinal is what
/// the orchestrator clicks when it re-selects an edition after a full
/// re-navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edition {
    /// The edition code extracted from the edition link label.
    pub code: String,
    /// Zero-based position in the discovery order.
    pub ordinal: usize,
}

/// A discovered but not-yet-fetched article within an edition.
///
/// Exists only while its date is being processed. The handle is whatever the
/// navigation port uses to refer to the article link; it may go stale after
/// a re-navigation, in which case the click fails and the article is skipped
/// through the normal recovery path.
#[derive(Debug)]
pub struct ArticleRef<H> {
    /// One-based position within the edition's article list.
    pub ordinal: usize,
    /// Markup-stripped title, as shown in the article list.
    pub title: String,
    /// Opaque navigation handle for the article link.
    pub handle: H,
}

/// A fully extracted article, ready to be written to the archive.
///
/// Never constructed with empty content: an extraction that yields no
/// paragraphs produces no `Article` and is not counted as saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    /// Normalized title (markup stripped, whitespace collapsed).
    pub title: String,
    /// Ordered paragraphs joined with newlines.
    pub content: String,
    /// The publication date this article belongs to.
    pub date: NaiveDate,
    /// The edition code the article was discovered under.
    pub edition: String,
    /// Per-date global sequence number, monotonic across all editions of the
    /// date in discovery order. Not reset per edition.
    pub sequence: u32,
}

/// Article counters for one processed date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateReport {
    /// Articles discovered across all editions of the date.
    pub discovered: u32,
    /// Articles fetched and written (primary or fallback path).
    pub saved: u32,
    /// Articles skipped because a file already existed.
    pub skipped: u32,
    /// Articles whose processing failed irrecoverably.
    pub failed: u32,
}

/// Aggregate counters for one run. Logged at the end, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStatistics {
    /// Total articles discovered across all processed dates.
    pub discovered: u32,
    /// Total articles saved.
    pub saved: u32,
    /// Total articles skipped as already archived.
    pub skipped: u32,
    /// Total articles that failed.
    pub failed: u32,
    /// Publication dates that completed processing (even with zero saves).
    pub publication_days: u32,
    /// Weekend dates skipped without touching the browser.
    pub weekend_days: u32,
    /// Dates abandoned at date entry or lost to a dead session.
    pub failed_dates: Vec<NaiveDate>,
    /// Set when an external interrupt stopped the run between dates.
    pub interrupted: bool,
    /// Set when the run aborted because the session could not be re-acquired.
    pub aborted: bool,
}

impl RunStatistics {
    /// Fold one date's report into the aggregate.
    pub fn absorb(&mut self, report: &DateReport) {
        self.discovered += report.discovered;
        self.saved += report.saved;
        self.skipped += report.skipped;
        self.failed += report.failed;
        self.publication_days += 1;
    }

    /// Average saved articles per completed publication day.
    pub fn saved_per_day(&self) -> f64 {
        if self.publication_days == 0 {
            0.0
        } else {
            f64::from(self.saved) / f64::from(self.publication_days)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absorb_accumulates_counters() {
        let mut stats = RunStatistics::default();
        stats.absorb(&DateReport {
            discovered: 5,
            saved: 4,
            skipped: 1,
            failed: 0,
        });
        stats.absorb(&DateReport {
            discovered: 3,
            saved: 0,
            skipped: 3,
            failed: 0,
        });

        assert_eq!(stats.discovered, 8);
        assert_eq!(stats.saved, 4);
        assert_eq!(stats.skipped, 4);
        assert_eq!(stats.publication_days, 2);
        assert_eq!(stats.saved_per_day(), 2.0);
    }

    #[test]
    fn saved_per_day_handles_empty_run() {
        let stats = RunStatistics::default();
        assert_eq!(stats.saved_per_day(), 0.0);
    }

    #[test]
    fn compact_date_form() {
        let cd = CrawlDate {
            date: NaiveDate::from_ymd_opt(2025, 1, 3).unwrap(),
            publication: true,
        };
        assert_eq!(cd.compact(), "20250103");
    }
}
