//! The crawl orchestrator: one date at a time, editions and articles in
//! discovery order, with tiered navigation recovery.
//!
//! Per-date state machine:
//!
//! ```text
//! NavigateDate → DiscoverEditions → SelectEdition → DiscoverArticles
//!   → ForEachArticle { CheckExists → Skip | FetchAndSave → RecoverNavigation }
//!   → NextEdition | DateComplete
//! ```
//!
//! Failure handling is deliberately asymmetric. Date entry is never retried:
//! a date that cannot be reached usually has no edition at all, so it is
//! marked failed and the run moves on. Failures inside a date are usually
//! transient rendering glitches, so they get the full
//! [`RecoveryLevel`] ladder, and a single article's irrecoverable failure
//! never aborts its date.
//!
//! The per-date sequence counter is explicit state threaded through the
//! crawl. It increments once per discovered article — whether or not the
//! fetch later succeeds — so file numbering is stable across re-runs with
//! identical site content.

use chrono::{Datelike, NaiveDate};
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use crate::archive::{ArchiveError, ArchiveWriter, SaveOutcome};
use crate::identity;
use crate::models::{Article, ArticleRef, DateReport, Edition};
use crate::port::{NavError, NavigationPort};
use crate::site;

/// Escalating recovery tiers, attempted strictly in declaration order with
/// early exit on the first that succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryLevel {
    /// Browser-history back to the article list.
    LocalBack,
    /// Re-click the current edition by its ordinal position.
    ReselectEdition,
    /// Re-navigate to the date, then re-select the edition.
    FullRenavigate,
}

const RECOVERY_ORDER: [RecoveryLevel; 3] = [
    RecoveryLevel::LocalBack,
    RecoveryLevel::ReselectEdition,
    RecoveryLevel::FullRenavigate,
];

/// What happened to one fetched article.
enum FetchOutcome {
    Saved,
    SkippedExisting,
    /// Extraction yielded no paragraphs; the article is dropped silently
    /// (no file, not counted as saved) but its sequence slot stays consumed.
    EmptyContent,
    /// Both archive writes failed.
    SaveFailed(ArchiveError),
}

/// Drives the per-date crawl against an injected navigation port.
pub struct Crawler<'a, P: NavigationPort> {
    port: &'a mut P,
    archive: &'a ArchiveWriter,
    base_url: &'a str,
    wait_timeout: Duration,
}

impl<'a, P: NavigationPort> Crawler<'a, P> {
    pub fn new(
        port: &'a mut P,
        archive: &'a ArchiveWriter,
        base_url: &'a str,
        wait_timeout: Duration,
    ) -> Self {
        Self {
            port,
            archive,
            base_url,
            wait_timeout,
        }
    }

    /// Process one publication date end to end.
    ///
    /// Returns `Err` only for date-entry failure; everything past entry is
    /// contained within the date and reported through the [`DateReport`].
    #[instrument(level = "info", skip(self), fields(date = %date.format("%Y%m%d")))]
    pub async fn crawl_date(&mut self, date: NaiveDate) -> Result<DateReport, NavError> {
        let mut report = DateReport::default();

        // No retry here: entry failure usually means the date has no paper.
        self.navigate_to_date(date).await?;

        let editions = self.discover_editions().await;
        let mut sequence: u32 = 0;

        for edition in &editions {
            info!(edition = %edition.code, "Processing edition");

            if let Err(e) = self.select_edition(edition.ordinal).await {
                warn!(
                    edition = %edition.code,
                    error = %e,
                    "Could not select edition; skipping it"
                );
                continue;
            }

            let articles = match self.discover_articles().await {
                Ok(articles) => articles,
                Err(e) => {
                    warn!(
                        edition = %edition.code,
                        error = %e,
                        "Article discovery failed; skipping edition"
                    );
                    continue;
                }
            };

            let mut edition_saved = 0u32;
            let mut edition_skipped = 0u32;

            for article in &articles {
                sequence += 1;
                report.discovered += 1;

                let id = identity::derive(
                    self.archive.root(),
                    date,
                    sequence,
                    &edition.code,
                    &article.title,
                );
                if id.exists() {
                    debug!(sequence, title = %article.title, "Already archived; not fetching");
                    report.skipped += 1;
                    edition_skipped += 1;
                    continue;
                }

                match self.fetch_article(date, &edition.code, sequence, article).await {
                    Ok(outcome) => {
                        match outcome {
                            FetchOutcome::Saved => {
                                report.saved += 1;
                                edition_saved += 1;
                            }
                            FetchOutcome::SkippedExisting => {
                                report.skipped += 1;
                                edition_skipped += 1;
                            }
                            FetchOutcome::EmptyContent => {
                                debug!(sequence, title = %article.title, "Empty extraction; article dropped");
                            }
                            FetchOutcome::SaveFailed(e) => {
                                report.failed += 1;
                                error!(
                                    sequence,
                                    title = %article.title,
                                    error = %e,
                                    "Could not persist article"
                                );
                            }
                        }
                        if let Err(e) = self.return_to_list().await {
                            warn!(
                                sequence,
                                error = %e,
                                "Lost the article list after processing; recovering"
                            );
                            self.recover(date, edition.ordinal).await;
                        }
                    }
                    Err(e) => {
                        report.failed += 1;
                        warn!(
                            sequence,
                            edition = %edition.code,
                            title = %article.title,
                            error = %e,
                            "Article processing failed; recovering navigation"
                        );
                        self.recover(date, edition.ordinal).await;
                    }
                }
            }

            info!(
                edition = %edition.code,
                saved = edition_saved,
                skipped = edition_skipped,
                "Edition complete"
            );
        }

        info!(
            discovered = report.discovered,
            saved = report.saved,
            skipped = report.skipped,
            failed = report.failed,
            "Date complete"
        );
        Ok(report)
    }

    /// Open the front page and click the target day in the calendar.
    async fn navigate_to_date(&mut self, date: NaiveDate) -> Result<(), NavError> {
        self.port.open(self.base_url).await?;
        self.port.wait_for(site::CALENDAR, self.wait_timeout).await?;

        let day = date.day().to_string();
        let links = self.port.find_all(site::CALENDAR_DAY_LINKS).await?;
        let found = links.len();
        for link in &links {
            if self.port.text(link).await?.trim() == day {
                self.port.click(link).await?;
                return Ok(());
            }
        }
        Err(NavError::MissingElement {
            selector: site::CALENDAR_DAY_LINKS.to_string(),
            index: date.day() as usize,
            found,
        })
    }

    /// Read the edition list for the current date.
    ///
    /// Discovery failure substitutes a single default edition so the date is
    /// not silently dropped.
    async fn discover_editions(&mut self) -> Vec<Edition> {
        let codes = match self.try_discover_edition_codes().await {
            Ok(codes) if !codes.is_empty() => codes,
            Ok(_) => {
                warn!(default = site::DEFAULT_EDITION, "No edition codes found; using default");
                vec![site::DEFAULT_EDITION.to_string()]
            }
            Err(e) => {
                warn!(
                    error = %e,
                    default = site::DEFAULT_EDITION,
                    "Edition discovery failed; using default"
                );
                vec![site::DEFAULT_EDITION.to_string()]
            }
        };

        info!(count = codes.len(), editions = %codes.join(", "), "Discovered editions");
        codes
            .into_iter()
            .enumerate()
            .map(|(ordinal, code)| Edition { code, ordinal })
            .collect()
    }

    async fn try_discover_edition_codes(&mut self) -> Result<Vec<String>, NavError> {
        self.port.wait_for(site::EDITION_LIST, self.wait_timeout).await?;
        let links = self.port.find_all(site::EDITION_LINKS).await?;
        let mut labels = Vec::with_capacity(links.len());
        for link in &links {
            labels.push(self.port.text(link).await?);
        }
        Ok(site::extract_edition_codes(labels))
    }

    /// Click an edition by its ordinal position. The site indexes editions
    /// by position, not by code, so this is also how an edition is
    /// re-selected after a full re-navigation.
    async fn select_edition(&mut self, ordinal: usize) -> Result<(), NavError> {
        let links = self.port.find_all(site::EDITION_LINKS).await?;
        let found = links.len();
        match links.get(ordinal) {
            Some(link) => self.port.click(link).await,
            None => Err(NavError::MissingElement {
                selector: site::EDITION_LINKS.to_string(),
                index: ordinal,
                found,
            }),
        }
    }

    /// Collect article refs for the active edition, stripping markup from
    /// each title. Rows with no extractable title never become refs.
    async fn discover_articles(&mut self) -> Result<Vec<ArticleRef<P::Handle>>, NavError> {
        self.port.wait_for(site::ARTICLE_LIST, self.wait_timeout).await?;
        let links = self.port.find_all(site::ARTICLE_LINKS).await?;

        let mut articles = Vec::new();
        for (i, link) in links.into_iter().enumerate() {
            let markup = match self.port.inner_markup(&link).await {
                Ok(markup) => markup,
                Err(e) => {
                    debug!(row = i + 1, error = %e, "Unreadable article row; skipping");
                    continue;
                }
            };
            let title = site::strip_title_markup(&markup);
            if title.is_empty() {
                continue;
            }
            articles.push(ArticleRef {
                ordinal: i + 1,
                title,
                handle: link,
            });
        }

        info!(count = articles.len(), "Discovered articles");
        Ok(articles)
    }

    /// Click through to one article, extract it, and persist it.
    async fn fetch_article(
        &mut self,
        date: NaiveDate,
        edition: &str,
        sequence: u32,
        article: &ArticleRef<P::Handle>,
    ) -> Result<FetchOutcome, NavError> {
        debug!(sequence, title = %article.title, "Fetching article");
        self.port.click(&article.handle).await?;
        self.port.wait_for(site::ARTICLE_BODY, self.wait_timeout).await?;

        let mut headings = Vec::new();
        for h in &self.port.find_all(site::ARTICLE_TITLE_HEADINGS).await? {
            headings.push(self.port.text(h).await?);
        }
        let title = site::join_headings(headings);

        let mut paragraphs = Vec::new();
        for p in &self.port.find_all(site::ARTICLE_PARAGRAPHS).await? {
            paragraphs.push(self.port.text(p).await?);
        }
        let content = site::join_paragraphs(paragraphs);
        if content.is_empty() {
            return Ok(FetchOutcome::EmptyContent);
        }

        let extracted = Article {
            title,
            content,
            date,
            edition: edition.to_string(),
            sequence,
        };
        match self.archive.save(&extracted).await {
            Ok(SaveOutcome::Saved(path)) => {
                debug!(sequence, path = %path.display(), "Saved article");
                Ok(FetchOutcome::Saved)
            }
            Ok(SaveOutcome::SkippedExisting) => Ok(FetchOutcome::SkippedExisting),
            Err(e) => Ok(FetchOutcome::SaveFailed(e)),
        }
    }

    /// Navigate back to the active edition's article list.
    async fn return_to_list(&mut self) -> Result<(), NavError> {
        self.port.back().await?;
        self.port.wait_for(site::ARTICLE_LIST, self.wait_timeout).await?;
        Ok(())
    }

    /// Attempt the recovery tiers in order, stopping at the first success.
    ///
    /// Total failure is logged and swallowed: one article's irrecoverable
    /// failure never aborts the date.
    async fn recover(&mut self, date: NaiveDate, edition_ordinal: usize) -> Option<RecoveryLevel> {
        for level in RECOVERY_ORDER {
            match self.attempt_recovery(level, date, edition_ordinal).await {
                Ok(()) => {
                    info!(level = ?level, "Navigation recovered");
                    return Some(level);
                }
                Err(e) => {
                    debug!(level = ?level, error = %e, "Recovery tier failed");
                }
            }
        }
        error!("All recovery tiers failed; continuing with the next article");
        None
    }

    async fn attempt_recovery(
        &mut self,
        level: RecoveryLevel,
        date: NaiveDate,
        edition_ordinal: usize,
    ) -> Result<(), NavError> {
        match level {
            RecoveryLevel::LocalBack => {
                self.port.back().await?;
            }
            RecoveryLevel::ReselectEdition => {
                self.select_edition(edition_ordinal).await?;
            }
            RecoveryLevel::FullRenavigate => {
                self.navigate_to_date(date).await?;
                self.select_edition(edition_ordinal).await?;
            }
        }
        self.port.wait_for(site::ARTICLE_LIST, self.wait_timeout).await?;
        Ok(())
    }
}
