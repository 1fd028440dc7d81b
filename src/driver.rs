//! The run driver: composes scheduler output with the orchestrator over one
//! browser session.
//!
//! The driver owns the session for the whole run. Sessions are expensive to
//! create and the orchestrator never needs more than one at a time, so one
//! is acquired up front and released unconditionally at the end — including
//! on abort. If a date fails and the session probe shows the browser is
//! gone, the session is released and re-acquired once; if re-acquisition
//! also fails, the run aborts with whatever statistics it has.
//!
//! Dates are processed strictly in schedule order. Non-publication dates are
//! counted and skipped with zero port calls. A pacing delay between dates
//! bounds the request rate against the upstream site, and cancellation is
//! honored only between date iterations — there is no mid-date cancellation
//! point.

use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::archive::ArchiveWriter;
use crate::crawler::Crawler;
use crate::models::{CrawlDate, RunStatistics};
use crate::port::{NavError, NavigationPort};

/// Timing knobs for one run. Named parameters, not magic constants.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Pause between consecutive publication dates.
    pub date_pacing: Duration,
    /// Deadline for condition waits inside the crawl.
    pub wait_timeout: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            date_pacing: Duration::from_secs(2),
            wait_timeout: Duration::from_secs(10),
        }
    }
}

/// Run the crawl over a schedule, returning aggregate statistics.
///
/// `acquire` creates a fresh session; it is called once up front and at most
/// once more if the session is lost mid-run. Statistics are always returned,
/// even when the run aborts.
#[instrument(level = "info", skip_all, fields(dates = schedule.len(), base_url))]
pub async fn run<P, F, Fut>(
    schedule: &[CrawlDate],
    archive: &ArchiveWriter,
    base_url: &str,
    mut acquire: F,
    opts: &RunOptions,
    cancel: &CancellationToken,
) -> RunStatistics
where
    P: NavigationPort,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<P, NavError>>,
{
    let mut stats = RunStatistics::default();

    let mut port = match acquire().await {
        Ok(port) => port,
        Err(e) => {
            error!(error = %e, "Could not acquire a browser session");
            stats.aborted = true;
            return stats;
        }
    };

    for crawl_date in schedule {
        if cancel.is_cancelled() {
            info!(date = %crawl_date.compact(), "Interrupted; stopping before this date");
            stats.interrupted = true;
            break;
        }

        if !crawl_date.publication {
            info!(date = %crawl_date.compact(), "Weekend; the paper does not publish");
            stats.weekend_days += 1;
            continue;
        }

        let date = crawl_date.date;
        let outcome = Crawler::new(&mut port, archive, base_url, opts.wait_timeout)
            .crawl_date(date)
            .await;

        let suspect_session = match outcome {
            Ok(report) => {
                let had_failures = report.failed > 0;
                stats.absorb(&report);
                had_failures
            }
            Err(e) => {
                error!(date = %crawl_date.compact(), error = %e, "Date entry failed; zero saved");
                stats.failed_dates.push(date);
                true
            }
        };

        // A failed date may really mean a dead browser. Probe, and re-acquire
        // once before giving up on the run.
        if suspect_session && port.current_url().await.is_err() {
            warn!("Session probe failed; releasing and re-acquiring the browser");
            if let Err(e) = port.close().await {
                warn!(error = %e, "Releasing the dead session failed");
            }
            match acquire().await {
                Ok(fresh) => {
                    info!("Browser session re-acquired");
                    port = fresh;
                }
                Err(e) => {
                    error!(error = %e, "Session re-acquisition failed; aborting run");
                    stats.aborted = true;
                    break;
                }
            }
        }

        tokio::time::sleep(opts.date_pacing).await;
    }

    if let Err(e) = port.close().await {
        warn!(error = %e, "Session release failed");
    }

    info!(
        discovered = stats.discovered,
        saved = stats.saved,
        skipped = stats.skipped,
        failed = stats.failed,
        publication_days = stats.publication_days,
        weekend_days = stats.weekend_days,
        failed_dates = stats.failed_dates.len(),
        "Run complete"
    );
    stats
}
