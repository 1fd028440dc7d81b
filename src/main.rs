//! # E-paper Archiver
//!
//! Binary entry point: builds a text corpus of daily newspaper editions by
//! driving a browser through the e-paper site's date calendar and archiving
//! every article it can extract.
//!
//! ## Usage
//!
//! ```sh
//! # Current month, 1st through today, weekends skipped automatically
//! epaper_archiver -o ./epaper_data
//!
//! # Explicit range, headless
//! epaper_archiver --from 20250101 --to 20250110 --headless
//!
//! # One date, for testing a site change
//! epaper_archiver --date 20250103
//! ```
//!
//! Re-running over already-archived dates is cheap: existing articles are
//! detected by file presence and skipped without being fetched. The process
//! exits non-zero when the run aborts, so an external scheduler wrapping it
//! (e.g. a month-end cron job) can decide to retry.

use chrono::{Local, NaiveDate};
use clap::Parser;
use std::error::Error;
use std::io::{self, Write};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};
use url::Url;

use epaper_archiver::archive::ArchiveWriter;
use epaper_archiver::browser::ChromiumPort;
use epaper_archiver::cli::Cli;
use epaper_archiver::driver;
use epaper_archiver::schedule::{self, RunMode};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("epaper_archiver starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.output_dir, ?args.base_url, "Parsed CLI arguments");

    // Fail fast on an unusable base URL
    Url::parse(&args.base_url)?;

    // Early check: ensure the archive root is writable
    let archive = ArchiveWriter::new(&args.output_dir);
    if let Err(e) = archive.ensure_writable_root().await {
        error!(
            path = %args.output_dir,
            error = %e,
            "Archive root is not writable (fix perms or choose a different path)"
        );
        return Err(e.into());
    }

    // ---- Build the schedule ----
    let today = Local::now().date_naive();
    let mode = args.run_mode(today);

    if let RunMode::Single(date) = mode {
        if !schedule::is_publication_day(date) && !args.yes {
            if !confirm_weekend(date)? {
                info!(date = %date, "Weekend crawl declined");
                return Ok(());
            }
        }
    }

    let dates = schedule::build(&mode);
    info!(dates = dates.len(), ?mode, "Schedule built");

    // ---- Cancellation: honored between dates only ----
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received; stopping after the current date");
                cancel.cancel();
            }
        });
    }

    // ---- Run ----
    let launch = args.launch_options();
    let opts = args.run_options();
    let stats = driver::run(
        &dates,
        &archive,
        &args.base_url,
        move || {
            let launch = launch.clone();
            async move { ChromiumPort::launch(&launch).await }
        },
        &opts,
        &cancel,
    )
    .await;

    // ---- Report ----
    info!(
        discovered = stats.discovered,
        saved = stats.saved,
        skipped = stats.skipped,
        failed = stats.failed,
        publication_days = stats.publication_days,
        weekend_days = stats.weekend_days,
        saved_per_day = format!("{:.1}", stats.saved_per_day()),
        "Crawl report"
    );
    if !stats.failed_dates.is_empty() {
        warn!(dates = ?stats.failed_dates, "Dates that failed");
    }
    if stats.interrupted {
        warn!("Run was interrupted; re-run to resume where it left off");
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    if stats.aborted {
        return Err("run aborted: the browser session could not be re-acquired".into());
    }
    Ok(())
}

/// Ask on stdin whether a weekend date should be crawled anyway.
fn confirm_weekend(date: NaiveDate) -> io::Result<bool> {
    print!(
        "{} falls on a {}; the paper does not publish. Crawl anyway? [y/N] ",
        date.format("%Y%m%d"),
        date.format("%A")
    );
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}
