//! Command-line interface definitions for the e-paper archiver.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Most options can also be provided via environment variables.

use chrono::NaiveDate;
use clap::Parser;
use std::time::Duration;

use crate::browser::LaunchOptions;
use crate::driver::RunOptions;
use crate::schedule::RunMode;

/// Command-line arguments for the e-paper archiver.
///
/// Three run modes are available, mutually exclusive:
/// - default: the current month from the 1st through today
/// - `--date YYYYMMDD`: one date (asks for confirmation on weekends)
/// - `--from YYYYMMDD --to YYYYMMDD`: an explicit inclusive range
///
/// # Examples
///
/// ```sh
/// # Archive the current month so far into ./epaper_data
/// epaper_archiver
///
/// # Re-crawl a specific range headless into a custom root
/// epaper_archiver --from 20250101 --to 20250110 --headless -o /data/epaper
/// ```
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    /// Root directory of the article archive
    #[arg(short, long, env = "EPAPER_ARCHIVE_ROOT", default_value = "./epaper_data")]
    pub output_dir: String,

    /// Front page URL of the e-paper site
    #[arg(
        long,
        env = "EPAPER_BASE_URL",
        default_value = "https://epaper.bjnews.com.cn/"
    )]
    pub base_url: String,

    /// Crawl a single date (YYYYMMDD); prompts if it falls on a weekend
    #[arg(long, value_parser = parse_date, conflicts_with_all = ["from", "to"])]
    pub date: Option<NaiveDate>,

    /// Start of an inclusive date range (YYYYMMDD)
    #[arg(long, value_parser = parse_date, requires = "to")]
    pub from: Option<NaiveDate>,

    /// End of an inclusive date range (YYYYMMDD)
    #[arg(long, value_parser = parse_date, requires = "from")]
    pub to: Option<NaiveDate>,

    /// Run the browser without a visible window
    #[arg(long)]
    pub headless: bool,

    /// Seconds to pause between dates
    #[arg(long, default_value_t = 2.0)]
    pub date_pacing_secs: f64,

    /// Seconds to wait for an expected element before timing out
    #[arg(long, default_value_t = 10.0)]
    pub wait_timeout_secs: f64,

    /// Seconds to let the page settle after clicks and navigations
    #[arg(long, default_value_t = 1.5)]
    pub settle_secs: f64,

    /// Answer yes to the weekend confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,
}

/// Accept compact `YYYYMMDD` or dashed `YYYY-MM-DD` dates.
///
/// The compact form must be exactly eight digits: chrono's `%Y%m%d` would
/// otherwise accept truncated inputs like `2025013` by guessing where the
/// year ends.
fn parse_date(s: &str) -> Result<NaiveDate, String> {
    let bad = || format!("`{s}` is not a YYYYMMDD or YYYY-MM-DD date");
    if s.chars().all(|c| c.is_ascii_digit()) {
        if s.len() != 8 {
            return Err(bad());
        }
        NaiveDate::parse_from_str(s, "%Y%m%d").map_err(|_| bad())
    } else {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| bad())
    }
}

impl Cli {
    /// Resolve the run mode. `today` is passed in so month-to-date stays a
    /// pure function of its inputs.
    pub fn run_mode(&self, today: NaiveDate) -> RunMode {
        match (self.date, self.from, self.to) {
            (Some(date), _, _) => RunMode::Single(date),
            (None, Some(from), Some(to)) => RunMode::Range { from, to },
            _ => RunMode::MonthToDate { today },
        }
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            date_pacing: Duration::from_secs_f64(self.date_pacing_secs),
            wait_timeout: Duration::from_secs_f64(self.wait_timeout_secs),
        }
    }

    pub fn launch_options(&self) -> LaunchOptions {
        LaunchOptions {
            headless: self.headless,
            settle: Duration::from_secs_f64(self.settle_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["epaper_archiver"]);
        assert_eq!(cli.output_dir, "./epaper_data");
        assert!(!cli.headless);
        assert!(!cli.yes);
        assert_eq!(
            cli.run_mode(d(2025, 1, 15)),
            RunMode::MonthToDate {
                today: d(2025, 1, 15)
            }
        );
    }

    #[test]
    fn test_single_date_mode() {
        let cli = Cli::parse_from(["epaper_archiver", "--date", "20250103"]);
        assert_eq!(cli.run_mode(d(2025, 1, 15)), RunMode::Single(d(2025, 1, 3)));
    }

    #[test]
    fn test_range_mode_accepts_both_date_forms() {
        let cli = Cli::parse_from([
            "epaper_archiver",
            "--from",
            "20250101",
            "--to",
            "2025-01-10",
        ]);
        assert_eq!(
            cli.run_mode(d(2025, 1, 15)),
            RunMode::Range {
                from: d(2025, 1, 1),
                to: d(2025, 1, 10)
            }
        );
    }

    #[test]
    fn test_date_conflicts_with_range() {
        let result = Cli::try_parse_from([
            "epaper_archiver",
            "--date",
            "20250103",
            "--from",
            "20250101",
            "--to",
            "20250110",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_requires_to() {
        let result = Cli::try_parse_from(["epaper_archiver", "--from", "20250101"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_timing_knobs() {
        let cli = Cli::parse_from([
            "epaper_archiver",
            "--date-pacing-secs",
            "0.5",
            "--wait-timeout-secs",
            "3",
            "--settle-secs",
            "0.1",
        ]);
        let run = cli.run_options();
        assert_eq!(run.date_pacing, Duration::from_millis(500));
        assert_eq!(run.wait_timeout, Duration::from_secs(3));
        assert_eq!(cli.launch_options().settle, Duration::from_millis(100));
    }

    #[test]
    fn test_bad_date_is_rejected() {
        // Truncated, overlong, out-of-range, and garbage forms all error.
        for bad in ["2025013", "202501030", "20250230", "2025-13-01", "today"] {
            let result = Cli::try_parse_from(["epaper_archiver", "--date", bad]);
            assert!(result.is_err(), "`{bad}` should be rejected");
        }
    }

    #[test]
    fn test_exact_compact_date_is_accepted() {
        let cli = Cli::parse_from(["epaper_archiver", "--date", "20250106"]);
        assert_eq!(cli.date, Some(d(2025, 1, 6)));
    }
}
