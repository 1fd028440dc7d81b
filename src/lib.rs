//! # E-paper Archiver
//!
//! A crawler that archives daily e-paper newspaper editions into a local
//! text corpus. It drives a real browser through the site's date calendar,
//! discovers the editions and articles published on each date, and writes
//! extracted article text to a hierarchical on-disk store.
//!
//! The crawl is resumable and idempotent: an article's file name is derived
//! deterministically from (date, sequence, edition, title), and the presence
//! of that file — under either its primary or fallback name — is the entire
//! dedup index. Re-running over already-archived dates is cheap because
//! existing articles are skipped without ever being fetched.
//!
//! ## Architecture
//!
//! The crawl follows a layered pipeline:
//! 1. **Scheduling**: [`schedule`] turns a run mode into an ordered date
//!    sequence, classifying weekend days as non-publication.
//! 2. **Orchestration**: [`crawler`] walks one date at a time — editions in
//!    discovery order, articles in discovery order — with tiered navigation
//!    recovery so a single flaky article never aborts a date.
//! 3. **Persistence**: [`identity`] derives file paths, [`archive`] writes
//!    the labeled text records.
//! 4. **Driving**: [`driver`] owns the browser session for the whole run,
//!    paces requests between dates, and aggregates statistics.
//!
//! The browser itself is only reached through the [`port::NavigationPort`]
//! trait; [`browser`] provides the Chromium-backed implementation and tests
//! substitute a deterministic scripted one.

pub mod archive;
pub mod browser;
pub mod cli;
pub mod crawler;
pub mod driver;
pub mod identity;
pub mod models;
pub mod port;
pub mod schedule;
pub mod site;
