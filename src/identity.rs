//! Deterministic file identity derivation.
//!
//! Every discovered article maps to exactly one primary path and one
//! fallback path, derived purely from (archive root, date, sequence,
//! edition, raw title). Re-deriving from the same inputs always yields the
//! same paths, which is what makes re-runs idempotent: the presence of
//! either path on disk is the entire dedup index — there is no database.
//!
//! # Layout
//!
//! ```text
//! <root>/
//! └── 2025-01/
//!     └── 03/
//!         ├── 20250103_001_A01_Some sanitized title.txt
//!         └── 20250103_002_A01_article.txt   # fallback name
//! ```

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

/// Maximum title length in characters, applied after sanitization.
pub const TITLE_MAX_CHARS: usize = 50;

/// Literal stem used in place of the title in the fallback file name.
pub const FALLBACK_STEM: &str = "article";

/// Characters illegal in common filesystem names.
static ILLEGAL_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[\\/*?:"<>|]"#).unwrap());

/// The (primary, fallback) path pair for one article.
///
/// The fallback path is used only when persisting to the primary path fails;
/// both are consulted when checking whether an article was already archived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileIdentity {
    /// Path embedding the sanitized, truncated title.
    pub primary: PathBuf,
    /// Path with [`FALLBACK_STEM`] in place of the title.
    pub fallback: PathBuf,
}

impl FileIdentity {
    /// `true` if the article was already persisted under either name.
    pub fn exists(&self) -> bool {
        self.primary.exists() || self.fallback.exists()
    }
}

/// Normalize a raw title into a filesystem-safe stem.
///
/// Line breaks become spaces, characters illegal in file names are stripped,
/// whitespace runs collapse to single spaces, and the result is truncated to
/// [`TITLE_MAX_CHARS`] characters. Truncation happens last so the limit
/// applies to the sanitized form.
pub fn sanitize_title(raw: &str) -> String {
    let flat = raw.replace(['\r', '\n'], " ");
    let legal = ILLEGAL_CHARS.replace_all(&flat, "");
    let collapsed = legal.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(TITLE_MAX_CHARS).collect()
}

/// Derive the deterministic file identity for one article.
///
/// Pure function: same inputs always produce the same pair of paths,
/// independent of call order or prior state.
pub fn derive(
    root: &Path,
    date: NaiveDate,
    sequence: u32,
    edition: &str,
    raw_title: &str,
) -> FileIdentity {
    let dir = day_dir(root, date);
    let stamp = date.format("%Y%m%d");
    let title = sanitize_title(raw_title);
    FileIdentity {
        primary: dir.join(format!("{stamp}_{sequence:03}_{edition}_{title}.txt")),
        fallback: dir.join(format!("{stamp}_{sequence:03}_{edition}_{FALLBACK_STEM}.txt")),
    }
}

/// Directory for one date's articles: `<root>/<YYYY>-<MM>/<DD>/`.
pub fn day_dir(root: &Path, date: NaiveDate) -> PathBuf {
    root.join(date.format("%Y-%m").to_string())
        .join(date.format("%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 3).unwrap()
    }

    #[test]
    fn sanitize_strips_illegal_characters() {
        assert_eq!(sanitize_title(r#"a\b/c*d?e:f"g<h>i|j"#), "abcdefghij");
    }

    #[test]
    fn sanitize_collapses_whitespace_and_line_breaks() {
        assert_eq!(sanitize_title("one\r\ntwo   three\n"), "one two three");
    }

    #[test]
    fn sanitize_truncates_after_cleaning() {
        // Stripping happens before truncation, so the surviving characters
        // fill the whole 50-character limit.
        let raw = format!("{}{}", "?".repeat(10), "x".repeat(60));
        let out = sanitize_title(&raw);
        assert_eq!(out.chars().count(), TITLE_MAX_CHARS);
        assert!(out.chars().all(|c| c == 'x'));
    }

    #[test]
    fn sanitize_counts_characters_not_bytes() {
        let raw = "标".repeat(80);
        assert_eq!(sanitize_title(&raw).chars().count(), TITLE_MAX_CHARS);
    }

    #[test]
    fn derive_is_deterministic() {
        let root = Path::new("/archive");
        let a = derive(root, date(), 7, "A02", "Some: Title?");
        let b = derive(root, date(), 7, "A02", "Some: Title?");
        assert_eq!(a, b);
    }

    #[test]
    fn derive_builds_expected_paths() {
        let root = Path::new("/archive");
        let id = derive(root, date(), 3, "A01", "Hello World");
        assert_eq!(
            id.primary,
            Path::new("/archive/2025-01/03/20250103_003_A01_Hello World.txt")
        );
        assert_eq!(
            id.fallback,
            Path::new("/archive/2025-01/03/20250103_003_A01_article.txt")
        );
    }

    #[test]
    fn primary_and_fallback_share_the_sequence_prefix() {
        let id = derive(Path::new("/a"), date(), 12, "B03", "t");
        let p = id.primary.file_name().unwrap().to_string_lossy().to_string();
        let f = id.fallback.file_name().unwrap().to_string_lossy().to_string();
        assert!(p.starts_with("20250103_012_B03_"));
        assert!(f.starts_with("20250103_012_B03_"));
    }

    #[test]
    fn exists_checks_both_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let id = derive(tmp.path(), date(), 1, "A01", "probe");
        assert!(!id.exists());

        std::fs::create_dir_all(id.fallback.parent().unwrap()).unwrap();
        std::fs::write(&id.fallback, "x").unwrap();
        assert!(id.exists());
    }
}
