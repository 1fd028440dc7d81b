//! Archive persistence.
//!
//! Writes extracted articles to the hierarchical text store, one file per
//! article, using the identity derived in [`crate::identity`]. A save is a
//! whole-file write with no partial-write cleanup: atomicity is whatever the
//! underlying filesystem's create-write-close gives us, so a crash mid-write
//! can leave a half-written file behind.
//!
//! # Record format
//!
//! ```text
//! Title: <title>
//! Edition: <edition code>
//! Date: <YYYYMMDD>
//! Content:
//! <paragraphs, one per line>
//! ```

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, instrument, warn};

use crate::identity;
use crate::models::Article;

/// What happened to one article handed to [`ArchiveWriter::save`].
#[derive(Debug)]
pub enum SaveOutcome {
    /// A new file was written at this path (primary or fallback).
    Saved(PathBuf),
    /// A file already existed; nothing was written.
    SkippedExisting,
}

/// Persistence failures. Produced only when both write attempts fail.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("could not create archive directory {dir}")]
    CreateDir {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("archive root {dir} is not writable")]
    NotWritable {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(
        "primary and fallback writes both failed for sequence {sequence} \
         (primary: {primary}; fallback: {fallback})"
    )]
    WriteFailed {
        sequence: u32,
        #[source]
        primary: io::Error,
        fallback: io::Error,
    },
}

/// Writes articles under a fixed archive root.
#[derive(Debug, Clone)]
pub struct ArchiveWriter {
    root: PathBuf,
}

impl ArchiveWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The archive root all identities are derived against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Ensure the archive root exists and is writable.
    ///
    /// Creates the root if needed, then probes it with a throwaway file.
    /// Run this once at startup so a bad path fails fast instead of on the
    /// first saved article.
    #[instrument(level = "info", skip_all, fields(root = %self.root.display()))]
    pub async fn ensure_writable_root(&self) -> Result<(), ArchiveError> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|source| ArchiveError::CreateDir {
                dir: self.root.clone(),
                source,
            })?;
        let probe = self.root.join("..__probe_write__");
        match fs::write(&probe, b"").await {
            Ok(()) => {
                let _ = fs::remove_file(&probe).await;
                info!("Archive root is writable");
                Ok(())
            }
            Err(source) => Err(ArchiveError::NotWritable {
                dir: self.root.clone(),
                source,
            }),
        }
    }

    /// Persist one article under its derived identity.
    ///
    /// If the primary path already exists, returns
    /// [`SaveOutcome::SkippedExisting`] without writing. If the primary
    /// write fails, the fallback path is checked (existing file ⇒ skipped)
    /// and then written once; only a failure of both attempts is an error.
    #[instrument(
        level = "debug",
        skip_all,
        fields(date = %article.date, sequence = article.sequence, edition = %article.edition)
    )]
    pub async fn save(&self, article: &Article) -> Result<SaveOutcome, ArchiveError> {
        let id = identity::derive(
            &self.root,
            article.date,
            article.sequence,
            &article.edition,
            &article.title,
        );

        if let Some(dir) = id.primary.parent() {
            fs::create_dir_all(dir)
                .await
                .map_err(|source| ArchiveError::CreateDir {
                    dir: dir.to_path_buf(),
                    source,
                })?;
        }

        if fs::try_exists(&id.primary).await.unwrap_or(false) {
            debug!(path = %id.primary.display(), "File exists; skipping save");
            return Ok(SaveOutcome::SkippedExisting);
        }

        let body = render_record(article);
        match fs::write(&id.primary, &body).await {
            Ok(()) => {
                debug!(path = %id.primary.display(), "Saved article");
                Ok(SaveOutcome::Saved(id.primary))
            }
            Err(primary) => {
                warn!(
                    path = %id.primary.display(),
                    error = %primary,
                    "Primary write failed; trying fallback name"
                );
                if fs::try_exists(&id.fallback).await.unwrap_or(false) {
                    debug!(path = %id.fallback.display(), "Fallback exists; skipping save");
                    return Ok(SaveOutcome::SkippedExisting);
                }
                match fs::write(&id.fallback, &body).await {
                    Ok(()) => {
                        debug!(path = %id.fallback.display(), "Saved article under fallback name");
                        Ok(SaveOutcome::Saved(id.fallback))
                    }
                    Err(fallback) => Err(ArchiveError::WriteFailed {
                        sequence: article.sequence,
                        primary,
                        fallback,
                    }),
                }
            }
        }
    }
}

/// Render the labeled-line record body for one article.
fn render_record(article: &Article) -> String {
    format!(
        "Title: {}\nEdition: {}\nDate: {}\nContent:\n{}\n",
        article.title,
        article.edition,
        article.date.format("%Y%m%d"),
        article.content
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn article(sequence: u32) -> Article {
        Article {
            title: "Test Title".into(),
            content: "first paragraph\nsecond paragraph".into(),
            date: NaiveDate::from_ymd_opt(2025, 1, 3).unwrap(),
            edition: "A01".into(),
            sequence,
        }
    }

    #[tokio::test]
    async fn save_writes_labeled_record() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = ArchiveWriter::new(tmp.path());

        let outcome = writer.save(&article(1)).await.unwrap();
        let path = match outcome {
            SaveOutcome::Saved(p) => p,
            SaveOutcome::SkippedExisting => panic!("expected a fresh save"),
        };

        let body = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            body,
            "Title: Test Title\nEdition: A01\nDate: 20250103\nContent:\nfirst paragraph\nsecond paragraph\n"
        );
        assert!(path.ends_with("2025-01/03/20250103_001_A01_Test Title.txt"));
    }

    #[tokio::test]
    async fn save_skips_existing_primary() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = ArchiveWriter::new(tmp.path());

        writer.save(&article(1)).await.unwrap();
        let outcome = writer.save(&article(1)).await.unwrap();
        assert!(matches!(outcome, SaveOutcome::SkippedExisting));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn save_falls_back_when_primary_write_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = ArchiveWriter::new(tmp.path());
        let a = article(3);

        // A dangling symlink at the primary path: the existence check sees
        // nothing, but the write fails with ENOENT.
        let id = identity::derive(tmp.path(), a.date, a.sequence, &a.edition, &a.title);
        std::fs::create_dir_all(id.primary.parent().unwrap()).unwrap();
        std::os::unix::fs::symlink("/nonexistent/target", &id.primary).unwrap();

        let outcome = writer.save(&a).await.unwrap();
        match outcome {
            SaveOutcome::Saved(p) => assert_eq!(p, id.fallback),
            SaveOutcome::SkippedExisting => panic!("expected a fallback save"),
        }
        assert!(id.fallback.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn save_skips_existing_fallback_after_primary_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = ArchiveWriter::new(tmp.path());
        let a = article(4);

        let id = identity::derive(tmp.path(), a.date, a.sequence, &a.edition, &a.title);
        std::fs::create_dir_all(id.primary.parent().unwrap()).unwrap();
        std::os::unix::fs::symlink("/nonexistent/target", &id.primary).unwrap();
        std::fs::write(&id.fallback, "already here").unwrap();

        let outcome = writer.save(&a).await.unwrap();
        assert!(matches!(outcome, SaveOutcome::SkippedExisting));
        assert_eq!(std::fs::read_to_string(&id.fallback).unwrap(), "already here");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn save_reports_failure_when_both_writes_fail() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = ArchiveWriter::new(tmp.path());
        let a = article(5);

        let id = identity::derive(tmp.path(), a.date, a.sequence, &a.edition, &a.title);
        std::fs::create_dir_all(id.primary.parent().unwrap()).unwrap();
        std::os::unix::fs::symlink("/nonexistent/target", &id.primary).unwrap();
        std::os::unix::fs::symlink("/nonexistent/target", &id.fallback).unwrap();

        let err = writer.save(&a).await.unwrap_err();
        assert!(matches!(err, ArchiveError::WriteFailed { sequence: 5, .. }));
    }
}
