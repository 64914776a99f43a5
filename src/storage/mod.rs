//! Persisted endpoint state.
//!
//! Two documents are kept under the history directory:
//! - `<slug>.yml`, one history record per endpoint
//! - `summary.json`, one entry per endpoint in first-seen order
//!
//! Every write goes to a temporary file in the target directory which is then
//! renamed over the destination, so readers never observe a partial document.

pub mod history;
pub mod summary;

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::SecondsFormat;
use log::debug;
use tempfile::NamedTempFile;

use crate::config::{HISTORY_FILE_EXTENSION, SUMMARY_FILE_NAME};
use crate::error_handling::PersistenceError;
use crate::models::{CheckResult, Endpoint};
use crate::utils::slugify;

pub use history::HistoryRecord;
pub use summary::{Summary, SummaryChange, SummaryEntry};

/// Writes `contents` to `path` atomically, creating the parent directory if needed.
///
/// # Errors
///
/// Returns `PersistenceError::Io` if the directory, the temporary file or the
/// final rename fails. The destination is unchanged in that case.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), PersistenceError> {
    let io_error = |source: std::io::Error| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(io_error)?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(io_error)?;
    tmp.write_all(contents).map_err(io_error)?;
    tmp.as_file().sync_all().map_err(io_error)?;
    tmp.persist(path).map_err(|e| io_error(e.error))?;
    Ok(())
}

/// History directory and the documents inside it.
#[derive(Debug, Clone)]
pub struct StateStore {
    history_dir: PathBuf,
}

impl StateStore {
    /// State rooted at `history_dir`.
    pub fn new(history_dir: impl Into<PathBuf>) -> Self {
        Self {
            history_dir: history_dir.into(),
        }
    }

    /// Directory holding every document.
    pub fn history_dir(&self) -> &Path {
        &self.history_dir
    }

    /// Path of the history record for a slug.
    pub fn history_path(&self, slug: &str) -> PathBuf {
        self.history_dir
            .join(format!("{slug}.{HISTORY_FILE_EXTENSION}"))
    }

    /// Path of `summary.json`.
    pub fn summary_path(&self) -> PathBuf {
        self.history_dir.join(SUMMARY_FILE_NAME)
    }

    /// Records the outcome of a check in the history record and the summary.
    ///
    /// The two documents are updated independently: a failure on one does not
    /// prevent the other. Returns every failure encountered.
    pub fn record(&self, endpoint: &Endpoint, result: &CheckResult) -> Vec<PersistenceError> {
        let now = result
            .checked_at
            .to_rfc3339_opts(SecondsFormat::Millis, true);
        let slug = slugify(&endpoint.name);
        let mut failures = Vec::new();

        let history_path = self.history_path(&slug);
        match history::update(&history_path, endpoint, result.verdict, &now) {
            Ok(_) => debug!("Updated {}", history_path.display()),
            Err(e) => failures.push(e),
        }

        let summary_path = self.summary_path();
        match summary::update(&summary_path, endpoint, result.verdict) {
            Ok(change) => debug!(
                "{} summary entry for {} ({:?})",
                summary_path.display(),
                endpoint.name,
                change
            ),
            Err(e) => failures.push(e),
        }

        failures
    }
}
