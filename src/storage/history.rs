//! Per-endpoint history records.
//!
//! One YAML file per endpoint slug, in the format Upptime writes:
//!
//! ```yaml
//! url: https://cce.example/health
//! status: up
//! code: 200
//! responseTime: 0
//! lastUpdated: 2026-10-19T08:00:00.000Z
//! startTime: 2026-01-05T12:30:00.000Z
//! generator: Upptime <https://github.com/upptime/upptime>
//! ```
//!
//! Fields this crate does not know about are kept as they are.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::HISTORY_GENERATOR;
use crate::error_handling::PersistenceError;
use crate::models::{Endpoint, Verdict};

use super::write_atomic;

/// History record of one endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HistoryRecord {
    /// Endpoint URL
    pub url: String,
    /// `up` or `down`
    pub status: String,
    /// 200 when up, 0 when down
    pub code: u16,
    /// Response time in milliseconds, maintained by the rollup process
    pub response_time: u64,
    /// Time of the latest check
    pub last_updated: String,
    /// Time of the first check; never changed once set
    pub start_time: String,
    /// Tool that created the record
    pub generator: String,
    /// Fields written by other tools
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl HistoryRecord {
    /// A record for an endpoint checked for the first time.
    pub fn new(endpoint: &Endpoint, verdict: Verdict, now: &str) -> Self {
        Self {
            url: endpoint.url.clone(),
            status: verdict.to_string(),
            code: verdict.history_code(),
            response_time: 0,
            last_updated: now.to_string(),
            start_time: now.to_string(),
            generator: HISTORY_GENERATOR.to_string(),
            extra: BTreeMap::new(),
        }
    }

    /// Applies a new verdict.
    ///
    /// Only `status`, `code` and `lastUpdated` change. Fields missing from an
    /// older file (`url`, `startTime`, `generator`) are filled in.
    pub fn apply(&mut self, endpoint: &Endpoint, verdict: Verdict, now: &str) {
        self.status = verdict.to_string();
        self.code = verdict.history_code();
        self.last_updated = now.to_string();
        if self.url.is_empty() {
            self.url = endpoint.url.clone();
        }
        if self.start_time.is_empty() {
            self.start_time = now.to_string();
        }
        if self.generator.is_empty() {
            self.generator = HISTORY_GENERATOR.to_string();
        }
    }
}

/// Reads a history record; `Ok(None)` if the file does not exist.
///
/// # Errors
///
/// `PersistenceError::Io` if the file cannot be read and
/// `PersistenceError::Yaml` if it is not a valid record.
pub fn load(path: &Path) -> Result<Option<HistoryRecord>, PersistenceError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(PersistenceError::Io {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };
    let record = serde_yaml::from_str(&content).map_err(|e| PersistenceError::Yaml {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(Some(record))
}

/// Writes a history record, replacing the file atomically.
pub fn save(path: &Path, record: &HistoryRecord) -> Result<(), PersistenceError> {
    let yaml = serde_yaml::to_string(record).map_err(|e| PersistenceError::Yaml {
        path: path.to_path_buf(),
        source: e,
    })?;
    write_atomic(path, yaml.as_bytes())
}

/// Loads, updates and saves the record of an endpoint.
///
/// A record that cannot be parsed is left untouched and reported.
pub fn update(
    path: &Path,
    endpoint: &Endpoint,
    verdict: Verdict,
    now: &str,
) -> Result<HistoryRecord, PersistenceError> {
    let record = match load(path)? {
        Some(mut existing) => {
            existing.apply(endpoint, verdict, now);
            existing
        }
        None => HistoryRecord::new(endpoint, verdict, now),
    };
    save(path, &record)?;
    Ok(record)
}
