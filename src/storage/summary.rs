//! Summary document.
//!
//! `summary.json` is a JSON array with one entry per endpoint, in first-seen
//! order. The checker only appends new entries and refreshes `status`; the
//! uptime and response-time aggregates belong to the rollup process and are
//! carried through untouched, as are fields this crate does not know.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::config::DEFAULT_UPTIME;
use crate::error_handling::PersistenceError;
use crate::models::{Endpoint, Verdict};
use crate::utils::{icon_url, slugify};

use super::write_atomic;

/// One endpoint's entry in the summary document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SummaryEntry {
    /// Endpoint name, the lookup key
    pub name: String,
    /// Endpoint URL
    pub url: String,
    /// Favicon URL derived from the hostname
    pub icon: String,
    /// Slug of the name
    pub slug: String,
    /// `up` or `down`
    pub status: String,
    /// All-time uptime percentage, e.g. `"99.87%"`
    pub uptime: String,
    /// Uptime over the last day
    pub uptime_day: String,
    /// Uptime over the last week
    pub uptime_week: String,
    /// Uptime over the last month
    pub uptime_month: String,
    /// Uptime over the last year
    pub uptime_year: String,
    /// All-time average response time in milliseconds
    pub time: Number,
    /// Average response time over the last day
    pub time_day: Number,
    /// Average response time over the last week
    pub time_week: Number,
    /// Average response time over the last month
    pub time_month: Number,
    /// Average response time over the last year
    pub time_year: Number,
    /// Calendar day (`YYYY-MM-DD`) to minutes of downtime
    pub daily_minutes_down: Map<String, Value>,
    /// Fields written by other tools
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for SummaryEntry {
    fn default() -> Self {
        Self {
            name: String::new(),
            url: String::new(),
            icon: String::new(),
            slug: String::new(),
            status: String::new(),
            uptime: DEFAULT_UPTIME.to_string(),
            uptime_day: DEFAULT_UPTIME.to_string(),
            uptime_week: DEFAULT_UPTIME.to_string(),
            uptime_month: DEFAULT_UPTIME.to_string(),
            uptime_year: DEFAULT_UPTIME.to_string(),
            time: Number::from(0),
            time_day: Number::from(0),
            time_week: Number::from(0),
            time_month: Number::from(0),
            time_year: Number::from(0),
            daily_minutes_down: Map::new(),
            extra: Map::new(),
        }
    }
}

impl SummaryEntry {
    /// A new entry with 100% uptime and zero response times.
    ///
    /// # Errors
    ///
    /// `PersistenceError::Icon` if the endpoint URL has no hostname.
    pub fn new(endpoint: &Endpoint, verdict: Verdict) -> Result<Self, PersistenceError> {
        let icon = icon_url(&endpoint.url).ok_or_else(|| PersistenceError::Icon {
            url: endpoint.url.clone(),
        })?;
        Ok(Self {
            name: endpoint.name.clone(),
            url: endpoint.url.clone(),
            icon,
            slug: slugify(&endpoint.name),
            status: verdict.to_string(),
            ..Default::default()
        })
    }
}

/// What [`Summary::upsert`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryChange {
    /// A new entry was appended
    Added,
    /// An existing entry's status was refreshed
    Updated,
}

/// The whole summary document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    entries: Vec<SummaryEntry>,
}

impl Summary {
    /// Reads the document; a missing or blank file is an empty summary.
    ///
    /// # Errors
    ///
    /// `PersistenceError::Io` if the file cannot be read and
    /// `PersistenceError::Json` if it is not a valid summary.
    pub fn load(path: &Path) -> Result<Self, PersistenceError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(PersistenceError::Io {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let entries = serde_json::from_str(&content).map_err(|e| PersistenceError::Json {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self { entries })
    }

    /// Writes the whole document, replacing the file atomically.
    pub fn save(&self, path: &Path) -> Result<(), PersistenceError> {
        let mut json =
            serde_json::to_string_pretty(&self.entries).map_err(|e| PersistenceError::Json {
                path: path.to_path_buf(),
                source: e,
            })?;
        json.push('\n');
        write_atomic(path, json.as_bytes())
    }

    /// Appends an entry for a new endpoint name or refreshes the status of an existing one.
    pub fn upsert(
        &mut self,
        endpoint: &Endpoint,
        verdict: Verdict,
    ) -> Result<SummaryChange, PersistenceError> {
        match self.entries.iter_mut().find(|e| e.name == endpoint.name) {
            Some(entry) => {
                entry.status = verdict.to_string();
                Ok(SummaryChange::Updated)
            }
            None => {
                self.entries.push(SummaryEntry::new(endpoint, verdict)?);
                Ok(SummaryChange::Added)
            }
        }
    }

    /// Entry for an endpoint name.
    pub fn get(&self, name: &str) -> Option<&SummaryEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Entries in document order.
    pub fn entries(&self) -> &[SummaryEntry] {
        &self.entries
    }
}

/// Loads, updates and saves the summary document for one endpoint.
pub fn update(
    path: &Path,
    endpoint: &Endpoint,
    verdict: Verdict,
) -> Result<SummaryChange, PersistenceError> {
    let mut summary = Summary::load(path)?;
    let change = summary.upsert(endpoint, verdict)?;
    summary.save(path)?;
    Ok(change)
}
