//! Core domain types shared by the checker, the executor and storage.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use strum_macros::{Display, EnumString};
use url::Url;

use crate::error_handling::ConfigurationError;
use crate::fetch::Body;

/// Liveness verdict of a single check.
///
/// Serialized as `up` / `down` in history files and the summary document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Verdict {
    /// The endpoint answered (successfully, or with a tolerated fault)
    Up,
    /// The endpoint could not be reached or answered with an unrecognized error
    Down,
}

impl Verdict {
    /// Builds a verdict from a boolean liveness flag.
    pub fn from_up(is_up: bool) -> Self {
        if is_up {
            Verdict::Up
        } else {
            Verdict::Down
        }
    }

    /// Returns `true` for `Verdict::Up`.
    pub fn is_up(self) -> bool {
        self == Verdict::Up
    }

    /// Status code recorded in history files: 200 when up, 0 when down.
    pub fn history_code(self) -> u16 {
        match self {
            Verdict::Up => 200,
            Verdict::Down => 0,
        }
    }
}

/// An endpoint from the site list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Endpoint {
    /// Human-readable name; drives slug derivation and credential selection
    pub name: String,
    /// HTTPS URL to request
    pub url: String,
    /// Headers as `"Key: Value"` strings
    #[serde(default)]
    pub headers: Vec<String>,
    /// Explicit credential set; overrides name-based selection
    #[serde(default)]
    pub credentials: Option<String>,
    /// Whether this endpoint is handled by the mTLS checker
    #[serde(default)]
    pub mtls: bool,
}

impl Endpoint {
    /// Creates an mTLS endpoint without headers.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            headers: Vec::new(),
            credentials: None,
            mtls: true,
        }
    }

    /// Adds a `"Key: Value"` header line.
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.headers.push(header.into());
        self
    }

    /// Checks that the name is non-empty and the URL is a well-formed HTTPS URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidEndpoint` describing the first problem found.
    pub fn validate(&self) -> Result<Url, ConfigurationError> {
        let invalid = |reason: String| ConfigurationError::InvalidEndpoint {
            name: self.name.clone(),
            reason,
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name is empty".to_string()));
        }
        let url = Url::parse(&self.url).map_err(|e| invalid(format!("invalid URL: {e}")))?;
        if url.scheme() != "https" {
            return Err(invalid(format!(
                "URL scheme must be https, got {}",
                url.scheme()
            )));
        }
        if url.host_str().is_none() {
            return Err(invalid("URL has no host".to_string()));
        }
        Ok(url)
    }
}

/// Outcome of one check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Up or down
    pub verdict: Verdict,
    /// HTTP status code as received, 0 when no response was received
    pub status_code: u16,
    /// When the check finished
    pub checked_at: DateTime<Utc>,
    /// Time spent on the request
    pub elapsed: Duration,
    /// Response body of a successful request
    pub body: Option<Body>,
    /// Error text of a failed request
    pub error: Option<String>,
    /// Label of the benign marker that turned a failure into "up"
    pub benign_marker: Option<String>,
}
