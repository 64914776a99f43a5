//! Liveness classification.
//!
//! Wraps the secure request executor and turns its outcome into an up/down
//! verdict:
//! - a 2xx response is up
//! - a transport or HTTP error is up if its text contains a benign marker,
//!   down otherwise
//! - credential and configuration problems are always down
//!
//! [`check_and_record`] additionally hands the verdict to the state store.

mod markers;

use std::time::{Duration, Instant};

use chrono::Utc;
use log::{error, info, warn};

use crate::config::Config;
use crate::credentials::{self, CredentialStore, ResolvedCredentials};
use crate::error_handling::RequestError;
use crate::fetch::{self, RequestOptions, Response};
use crate::models::{CheckResult, Endpoint, Verdict};
use crate::storage::StateStore;
use crate::tls::ServerVerification;

pub use markers::{BenignMarker, MarkerPolicy};

/// Settings shared by every check of a run.
#[derive(Debug, Clone)]
pub struct CheckSettings {
    /// Benign fault markers
    pub markers: MarkerPolicy,
    /// Per-request timeout
    pub timeout: Duration,
    /// Server certificate policy
    pub server_verification: ServerVerification,
}

impl Default for CheckSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for CheckSettings {
    fn from(config: &Config) -> Self {
        Self {
            markers: config.markers.clone(),
            timeout: config.timeout(),
            server_verification: config.server_verification,
        }
    }
}

/// Splits a `"Key: Value"` header line.
///
/// Returns `None` when there is no colon or the name is empty.
pub fn parse_header_line(line: &str) -> Option<(String, String)> {
    let (name, value) = line.split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), value.trim().to_string()))
}

/// Classifies a request outcome.
///
/// Returns the verdict and, when a benign marker rescued a failed request,
/// the marker that matched.
pub fn classify<'a>(
    outcome: &Result<Response, RequestError>,
    markers: &'a MarkerPolicy,
) -> (Verdict, Option<&'a BenignMarker>) {
    match outcome {
        Ok(_) => (Verdict::Up, None),
        Err(e) if e.is_remote() => match markers.find(&e.to_string()) {
            Some(marker) => (Verdict::Up, Some(marker)),
            None => (Verdict::Down, None),
        },
        Err(_) => (Verdict::Down, None),
    }
}

/// Checks a URL with already resolved credentials.
///
/// The credential bundle is built for this check only and dropped when it returns.
pub async fn check_url(
    url: &str,
    credentials: &ResolvedCredentials,
    header_lines: &[String],
    settings: &CheckSettings,
) -> CheckResult {
    let started = Instant::now();

    let mut headers = Vec::with_capacity(header_lines.len());
    for line in header_lines {
        match parse_header_line(line) {
            Some(header) => headers.push(header),
            None => warn!("Ignoring malformed header line for {url}"),
        }
    }
    let options = RequestOptions {
        headers,
        timeout: settings.timeout,
        server_verification: settings.server_verification,
        ..Default::default()
    };

    let outcome = match credentials::load(&credentials.certificate, &credentials.password) {
        Ok(bundle) => fetch::request(url, &bundle, &options).await,
        Err(e) => Err(RequestError::from(e)),
    };

    let (verdict, marker) = classify(&outcome, &settings.markers);
    let status_code = match &outcome {
        Ok(response) => response.status,
        Err(e) => e.status_code().unwrap_or(0),
    };
    if let Some(marker) = marker {
        info!(
            "{url} returned an error matching benign marker '{}', the server is up",
            marker.label
        );
    }

    let (body, error_text) = match outcome {
        Ok(response) => (Some(response.body), None),
        Err(e) => {
            if verdict == Verdict::Down {
                error!("Error checking URL {url}: {e}");
            }
            (None, Some(e.to_string()))
        }
    };

    CheckResult {
        verdict,
        status_code,
        checked_at: Utc::now(),
        elapsed: started.elapsed(),
        body,
        error: error_text,
        benign_marker: marker.map(|m| m.label.clone()),
    }
}

/// Checks one endpoint.
///
/// Validation and credential resolution failures yield a down result without
/// any request being made.
pub async fn check_endpoint(
    endpoint: &Endpoint,
    store: &CredentialStore,
    settings: &CheckSettings,
) -> CheckResult {
    let resolved = endpoint
        .validate()
        .and_then(|_| store.resolve(endpoint));
    match resolved {
        Ok(credentials) => {
            let headers = store.headers_for(endpoint);
            check_url(&endpoint.url, &credentials, &headers, settings).await
        }
        Err(e) => {
            error!("Cannot check {}: {e}", endpoint.name);
            CheckResult {
                verdict: Verdict::Down,
                status_code: 0,
                checked_at: Utc::now(),
                elapsed: Duration::ZERO,
                body: None,
                error: Some(e.to_string()),
                benign_marker: None,
            }
        }
    }
}

/// Checks one endpoint and records the verdict.
///
/// Recording failures are logged and do not change the verdict.
pub async fn check_and_record(
    endpoint: &Endpoint,
    store: &CredentialStore,
    settings: &CheckSettings,
    state: &StateStore,
) -> Verdict {
    info!("Checking {} ({})...", endpoint.name, endpoint.url);
    let result = check_endpoint(endpoint, store, settings).await;
    info!(
        "{} is {} ({} ms)",
        endpoint.name,
        result.verdict,
        result.elapsed.as_millis()
    );

    for failure in state.record(endpoint, &result) {
        error!("Failed to record status of {}: {failure}", endpoint.name);
    }
    result.verdict
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handling::CredentialError;
    use crate::fetch::Body;

    #[test]
    fn test_parse_header_line() {
        assert_eq!(
            parse_header_line("Authorization: Basic abc:def"),
            Some(("Authorization".to_string(), "Basic abc:def".to_string()))
        );
        assert_eq!(
            parse_header_line("  X-Trace :  1 "),
            Some(("X-Trace".to_string(), "1".to_string()))
        );
        assert_eq!(parse_header_line("no colon here"), None);
        assert_eq!(parse_header_line(": value"), None);
    }

    #[test]
    fn test_success_is_up() {
        let markers = MarkerPolicy::default();
        let outcome = Ok(Response {
            status: 200,
            body: Body::Json(serde_json::json!({"status": "ok"})),
        });
        assert_eq!(classify(&outcome, &markers), (Verdict::Up, None));

        let no_content = Ok(Response {
            status: 204,
            body: Body::Text(String::new()),
        });
        assert_eq!(classify(&no_content, &markers), (Verdict::Up, None));
    }

    #[test]
    fn test_status_error_with_marker_is_up() {
        let markers = MarkerPolicy::default();
        let outcome = Err(RequestError::Status {
            code: 500,
            body: "<soap:Envelope>No binding operation info</soap:Envelope>".to_string(),
        });
        let (verdict, marker) = classify(&outcome, &markers);
        assert_eq!(verdict, Verdict::Up);
        assert_eq!(marker.unwrap().label, "soap-binding");
    }

    #[test]
    fn test_status_error_without_marker_is_down() {
        let markers = MarkerPolicy::default();
        let outcome = Err(RequestError::Status {
            code: 502,
            body: "Bad Gateway".to_string(),
        });
        assert_eq!(classify(&outcome, &markers), (Verdict::Down, None));
    }

    #[test]
    fn test_transport_error_with_marker_is_up() {
        let mut markers = MarkerPolicy::empty();
        markers.push("reset", "connection reset");
        let outcome = Err(RequestError::Transport {
            message: "error sending request: connection reset by peer".to_string(),
            timeout: false,
        });
        assert_eq!(classify(&outcome, &markers).0, Verdict::Up);
    }

    #[test]
    fn test_credential_error_is_always_down() {
        let mut markers = MarkerPolicy::empty();
        markers.push("p12", "P12 file");
        let outcome = Err(RequestError::from(CredentialError::MissingCertificate));
        assert_eq!(classify(&outcome, &markers), (Verdict::Down, None));
    }

    #[test]
    fn test_settings_from_config() {
        let config = Config {
            timeout_seconds: 12,
            server_verification: ServerVerification::Enabled,
            ..Default::default()
        };
        let settings = CheckSettings::from(&config);
        assert_eq!(settings.timeout, Duration::from_secs(12));
        assert_eq!(settings.server_verification, ServerVerification::Enabled);
        assert_eq!(settings.markers, MarkerPolicy::default());
    }

    #[tokio::test]
    async fn test_invalid_endpoint_is_down_without_request() {
        let store = CredentialStore::default();
        let endpoint = Endpoint::new("Legacy", "http://legacy.example");
        let result = check_endpoint(&endpoint, &store, &CheckSettings::default()).await;
        assert_eq!(result.verdict, Verdict::Down);
        assert_eq!(result.status_code, 0);
        assert!(result.error.unwrap().contains("https"));
    }

    #[tokio::test]
    async fn test_wrong_credentials_are_down() {
        let store = CredentialStore::new(crate::credentials::CredentialPair::new(
            "bm90IGEgcDEy",
            "secret",
        ));
        let endpoint = Endpoint::new("Payment API", "https://127.0.0.1:9/health");
        let result = check_endpoint(&endpoint, &store, &CheckSettings::default()).await;
        assert_eq!(result.verdict, Verdict::Down);
        assert!(result.benign_marker.is_none());
    }
}
