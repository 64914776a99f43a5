//! Configuration constants.
//!
//! Defaults for paths, timeouts, persisted-file conventions and the built-in
//! benign fault markers.

use std::time::Duration;

/// Default site list (Upptime configuration file)
pub const DEFAULT_CONFIG_PATH: &str = ".upptimerc.yml";
/// Default directory for per-endpoint history files and the summary document
pub const DEFAULT_HISTORY_DIR: &str = "history";
/// File name of the summary document inside the history directory
pub const SUMMARY_FILE_NAME: &str = "summary.json";
/// Extension of per-endpoint history files
pub const HISTORY_FILE_EXTENSION: &str = "yml";

/// Per-request timeout in seconds.
/// A timed out request is a transport failure and goes through marker classification.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// [`DEFAULT_TIMEOUT_SECS`] as a `Duration`
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(DEFAULT_TIMEOUT_SECS);

/// Generator tag written into new history records
pub const HISTORY_GENERATOR: &str = "Upptime <https://github.com/upptime/upptime>";
/// Icon service used for summary entries; the endpoint hostname is appended
pub const ICON_SERVICE_PREFIX: &str = "https://icons.duckduckgo.com/ip3/";
/// Uptime value given to summary entries that have not been rolled up yet
pub const DEFAULT_UPTIME: &str = "100.00%";

// Credential environment variables
/// Generic (fallback) base64 PKCS#12 bundle
pub const ENV_CERTIFICATE: &str = "MTLS_CERTIFICATE";
/// Generic (fallback) bundle password
pub const ENV_CERTIFICATE_PASSWORD: &str = "MTLS_CERTIFICATE_PASSWORD";
/// Production-tagged bundle
pub const ENV_PROD_CERTIFICATE: &str = "PROD_MTLS_CERTIFICATE";
/// Production-tagged bundle password
pub const ENV_PROD_CERTIFICATE_PASSWORD: &str = "PROD_MTLS_CERTIFICATE_PASSWORD";
/// CCE (pre-production) tagged bundle
pub const ENV_CCE_CERTIFICATE: &str = "CCE_MTLS_CERTIFICATE";
/// CCE-tagged bundle password
pub const ENV_CCE_CERTIFICATE_PASSWORD: &str = "CCE_MTLS_CERTIFICATE_PASSWORD";
/// Token replacing the embedded Authorization credential of Bankpay endpoints
pub const ENV_BANKPAY_AUTH_TOKEN: &str = "BANKPAY_AUTH_TOKEN";

/// Credential tag used for production endpoints and for the single-URL checker
pub const PROD_CREDENTIAL_TAG: &str = "prod";
/// Credential tag used for CCE endpoints
pub const CCE_CREDENTIAL_TAG: &str = "cce";
/// Endpoint name substring selecting the CCE credentials
pub const CCE_NAME_MARKER: &str = "CCE";
/// Endpoint name substring selecting the Bankpay token override
pub const BANKPAY_NAME_MARKER: &str = "Bankpay";

/// Built-in benign fault markers as `(label, substring)` pairs.
///
/// A failed request whose error text contains one of these substrings still
/// proves that the remote service answered.
pub const DEFAULT_BENIGN_MARKERS: &[(&str, &str)] = &[
    ("soap-fault", "soap:Fault"),
    ("soap-binding", "No binding operation info"),
    ("route-not-found", "Route not found"),
];
