//! mtls_status library: liveness checks for mutual-TLS endpoints
//!
//! Reads the endpoints flagged `mtls: true` from an Upptime site list, calls
//! each one with a client certificate taken from a base64 PKCS#12 bundle, and
//! records whether it is up in Upptime-compatible history files and
//! `summary.json`.
//!
//! # Example
//!
//! ```no_run
//! use mtls_status::{run_checks, Config};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     config_path: std::path::PathBuf::from(".upptimerc.yml"),
//!     history_dir: std::path::PathBuf::from("history"),
//!     ..Default::default()
//! };
//!
//! let report = run_checks(config).await?;
//! println!("Checked {} endpoints: {} up, {} down",
//!          report.total, report.up, report.down);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! Credentials are read from the `MTLS_*`, `PROD_MTLS_*` and `CCE_MTLS_*`
//! environment variables. A Tokio runtime is required.

#![warn(missing_docs)]

pub mod checker;
pub mod config;
pub mod credentials;
pub mod error_handling;
pub mod fetch;
pub mod initialization;
pub mod models;
pub mod storage;
pub mod tls;
mod utils;

// Re-export public API
pub use checker::{check_and_record, check_endpoint, check_url, CheckSettings, MarkerPolicy};
pub use config::{Config, LogFormat, LogLevel};
pub use credentials::{CredentialBundle, CredentialStore};
pub use models::{CheckResult, Endpoint, Verdict};
pub use run::{check_single_url, run_checks, run_checks_with, RunReport};
pub use storage::StateStore;
pub use utils::slugify;

// Batch runner
mod run {
    use anyhow::{Context, Result};
    use log::info;

    use crate::checker::{self, CheckSettings};
    use crate::config::{load_site_list, Config, PROD_CREDENTIAL_TAG};
    use crate::credentials::CredentialStore;
    use crate::models::{Endpoint, Verdict};
    use crate::storage::StateStore;

    /// Results of a checking run.
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct RunReport {
        /// Number of endpoints checked
        pub total: usize,
        /// Endpoints found up
        pub up: usize,
        /// Endpoints found down
        pub down: usize,
        /// Elapsed time in seconds
        pub elapsed_seconds: f64,
    }

    /// Checks every mTLS endpoint of the site list and records the results.
    ///
    /// Credentials come from the process environment.
    ///
    /// # Errors
    ///
    /// Fails before any endpoint is touched if the site list cannot be read or
    /// any endpoint lacks a certificate or password. Failures of individual
    /// endpoints only mark them down.
    pub async fn run_checks(config: Config) -> Result<RunReport> {
        let endpoints = load_site_list(&config.config_path)
            .with_context(|| format!("Failed to load {}", config.config_path.display()))?;
        let store = CredentialStore::from_env();
        run_checks_with(&config, &store, &endpoints).await
    }

    /// Checks the given endpoints with an explicit credential store.
    ///
    /// Endpoints are checked one after the other; each one is recorded before
    /// the next starts.
    pub async fn run_checks_with(
        config: &Config,
        store: &CredentialStore,
        endpoints: &[Endpoint],
    ) -> Result<RunReport> {
        store
            .ensure_configured()
            .context("Cannot check mTLS endpoints")?;
        // A certificate without its password is as fatal as no certificate
        for endpoint in endpoints {
            store
                .resolve(endpoint)
                .with_context(|| format!("Cannot check {}", endpoint.name))?;
        }
        config.server_verification.warn_if_disabled();

        let settings = CheckSettings::from(config);
        let state = StateStore::new(&config.history_dir);
        let started = std::time::Instant::now();
        info!("Checking {} mTLS endpoint(s)", endpoints.len());

        let mut report = RunReport::default();
        for endpoint in endpoints {
            let verdict = checker::check_and_record(endpoint, store, &settings, &state).await;
            report.total += 1;
            match verdict {
                Verdict::Up => report.up += 1,
                Verdict::Down => report.down += 1,
            }
        }
        report.elapsed_seconds = started.elapsed().as_secs_f64();

        info!(
            "Checked {} endpoint(s): {} up, {} down in {:.1}s",
            report.total, report.up, report.down, report.elapsed_seconds
        );
        Ok(report)
    }

    /// Checks one URL with the production credentials, without recording anything.
    ///
    /// Missing credentials yield `Verdict::Down`.
    pub async fn check_single_url(
        url: &str,
        store: &CredentialStore,
        settings: &CheckSettings,
    ) -> Verdict {
        let credentials = match store.resolve_tag(PROD_CREDENTIAL_TAG) {
            Ok(credentials) => credentials,
            Err(e) => {
                log::error!("Cannot check {url}: {e}");
                return Verdict::Down;
            }
        };
        let result = checker::check_url(url, &credentials, &[], settings).await;
        info!("{url} is {}", result.verdict);
        result.verdict
    }
}
