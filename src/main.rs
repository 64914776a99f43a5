//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `mtls_status` library that handles:
//! - Command-line argument parsing
//! - Logger initialization
//! - Exit codes
//!
//! All core functionality is implemented in the library crate.

use std::path::Path;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;

use mtls_status::config::{Cli, Command, PROD_CREDENTIAL_TAG};
use mtls_status::credentials::CredentialPair;
use mtls_status::initialization::{init_crypto_provider, init_logger_with};
use mtls_status::{check_single_url, run_checks, CheckSettings, CredentialStore, Verdict};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = cli.common.to_config();

    init_logger_with(config.log_level.clone().into(), config.log_format.clone())
        .context("Failed to initialize logger")?;
    init_crypto_provider();

    match cli.command {
        Command::CheckAll {
            config: config_path,
            history_dir,
        } => {
            config.config_path = config_path;
            config.history_dir = history_dir;
            match run_checks(config).await {
                Ok(report) => {
                    println!(
                        "✅ Checked {} endpoint{} ({} up, {} down) in {:.1}s",
                        report.total,
                        if report.total == 1 { "" } else { "s" },
                        report.up,
                        report.down,
                        report.elapsed_seconds
                    );
                    Ok(())
                }
                Err(e) => {
                    eprintln!("mtls_status error: {:#}", e);
                    process::exit(1);
                }
            }
        }
        Command::CheckUrl {
            url,
            cert_file,
            password_env,
        } => {
            let store = match cert_file {
                Some(path) => match store_from_file(&path, &password_env) {
                    Ok(store) => store,
                    Err(e) => {
                        eprintln!("mtls_status error: {:#}", e);
                        process::exit(1);
                    }
                },
                None => CredentialStore::from_env(),
            };
            config.server_verification.warn_if_disabled();
            let settings = CheckSettings::from(&config);
            match check_single_url(&url, &store, &settings).await {
                Verdict::Up => Ok(()),
                Verdict::Down => process::exit(1),
            }
        }
    }
}

/// Builds a store whose production pair is a base64 bundle read from a file.
fn store_from_file(path: &Path, password_env: &str) -> Result<CredentialStore> {
    let certificate = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let password = std::env::var(password_env)
        .with_context(|| format!("{password_env} is not set"))?;

    let mut store = CredentialStore::default();
    store.insert(
        PROD_CREDENTIAL_TAG,
        CredentialPair::new(certificate.trim(), password),
    );
    Ok(store)
}
