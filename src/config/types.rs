//! Configuration types and CLI options.
//!
//! This module defines the `clap` command line, the library `Config` it is
//! converted into, and the logging enums shared by both.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::checker::MarkerPolicy;
use crate::config::constants::{DEFAULT_CONFIG_PATH, DEFAULT_HISTORY_DIR, DEFAULT_TIMEOUT_SECS};
use crate::tls::ServerVerification;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Command-line options.
///
/// # Examples
///
/// ```bash
/// # Check every `mtls: true` site of .upptimerc.yml and update ./history
/// mtls_status check-all
///
/// # Check one URL with the production certificate
/// mtls_status check-url https://api.example.com/health
/// ```
#[derive(Debug, Parser)]
#[command(
    name = "mtls_status",
    about = "Checks mutual-TLS endpoints and records whether they are up."
)]
pub struct Cli {
    /// Options shared by every subcommand
    #[command(flatten)]
    pub common: CommonOpts,

    /// What to check
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check every endpoint flagged `mtls: true` in the site list and record the results
    CheckAll {
        /// Upptime site list
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Directory holding history files and summary.json
        #[arg(long, default_value = DEFAULT_HISTORY_DIR)]
        history_dir: PathBuf,
    },
    /// Check a single URL with the production credentials; exits 1 if it is down
    CheckUrl {
        /// URL to check
        url: String,

        /// Read the base64 PKCS#12 bundle from this file instead of the environment
        #[arg(long)]
        cert_file: Option<PathBuf>,

        /// Environment variable holding the password for `--cert-file`
        #[arg(long, default_value = crate::config::ENV_PROD_CERTIFICATE_PASSWORD)]
        password_env: String,
    },
}

/// Flags accepted by every subcommand.
#[derive(Debug, Args)]
pub struct CommonOpts {
    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info, global = true)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain, global = true)]
    pub log_format: LogFormat,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS, global = true)]
    pub timeout_seconds: u64,

    /// Verify the server certificate against public roots and the bundled CAs
    #[arg(long, global = true)]
    pub verify_server_cert: bool,

    /// Extra error substring that still counts as "up" (repeatable)
    #[arg(long = "benign-marker", global = true)]
    pub benign_markers: Vec<String>,

    /// Do not use the built-in benign markers
    #[arg(long, global = true)]
    pub no_default_markers: bool,
}

/// Library configuration (no CLI dependencies).
///
/// # Examples
///
/// ```no_run
/// use mtls_status::Config;
/// use std::path::PathBuf;
///
/// let config = Config {
///     config_path: PathBuf::from("sites.yml"),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Site list to read endpoints from
    pub config_path: PathBuf,

    /// Directory holding history files and summary.json
    pub history_dir: PathBuf,

    /// Log level
    pub log_level: LogLevel,

    /// Log format
    pub log_format: LogFormat,

    /// Per-request timeout in seconds
    pub timeout_seconds: u64,

    /// Server certificate policy
    pub server_verification: ServerVerification,

    /// Error substrings that still count as "up"
    pub markers: MarkerPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            history_dir: PathBuf::from(DEFAULT_HISTORY_DIR),
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            server_verification: ServerVerification::default(),
            markers: MarkerPolicy::default(),
        }
    }
}

impl Config {
    /// Per-request timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl CommonOpts {
    /// Marker policy described by `--benign-marker` and `--no-default-markers`.
    pub fn marker_policy(&self) -> MarkerPolicy {
        let mut policy = if self.no_default_markers {
            MarkerPolicy::empty()
        } else {
            MarkerPolicy::default()
        };
        for (i, pattern) in self.benign_markers.iter().enumerate() {
            policy.push(format!("custom-{}", i + 1), pattern.clone());
        }
        policy
    }

    /// Server certificate policy described by `--verify-server-cert`.
    pub fn server_verification(&self) -> ServerVerification {
        if self.verify_server_cert {
            ServerVerification::Enabled
        } else {
            ServerVerification::Disabled
        }
    }

    /// Builds a library `Config` from the shared flags.
    pub fn to_config(&self) -> Config {
        Config {
            log_level: self.log_level.clone(),
            log_format: self.log_format.clone(),
            timeout_seconds: self.timeout_seconds,
            server_verification: self.server_verification(),
            markers: self.marker_policy(),
            ..Default::default()
        }
    }
}
