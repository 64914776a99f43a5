//! Logger initialization.
//!
//! Plain (colored, with emoji) or JSON-lines output through `env_logger`.

use std::io::Write;

use crate::config::LogFormat;
use crate::error_handling::InitializationError;
use colored::*;
use log::LevelFilter;

/// Initializes the logger with the specified level and format.
///
/// `RUST_LOG` is read first; `level` then overrides it for this crate and as
/// the global default. HTTP stack modules are capped at info and `rustls` at
/// error so a failing endpoint produces one line per check.
///
/// # Errors
///
/// Returns `InitializationError::LoggerError` if logger initialization fails.
///
/// # Examples
///
/// ```bash
/// # Use RUST_LOG for quick debugging (no CLI args needed)
/// RUST_LOG=debug mtls_status check-all
///
/// # Override with CLI args (takes precedence)
/// RUST_LOG=debug mtls_status check-all --log-level info
///
/// # Per-module filtering via RUST_LOG
/// RUST_LOG=mtls_status=debug,rustls=debug mtls_status check-url https://api.example.com/health
/// ```
pub fn init_logger_with(level: LevelFilter, format: LogFormat) -> Result<(), InitializationError> {
    colored::control::set_override(true);

    // Read from RUST_LOG environment variable first, then override with CLI arg
    let mut builder = env_logger::Builder::from_default_env();

    // Override with CLI-provided level (takes precedence over RUST_LOG)
    builder.filter_level(level);
    builder.filter_module("reqwest", LevelFilter::Info);
    builder.filter_module("hyper", LevelFilter::Info);
    builder.filter_module("hyper_util", LevelFilter::Info);
    // Handshake alerts are reported through RequestError; rustls repeats them at warn
    builder.filter_module("rustls", LevelFilter::Error);
    builder.filter_module("mtls_status", level);

    match format {
        LogFormat::Json => {
            builder.format(|buf, record| {
                let line = serde_json::json!({
                    "ts": chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
                    "level": record.level().as_str(),
                    "target": record.target(),
                    "msg": record.args().to_string(),
                });
                writeln!(buf, "{line}")
            });
        }
        LogFormat::Plain => {
            builder.format(|buf, record| {
                let level = record.level();
                let (emoji, colored_level) = match level {
                    log::Level::Error => ("❌", level.as_str().red()),
                    log::Level::Warn => ("⚠️", level.as_str().yellow()),
                    log::Level::Info => ("✔️", level.as_str().green()),
                    log::Level::Debug => ("🔍", level.as_str().blue()),
                    log::Level::Trace => ("🔬", level.as_str().purple()),
                };

                writeln!(
                    buf,
                    "{} {} {} [{}] {}",
                    chrono::Utc::now().format("%H:%M:%S").to_string().dimmed(),
                    emoji,
                    record.target().cyan(),
                    colored_level,
                    record.args()
                )
            });
        }
    }

    // try_init() so tests and embedding applications can call this more than once
    builder.try_init().map_err(InitializationError::from)?;

    Ok(())
}
