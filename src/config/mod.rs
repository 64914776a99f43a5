//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (timeouts, paths, environment variable names)
//! - CLI option types and the library `Config`
//! - Site list loading

mod constants;
mod sites;
mod types;

// Re-export all constants
pub use constants::*;
pub use sites::{load_site_list, parse_site_list};
pub use types::{Cli, Command, CommonOpts, Config, LogFormat, LogLevel};
