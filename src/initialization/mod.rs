//! Process-wide setup performed once by the binary.
//!
//! - Logger
//! - rustls crypto provider

mod logger;

use rustls::crypto::{ring::default_provider, CryptoProvider};

pub use logger::init_logger_with;

/// Installs the `ring` crypto provider as the process default.
///
/// Client configurations built by this crate name their provider explicitly;
/// the default only matters to code that calls `rustls` builders without one.
pub fn init_crypto_provider() {
    // Ignored: a provider installed earlier by the embedding application is kept
    let _ = CryptoProvider::install_default(default_provider());
}
