//! Error handling.
//!
//! Error types are split by how far they propagate:
//! - **Configuration**: aborts the run when raised before any endpoint is checked
//! - **Credential / Request**: end one endpoint's check, which is recorded down
//!   unless a benign marker matches the error text
//! - **Persistence**: logged; the endpoint's stored state may stay stale

mod types;

// Re-export public API
pub use types::{
    error_chain, ConfigurationError, CredentialError, InitializationError, PersistenceError,
    RequestError,
};
