//! Error type definitions.
//!
//! One enum per failure class: configuration (fatal for the run), credential
//! extraction (fatal for one endpoint), request (classified by the benign
//! marker table) and persistence (logged, never aborts the batch).

use std::path::PathBuf;

use log::SetLoggerError;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),
}

/// Missing or invalid configuration.
///
/// Raised before the endpoint loop it aborts the whole run; raised while
/// resolving credentials for one endpoint it marks only that endpoint down.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    /// A credential variable is unset after applying fallbacks.
    #[error("{variable} is not set")]
    MissingCredential {
        /// Name of the environment variable that was looked up last
        variable: String,
    },

    /// Neither the generic nor any tagged credential pair is configured.
    #[error("no mTLS credentials configured (set MTLS_CERTIFICATE and MTLS_CERTIFICATE_PASSWORD)")]
    NoCredentials,

    /// The site list could not be read.
    #[error("failed to read site list {path}: {source}")]
    SiteListRead {
        /// Site list path
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The site list is not valid YAML.
    #[error("invalid site list: {0}")]
    SiteList(String),

    /// An endpoint descriptor is unusable.
    #[error("invalid endpoint '{name}': {reason}")]
    InvalidEndpoint {
        /// Endpoint name as configured
        name: String,
        /// What is wrong with it
        reason: String,
    },
}

/// Failure to turn a base64 PKCS#12 bundle into credential material.
#[derive(Error, Debug)]
pub enum CredentialError {
    /// The certificate text is not valid base64.
    #[error("certificate is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The decoded bytes are not a PKCS#12 structure.
    #[error("malformed PKCS#12 bundle: {0}")]
    Pkcs12(String),

    /// The password does not open the bundle.
    #[error("wrong password for PKCS#12 bundle")]
    WrongPassword,

    /// The bundle uses a MAC or encryption scheme the loader cannot open.
    #[error("unsupported PKCS#12 algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The bundle holds no certificate bag.
    #[error("Certificate not found in P12 file")]
    MissingCertificate,

    /// The bundle holds no private key bag.
    #[error("Private key not found in P12 file")]
    MissingPrivateKey,
}

/// Failure of a secure request.
#[derive(Error, Debug)]
pub enum RequestError {
    /// Credential material could not be loaded.
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// Credentials for the endpoint are not configured.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The TLS client configuration could not be built (e.g. key and certificate mismatch).
    #[error("TLS configuration error: {0}")]
    Tls(String),

    /// No HTTP response was received: DNS, connect, handshake, timeout or body read failure.
    #[error("{message}")]
    Transport {
        /// Error text including every source in the chain
        message: String,
        /// Whether the request hit the configured timeout
        timeout: bool,
    },

    /// The server answered with a non-2xx status.
    #[error("Request failed with status code {code}: {body}")]
    Status {
        /// HTTP status code
        code: u16,
        /// Raw response body
        body: String,
    },
}

impl RequestError {
    /// HTTP status code carried by the error, if a response was received.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            RequestError::Status { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Whether the error came from the remote side (transport or HTTP status).
    ///
    /// Only these errors are eligible for benign marker classification; local
    /// credential and configuration problems always mean "down".
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            RequestError::Transport { .. } | RequestError::Status { .. }
        )
    }

    /// Builds a transport error from a `reqwest::Error`, flattening its source chain.
    pub fn transport(error: &reqwest::Error) -> Self {
        RequestError::Transport {
            message: error_chain(error),
            timeout: error.is_timeout(),
        }
    }
}

/// Failure to read or write persisted state.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// File system error.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// A history record could not be parsed or serialized.
    #[error("invalid history record {path}: {source}")]
    Yaml {
        /// History file
        path: PathBuf,
        /// Underlying YAML error
        source: serde_yaml::Error,
    },

    /// The summary document could not be parsed or serialized.
    #[error("invalid summary document {path}: {source}")]
    Json {
        /// Summary file
        path: PathBuf,
        /// Underlying JSON error
        source: serde_json::Error,
    },

    /// The endpoint URL has no host to derive an icon from.
    #[error("cannot derive icon for {url}")]
    Icon {
        /// Endpoint URL
        url: String,
    },
}

/// Joins an error and all of its sources into one line.
///
/// `reqwest` keeps the interesting part (DNS failure, handshake alert, ...) in
/// the source chain, and benign markers have to see it.
pub fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
