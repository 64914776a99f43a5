//! TLS client configuration for mutual authentication.
//!
//! Builds a `rustls` client config that:
//! - negotiates TLS 1.2 or TLS 1.3 only
//! - presents the client certificate chain and key from a [`CredentialBundle`]
//! - trusts the public web PKI plus the bundle's CA certificates, or, under
//!   [`ServerVerification::Disabled`], accepts any server certificate
//!
//! Uses the `ring` crypto provider explicitly instead of relying on a
//! process-wide default.

mod verifier;

use std::sync::Arc;

use log::warn;
use rustls::crypto::ring::default_provider;
use rustls::crypto::CryptoProvider;
use rustls::{ClientConfig, RootCertStore, SupportedProtocolVersion};

use crate::credentials::CredentialBundle;
use crate::error_handling::RequestError;

use verifier::AcceptAnyServerCert;

/// Protocol versions offered by the client, newest first.
pub static PROTOCOL_VERSIONS: &[&SupportedProtocolVersion] =
    &[&rustls::version::TLS13, &rustls::version::TLS12];

/// How the server certificate is checked.
///
/// The checker exists to tell whether an endpoint answers, and many of the
/// monitored services sit behind private CAs that are not shipped in the
/// client bundle. Verification is therefore off unless requested with
/// `--verify-server-cert`. With verification off the handshake still
/// authenticates the client and checks the server's handshake signature, but
/// anyone able to intercept the connection can impersonate the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServerVerification {
    /// Verify against `webpki-roots` and the bundle's CA certificates
    Enabled,
    /// Accept any server certificate
    #[default]
    Disabled,
}

impl ServerVerification {
    /// Logs a warning when verification is disabled. Called once per run.
    pub fn warn_if_disabled(self) {
        if self == ServerVerification::Disabled {
            warn!("Server certificate verification is disabled; pass --verify-server-cert to enable it");
        }
    }
}

/// Builds the client configuration for one request.
///
/// # Errors
///
/// Returns `RequestError::Tls` if the protocol versions are unsupported by the
/// provider, a CA certificate cannot be added as a trust anchor, or the key
/// does not match the certificate.
pub fn build_client_config(
    bundle: &CredentialBundle,
    verification: ServerVerification,
) -> Result<ClientConfig, RequestError> {
    let provider: Arc<CryptoProvider> = Arc::new(default_provider());

    let builder = ClientConfig::builder_with_provider(Arc::clone(&provider))
        .with_protocol_versions(PROTOCOL_VERSIONS)
        .map_err(|e| RequestError::Tls(e.to_string()))?;

    let builder = match verification {
        ServerVerification::Enabled => {
            builder.with_root_certificates(root_store(bundle)?)
        }
        ServerVerification::Disabled => builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert::new(provider))),
    };

    let mut config = builder
        .with_client_auth_cert(bundle.certificate_chain(), bundle.private_key())
        .map_err(|e| RequestError::Tls(format!("client certificate rejected: {e}")))?;
    config.alpn_protocols = vec![b"http/1.1".to_vec()];

    Ok(config)
}

/// Public web PKI roots plus the bundle's CA certificates.
fn root_store(bundle: &CredentialBundle) -> Result<RootCertStore, RequestError> {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    for ca in bundle.ca_certificates() {
        roots
            .add(ca)
            .map_err(|e| RequestError::Tls(format!("invalid CA certificate in bundle: {e}")))?;
    }
    Ok(roots)
}
