//! Client credential loading.
//!
//! Decodes a base64 PKCS#12 bundle with its password and extracts the private
//! key, the leaf certificate and any CA certificates shipped alongside it.
//! The material stays in memory as DER: `rustls` takes it directly, so nothing
//! is ever staged on disk.
//!
//! Credential *selection* (which bundle applies to which endpoint) lives in
//! [`store`].

pub mod store;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::{debug, warn};
use p12_keystore::{KeyStore, KeyStoreEntry};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};

use crate::error_handling::CredentialError;

pub use store::{
    CredentialPair, CredentialStore, ResolvedCredentials, SelectionRule, TokenOverride,
};

/// Key and certificates extracted from a PKCS#12 bundle.
///
/// A bundle always holds a key and a leaf certificate; loading fails
/// otherwise. It is built per check and dropped once the request completes.
pub struct CredentialBundle {
    private_key: Vec<u8>,
    certificate: Vec<u8>,
    ca_certificates: Vec<Vec<u8>>,
}

impl std::fmt::Debug for CredentialBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialBundle")
            .field("private_key", &"<redacted>")
            .field("certificate_len", &self.certificate.len())
            .field("ca_certificates", &self.ca_certificates.len())
            .finish()
    }
}

impl CredentialBundle {
    /// PKCS#8 DER encoding of the private key.
    pub fn private_key_der(&self) -> &[u8] {
        &self.private_key
    }

    /// DER encoding of the leaf certificate.
    pub fn certificate_der(&self) -> &[u8] {
        &self.certificate
    }

    /// DER encodings of the bundled CA certificates, in bundle order.
    pub fn ca_certificates_der(&self) -> &[Vec<u8>] {
        &self.ca_certificates
    }

    /// Private key in the form `rustls` expects.
    pub fn private_key(&self) -> PrivateKeyDer<'static> {
        PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(self.private_key.clone()))
    }

    /// Certificate chain to present: the leaf first, then the bundled CAs.
    pub fn certificate_chain(&self) -> Vec<CertificateDer<'static>> {
        std::iter::once(&self.certificate)
            .chain(self.ca_certificates.iter())
            .map(|der| CertificateDer::from(der.clone()))
            .collect()
    }

    /// Bundled CA certificates, used as extra trust anchors.
    pub fn ca_certificates(&self) -> Vec<CertificateDer<'static>> {
        self.ca_certificates
            .iter()
            .map(|der| CertificateDer::from(der.clone()))
            .collect()
    }
}

/// Loads a credential bundle from a base64 PKCS#12 blob and its password.
///
/// Both legacy bundles (3DES, SHA-1 MAC) and current OpenSSL exports (PBES2 with
/// AES-256, SHA-256 MAC) are accepted. The leaf certificate is the one paired
/// with the private key through `localKeyId`; its issuers found in the bundle
/// and any standalone trusted certificates are returned as CA certificates.
///
/// # Errors
///
/// - `CredentialError::Base64` if the text is not base64
/// - `CredentialError::Pkcs12` if the bytes are not a PKCS#12 structure
/// - `CredentialError::WrongPassword` if the password does not open the bundle
/// - `CredentialError::UnsupportedAlgorithm` for MAC or encryption schemes the loader lacks
/// - `CredentialError::MissingCertificate` / `MissingPrivateKey` if the key pair is incomplete
pub fn load(certificate_base64: &str, password: &str) -> Result<CredentialBundle, CredentialError> {
    let compact: String = certificate_base64
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let der = STANDARD.decode(compact.as_bytes())?;

    let keystore = KeyStore::from_pkcs12(&der, password).map_err(pkcs12_error)?;

    // Keys without a matching certificate are dropped while parsing, so an
    // empty store means no usable certificate.
    let Some((alias, key_chain)) = keystore.private_key_chain() else {
        return Err(if keystore.entries_count() == 0 {
            CredentialError::MissingCertificate
        } else {
            CredentialError::MissingPrivateKey
        });
    };
    let (leaf, issuers) = key_chain
        .chain()
        .split_first()
        .ok_or(CredentialError::MissingCertificate)?;

    let mut ca_certificates: Vec<Vec<u8>> =
        issuers.iter().map(|cert| cert.as_der().to_vec()).collect();
    for (_, entry) in keystore.entries() {
        if let KeyStoreEntry::Certificate(cert) = entry {
            let der = cert.as_der().to_vec();
            if !ca_certificates.contains(&der) {
                ca_certificates.push(der);
            }
        }
    }

    let certificate = leaf.as_der().to_vec();
    log_leaf_certificate(&certificate);
    debug!(
        "Loaded client credentials '{alias}': 1 leaf certificate, {} CA certificate(s)",
        ca_certificates.len()
    );

    Ok(CredentialBundle {
        private_key: key_chain.key().to_vec(),
        certificate,
        ca_certificates,
    })
}

fn pkcs12_error(error: p12_keystore::error::Error) -> CredentialError {
    use p12_keystore::error::Error;

    match error {
        Error::MacError(_) | Error::UnpadError => CredentialError::WrongPassword,
        Error::UnsupportedEncryptionScheme | Error::UnsupportedMacAlgorithm => {
            CredentialError::UnsupportedAlgorithm(error.to_string())
        }
        other => CredentialError::Pkcs12(other.to_string()),
    }
}

/// Logs the leaf subject and warns when the certificate has expired.
///
/// An unparseable leaf is not an error here; the TLS handshake will report it.
fn log_leaf_certificate(der: &[u8]) {
    match x509_parser::parse_x509_certificate(der) {
        Ok((_, cert)) => {
            let subject = cert.subject().to_string();
            let not_after = cert.validity().not_after;
            if cert.validity().is_valid() {
                debug!("Client certificate {subject} valid until {not_after}");
            } else {
                warn!("Client certificate {subject} is outside its validity period (not after {not_after})");
            }
        }
        Err(e) => warn!("Could not parse client certificate: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_base64() {
        let err = load("not base64 at all!", "secret").unwrap_err();
        assert!(matches!(err, CredentialError::Base64(_)));
    }

    #[test]
    fn test_not_pkcs12() {
        let blob = STANDARD.encode(b"definitely not DER");
        let err = load(&blob, "secret").unwrap_err();
        assert!(matches!(err, CredentialError::Pkcs12(_)));
    }

    #[test]
    fn test_mac_failure_means_wrong_password() {
        let err = pkcs12_error(p12_keystore::error::Error::MacError(Default::default()));
        assert!(matches!(err, CredentialError::WrongPassword));

        let err = pkcs12_error(p12_keystore::error::Error::UnsupportedMacAlgorithm);
        assert!(matches!(err, CredentialError::UnsupportedAlgorithm(_)));
    }

    #[test]
    fn test_debug_redacts_key() {
        let bundle = CredentialBundle {
            private_key: vec![1, 2, 3],
            certificate: vec![4, 5],
            ca_certificates: vec![vec![6]],
        };
        let text = format!("{bundle:?}");
        assert!(text.contains("<redacted>"));
        assert!(!text.contains("[1, 2, 3]"));
        assert_eq!(bundle.certificate_chain().len(), 2);
        assert_eq!(bundle.ca_certificates().len(), 1);
    }
}
