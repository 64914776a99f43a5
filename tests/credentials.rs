//! Tests for PKCS#12 credential loading.

mod helpers;

use helpers::{TestPki, PASSWORD};
use mtls_status::credentials;
use mtls_status::error_handling::CredentialError;

#[test]
fn test_valid_bundle_yields_key_leaf_and_ca() {
    let pki = TestPki::generate();
    let bundle = credentials::load(&pki.bundle_base64(PASSWORD), PASSWORD)
        .expect("bundle should load");

    assert!(!bundle.private_key_der().is_empty());
    assert_eq!(bundle.certificate_der(), pki.client_der.as_slice());
    assert_eq!(bundle.ca_certificates_der(), &[pki.ca_der.clone()]);
    assert_eq!(bundle.certificate_chain().len(), 2);
}

#[test]
fn test_base64_with_line_breaks_is_accepted() {
    let pki = TestPki::generate();
    let wrapped: String = pki
        .bundle_base64(PASSWORD)
        .as_bytes()
        .chunks(64)
        .map(|chunk| format!("{}\n", String::from_utf8_lossy(chunk)))
        .collect();

    assert!(credentials::load(&wrapped, PASSWORD).is_ok());
}

#[test]
fn test_wrong_password_is_rejected() {
    let pki = TestPki::generate();
    let err = credentials::load(&pki.bundle_base64(PASSWORD), "wrong password").unwrap_err();
    assert!(matches!(err, CredentialError::WrongPassword), "{err:?}");
}

#[test]
fn test_legacy_bundle_is_accepted() {
    let pki = TestPki::generate();
    let bundle = credentials::load(&pki.legacy_bundle_base64(PASSWORD), PASSWORD)
        .expect("legacy bundle should load");
    assert_eq!(bundle.certificate_der(), pki.client_der.as_slice());
    assert_eq!(bundle.ca_certificates_der(), &[pki.ca_der.clone()]);
}

// Exported by `openssl pkcs12 -export` (OpenSSL 3.5) with default settings:
// PBES2/AES-256-CBC bags and a SHA-256 MAC, password "secret".
const OPENSSL3_BUNDLE: &str = include_str!("fixtures/openssl3-default.p12.b64");
const OPENSSL3_CLIENT: &[u8] = include_bytes!("fixtures/openssl3-default-client.der");
const OPENSSL3_CA: &[u8] = include_bytes!("fixtures/openssl3-default-ca.der");

#[test]
fn test_openssl3_default_bundle_loads() {
    let bundle = credentials::load(OPENSSL3_BUNDLE, "secret").expect("bundle should load");

    assert!(!bundle.private_key_der().is_empty());
    assert_eq!(bundle.certificate_der(), OPENSSL3_CLIENT);
    assert_eq!(bundle.ca_certificates_der(), &[OPENSSL3_CA.to_vec()]);

    let config = mtls_status::tls::build_client_config(
        &bundle,
        mtls_status::tls::ServerVerification::Disabled,
    )
    .expect("client config should build");
    assert_eq!(config.alpn_protocols, vec![b"http/1.1".to_vec()]);
}

#[test]
fn test_openssl3_default_bundle_wrong_password() {
    let err = credentials::load(OPENSSL3_BUNDLE, "not secret").unwrap_err();
    assert!(matches!(err, CredentialError::WrongPassword), "{err:?}");
}

#[test]
fn test_bundle_builds_tls_config() {
    let pki = TestPki::generate();
    let bundle = credentials::load(&pki.bundle_base64(PASSWORD), PASSWORD).unwrap();

    for verification in [
        mtls_status::tls::ServerVerification::Disabled,
        mtls_status::tls::ServerVerification::Enabled,
    ] {
        let config = mtls_status::tls::build_client_config(&bundle, verification)
            .expect("client config should build");
        assert_eq!(config.alpn_protocols, vec![b"http/1.1".to_vec()]);
    }
}
