// Shared test helpers: throwaway PKI, PKCS#12 packing and a local mTLS server.
//
// Each test file that needs them declares `mod helpers;`.

#![allow(dead_code)] // Not every test file uses every helper

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use p12_keystore::{
    Certificate, EncryptionAlgorithm, KeyStore, KeyStoreEntry, MacAlgorithm, PrivateKeyChain,
};
use rcgen::{
    BasicConstraints, CertificateParams, CertifiedKey, DnType, ExtendedKeyUsagePurpose, IsCa,
    KeyPair,
};
use rustls::crypto::ring::default_provider;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use rustls::server::WebPkiClientVerifier;
use rustls::{RootCertStore, ServerConfig};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_rustls::TlsAcceptor;

pub const PASSWORD: &str = "correct horse battery staple";

/// A client CA and a client certificate it issued.
pub struct TestPki {
    pub ca_der: Vec<u8>,
    pub client_der: Vec<u8>,
    pub client_key_der: Vec<u8>,
}

impl TestPki {
    pub fn generate() -> Self {
        let ca_key = KeyPair::generate().expect("Failed to generate CA key");
        let mut ca_params =
            CertificateParams::new(Vec::<String>::new()).expect("Failed to build CA params");
        ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        ca_params
            .distinguished_name
            .push(DnType::CommonName, "mtls_status test CA");
        let ca_cert = ca_params
            .self_signed(&ca_key)
            .expect("Failed to self-sign CA");

        let client_key = KeyPair::generate().expect("Failed to generate client key");
        let mut client_params = CertificateParams::new(vec!["client.test".to_string()])
            .expect("Failed to build client params");
        client_params
            .distinguished_name
            .push(DnType::CommonName, "mtls_status test client");
        client_params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ClientAuth];
        let client_cert = client_params
            .signed_by(&client_key, &ca_cert, &ca_key)
            .expect("Failed to sign client certificate");

        Self {
            ca_der: ca_cert.der().to_vec(),
            client_der: client_cert.der().to_vec(),
            client_key_der: client_key.serialize_der(),
        }
    }

    /// Client key, client certificate and CA packed as base64 PKCS#12 with
    /// PBES2/AES-256 encryption and a SHA-256 MAC.
    pub fn bundle_base64(&self, password: &str) -> String {
        self.pack(
            password,
            EncryptionAlgorithm::PbeWithHmacSha256AndAes256,
            MacAlgorithm::HmacSha256,
        )
    }

    /// Same content packed the legacy way: 3DES encryption and a SHA-1 MAC.
    pub fn legacy_bundle_base64(&self, password: &str) -> String {
        self.pack(
            password,
            EncryptionAlgorithm::PbeWithShaAnd3KeyTripleDesCbc,
            MacAlgorithm::HmacSha1,
        )
    }

    fn pack(&self, password: &str, encryption: EncryptionAlgorithm, mac: MacAlgorithm) -> String {
        let chain = [&self.client_der, &self.ca_der]
            .into_iter()
            .map(|der| Certificate::from_der(der).expect("Failed to parse test certificate"));
        let key_chain = PrivateKeyChain::new(self.client_key_der.clone(), *b"mtls-test-key-id", chain);

        let mut keystore = KeyStore::new();
        keystore.add_entry(
            "mtls_status test client",
            KeyStoreEntry::PrivateKeyChain(key_chain),
        );
        let der = keystore
            .writer(password)
            .encryption_algorithm(encryption)
            .mac_algorithm(mac)
            .write()
            .expect("Failed to build PKCS#12 bundle");
        STANDARD.encode(der)
    }
}

/// Canned response returned for every request.
#[derive(Clone)]
pub struct CannedResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
    pub location: Option<String>,
    /// Accept the request and never answer
    pub stall: bool,
}

impl CannedResponse {
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.to_string(),
            location: None,
            stall: false,
        }
    }

    pub fn xml(status: u16, body: &str) -> Self {
        Self {
            content_type: "text/xml",
            ..Self::json(status, body)
        }
    }

    pub fn redirect(location: &str) -> Self {
        Self {
            location: Some(location.to_string()),
            ..Self::json(302, "")
        }
    }

    pub fn stalled() -> Self {
        Self {
            stall: true,
            ..Self::json(200, "")
        }
    }
}

/// Local HTTPS server that requires a client certificate issued by a given CA.
pub struct TestServer {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start(client_ca_der: &[u8], response: CannedResponse) -> Self {
        let provider = Arc::new(default_provider());

        let mut client_roots = RootCertStore::empty();
        client_roots
            .add(CertificateDer::from(client_ca_der.to_vec()))
            .expect("Failed to add client CA");
        let client_verifier =
            WebPkiClientVerifier::builder_with_provider(Arc::new(client_roots), provider.clone())
                .build()
                .expect("Failed to build client verifier");

        let CertifiedKey { cert, key_pair } =
            rcgen::generate_simple_self_signed(vec!["localhost".to_string()])
                .expect("Failed to generate server certificate");
        let server_key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key_pair.serialize_der()));

        let config = ServerConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .expect("Failed to select protocol versions")
            .with_client_cert_verifier(client_verifier)
            .with_single_cert(vec![cert.der().clone()], server_key)
            .expect("Failed to build server config");
        let acceptor = TlsAcceptor::from(Arc::new(config));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test server");
        let addr = listener.local_addr().expect("Failed to read local address");
        let requests = Arc::new(Mutex::new(Vec::new()));

        let seen = Arc::clone(&requests);
        let handle = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                let acceptor = acceptor.clone();
                let response = response.clone();
                let seen = Arc::clone(&seen);
                tokio::spawn(async move {
                    // Handshake failures (e.g. untrusted client certificate) just drop the connection
                    let Ok(mut tls) = acceptor.accept(stream).await else {
                        return;
                    };
                    let mut request = Vec::new();
                    let mut buf = [0u8; 4096];
                    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                        match tls.read(&mut buf).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => request.extend_from_slice(&buf[..n]),
                        }
                    }
                    seen.lock()
                        .expect("request log poisoned")
                        .push(String::from_utf8_lossy(&request).into_owned());

                    if response.stall {
                        std::future::pending::<()>().await;
                    }

                    let location = response
                        .location
                        .as_ref()
                        .map(|target| format!("Location: {target}\r\n"))
                        .unwrap_or_default();
                    let reply = format!(
                        "HTTP/1.1 {} {}\r\n{}Content-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        response.status,
                        reason(response.status),
                        location,
                        response.content_type,
                        response.body.len(),
                        response.body
                    );
                    let _ = tls.write_all(reply.as_bytes()).await;
                    let _ = tls.shutdown().await;
                });
            }
        });

        Self {
            addr,
            requests,
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("https://{}{}", self.addr, path)
    }

    /// Raw request heads received so far.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("request log poisoned").clone()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        204 => "No Content",
        302 => "Found",
        404 => "Not Found",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        _ => "Unknown",
    }
}
