//! Secure request execution.
//!
//! Performs one mutually authenticated HTTPS request with the credentials of a
//! [`CredentialBundle`]. A fresh `reqwest` client is built per request around
//! the bundle's TLS configuration; there is no pooling across checks.

use std::time::Duration;

use log::debug;
use reqwest::redirect::Policy;
use reqwest::{Client, Method};

use crate::config::DEFAULT_TIMEOUT;
use crate::credentials::CredentialBundle;
use crate::error_handling::RequestError;
use crate::tls::{build_client_config, ServerVerification};

/// Payload of a successful response.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// The body parsed as JSON
    Json(serde_json::Value),
    /// The raw body when it is not JSON
    Text(String),
}

impl Body {
    /// Parses a response payload, keeping the raw text when it is not JSON.
    pub fn parse(text: String) -> Self {
        match serde_json::from_str(&text) {
            Ok(value) => Body::Json(value),
            Err(_) => Body::Text(text),
        }
    }

    /// The JSON value, if the body was JSON.
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Body::Json(value) => Some(value),
            Body::Text(_) => None,
        }
    }
}

/// A successful (2xx) response.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Status code as received
    pub status: u16,
    /// Parsed payload
    pub body: Body,
}

/// Request options.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// HTTP method (GET by default)
    pub method: Method,
    /// Headers in sending order
    pub headers: Vec<(String, String)>,
    /// Request body; only sent with POST, PUT and PATCH
    pub body: Option<String>,
    /// Overall request timeout
    pub timeout: Duration,
    /// Server certificate policy
    pub server_verification: ServerVerification,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: Vec::new(),
            body: None,
            timeout: DEFAULT_TIMEOUT,
            server_verification: ServerVerification::default(),
        }
    }
}

impl RequestOptions {
    /// Whether the body is sent with this method.
    fn sends_body(&self) -> bool {
        self.method == Method::POST || self.method == Method::PUT || self.method == Method::PATCH
    }
}

/// Performs a mutually authenticated HTTPS request.
///
/// Redirects are not followed: a 3xx is reported as a status error and the
/// client certificate is never presented to the `Location` host.
///
/// # Returns
///
/// The status code and body of a 2xx response; the body is JSON when it
/// parses, raw text otherwise.
///
/// # Errors
///
/// - `RequestError::Tls` if the client configuration cannot be built
/// - `RequestError::Transport` if no response was received (DNS, connect,
///   handshake, timeout) or the body could not be read
/// - `RequestError::Status` for non-2xx responses, carrying the code and raw body
pub async fn request(
    url: &str,
    credentials: &CredentialBundle,
    options: &RequestOptions,
) -> Result<Response, RequestError> {
    let tls = build_client_config(credentials, options.server_verification)?;
    let client = Client::builder()
        .use_preconfigured_tls(tls)
        .redirect(Policy::none())
        .timeout(options.timeout)
        .build()
        .map_err(|e| RequestError::transport(&e))?;

    let mut builder = client.request(options.method.clone(), url);
    for (name, value) in &options.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    if options.sends_body() {
        if let Some(body) = &options.body {
            builder = builder.body(body.clone());
        }
    }

    debug!("{} {}", options.method, url);
    let response = builder
        .send()
        .await
        .map_err(|e| RequestError::transport(&e))?;
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| RequestError::transport(&e))?;
    debug!("{} {} -> {} ({} bytes)", options.method, url, status, text.len());

    if status.is_success() {
        Ok(Response {
            status: status.as_u16(),
            body: Body::parse(text),
        })
    } else {
        Err(RequestError::Status {
            code: status.as_u16(),
            body: text,
        })
    }
}
