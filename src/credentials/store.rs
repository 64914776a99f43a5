//! Credential selection.
//!
//! A [`CredentialStore`] holds a generic credential pair plus named (tagged)
//! pairs, and decides which pair applies to an endpoint. Selection is a pure
//! function of the endpoint and the store; nothing is read from or written to
//! the process environment after [`CredentialStore::from_env`].

use std::collections::BTreeMap;

use log::debug;

use crate::config::{
    BANKPAY_NAME_MARKER, CCE_CREDENTIAL_TAG, CCE_NAME_MARKER, ENV_BANKPAY_AUTH_TOKEN,
    ENV_CCE_CERTIFICATE, ENV_CCE_CERTIFICATE_PASSWORD, ENV_CERTIFICATE, ENV_CERTIFICATE_PASSWORD,
    ENV_PROD_CERTIFICATE, ENV_PROD_CERTIFICATE_PASSWORD, PROD_CREDENTIAL_TAG,
};
use crate::error_handling::ConfigurationError;
use crate::models::Endpoint;

/// Base64 PKCS#12 bundle and password, either of which may be unset.
///
/// Fields fall back independently: a tagged pair with only a password set
/// still takes its certificate from the generic pair.
#[derive(Clone, Default)]
pub struct CredentialPair {
    /// Base64 PKCS#12 bundle
    pub certificate: Option<String>,
    /// Bundle password
    pub password: Option<String>,
    certificate_source: String,
    password_source: String,
}

impl std::fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialPair")
            .field("certificate", &self.certificate.as_ref().map(|_| "<set>"))
            .field("password", &self.password.as_ref().map(|_| "<set>"))
            .finish()
    }
}

impl CredentialPair {
    /// A pair with both fields set.
    pub fn new(certificate: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            certificate: Some(certificate.into()),
            password: Some(password.into()),
            certificate_source: "certificate".to_string(),
            password_source: "password".to_string(),
        }
    }

    /// Reads a pair from two environment variables; empty values count as unset.
    pub fn from_env(certificate_var: &str, password_var: &str) -> Self {
        Self {
            certificate: non_empty_env(certificate_var),
            password: non_empty_env(password_var),
            certificate_source: certificate_var.to_string(),
            password_source: password_var.to_string(),
        }
    }

    /// Whether neither field is set.
    pub fn is_empty(&self) -> bool {
        self.certificate.is_none() && self.password.is_none()
    }
}

/// Resolved certificate and password for one check.
#[derive(Clone)]
pub struct ResolvedCredentials {
    /// Base64 PKCS#12 bundle
    pub certificate: String,
    /// Bundle password
    pub password: String,
    /// Tag the credentials were selected for
    pub tag: String,
}

impl std::fmt::Debug for ResolvedCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedCredentials")
            .field("tag", &self.tag)
            .finish_non_exhaustive()
    }
}

/// Maps an endpoint-name substring to a credential tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionRule {
    /// Substring searched for in the endpoint name (case-sensitive)
    pub name_contains: String,
    /// Tag of the credential pair to use
    pub tag: String,
}

/// Replaces the credential token of an `Authorization` header.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenOverride {
    /// Substring searched for in the endpoint name (case-sensitive)
    pub name_contains: String,
    /// Replacement token
    pub token: String,
}

impl std::fmt::Debug for TokenOverride {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenOverride")
            .field("name_contains", &self.name_contains)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Credential pairs and the policy choosing between them.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    fallback: CredentialPair,
    tagged: BTreeMap<String, CredentialPair>,
    rules: Vec<SelectionRule>,
    default_tag: String,
    token_overrides: Vec<TokenOverride>,
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self {
            fallback: CredentialPair::default(),
            tagged: BTreeMap::new(),
            rules: vec![SelectionRule {
                name_contains: CCE_NAME_MARKER.to_string(),
                tag: CCE_CREDENTIAL_TAG.to_string(),
            }],
            default_tag: PROD_CREDENTIAL_TAG.to_string(),
            token_overrides: Vec::new(),
        }
    }
}

impl CredentialStore {
    /// Creates a store with only a generic pair and the default rules.
    pub fn new(fallback: CredentialPair) -> Self {
        Self {
            fallback,
            ..Default::default()
        }
    }

    /// Builds the store from the process environment.
    ///
    /// Reads the generic `MTLS_*` pair, the `PROD_MTLS_*` and `CCE_MTLS_*`
    /// tagged pairs and the `BANKPAY_AUTH_TOKEN` override.
    pub fn from_env() -> Self {
        let mut store = Self::new(CredentialPair::from_env(
            ENV_CERTIFICATE,
            ENV_CERTIFICATE_PASSWORD,
        ));
        store.insert(
            PROD_CREDENTIAL_TAG,
            CredentialPair::from_env(ENV_PROD_CERTIFICATE, ENV_PROD_CERTIFICATE_PASSWORD),
        );
        store.insert(
            CCE_CREDENTIAL_TAG,
            CredentialPair::from_env(ENV_CCE_CERTIFICATE, ENV_CCE_CERTIFICATE_PASSWORD),
        );
        if let Some(token) = non_empty_env(ENV_BANKPAY_AUTH_TOKEN) {
            store.add_token_override(TokenOverride {
                name_contains: BANKPAY_NAME_MARKER.to_string(),
                token,
            });
        }
        store
    }

    /// Registers a tagged pair, replacing any pair with the same tag.
    pub fn insert(&mut self, tag: impl Into<String>, pair: CredentialPair) {
        self.tagged.insert(tag.into(), pair);
    }

    /// Appends a name rule; earlier rules win.
    pub fn add_rule(&mut self, rule: SelectionRule) {
        self.rules.push(rule);
    }

    /// Appends an Authorization token override; earlier overrides win.
    pub fn add_token_override(&mut self, token_override: TokenOverride) {
        self.token_overrides.push(token_override);
    }

    /// Whether any certificate is configured at all.
    ///
    /// Checked once before the endpoint loop so a run without credentials
    /// aborts before touching any endpoint.
    pub fn ensure_configured(&self) -> Result<(), ConfigurationError> {
        let any_certificate = self.fallback.certificate.is_some()
            || self.tagged.values().any(|pair| pair.certificate.is_some());
        if any_certificate {
            Ok(())
        } else {
            Err(ConfigurationError::NoCredentials)
        }
    }

    /// Credential tag applying to an endpoint.
    ///
    /// The endpoint's explicit `credentials` tag wins, then the first matching
    /// name rule, then the default tag.
    pub fn tag_for<'a>(&'a self, endpoint: &'a Endpoint) -> &'a str {
        if let Some(tag) = endpoint.credentials.as_deref() {
            return tag;
        }
        self.rules
            .iter()
            .find(|rule| endpoint.name.contains(&rule.name_contains))
            .map(|rule| rule.tag.as_str())
            .unwrap_or(&self.default_tag)
    }

    /// Resolves the credentials for an endpoint.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::MissingCredential` naming the variable that
    /// was looked up last when the certificate or password is still unset
    /// after falling back to the generic pair.
    pub fn resolve(&self, endpoint: &Endpoint) -> Result<ResolvedCredentials, ConfigurationError> {
        let tag = self.tag_for(endpoint);
        self.resolve_tag(tag)
    }

    /// Resolves the credentials registered under a tag, with generic fallback.
    pub fn resolve_tag(&self, tag: &str) -> Result<ResolvedCredentials, ConfigurationError> {
        let tagged = self.tagged.get(tag);
        debug!("Using credential set '{tag}'");

        let certificate = tagged
            .and_then(|pair| pair.certificate.clone())
            .or_else(|| self.fallback.certificate.clone())
            .ok_or_else(|| ConfigurationError::MissingCredential {
                variable: self.fallback.certificate_source.clone(),
            })?;
        let password = tagged
            .and_then(|pair| pair.password.clone())
            .or_else(|| self.fallback.password.clone())
            .ok_or_else(|| ConfigurationError::MissingCredential {
                variable: self.fallback.password_source.clone(),
            })?;

        Ok(ResolvedCredentials {
            certificate,
            password,
            tag: tag.to_string(),
        })
    }

    /// Returns the endpoint's header lines with any token override applied.
    ///
    /// An override applies to `Authorization: <scheme> <token>` lines of
    /// endpoints whose name contains the override's marker; the scheme is kept.
    pub fn headers_for(&self, endpoint: &Endpoint) -> Vec<String> {
        let token_override = self
            .token_overrides
            .iter()
            .find(|o| endpoint.name.contains(&o.name_contains));

        endpoint
            .headers
            .iter()
            .map(|line| match token_override {
                Some(o) => override_authorization(line, &o.token).unwrap_or_else(|| line.clone()),
                None => line.clone(),
            })
            .collect()
    }
}

/// Rewrites `Authorization: <scheme> <token>` with a new token.
///
/// Returns `None` for other headers.
fn override_authorization(line: &str, token: &str) -> Option<String> {
    let (name, value) = line.split_once(':')?;
    if !name.trim().eq_ignore_ascii_case("authorization") {
        return None;
    }
    let scheme = value.split_whitespace().next().unwrap_or("Basic");
    Some(format!("{}: {} {}", name.trim(), scheme, token))
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> CredentialStore {
        let mut store = CredentialStore::new(CredentialPair::new("generic-cert", "generic-pass"));
        store.insert("prod", CredentialPair::new("prod-cert", "prod-pass"));
        store.insert(
            "cce",
            CredentialPair {
                certificate: Some("cce-cert".to_string()),
                ..Default::default()
            },
        );
        store
    }

    #[test]
    fn test_cce_endpoint_uses_cce_pair_with_password_fallback() {
        let endpoint = Endpoint::new("CCE Payment API", "https://cce.example/health");
        let resolved = store().resolve(&endpoint).unwrap();
        assert_eq!(resolved.tag, "cce");
        assert_eq!(resolved.certificate, "cce-cert");
        assert_eq!(resolved.password, "generic-pass");
    }

    #[test]
    fn test_other_endpoints_use_prod_pair() {
        let endpoint = Endpoint::new("Payment API", "https://api.example/health");
        let resolved = store().resolve(&endpoint).unwrap();
        assert_eq!(resolved.tag, "prod");
        assert_eq!(resolved.certificate, "prod-cert");
        assert_eq!(resolved.password, "prod-pass");
    }

    #[test]
    fn test_explicit_tag_wins_over_name_rule() {
        let mut endpoint = Endpoint::new("CCE Payment API", "https://cce.example/health");
        endpoint.credentials = Some("prod".to_string());
        assert_eq!(store().tag_for(&endpoint), "prod");
    }

    #[test]
    fn test_unknown_tag_falls_back_to_generic_pair() {
        let mut endpoint = Endpoint::new("Partner", "https://partner.example");
        endpoint.credentials = Some("partner".to_string());
        let resolved = store().resolve(&endpoint).unwrap();
        assert_eq!(resolved.certificate, "generic-cert");
    }

    #[test]
    fn test_missing_credentials() {
        let store = CredentialStore::new(CredentialPair::from_env(
            "MTLS_STATUS_TEST_UNSET_CERT",
            "MTLS_STATUS_TEST_UNSET_PASS",
        ));
        assert!(matches!(
            store.ensure_configured(),
            Err(ConfigurationError::NoCredentials)
        ));
        let endpoint = Endpoint::new("Payment API", "https://api.example/health");
        match store.resolve(&endpoint) {
            Err(ConfigurationError::MissingCredential { variable }) => {
                assert_eq!(variable, "MTLS_STATUS_TEST_UNSET_CERT")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_missing_password_only() {
        let store = CredentialStore::new(CredentialPair {
            certificate: Some("cert".to_string()),
            password: None,
            certificate_source: "MTLS_CERTIFICATE".to_string(),
            password_source: "MTLS_CERTIFICATE_PASSWORD".to_string(),
        });
        assert!(store.ensure_configured().is_ok());
        let err = store
            .resolve(&Endpoint::new("Payment API", "https://api.example"))
            .unwrap_err();
        assert_eq!(err.to_string(), "MTLS_CERTIFICATE_PASSWORD is not set");
    }

    #[test]
    fn test_token_override() {
        let mut store = store();
        store.add_token_override(TokenOverride {
            name_contains: "Bankpay".to_string(),
            token: "fresh-token".to_string(),
        });

        let bankpay = Endpoint::new("Bankpay Gateway", "https://bankpay.example")
            .with_header("Authorization: Basic stale-token")
            .with_header("Accept: application/json");
        assert_eq!(
            store.headers_for(&bankpay),
            vec![
                "Authorization: Basic fresh-token".to_string(),
                "Accept: application/json".to_string()
            ]
        );

        let other = Endpoint::new("Payment API", "https://api.example")
            .with_header("Authorization: Bearer keep-me");
        assert_eq!(
            store.headers_for(&other),
            vec!["Authorization: Bearer keep-me".to_string()]
        );
    }

    #[test]
    fn test_debug_hides_secrets() {
        let text = format!("{:?}", store());
        assert!(!text.contains("prod-pass"));
        assert!(!text.contains("generic-cert"));
    }
}
