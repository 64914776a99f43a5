//! Site list loading.
//!
//! Reads the Upptime `.upptimerc.yml` file and returns the endpoints flagged
//! `mtls: true`. Every other key of the file belongs to Upptime and is ignored.

use std::path::Path;

use serde::Deserialize;

use crate::error_handling::ConfigurationError;
use crate::models::Endpoint;

#[derive(Debug, Deserialize)]
struct SiteList {
    #[serde(default)]
    sites: Vec<Endpoint>,
}

/// Parses a site list document and returns its mTLS endpoints in file order.
///
/// # Errors
///
/// Returns `ConfigurationError::SiteList` if the YAML is invalid and
/// `ConfigurationError::InvalidEndpoint` if an mTLS endpoint has an empty name
/// or a URL that is not `https`.
pub fn parse_site_list(content: &str) -> Result<Vec<Endpoint>, ConfigurationError> {
    let list: SiteList = serde_yaml::from_str(content)
        .map_err(|e| ConfigurationError::SiteList(e.to_string()))?;

    let endpoints: Vec<Endpoint> = list.sites.into_iter().filter(|s| s.mtls).collect();
    for endpoint in &endpoints {
        endpoint.validate()?;
    }
    Ok(endpoints)
}

/// Reads a site list file and returns its mTLS endpoints.
///
/// # Errors
///
/// Returns `ConfigurationError::SiteListRead` if the file cannot be read, plus
/// the errors of [`parse_site_list`].
pub fn load_site_list(path: &Path) -> Result<Vec<Endpoint>, ConfigurationError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| ConfigurationError::SiteListRead {
            path: path.to_path_buf(),
            source: e,
        })?;
    parse_site_list(&content)
}
