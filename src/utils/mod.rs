//! Naming helpers for persisted state.
//!
//! - Slug derivation for history file names
//! - Icon URL derivation for summary entries

use url::Url;

use crate::config::ICON_SERVICE_PREFIX;

/// Derives the slug of an endpoint name.
///
/// Lowercases the name and replaces every character outside `[a-z0-9]` with
/// a hyphen, one hyphen per character. Distinct names can share a slug
/// (`"A B"` and `"A-B"`); the site list is expected to avoid that.
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Icon URL for an endpoint, derived from its hostname.
///
/// Returns `None` if the URL does not parse or has no host.
pub fn icon_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(format!("{ICON_SERVICE_PREFIX}{host}.ico"))
}
