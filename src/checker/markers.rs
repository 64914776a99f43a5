//! Benign fault markers.
//!
//! Some services answer every request that does not match their expected shape
//! with an error: a SOAP endpoint hit with a plain GET returns a SOAP fault, an
//! API gateway returns "Route not found". Such an answer still proves the
//! service is reachable. The marker table lists substrings that, found in the
//! error text of a failed request, turn the verdict into "up".
//!
//! This is a heuristic: it matches substrings of a human-readable message and
//! can be fooled by a proxy echoing one of the markers.

use crate::config::DEFAULT_BENIGN_MARKERS;

/// One entry of the marker table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenignMarker {
    /// Short name used in logs
    pub label: String,
    /// Case-sensitive substring searched for in the error text
    pub pattern: String,
}

/// Ordered table of benign fault markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerPolicy {
    markers: Vec<BenignMarker>,
}

impl Default for MarkerPolicy {
    fn default() -> Self {
        let mut policy = Self::empty();
        for (label, pattern) in DEFAULT_BENIGN_MARKERS {
            policy.push(*label, *pattern);
        }
        policy
    }
}

impl MarkerPolicy {
    /// A table that matches nothing.
    pub fn empty() -> Self {
        Self {
            markers: Vec::new(),
        }
    }

    /// Appends a marker. Empty patterns are ignored, since they would match every error.
    pub fn push(&mut self, label: impl Into<String>, pattern: impl Into<String>) {
        let pattern = pattern.into();
        if pattern.is_empty() {
            return;
        }
        self.markers.push(BenignMarker {
            label: label.into(),
            pattern,
        });
    }

    /// First marker contained in `error_text`.
    pub fn find(&self, error_text: &str) -> Option<&BenignMarker> {
        self.markers
            .iter()
            .find(|marker| error_text.contains(&marker.pattern))
    }

    /// Number of markers.
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Markers in table order.
    pub fn iter(&self) -> impl Iterator<Item = &BenignMarker> {
        self.markers.iter()
    }
}
