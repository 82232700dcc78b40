//! URL validation and probe formatting shared by registration and probing.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ValidationError;

/// Optional http(s) scheme, a dotted host ending in an alphabetic TLD, then an
/// optional path/query/fragment. Ports and bare IP addresses are rejected.
static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(https?://)?",
        r"([a-zA-Z0-9\-]+\.)+[a-zA-Z]{2,}",
        r"(/[a-zA-Z0-9\-._~:/?#\[\]@!$&'()*+,;=]*)?$",
    ))
    .expect("URL pattern is a valid regex")
});

/// Check whether a string is an acceptable monitoring target
pub fn is_valid_url(s: &str) -> bool {
    URL_PATTERN.is_match(s)
}

/// Validate a URL, distinguishing a missing value from a malformed one
pub fn validate_url(s: &str) -> Result<(), ValidationError> {
    if s.is_empty() {
        return Err(ValidationError::Missing);
    }

    if !is_valid_url(s) {
        return Err(ValidationError::Malformed(s.to_string()));
    }

    Ok(())
}

/// Prefix `http://` when the URL carries no http(s) scheme.
///
/// Only used for the outbound request; registry keys keep their registered form.
pub fn canonicalize_for_probe(s: &str) -> String {
    if s.starts_with("http://") || s.starts_with("https://") {
        s.to_string()
    } else {
        format!("http://{s}")
    }
}
