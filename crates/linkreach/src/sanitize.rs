//! Helpers for sanitizing data before it enters tracing span attributes.
//!
//! Logs are meant to be shareable; these keep tracking parameters, full
//! local paths and credentials out of span fields.

use std::path::Path;

use url::Url;

/// Returns only the filename component of a path (no directory).
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Drops query string, fragment and userinfo from a URL.
///
/// Unparseable input is cut at the first `?` or `#`.
pub fn strip_query(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) => {
            url.set_query(None);
            url.set_fragment(None);
            let _ = url.set_username("");
            let _ = url.set_password(None);
            url.to_string()
        }
        Err(_) => raw
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}

/// Short identifier for a profile URL: the last non-empty path segment.
///
/// - `https://www.linkedin.com/in/jane-doe/` → `jane-doe`
/// - `https://www.ycombinator.com/companies/acme?x=1` → `acme`
pub fn profile_slug(raw: &str) -> String {
    let path = match Url::parse(raw) {
        Ok(url) => url.path().to_string(),
        Err(_) => strip_query(raw),
    };

    path.rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or("<none>")
        .to_string()
}
