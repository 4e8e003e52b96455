//! Endpoint URL canonicalization.
//!
//! Policy:
//! - Trim surrounding whitespace.
//! - Lower-case scheme and host (also for non-special schemes such as rsync).
//! - Drop trailing slashes from the path, including the root path's. Query
//!   and fragment are left as they are.
//!
//! Normalizing an already normalized URL returns it unchanged.

use url::{Position, Url};

use crate::error::{AdminError, Result};

/// Canonical form of an endpoint URL. `kind` only labels errors.
pub fn normalize(kind: &'static str, raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let mut parsed = Url::parse(trimmed).map_err(|e| AdminError::InvalidUrl {
        kind,
        value: raw.to_string(),
        reason: e.to_string(),
    })?;

    if let Some(host) = parsed.host_str() {
        let lowered = host.to_ascii_lowercase();
        if lowered != host {
            parsed
                .set_host(Some(&lowered))
                .map_err(|e| AdminError::InvalidUrl {
                    kind,
                    value: raw.to_string(),
                    reason: e.to_string(),
                })?;
        }
    }

    let path = parsed[..Position::AfterPath].trim_end_matches('/');
    Ok(format!("{path}{}", &parsed[Position::AfterPath..]))
}

/// Empty stays empty; anything else goes through [`normalize`].
pub fn normalize_optional(kind: &'static str, raw: &str) -> Result<String> {
    if raw.trim().is_empty() {
        Ok(String::new())
    } else {
        normalize(kind, raw)
    }
}

/// Like [`normalize`] but assumes `http://` when no scheme is given.
pub fn normalize_http(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if has_scheme(trimmed) {
        normalize("HTTP", trimmed)
    } else {
        normalize("HTTP", &format!("http://{trimmed}"))
    }
}

/// `scheme://` at the very start, before any path, query or fragment.
fn has_scheme(raw: &str) -> bool {
    match raw.find("://") {
        Some(0) | None => false,
        Some(i) => raw[..i]
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')),
    }
}

/// Host part of an HTTP endpoint, used for geolocation.
pub fn host_of(normalized: &str) -> Option<String> {
    Url::parse(normalized)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
}
