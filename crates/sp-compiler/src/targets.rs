//! Target list text
//!
//! The popup edits targets as free text, one entry per line or comma
//! separated. Users paste full URLs as often as hostnames, so entries are
//! reduced to their hostname before they are stored.

use sp_core::domain::registrable_domain;
use sp_core::url::hostname;

/// Reduce one target entry to a hostname or `*.suffix` pattern.
///
/// ```
/// use sp_compiler::clean_target;
///
/// assert_eq!(clean_target("https://Example.com/path"), "example.com");
/// assert_eq!(clean_target("example.com/path?q=1"), "example.com");
/// assert_eq!(clean_target("*.corp.io"), "*.corp.io");
/// ```
pub fn clean_target(raw: &str) -> String {
    let value = raw.trim();

    let host = if value.contains("://") {
        hostname(value)
    } else if value.contains('/') || value.contains('?') {
        hostname(&format!("http://{value}"))
    } else {
        return value.to_ascii_lowercase();
    };

    if host.is_empty() {
        strip_url_parts(value)
    } else {
        host
    }
}

/// Fallback when the value does not parse as a network URL.
fn strip_url_parts(value: &str) -> String {
    let rest = match value.find("://") {
        Some(idx) => &value[idx + 3..],
        None => value,
    };
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    rest[..end].trim().to_ascii_lowercase()
}

/// Split target text on newlines and commas and clean every entry.
pub fn parse_targets(text: &str) -> Vec<String> {
    text.split(['\n', ','])
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(clean_target)
        .filter(|entry| !entry.is_empty())
        .collect()
}

/// Entries to add for the page at `url`: its registrable domain and the
/// matching wildcard, minus those already in `existing`.
pub fn suggest_targets(url: &str, existing: &[String]) -> Vec<String> {
    let host = hostname(url);
    if host.is_empty() {
        return Vec::new();
    }

    let Some(root) = registrable_domain(&host) else {
        return Vec::new();
    };
    let wildcard = format!("*.{root}");

    [root, wildcard]
        .into_iter()
        .filter(|candidate| !existing.contains(candidate))
        .collect()
}
