//! Registrable-domain heuristic
//!
//! Used when suggesting target entries for the page a user is on. No public
//! suffix list is shipped; a short table of common two-part suffixes covers
//! the usual cases.

/// Common two-part public suffixes.
const COMMON_TWO_PART_TLDS: &[&str] = &[
    "co.uk", "co.jp", "co.nz", "co.za", "co.in", "co.kr",
    "com.au", "com.br", "com.cn", "com.mx", "com.tw", "com.hk", "com.tr", "com.ua",
    "net.au", "net.nz",
    "org.uk", "org.au",
    "gov.uk", "gov.au",
    "ac.uk", "ac.jp",
    "ne.jp", "or.jp",
];

/// Get the registrable domain (eTLD+1) for a hostname.
///
/// Returns None for single-label hosts and IP literals.
///
/// # Examples
///
/// ```
/// use sp_core::domain::registrable_domain;
///
/// assert_eq!(registrable_domain("sub.example.com").as_deref(), Some("example.com"));
/// assert_eq!(registrable_domain("sub.example.co.uk").as_deref(), Some("example.co.uk"));
/// assert_eq!(registrable_domain("localhost"), None);
/// ```
pub fn registrable_domain(host: &str) -> Option<String> {
    let host = host.trim_end_matches('.');
    if is_ip_literal(host) {
        return None;
    }

    let labels: Vec<&str> = host.split('.').collect();
    let n = labels.len();
    if n < 2 || labels.iter().any(|l| l.is_empty()) {
        return None;
    }
    if n == 2 {
        return Some(labels.join("."));
    }

    let last_two = format!("{}.{}", labels[n - 2], labels[n - 1]);
    if COMMON_TWO_PART_TLDS.contains(&last_two.as_str()) {
        return Some(labels[n - 3..].join("."));
    }

    Some(labels[n - 2..].join("."))
}

fn is_ip_literal(host: &str) -> bool {
    host.starts_with('[') || host.parse::<std::net::IpAddr>().is_ok()
}
