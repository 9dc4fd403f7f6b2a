//! Fast URL parsing utilities
//!
//! These functions avoid allocations and work directly on string slices.
//! Only network schemes carry a hostname the proxy layer cares about; every
//! other URL (`chrome://`, `about:`, `data:`, garbage) resolves to no host.

// =============================================================================
// Scheme Extraction
// =============================================================================

/// URL schemes whose requests go through the proxy settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkScheme {
    Http,
    Https,
    Ws,
    Wss,
    Ftp,
}

/// Fast scheme extraction without URL parsing.
/// Returns None for non-network or unknown schemes.
#[inline]
pub fn extract_scheme(url: &str) -> Option<NetworkScheme> {
    let bytes = url.as_bytes();
    if bytes.len() < 5 {
        return None;
    }

    // Lowercase first char
    let c0 = bytes[0] | 0x20;

    match c0 {
        b'h' => {
            if bytes.len() >= 8 && bytes[..8].eq_ignore_ascii_case(b"https://") {
                Some(NetworkScheme::Https)
            } else if bytes.len() >= 7 && bytes[..7].eq_ignore_ascii_case(b"http://") {
                Some(NetworkScheme::Http)
            } else {
                None
            }
        }
        b'w' => {
            if bytes.len() >= 6 && bytes[..6].eq_ignore_ascii_case(b"wss://") {
                Some(NetworkScheme::Wss)
            } else if bytes[..5].eq_ignore_ascii_case(b"ws://") {
                Some(NetworkScheme::Ws)
            } else {
                None
            }
        }
        b'f' => {
            if bytes.len() >= 6 && bytes[..6].eq_ignore_ascii_case(b"ftp://") {
                Some(NetworkScheme::Ftp)
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Get the position after "://".
#[inline]
pub fn get_scheme_end(url: &str) -> Option<usize> {
    let bytes = url.as_bytes();

    let colon_pos = bytes.iter().position(|&b| b == b':')?;

    if bytes.len() > colon_pos + 2
        && bytes[colon_pos + 1] == b'/'
        && bytes[colon_pos + 2] == b'/'
    {
        return Some(colon_pos + 3);
    }

    None
}

// =============================================================================
// Host Extraction
// =============================================================================

/// Get the start and end positions of the hostname in a URL.
///
/// Userinfo is skipped, the port is excluded, and bracketed IPv6 literals are
/// returned with their brackets.
#[inline]
pub fn get_host_position(url: &str) -> Option<(usize, usize)> {
    let scheme_end = get_scheme_end(url)?;
    let bytes = url.as_bytes();

    // Authority ends at the first '/', '?' or '#'
    let mut authority_end = bytes.len();
    for (i, &b) in bytes[scheme_end..].iter().enumerate() {
        if b == b'/' || b == b'?' || b == b'#' {
            authority_end = scheme_end + i;
            break;
        }
    }

    // Skip userinfo (last '@' inside the authority)
    let host_start = bytes[scheme_end..authority_end]
        .iter()
        .rposition(|&b| b == b'@')
        .map_or(scheme_end, |at| scheme_end + at + 1);

    if bytes.get(host_start) == Some(&b'[') {
        let close = bytes[host_start..authority_end]
            .iter()
            .position(|&b| b == b']')?;
        return Some((host_start, host_start + close + 1));
    }

    let mut host_end = authority_end;
    for (i, &b) in bytes[host_start..authority_end].iter().enumerate() {
        if b == b':' {
            host_end = host_start + i;
            break;
        }
    }

    Some((host_start, host_end))
}

/// Fast host extraction without allocations.
/// Returns a slice into the original URL.
#[inline]
pub fn extract_host(url: &str) -> Option<&str> {
    let (host_start, host_end) = get_host_position(url)?;
    Some(&url[host_start..host_end])
}

/// Resolve the hostname the proxy layer will see for `url`.
///
/// Lowercased, trailing dot removed. IPv6 literals lose their brackets, the
/// way the proxy layer passes them to `FindProxyForURL`. Non-network or
/// malformed URLs yield an empty string, which the override tracker ignores.
pub fn hostname(url: &str) -> String {
    let url = url.trim();
    if extract_scheme(url).is_none() {
        return String::new();
    }
    match extract_host(url) {
        Some(host) => {
            let host = host
                .strip_prefix('[')
                .and_then(|h| h.strip_suffix(']'))
                .unwrap_or(host);
            normalize_host(host)
        }
        None => String::new(),
    }
}

/// Lowercase a hostname and drop a trailing root dot.
#[inline]
pub fn normalize_host(host: &str) -> String {
    host.trim().trim_end_matches('.').to_ascii_lowercase()
}
