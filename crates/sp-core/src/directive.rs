//! PAC proxy directive builder
//!
//! Turns a profile's three endpoint slots into the string a PAC function
//! returns for proxied hosts, e.g. `SOCKS5 127.0.0.1:1080; SOCKS5 10.0.0.1:1080`.

use std::fmt;

use crate::types::{Endpoint, Profile, ProxyScheme};

/// Separator between directive entries (browser fallback order).
const DIRECTIVE_SEPARATOR: &str = "; ";

/// Format one endpoint, or None if host or port is missing.
#[inline]
fn format_entry(scheme: ProxyScheme, endpoint: &Endpoint) -> Option<String> {
    if endpoint.is_empty() {
        return None;
    }
    Some(format!(
        "{} {}:{}",
        scheme.directive_keyword(),
        endpoint.host.trim(),
        endpoint.port.trim()
    ))
}

/// Build the directive string for the http, ssl and ftp endpoints, in that
/// order. Missing endpoints are skipped; all missing gives `""`.
pub fn build_proxy_string(
    scheme: ProxyScheme,
    http: &Endpoint,
    ssl: &Endpoint,
    ftp: &Endpoint,
) -> String {
    [http, ssl, ftp]
        .into_iter()
        .filter_map(|endpoint| format_entry(scheme, endpoint))
        .collect::<Vec<_>>()
        .join(DIRECTIVE_SEPARATOR)
}

// =============================================================================
// ProxyDirective
// =============================================================================

/// A built directive string. Empty means "no upstream available".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ProxyDirective(String);

impl ProxyDirective {
    pub fn new(directive: impl Into<String>) -> Self {
        Self(directive.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ProxyDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Profile {
    /// The directive this profile routes proxied hosts through.
    pub fn directive(&self) -> ProxyDirective {
        ProxyDirective(build_proxy_string(
            self.scheme,
            &self.http,
            &self.ssl,
            &self.ftp,
        ))
    }
}
