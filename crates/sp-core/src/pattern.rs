//! Host patterns for profile target lists
//!
//! A pattern is either a literal hostname or a `*.suffix` wildcard. The
//! wildcard matches the suffix itself and any name below it, which is the
//! same as DNS domain-suffix matching.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::url::normalize_host;

/// A target-list entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HostPattern {
    /// Matches only this exact hostname
    Exact(String),
    /// `*.suffix` - matches `suffix` and every `*.suffix` (stored without `*.`)
    Suffix(String),
}

impl HostPattern {
    /// Parse a pattern, normalizing case and a trailing dot.
    /// Returns None for empty input or a bare `*.`.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = normalize_host(raw);
        if let Some(suffix) = normalized.strip_prefix("*.") {
            let suffix = suffix.trim_start_matches('.');
            if suffix.is_empty() {
                return None;
            }
            return Some(Self::Suffix(suffix.to_string()));
        }
        if normalized.is_empty() {
            return None;
        }
        Some(Self::Exact(normalized))
    }

    /// Does this pattern match `host`?
    #[inline]
    pub fn matches(&self, host: &str) -> bool {
        match self {
            Self::Exact(name) => host.eq_ignore_ascii_case(name),
            Self::Suffix(suffix) => is_domain_or_subdomain(host, suffix),
        }
    }

    /// The hostname part (`example.com` for both `example.com` and `*.example.com`).
    pub fn as_str(&self) -> &str {
        match self {
            Self::Exact(name) => name,
            Self::Suffix(suffix) => suffix,
        }
    }
}

/// `host == domain` or `host` ends with `.domain`, ASCII case-insensitive.
#[inline]
pub fn is_domain_or_subdomain(host: &str, domain: &str) -> bool {
    let host = host.as_bytes();
    let domain = domain.as_bytes();

    if host.len() == domain.len() {
        return host.eq_ignore_ascii_case(domain);
    }
    if host.len() <= domain.len() {
        return false;
    }

    let offset = host.len() - domain.len();
    host[offset - 1] == b'.' && host[offset..].eq_ignore_ascii_case(domain)
}

/// True if any pattern in the list matches. Order does not matter.
#[inline]
pub fn any_matches(patterns: &[HostPattern], host: &str) -> bool {
    patterns.iter().any(|p| p.matches(host))
}

impl fmt::Display for HostPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(name) => f.write_str(name),
            Self::Suffix(suffix) => write!(f, "*.{suffix}"),
        }
    }
}

impl Serialize for HostPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for HostPattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid host pattern: {raw:?}")))
    }
}

/// Deserialize a target list, dropping blank entries instead of failing.
pub(crate) fn deserialize_patterns<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<HostPattern>, D::Error> {
    let raw = Option::<Vec<String>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .iter()
        .filter_map(|entry| HostPattern::parse(entry))
        .collect())
}
