//! Core type definitions for SelectProxy
//!
//! These types mirror the profile documents the extension keeps in
//! `chrome.storage.local` and are used throughout the engine.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::pattern::HostPattern;

// =============================================================================
// Identifiers
// =============================================================================

/// Browser tab identifier (opaque, assigned by the browser).
pub type TabId = i32;

/// Browser frame identifier within a tab.
pub type FrameId = i32;

/// Frame id of the top-level document.
pub const MAIN_FRAME_ID: FrameId = 0;

// =============================================================================
// Profile defaults
// =============================================================================

pub const DEFAULT_PROFILE_NAME: &str = "Default";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: &str = "12334";

// =============================================================================
// Proxy Scheme
// =============================================================================

/// Protocol spoken to the upstream proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyScheme {
    #[default]
    Socks5,
    Socks4,
    Http,
    Https,
}

impl ProxyScheme {
    /// PAC keyword used in front of `host:port`.
    pub fn directive_keyword(self) -> &'static str {
        match self {
            Self::Socks5 => "SOCKS5",
            Self::Socks4 => "SOCKS4",
            Self::Http => "PROXY",
            Self::Https => "HTTPS",
        }
    }

    /// Parse from the profile string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "socks5" => Some(Self::Socks5),
            "socks4" => Some(Self::Socks4),
            "http" => Some(Self::Http),
            "https" => Some(Self::Https),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Socks5 => "socks5",
            Self::Socks4 => "socks4",
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

// =============================================================================
// Proxy Mode
// =============================================================================

/// What membership in the target list means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProxyMode {
    /// Targets go through the proxy, everything else connects direct
    #[default]
    ProxyOnly,
    /// Targets connect direct, everything else goes through the proxy
    Bypass,
}

impl ProxyMode {
    /// Parse the stored mode string. Anything other than "proxy" is bypass.
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "proxy" | "proxy-only" => Self::ProxyOnly,
            _ => Self::Bypass,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProxyOnly => "proxy",
            Self::Bypass => "bypass",
        }
    }
}

impl Serialize for ProxyMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ProxyMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

// =============================================================================
// Endpoint
// =============================================================================

/// Upstream proxy address for one protocol slot (http / ssl / ftp).
///
/// Both fields are kept as text, exactly as typed into the popup. An endpoint
/// with an empty host or port is skipped when building the directive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Endpoint {
    #[serde(default, deserialize_with = "text_or_number")]
    pub host: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub port: String,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: port.into(),
        }
    }

    /// True if either host or port is missing.
    pub fn is_empty(&self) -> bool {
        self.host.trim().is_empty() || self.port.trim().is_empty()
    }
}

/// Accept `"1080"`, `1080` or `null` for endpoint fields.
fn text_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Text(s)) => s,
        Some(Raw::Number(n)) => n.to_string(),
        None => String::new(),
    })
}

// =============================================================================
// Profile
// =============================================================================

/// A named proxy profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub name: String,
    /// Host patterns this profile's mode applies to
    #[serde(default, deserialize_with = "crate::pattern::deserialize_patterns")]
    pub targets: Vec<HostPattern>,
    #[serde(default)]
    pub scheme: ProxyScheme,
    /// A stored document without a mode is bypass; only "proxy" is proxy-only
    #[serde(default = "stored_mode_default")]
    pub mode: ProxyMode,
    #[serde(default)]
    pub http: Endpoint,
    #[serde(default)]
    pub ssl: Endpoint,
    #[serde(default)]
    pub ftp: Endpoint,
}

fn stored_mode_default() -> ProxyMode {
    ProxyMode::Bypass
}

impl Profile {
    /// A fresh profile with the extension defaults and the given name.
    pub fn with_defaults(name: impl Into<String>) -> Self {
        let endpoint = Endpoint::new(DEFAULT_HOST, DEFAULT_PORT);
        Self {
            name: name.into(),
            targets: Vec::new(),
            scheme: ProxyScheme::default(),
            mode: ProxyMode::default(),
            http: endpoint.clone(),
            ssl: endpoint.clone(),
            ftp: endpoint,
        }
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::with_defaults(DEFAULT_PROFILE_NAME)
    }
}
