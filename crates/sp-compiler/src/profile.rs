//! Profile documents
//!
//! Profiles are stored by the popup as JSON objects under `profile:<name>`
//! keys, next to `activeProfile` and `proxyEnabled`. This module turns those
//! documents into [`Profile`] values.

use serde_json::{Map, Value};
use sp_core::{Profile, ProxyScheme};
use thiserror::Error;

/// Storage key prefix for profile documents.
pub const PROFILE_KEY_PREFIX: &str = "profile:";
/// Storage key holding the selected profile name.
pub const ACTIVE_PROFILE_KEY: &str = "activeProfile";
/// Storage key holding the global power switch.
pub const PROXY_ENABLED_KEY: &str = "proxyEnabled";
/// Storage key listing profile names in popup order.
pub const PROFILE_LIST_KEY: &str = "profiles";

/// Errors loading a profile document.
#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("Malformed profile JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Profile document is not a JSON object")]
    NotAnObject,

    #[error("Unknown proxy scheme: {0}")]
    UnknownScheme(String),
}

/// Storage key for the profile called `name`.
pub fn profile_key(name: &str) -> String {
    format!("{PROFILE_KEY_PREFIX}{name}")
}

/// Parse one profile document.
pub fn load_profile(json: &str) -> Result<Profile, ProfileError> {
    let value: Value = serde_json::from_str(json)?;
    profile_from_value(value)
}

/// Convert an already-parsed profile document.
///
/// `null` fields count as missing. The scheme is matched case-insensitively
/// and an unknown scheme rejects the whole document.
pub fn profile_from_value(value: Value) -> Result<Profile, ProfileError> {
    let Value::Object(mut doc) = value else {
        return Err(ProfileError::NotAnObject);
    };

    doc.retain(|_, v| !v.is_null());
    normalize_scheme(&mut doc)?;

    Ok(serde_json::from_value(Value::Object(doc))?)
}

fn normalize_scheme(doc: &mut Map<String, Value>) -> Result<(), ProfileError> {
    let Some(raw) = doc.get("scheme") else {
        return Ok(());
    };

    let scheme = raw
        .as_str()
        .and_then(ProxyScheme::parse)
        .ok_or_else(|| ProfileError::UnknownScheme(raw.to_string()))?;

    doc.insert("scheme".to_string(), Value::from(scheme.as_str()));
    Ok(())
}

// =============================================================================
// Storage snapshot
// =============================================================================

/// Everything the engine reads from extension storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageSnapshot {
    pub profiles: Vec<Profile>,
    pub active_profile: Option<String>,
    pub proxy_enabled: bool,
}

impl StorageSnapshot {
    pub fn profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.name == name)
    }
}

/// Parse a dump of extension storage (the popup's settings export format).
///
/// Invalid profile documents are logged and skipped. A document without a
/// `name` takes the name from its storage key.
pub fn parse_storage(json: &str) -> Result<StorageSnapshot, ProfileError> {
    let value: Value = serde_json::from_str(json)?;
    let Value::Object(storage) = value else {
        return Err(ProfileError::NotAnObject);
    };

    let mut profiles = Vec::new();
    for (key, doc) in &storage {
        let Some(name) = key.strip_prefix(PROFILE_KEY_PREFIX) else {
            continue;
        };

        match profile_from_value(doc.clone()) {
            Ok(mut profile) => {
                if profile.name.is_empty() {
                    profile.name = name.to_string();
                }
                profiles.push(profile);
            }
            Err(e) => log::warn!("Skipping profile {name:?}: {e}"),
        }
    }

    // Popup order when the list is present, name order otherwise
    let order: Vec<&str> = storage
        .get(PROFILE_LIST_KEY)
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    profiles.sort_by_key(|p| {
        let rank = order.iter().position(|n| *n == p.name).unwrap_or(usize::MAX);
        (rank, p.name.clone())
    });

    let active_profile = storage
        .get(ACTIVE_PROFILE_KEY)
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .map(str::to_string);
    let proxy_enabled = storage
        .get(PROXY_ENABLED_KEY)
        .and_then(Value::as_bool)
        .unwrap_or(false);

    Ok(StorageSnapshot {
        profiles,
        active_profile,
        proxy_enabled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sp_core::{Endpoint, ProxyMode, RoutingPolicy};

    #[test]
    fn test_load_full_document() {
        let profile = load_profile(
            r#"{"name":"Work","targets":["*.corp.io"],"scheme":"HTTP","mode":"proxy",
                "http":{"host":"proxy.corp","port":3128}}"#,
        )
        .unwrap();
        assert_eq!(profile.scheme, ProxyScheme::Http);
        assert_eq!(profile.mode, ProxyMode::ProxyOnly);
        assert_eq!(profile.http, Endpoint::new("proxy.corp", "3128"));
        assert_eq!(profile.directive().as_str(), "PROXY proxy.corp:3128");
    }

    #[test]
    fn test_nulls_count_as_missing() {
        let profile = load_profile(
            r#"{"name":"N","targets":null,"scheme":null,"mode":null,"http":null}"#,
        )
        .unwrap();
        assert_eq!(profile.scheme, ProxyScheme::Socks5);
        assert_eq!(profile.mode, ProxyMode::Bypass);
        assert!(profile.targets.is_empty());
        assert!(profile.http.is_empty());
    }

    #[test]
    fn test_missing_mode_routes_as_bypass() {
        let profile =
            load_profile(r#"{"name":"N","targets":["a.com"],"http":{"host":"h","port":1}}"#)
                .unwrap();
        assert_eq!(profile.mode, ProxyMode::Bypass);

        let policy = RoutingPolicy::for_profile(&profile, Vec::<String>::new());
        assert!(policy.decide("other.com").is_proxy());
        assert!(!policy.decide("a.com").is_proxy());
    }

    #[test]
    fn test_unknown_mode_is_bypass() {
        let profile = load_profile(r#"{"name":"B","mode":"direct"}"#).unwrap();
        assert_eq!(profile.mode, ProxyMode::Bypass);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(load_profile("{"), Err(ProfileError::Malformed(_))));
        assert!(matches!(load_profile("[1]"), Err(ProfileError::NotAnObject)));
        assert!(matches!(
            load_profile(r#"{"scheme":"quic"}"#),
            Err(ProfileError::UnknownScheme(s)) if s == "\"quic\""
        ));
        assert!(matches!(
            load_profile(r#"{"scheme":5}"#),
            Err(ProfileError::UnknownScheme(_))
        ));
    }

    #[test]
    fn test_parse_storage() {
        let snapshot = parse_storage(
            r#"{
                "profiles": ["Work", "Default"],
                "activeProfile": "Work",
                "proxyEnabled": true,
                "profile:Default": {"scheme": "socks5"},
                "profile:Work": {"name": "Work", "targets": ["intranet"], "mode": "bypass"},
                "profile:Broken": {"scheme": "carrier-pigeon"},
                "fastProxyVisible": true
            }"#,
        )
        .unwrap();

        let names: Vec<&str> = snapshot.profiles.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Work", "Default"]);
        assert_eq!(snapshot.active_profile.as_deref(), Some("Work"));
        assert!(snapshot.proxy_enabled);
        assert_eq!(snapshot.profile("Work").unwrap().mode, ProxyMode::Bypass);
        assert!(snapshot.profile("Broken").is_none());
    }

    #[test]
    fn test_parse_empty_storage() {
        let snapshot = parse_storage("{}").unwrap();
        assert_eq!(snapshot, StorageSnapshot::default());
        assert_eq!(profile_key("Work"), "profile:Work");
    }
}
