//! Compiled routing policy
//!
//! The policy is the decision function the browser evaluates for every
//! connection. It is kept as a plain value here; PAC source text is produced
//! only when it is handed to the browser (see `sp_compiler::render_pac`).

use std::borrow::Cow;
use std::collections::BTreeSet;

use crate::directive::ProxyDirective;
use crate::pattern::{any_matches, HostPattern};
use crate::types::{Profile, ProxyMode};

/// PAC result for direct connections.
pub const DIRECT: &str = "DIRECT";

// =============================================================================
// Route
// =============================================================================

/// Routing decision for one destination host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    /// Connect without a proxy
    Direct,
    /// Connect through the given directive
    Proxy(&'a str),
}

impl<'a> Route<'a> {
    pub fn is_proxy(&self) -> bool {
        matches!(self, Self::Proxy(_))
    }

    /// The string a PAC function would return for this route.
    pub fn as_pac_result(&self) -> &'a str {
        match self {
            Self::Direct => DIRECT,
            Self::Proxy(directive) => *directive,
        }
    }
}

/// Which rule produced a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteReason {
    /// Host is in a tab override set
    Override,
    /// Host matched the profile's target list
    TargetMatched,
    /// Host matched no target
    TargetNotMatched,
}

// =============================================================================
// RoutingPolicy
// =============================================================================

/// A compiled, self-contained routing policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingPolicy {
    mode: ProxyMode,
    targets: Vec<HostPattern>,
    directive: ProxyDirective,
    overrides: BTreeSet<String>,
}

impl RoutingPolicy {
    /// Compile a policy from a mode, target list, directive and override hosts.
    ///
    /// Override hosts are literal hostnames; they are lowercased and blank
    /// entries are dropped, but no wildcard expansion happens.
    pub fn compile<I, S>(
        mode: ProxyMode,
        targets: Vec<HostPattern>,
        directive: ProxyDirective,
        overrides: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let overrides = overrides
            .into_iter()
            .map(|host| host.as_ref().trim().trim_end_matches('.').to_ascii_lowercase())
            .filter(|host| !host.is_empty())
            .collect();

        Self {
            mode,
            targets,
            directive,
            overrides,
        }
    }

    /// Compile the policy for `profile` with the current override hosts.
    pub fn for_profile<I, S>(profile: &Profile, overrides: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::compile(
            profile.mode,
            profile.targets.clone(),
            profile.directive(),
            overrides,
        )
    }

    /// Decide how to reach `host`.
    pub fn decide(&self, host: &str) -> Route<'_> {
        self.decide_with_reason(host).0
    }

    /// Decide how to reach `host`, and report which rule decided it.
    pub fn decide_with_reason(&self, host: &str) -> (Route<'_>, RouteReason) {
        let host = lowercase_host(host);

        // Overrides win regardless of mode
        if self.overrides.contains(&*host) {
            return (self.routed(), RouteReason::Override);
        }

        let matched = any_matches(&self.targets, &host);
        let reason = if matched {
            RouteReason::TargetMatched
        } else {
            RouteReason::TargetNotMatched
        };

        let proxied = match self.mode {
            ProxyMode::ProxyOnly => matched,
            ProxyMode::Bypass => !matched,
        };

        if proxied {
            (self.routed(), reason)
        } else {
            (Route::Direct, reason)
        }
    }

    /// A routed decision degrades to direct when no upstream is configured.
    #[inline]
    fn routed(&self) -> Route<'_> {
        if self.directive.is_empty() {
            Route::Direct
        } else {
            Route::Proxy(self.directive.as_str())
        }
    }

    pub fn mode(&self) -> ProxyMode {
        self.mode
    }

    pub fn targets(&self) -> &[HostPattern] {
        &self.targets
    }

    pub fn directive(&self) -> &ProxyDirective {
        &self.directive
    }

    /// Override hosts in sorted order.
    pub fn overrides(&self) -> impl Iterator<Item = &str> + '_ {
        self.overrides.iter().map(String::as_str)
    }

    pub fn override_count(&self) -> usize {
        self.overrides.len()
    }
}

#[inline]
fn lowercase_host(host: &str) -> Cow<'_, str> {
    let host = host.trim_end_matches('.');
    if host.bytes().any(|b| b.is_ascii_uppercase()) {
        Cow::Owned(host.to_ascii_lowercase())
    } else {
        Cow::Borrowed(host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Endpoint, ProxyScheme};

    const SOCKS: &str = "SOCKS5 127.0.0.1:1080";

    fn targets(list: &[&str]) -> Vec<HostPattern> {
        list.iter().filter_map(|s| HostPattern::parse(s)).collect()
    }

    fn policy(mode: ProxyMode, list: &[&str], overrides: &[&str]) -> RoutingPolicy {
        RoutingPolicy::compile(mode, targets(list), ProxyDirective::new(SOCKS), overrides)
    }

    #[test]
    fn test_proxy_only_mode() {
        let p = policy(ProxyMode::ProxyOnly, &["example.com"], &[]);
        assert_eq!(p.decide("example.com"), Route::Proxy(SOCKS));
        assert_eq!(p.decide("other.com"), Route::Direct);
    }

    #[test]
    fn test_bypass_mode() {
        let p = policy(ProxyMode::Bypass, &["example.com"], &[]);
        assert_eq!(p.decide("example.com"), Route::Direct);
        assert_eq!(p.decide("other.com"), Route::Proxy(SOCKS));
    }

    #[test]
    fn test_override_wins_in_proxy_only() {
        let p = policy(ProxyMode::ProxyOnly, &[], &["example.com"]);
        assert_eq!(
            p.decide_with_reason("example.com"),
            (Route::Proxy(SOCKS), RouteReason::Override)
        );
        assert_eq!(p.decide("other.com"), Route::Direct);
    }

    #[test]
    fn test_override_wins_in_bypass() {
        let p = policy(ProxyMode::Bypass, &["*.example.com"], &["api.example.com"]);
        assert_eq!(p.decide("api.example.com"), Route::Proxy(SOCKS));
        assert_eq!(p.decide("www.example.com"), Route::Direct);
    }

    #[test]
    fn test_overrides_are_exact_not_wildcard() {
        let p = policy(ProxyMode::ProxyOnly, &[], &["example.com"]);
        assert_eq!(p.decide("a.example.com"), Route::Direct);
    }

    #[test]
    fn test_empty_directive_degrades_to_direct() {
        let p = RoutingPolicy::compile(
            ProxyMode::Bypass,
            Vec::new(),
            ProxyDirective::default(),
            ["forced.com"],
        );
        assert_eq!(p.decide("anything.com"), Route::Direct);
        assert_eq!(p.decide("forced.com"), Route::Direct);
        assert_eq!(p.decide("forced.com").as_pac_result(), DIRECT);
    }

    #[test]
    fn test_case_and_trailing_dot_insensitive() {
        let p = policy(ProxyMode::ProxyOnly, &["*.corp.io"], &["Public.NET"]);
        assert!(p.decide("API.corp.io").is_proxy());
        assert!(p.decide("public.net.").is_proxy());
    }

    #[test]
    fn test_compile_is_deterministic() {
        let a = policy(ProxyMode::ProxyOnly, &["x.com"], &["b.com", "a.com", ""]);
        let b = policy(ProxyMode::ProxyOnly, &["x.com"], &["a.com", "b.com"]);
        assert_eq!(a, b);
        assert_eq!(a.overrides().collect::<Vec<_>>(), vec!["a.com", "b.com"]);
    }

    #[test]
    fn test_for_profile() {
        let profile = Profile {
            name: "P".into(),
            targets: targets(&["*.corp.io"]),
            scheme: ProxyScheme::Socks5,
            mode: ProxyMode::ProxyOnly,
            http: Endpoint::new("127.0.0.1", "1080"),
            ssl: Endpoint::default(),
            ftp: Endpoint::default(),
        };
        let p = RoutingPolicy::for_profile(&profile, ["api.corp.io", "public.net"]);
        assert_eq!(p.decide("api.corp.io"), Route::Proxy(SOCKS));
        assert_eq!(p.decide("public.net"), Route::Proxy(SOCKS));
        assert_eq!(p.decide("random.com"), Route::Direct);
    }
}
