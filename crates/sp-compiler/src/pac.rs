//! PAC script rendering
//!
//! Serializes a [`RoutingPolicy`] into a `FindProxyForURL` function the
//! browser can evaluate. The script encodes the same decision order as
//! [`RoutingPolicy::decide`]: override hosts first (exact match), then the
//! target list, then the mode.

use std::fmt::Write;

use serde_json::Value;
use sp_core::policy::DIRECT;
use sp_core::{Profile, ProxyMode, RoutingPolicy};

/// Render `policy` as PAC source text.
///
/// Output is deterministic: equal policies render byte-identical scripts.
pub fn render_pac(policy: &RoutingPolicy) -> String {
    let directive = if policy.directive().is_empty() {
        DIRECT
    } else {
        policy.directive().as_str()
    };

    let overrides: Vec<&str> = policy.overrides().collect();
    let targets: Vec<String> = policy.targets().iter().map(ToString::to_string).collect();

    let (on_match, on_miss) = match policy.mode() {
        ProxyMode::ProxyOnly => ("proxy", "\"DIRECT\""),
        ProxyMode::Bypass => ("\"DIRECT\"", "proxy"),
    };

    let mut out = String::with_capacity(512 + 24 * (overrides.len() + targets.len()));

    out.push_str("function FindProxyForURL(url, host) {\n");
    // Writing into a String cannot fail
    let _ = writeln!(out, "    var proxy = {};", js_string(directive));
    let _ = writeln!(out, "    var overrides = {};", js_array(&overrides));
    let _ = writeln!(out, "    var targets = {};", js_array(&targets));
    out.push_str(concat!(
        "    host = host.toLowerCase();\n",
        "    if (host.charAt(host.length - 1) === \".\")\n",
        "        host = host.substring(0, host.length - 1);\n",
        "    for (var i = 0; i < overrides.length; i++) {\n",
        "        if (host === overrides[i]) return proxy;\n",
        "    }\n",
        "    for (var j = 0; j < targets.length; j++) {\n",
        "        var t = targets[j];\n",
        "        if (t.indexOf(\"*.\") === 0) {\n",
        "            var suffix = t.substring(2);\n",
        "            if (host === suffix || dnsDomainIs(host, \".\" + suffix)) return ",
    ));
    let _ = writeln!(out, "{on_match};");
    out.push_str("        } else if (host === t) {\n");
    let _ = writeln!(out, "            return {on_match};");
    out.push_str("        }\n    }\n");
    let _ = writeln!(out, "    return {on_miss};");
    out.push_str("}\n");

    log::debug!(
        "Rendered PAC: {} override(s), {} target(s), {} bytes",
        overrides.len(),
        targets.len(),
        out.len()
    );
    out
}

/// Compile and render the script for `profile` with the given override hosts.
pub fn pac_for_profile<I, S>(profile: &Profile, overrides: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    render_pac(&RoutingPolicy::for_profile(profile, overrides))
}

fn js_string(s: &str) -> String {
    Value::from(s).to_string()
}

fn js_array<S: AsRef<str>>(items: &[S]) -> String {
    Value::Array(items.iter().map(|s| Value::from(s.as_ref())).collect()).to_string()
}
