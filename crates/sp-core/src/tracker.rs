//! Reference-counted override hosts
//!
//! Each override-enabled tab contributes the hosts it has navigated to. A host
//! stays in the override set as long as at least one tab still holds it, so
//! one tab switching its override off never un-proxies a host another tab
//! still relies on.
//!
//! Invariant: `ref_counts[h]` equals the number of tabs whose set contains
//! `h`, and zero counts are never stored.

use std::collections::{HashMap, HashSet};

use crate::types::TabId;

/// Per-tab host sets plus a global reference count per host.
#[derive(Debug, Default, Clone)]
pub struct HostTracker {
    tab_hosts: HashMap<TabId, HashSet<String>>,
    ref_counts: HashMap<String, usize>,
}

impl HostTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `tab` visited `host`.
    ///
    /// Empty hosts and hosts the tab already holds are ignored. Returns true
    /// if the host was newly added for this tab. The caller is responsible for
    /// only calling this for override-enabled tabs.
    pub fn add_host(&mut self, tab: TabId, host: &str) -> bool {
        if host.is_empty() {
            return false;
        }

        let hosts = self.tab_hosts.entry(tab).or_default();
        if hosts.contains(host) {
            return false;
        }
        hosts.insert(host.to_string());
        *self.ref_counts.entry(host.to_string()).or_insert(0) += 1;
        true
    }

    /// Release every host `tab` holds and forget the tab.
    ///
    /// Returns the number of hosts released. Clearing an unknown tab is a no-op.
    pub fn clear(&mut self, tab: TabId) -> usize {
        let Some(hosts) = self.tab_hosts.remove(&tab) else {
            return 0;
        };

        for host in &hosts {
            if let Some(count) = self.ref_counts.get_mut(host) {
                *count -= 1;
                if *count == 0 {
                    self.ref_counts.remove(host);
                }
            }
        }

        hosts.len()
    }

    /// Hosts currently held by at least one tab (unordered).
    pub fn override_hosts(&self) -> impl Iterator<Item = &str> + '_ {
        self.ref_counts.keys().map(String::as_str)
    }

    /// Is `host` held by any tab?
    pub fn is_override(&self, host: &str) -> bool {
        self.ref_counts.contains_key(host)
    }

    /// Number of tabs holding `host`.
    pub fn ref_count(&self, host: &str) -> usize {
        self.ref_counts.get(host).copied().unwrap_or(0)
    }

    /// Hosts held by `tab`.
    pub fn hosts_for(&self, tab: TabId) -> Option<&HashSet<String>> {
        self.tab_hosts.get(&tab)
    }

    /// Number of distinct override hosts.
    pub fn host_count(&self) -> usize {
        self.ref_counts.len()
    }

    /// Total number of (tab, host) pairs.
    pub fn pair_count(&self) -> usize {
        self.tab_hosts.values().map(HashSet::len).sum()
    }

    /// Check the reference-count invariant against the per-tab sets.
    pub fn is_consistent(&self) -> bool {
        let mut expected: HashMap<&str, usize> = HashMap::new();
        for hosts in self.tab_hosts.values() {
            for host in hosts {
                *expected.entry(host.as_str()).or_insert(0) += 1;
            }
        }

        expected.len() == self.ref_counts.len()
            && self
                .ref_counts
                .iter()
                .all(|(host, &count)| count > 0 && expected.get(host.as_str()) == Some(&count))
            && self.ref_counts.values().sum::<usize>() == self.pair_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_is_idempotent_per_tab() {
        let mut t = HostTracker::new();
        assert!(t.add_host(1, "a.com"));
        assert!(!t.add_host(1, "a.com"));
        assert_eq!(t.ref_count("a.com"), 1);
        assert!(t.is_consistent());
    }

    #[test]
    fn test_empty_host_is_ignored() {
        let mut t = HostTracker::new();
        assert!(!t.add_host(1, ""));
        assert_eq!(t.host_count(), 0);
        assert!(t.hosts_for(1).is_none());
    }

    #[test]
    fn test_shared_host_survives_one_clear() {
        let mut t = HostTracker::new();
        t.add_host(1, "shared.com");
        t.add_host(2, "shared.com");
        assert_eq!(t.ref_count("shared.com"), 2);

        assert_eq!(t.clear(1), 1);
        assert_eq!(t.ref_count("shared.com"), 1);
        assert!(t.is_override("shared.com"));

        t.clear(2);
        assert_eq!(t.ref_count("shared.com"), 0);
        assert!(!t.is_override("shared.com"));
        assert!(t.is_consistent());
    }

    #[test]
    fn test_clear_unknown_tab_is_noop() {
        let mut t = HostTracker::new();
        t.add_host(1, "a.com");
        assert_eq!(t.clear(99), 0);
        assert_eq!(t.clear(1), 1);
        assert_eq!(t.clear(1), 0);
        assert_eq!(t.host_count(), 0);
    }

    #[test]
    fn test_sum_of_counts_equals_pairs() {
        let mut t = HostTracker::new();
        let visits = [
            (1, "a.com"),
            (1, "b.com"),
            (2, "a.com"),
            (3, "c.com"),
            (2, "b.com"),
            (3, "a.com"),
            (1, "a.com"),
            (2, "d.com"),
        ];
        for (tab, host) in visits {
            t.add_host(tab, host);
            assert!(t.is_consistent());
        }
        assert_eq!(t.pair_count(), 7);

        t.clear(2);
        assert!(t.is_consistent());
        assert_eq!(t.pair_count(), 4);
        assert_eq!(t.ref_count("a.com"), 2);
        assert!(!t.is_override("d.com"));

        let mut hosts: Vec<_> = t.override_hosts().collect();
        hosts.sort_unstable();
        assert_eq!(hosts, vec!["a.com", "b.com", "c.com"]);
    }
}
