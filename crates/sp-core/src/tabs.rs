//! Per-tab override state machine
//!
//! A tab is either Disabled (no entry) or Enabled. While enabled, every
//! committed top-level navigation feeds its host into the [`HostTracker`].
//!
//! ```text
//!   Disabled --enable(url)--> Enabled   seed host of url
//!   Enabled  --navigate-----> Enabled   add host (main frame only)
//!   Enabled  --disable------> Disabled  release all hosts
//!   Enabled  --tab removed--> Disabled  release all hosts
//! ```

use std::collections::HashSet;

use crate::tracker::HostTracker;
use crate::types::{FrameId, TabId, MAIN_FRAME_ID};
use crate::url::hostname;

/// Outcome of a state-machine event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Disabled -> Enabled; `seeded` if the current page's host was tracked
    Enabled { seeded: bool },
    /// Enabled -> Disabled; number of hosts the tab released
    Disabled { released: usize },
    /// Enabled -> Enabled on a top-level navigation
    Navigated { added: bool },
    /// Event had no effect (sub-frame, tab not enabled, double enable)
    Unchanged,
}

impl Transition {
    /// Should the routing policy be recompiled after this transition?
    pub fn needs_recompile(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// Override states and host tracking for all tabs.
#[derive(Debug, Default, Clone)]
pub struct TabOverrides {
    /// Tabs with the override on; absent means disabled
    enabled: HashSet<TabId>,
    tracker: HostTracker,
}

impl TabOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self, tab: TabId) -> bool {
        self.enabled.contains(&tab)
    }

    /// Switch the override on for `tab`, seeding the host of `url`.
    pub fn enable(&mut self, tab: TabId, url: &str) -> Transition {
        if !self.enabled.insert(tab) {
            return Transition::Unchanged;
        }

        let seeded = self.tracker.add_host(tab, &hostname(url));
        log::debug!("tab {tab}: override enabled (seeded: {seeded})");
        Transition::Enabled { seeded }
    }

    /// Switch the override off for `tab`, releasing its hosts.
    pub fn disable(&mut self, tab: TabId) -> Transition {
        if !self.enabled.remove(&tab) {
            return Transition::Unchanged;
        }

        let released = self.tracker.clear(tab);
        log::debug!("tab {tab}: override disabled, released {released} host(s)");
        Transition::Disabled { released }
    }

    /// Flip the override for `tab`. Returns the new state and the transition.
    pub fn toggle(&mut self, tab: TabId, url: &str) -> (bool, Transition) {
        if self.is_enabled(tab) {
            (false, self.disable(tab))
        } else {
            (true, self.enable(tab, url))
        }
    }

    /// A navigation committed in `tab`. Only main-frame navigations of
    /// enabled tabs count.
    pub fn navigate(&mut self, tab: TabId, frame: FrameId, url: &str) -> Transition {
        if frame != MAIN_FRAME_ID || !self.is_enabled(tab) {
            return Transition::Unchanged;
        }

        let host = hostname(url);
        let added = self.tracker.add_host(tab, &host);
        if added {
            log::debug!("tab {tab}: tracking {host}");
        }
        Transition::Navigated { added }
    }

    /// `tab` was closed. Same effect as disabling its override.
    pub fn remove_tab(&mut self, tab: TabId) -> Transition {
        self.disable(tab)
    }

    pub fn tracker(&self) -> &HostTracker {
        &self.tracker
    }

    /// Hosts currently forced through the proxy (unordered).
    pub fn override_hosts(&self) -> impl Iterator<Item = &str> + '_ {
        self.tracker.override_hosts()
    }

    /// Tabs with the override switched on.
    pub fn enabled_tabs(&self) -> impl Iterator<Item = TabId> + '_ {
        self.enabled.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted_hosts(tabs: &TabOverrides) -> Vec<String> {
        let mut hosts: Vec<String> = tabs.override_hosts().map(str::to_string).collect();
        hosts.sort();
        hosts
    }

    #[test]
    fn test_enable_seeds_current_host() {
        let mut tabs = TabOverrides::new();
        assert_eq!(tabs.enable(1, "https://a.com/x"), Transition::Enabled { seeded: true });
        assert!(tabs.is_enabled(1));
        assert_eq!(sorted_hosts(&tabs), vec!["a.com"]);
    }

    #[test]
    fn test_enable_on_internal_page_seeds_nothing() {
        let mut tabs = TabOverrides::new();
        assert_eq!(tabs.enable(1, "chrome://newtab/"), Transition::Enabled { seeded: false });
        assert!(tabs.is_enabled(1));
        assert!(sorted_hosts(&tabs).is_empty());
    }

    #[test]
    fn test_double_enable_is_noop() {
        let mut tabs = TabOverrides::new();
        tabs.enable(1, "https://a.com");
        assert_eq!(tabs.enable(1, "https://b.com"), Transition::Unchanged);
        assert_eq!(sorted_hosts(&tabs), vec!["a.com"]);
    }

    #[test]
    fn test_disable_never_enabled_is_noop() {
        let mut tabs = TabOverrides::new();
        assert_eq!(tabs.disable(7), Transition::Unchanged);
        assert!(!Transition::Unchanged.needs_recompile());
    }

    #[test]
    fn test_disabled_tab_is_forgotten() {
        let mut tabs = TabOverrides::new();
        tabs.enable(7, "https://a.com");
        assert!(tabs.disable(7).needs_recompile());
        assert!(!tabs.is_enabled(7));
        assert_eq!(tabs.enabled_tabs().count(), 0);
        assert_eq!(tabs.disable(7), Transition::Unchanged);
        assert_eq!(tabs.enable(7, "https://b.com"), Transition::Enabled { seeded: true });
        assert_eq!(sorted_hosts(&tabs), vec!["b.com"]);
    }

    #[test]
    fn test_ipv6_host_is_unbracketed() {
        let mut tabs = TabOverrides::new();
        tabs.enable(1, "http://[::1]:8080/");
        assert_eq!(sorted_hosts(&tabs), vec!["::1"]);
    }

    #[test]
    fn test_navigation_only_counts_when_enabled() {
        let mut tabs = TabOverrides::new();
        assert_eq!(tabs.navigate(1, MAIN_FRAME_ID, "https://a.com"), Transition::Unchanged);

        tabs.enable(1, "https://a.com");
        assert_eq!(
            tabs.navigate(1, MAIN_FRAME_ID, "https://b.com"),
            Transition::Navigated { added: true }
        );
        assert_eq!(
            tabs.navigate(1, MAIN_FRAME_ID, "https://b.com/other"),
            Transition::Navigated { added: false }
        );
        assert!(Transition::Navigated { added: false }.needs_recompile());
        assert_eq!(sorted_hosts(&tabs), vec!["a.com", "b.com"]);
    }

    #[test]
    fn test_subframe_navigation_ignored() {
        let mut tabs = TabOverrides::new();
        tabs.enable(1, "https://a.com");
        assert_eq!(tabs.navigate(1, 3, "https://ads.example"), Transition::Unchanged);
        assert_eq!(sorted_hosts(&tabs), vec!["a.com"]);
    }

    #[test]
    fn test_enable_does_not_add_earlier_visits() {
        let mut tabs = TabOverrides::new();
        tabs.navigate(1, MAIN_FRAME_ID, "https://before.com");
        tabs.enable(1, "https://now.com");
        assert_eq!(sorted_hosts(&tabs), vec!["now.com"]);
    }

    #[test]
    fn test_toggle_flips() {
        let mut tabs = TabOverrides::new();
        let (on, _) = tabs.toggle(1, "https://a.com");
        assert!(on);
        let (on, transition) = tabs.toggle(1, "https://a.com");
        assert!(!on);
        assert_eq!(transition, Transition::Disabled { released: 1 });
        assert!(!tabs.is_enabled(1));
    }

    #[test]
    fn test_two_tabs_share_a_host() {
        let mut tabs = TabOverrides::new();
        tabs.enable(1, "https://start-a.com");
        tabs.enable(2, "https://start-b.com");
        tabs.navigate(1, MAIN_FRAME_ID, "https://shared.com");
        tabs.navigate(2, MAIN_FRAME_ID, "https://shared.com");
        assert_eq!(tabs.tracker().ref_count("shared.com"), 2);

        tabs.disable(1);
        assert_eq!(tabs.tracker().ref_count("shared.com"), 1);
        assert!(sorted_hosts(&tabs).contains(&"shared.com".to_string()));

        tabs.disable(2);
        assert_eq!(tabs.tracker().ref_count("shared.com"), 0);
        assert!(sorted_hosts(&tabs).is_empty());
    }

    #[test]
    fn test_tab_close_equals_disable() {
        let build = || {
            let mut tabs = TabOverrides::new();
            tabs.enable(1, "https://a.com");
            tabs.enable(2, "https://a.com");
            tabs.navigate(1, MAIN_FRAME_ID, "https://b.com");
            tabs
        };

        let mut closed = build();
        let mut disabled = build();
        assert_eq!(closed.remove_tab(1), disabled.disable(1));

        assert_eq!(sorted_hosts(&closed), sorted_hosts(&disabled));
        assert_eq!(closed.tracker().ref_count("a.com"), disabled.tracker().ref_count("a.com"));
        assert!(!closed.is_enabled(1));
        assert!(closed.tracker().hosts_for(1).is_none());
        assert!(closed.tracker().is_consistent());
    }

    #[test]
    fn test_enabled_tabs() {
        let mut tabs = TabOverrides::new();
        tabs.enable(4, "https://a.com");
        tabs.enable(9, "https://b.com");
        tabs.disable(4);
        assert_eq!(tabs.enabled_tabs().collect::<Vec<_>>(), vec![9]);
    }
}
