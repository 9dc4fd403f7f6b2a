//! In-memory store and sink
//!
//! Used by the CLI replay tool and by tests. Both are single-threaded and use
//! interior mutability so they can be shared with an [`Engine`](crate::Engine).

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::engine::{PolicySink, ProfileStore};
use crate::policy::RoutingPolicy;
use crate::types::Profile;

// =============================================================================
// MemoryProfileStore
// =============================================================================

/// Profiles, active profile name and power flag held in memory.
#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    profiles: RefCell<HashMap<String, Profile>>,
    active: RefCell<Option<String>>,
    enabled: Cell<bool>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_profile(self, profile: Profile) -> Self {
        self.insert(profile);
        self
    }

    /// Store `profile` under its name, replacing any previous one.
    pub fn insert(&self, profile: Profile) {
        self.profiles.borrow_mut().insert(profile.name.clone(), profile);
    }

    pub fn remove(&self, name: &str) -> Option<Profile> {
        self.profiles.borrow_mut().remove(name)
    }

    pub fn set_active(&self, name: Option<&str>) {
        *self.active.borrow_mut() = name.map(str::to_string);
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.set(enabled);
    }

    /// Stored profile names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.profiles.borrow().keys().cloned().collect();
        names.sort_unstable();
        names
    }
}

impl ProfileStore for MemoryProfileStore {
    async fn get_profile(&self, name: &str) -> Option<Profile> {
        self.profiles.borrow().get(name).cloned()
    }

    async fn active_profile(&self) -> Option<String> {
        self.active.borrow().clone()
    }

    async fn proxy_enabled(&self) -> bool {
        self.enabled.get()
    }
}

// =============================================================================
// RecordingSink
// =============================================================================

/// One call made on a [`PolicySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Installed(RoutingPolicy),
    Cleared,
}

/// Sink that records every install and clear.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: RefCell<Vec<SinkEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded events, oldest first.
    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.borrow().clone()
    }

    pub fn last(&self) -> Option<SinkEvent> {
        self.events.borrow().last().cloned()
    }

    /// The policy in effect: the last event if it was an install.
    pub fn installed_policy(&self) -> Option<RoutingPolicy> {
        match self.events.borrow().last() {
            Some(SinkEvent::Installed(policy)) => Some(policy.clone()),
            _ => None,
        }
    }

    pub fn install_count(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| matches!(e, SinkEvent::Installed(_)))
            .count()
    }
}

impl PolicySink for RecordingSink {
    async fn install(&self, policy: RoutingPolicy) {
        self.events.borrow_mut().push(SinkEvent::Installed(policy));
    }

    async fn clear(&self) {
        self.events.borrow_mut().push(SinkEvent::Cleared);
    }
}
