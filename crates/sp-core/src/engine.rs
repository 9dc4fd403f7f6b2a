//! Recompilation trigger and event wiring
//!
//! The [`Engine`] owns all override bookkeeping and reacts to three kinds of
//! input: control-channel messages, committed navigations and closed tabs.
//! Every input that changes the power state or the override host set ends
//! with [`Engine::recompute`], which installs a freshly compiled policy as a
//! total replacement of the previous one.
//!
//! # Concurrency
//!
//! The engine is single-threaded. Handlers take `&self` and keep their state
//! borrows strictly between awaits, so several handlers can be in flight at
//! once (e.g. two tabs navigating while a profile lookup is pending). A
//! recompute that finds a newer recompute has started while it was waiting
//! for the profile store leaves the outcome to the newer one. The last
//! recompute to start therefore always installs, and it reads the override
//! set after its own profile lookup.

use std::cell::RefCell;

use crate::message::{Message, Response};
use crate::policy::RoutingPolicy;
use crate::tabs::{TabOverrides, Transition};
use crate::types::{FrameId, Profile, TabId};

// =============================================================================
// External collaborators
// =============================================================================

/// Persistent profile storage (owned by the popup UI).
#[allow(async_fn_in_trait)]
pub trait ProfileStore {
    /// Load a profile by name. Missing or unreadable profiles are `None`.
    async fn get_profile(&self, name: &str) -> Option<Profile>;

    /// Name of the profile selected in the popup.
    async fn active_profile(&self) -> Option<String>;

    /// Stored state of the global power switch.
    async fn proxy_enabled(&self) -> bool;
}

/// Where compiled policies go (the browser's proxy settings).
///
/// Both calls are fire-and-forget: failures are the sink's concern.
#[allow(async_fn_in_trait)]
pub trait PolicySink {
    /// Replace the active routing policy.
    async fn install(&self, policy: RoutingPolicy);

    /// Remove any installed policy (everything connects direct).
    async fn clear(&self);
}

// =============================================================================
// Power state
// =============================================================================

/// Global power switch plus the profile it applies.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PowerState {
    #[default]
    Off,
    On(String),
}

impl PowerState {
    pub fn profile(&self) -> Option<&str> {
        match self {
            Self::Off => None,
            Self::On(name) => Some(name),
        }
    }

    pub fn is_on(&self) -> bool {
        matches!(self, Self::On(_))
    }
}

// =============================================================================
// Engine
// =============================================================================

#[derive(Debug, Default)]
struct EngineState {
    power: PowerState,
    tabs: TabOverrides,
    /// Number of recomputes started so far
    generation: u64,
}

/// The tab-scoped proxy override engine.
pub struct Engine<S, P> {
    store: S,
    sink: P,
    state: RefCell<EngineState>,
}

impl<S: ProfileStore, P: PolicySink> Engine<S, P> {
    /// Create an engine with power off and no overrides.
    pub fn new(store: S, sink: P) -> Self {
        Self {
            store,
            sink,
            state: RefCell::new(EngineState::default()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn sink(&self) -> &P {
        &self.sink
    }

    pub fn power(&self) -> PowerState {
        self.state.borrow().power.clone()
    }

    pub fn is_tab_enabled(&self, tab: TabId) -> bool {
        self.state.borrow().tabs.is_enabled(tab)
    }

    /// Current override hosts, sorted.
    pub fn override_hosts(&self) -> Vec<String> {
        let state = self.state.borrow();
        let mut hosts: Vec<String> = state.tabs.override_hosts().map(str::to_string).collect();
        hosts.sort_unstable();
        hosts
    }

    /// Number of enabled tabs holding `host`.
    pub fn ref_count(&self, host: &str) -> usize {
        self.state.borrow().tabs.tracker().ref_count(host)
    }

    /// Inspect the override bookkeeping.
    pub fn with_tabs<R>(&self, f: impl FnOnce(&TabOverrides) -> R) -> R {
        f(&self.state.borrow().tabs)
    }

    /// Number of recomputes started so far.
    pub fn generation(&self) -> u64 {
        self.state.borrow().generation
    }

    // -------------------------------------------------------------------------
    // Control channel
    // -------------------------------------------------------------------------

    /// Handle one control-channel message from `sender` (if it came from a tab).
    pub async fn handle(&self, message: Message, sender: Option<TabId>) -> Response {
        match message {
            Message::ApplyProfile { name, enabled } => {
                self.apply_profile(name.as_deref(), enabled).await;
                Response::None
            }
            Message::ProxyPower { enabled } => {
                self.set_power(enabled).await;
                Response::None
            }
            Message::GetTabProxyState => Response::TabState {
                enabled: sender.is_some_and(|tab| self.is_tab_enabled(tab)),
            },
            Message::ToggleTabProxy { url } => match sender {
                Some(tab) => Response::Toggled {
                    enabled: self.toggle_tab(tab, &url).await,
                    reload: true,
                },
                // No tab to flip or reload, so report reload: false
                None => {
                    log::warn!("toggleTabProxy without a sender tab");
                    Response::Toggled {
                        enabled: false,
                        reload: false,
                    }
                }
            },
        }
    }

    /// Decode and handle a raw JSON message. Undecodable messages are
    /// logged and answered with `null`.
    pub async fn handle_json(&self, text: &str, sender: Option<TabId>) -> Response {
        match Message::from_json(text) {
            Ok(message) => self.handle(message, sender).await,
            Err(e) => {
                log::warn!("Ignoring control message: {e}");
                Response::None
            }
        }
    }

    /// Power on with profile `name` if `enabled`, otherwise power off.
    pub async fn apply_profile(&self, name: Option<&str>, enabled: bool) {
        let power = match name {
            Some(name) if enabled && !name.is_empty() => PowerState::On(name.to_string()),
            _ => PowerState::Off,
        };
        self.set_power_state(power);
        self.recompute().await;
    }

    /// Global power switch. Powering on uses the store's active profile.
    pub async fn set_power(&self, enabled: bool) {
        let power = if enabled {
            match self.store.active_profile().await {
                Some(name) if !name.is_empty() => PowerState::On(name),
                _ => {
                    log::warn!("Power on requested but no profile is active");
                    PowerState::Off
                }
            }
        } else {
            PowerState::Off
        };
        self.set_power_state(power);
        self.recompute().await;
    }

    /// Restore the stored power state when the browser starts.
    pub async fn startup(&self) {
        let enabled = self.store.proxy_enabled().await;
        log::info!("Startup: stored power is {}", if enabled { "on" } else { "off" });
        self.set_power(enabled).await;
    }

    fn set_power_state(&self, power: PowerState) {
        let mut state = self.state.borrow_mut();
        if state.power != power {
            log::info!("Power: {:?} -> {:?}", state.power, power);
            state.power = power;
        }
    }

    // -------------------------------------------------------------------------
    // Tab overrides
    // -------------------------------------------------------------------------

    /// Flip the override for `tab` showing `url`. Returns the new state.
    pub async fn toggle_tab(&self, tab: TabId, url: &str) -> bool {
        let (enabled, transition) = self.state.borrow_mut().tabs.toggle(tab, url);
        self.after(transition).await;
        enabled
    }

    /// A navigation committed in `tab` / `frame`.
    pub async fn on_navigation_committed(&self, tab: TabId, frame: FrameId, url: &str) {
        let transition = self.state.borrow_mut().tabs.navigate(tab, frame, url);
        self.after(transition).await;
    }

    /// `tab` was closed.
    pub async fn on_tab_removed(&self, tab: TabId) {
        let transition = self.state.borrow_mut().tabs.remove_tab(tab);
        self.after(transition).await;
    }

    async fn after(&self, transition: Transition) {
        if transition.needs_recompile() {
            self.recompute().await;
        }
    }

    // -------------------------------------------------------------------------
    // Recompilation
    // -------------------------------------------------------------------------

    /// Compile the policy for the current power state and override hosts and
    /// hand it to the sink. Power off or an unknown profile clears the policy.
    pub async fn recompute(&self) {
        let (generation, power) = {
            let mut state = self.state.borrow_mut();
            state.generation += 1;
            (state.generation, state.power.clone())
        };

        let PowerState::On(name) = power else {
            log::debug!("recompute #{generation}: power off, clearing policy");
            self.sink.clear().await;
            return;
        };

        let profile = self.store.get_profile(&name).await;

        let policy = {
            let state = self.state.borrow();
            if state.generation != generation {
                log::debug!(
                    "recompute #{generation}: superseded by #{} while loading {name:?}",
                    state.generation
                );
                return;
            }
            profile.map(|profile| RoutingPolicy::for_profile(&profile, state.tabs.override_hosts()))
        };

        match policy {
            Some(policy) => {
                log::info!(
                    "recompute #{generation}: installing {name:?} with {} override host(s)",
                    policy.override_count()
                );
                self.sink.install(policy).await;
            }
            None => {
                log::warn!("recompute #{generation}: profile {name:?} not found, clearing policy");
                self.sink.clear().await;
            }
        }
    }
}
