//! SelectProxy Core Library
//!
//! This crate provides the tab-scoped proxy override engine for the SelectProxy
//! browser extension.
//!
//! # Architecture
//!
//! A profile names an upstream proxy, a target-host list and a mode. Tabs can
//! switch on an override that forces every host they navigate to through the
//! proxy. Whenever the active profile, the global power switch or the override
//! host set changes, the engine compiles a fresh [`RoutingPolicy`] and hands it
//! to a [`PolicySink`] as a total replacement of the previous one.
//!
//! The policy is a pure decision function. Rendering it as PAC source text is
//! left to the boundary (see the `sp-compiler` crate).
//!
//! # Modules
//!
//! - `types`: Profile, endpoints, scheme/mode enums
//! - `url`: Fast hostname extraction without allocations
//! - `pattern`: Host patterns with `*.suffix` wildcards
//! - `domain`: Registrable-domain heuristic
//! - `directive`: PAC proxy directive builder
//! - `policy`: Compiled routing policy and per-host decisions
//! - `tracker`: Reference-counted override hosts
//! - `tabs`: Per-tab override state machine
//! - `message`: Control-channel messages and responses
//! - `engine`: Recompilation trigger and event wiring
//! - `memory`: In-memory store and sink

pub mod directive;
pub mod domain;
pub mod engine;
pub mod error;
pub mod memory;
pub mod message;
pub mod pattern;
pub mod policy;
pub mod tabs;
pub mod tracker;
pub mod types;
pub mod url;

// Re-export commonly used types
pub use directive::{build_proxy_string, ProxyDirective};
pub use engine::{Engine, PolicySink, PowerState, ProfileStore};
pub use error::ChannelError;
pub use message::{Message, Response};
pub use pattern::HostPattern;
pub use policy::{Route, RoutingPolicy};
pub use tabs::{TabOverrides, Transition};
pub use tracker::HostTracker;
pub use types::{Endpoint, FrameId, Profile, ProxyMode, ProxyScheme, TabId, MAIN_FRAME_ID};
