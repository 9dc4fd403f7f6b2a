//! SelectProxy Policy Compiler
//!
//! Boundary serialization for the override engine: profile documents in,
//! PAC script text out.

pub mod pac;
pub mod profile;
pub mod targets;

pub use pac::{pac_for_profile, render_pac};
pub use profile::{load_profile, parse_storage, ProfileError, StorageSnapshot};
pub use targets::{clean_target, parse_targets, suggest_targets};
