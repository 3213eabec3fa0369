//! Concrete Method families: one module per technique.
//!
//! Each module exposes a `descriptor(mode_name) -> MethodDescriptor`
//! (or one per [`Scope`] for the two Methods whose behavior differs
//! between `keep.running` and `keep.presenting`). [`register_all`] wires
//! every shipped Method into a [`Registry`] in a fixed declaration order
//! — Windows first, then macOS, then the two D-Bus-based Linux/BSD
//! Methods — which becomes the deterministic tie-break when no explicit
//! priority is given.

pub mod freedesktop;
pub mod gnome;
pub mod macos;
pub mod windows;

use crate::error::ConfigError;
use crate::registry::Registry;

/// What a Method should keep awake: matches the two shipped Mode names
/// onto the scope each concrete Method technique needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// `keep.running`: inhibit automatic idle suspend only.
    Running,
    /// `keep.presenting`: also inhibit screensaver/lock/display-off.
    Presenting,
}

impl Scope {
    #[must_use]
    pub fn mode_name(self) -> &'static str {
        match self {
            Scope::Running => crate::KEEP_RUNNING,
            Scope::Presenting => crate::KEEP_PRESENTING,
        }
    }
}

/// Registers every shipped Method for both Mode names into `registry`.
///
/// Nothing registers itself implicitly at module load; callers go
/// through this explicit entry point (or the higher-level
/// [`crate::register_default_methods`]) to avoid hidden cross-module
/// init order.
pub fn register_all(registry: &mut Registry) -> Result<(), ConfigError> {
    for scope in [Scope::Running, Scope::Presenting] {
        registry.register(windows::descriptor(scope))?;
        registry.register(macos::descriptor(scope))?;
        registry.register(freedesktop::descriptor(scope))?;
        registry.register(gnome::descriptor(scope))?;
    }
    Ok(())
}
