//! The mode-name → Methods registry.
//!
//! Registration order is preserved (each mode's methods are stored in a
//! plain `Vec`, appended to in `register` order) and is the deterministic
//! tie-break used by [`crate::prioritize::plan`].

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use crate::error::ConfigError;
use crate::method::MethodDescriptor;

/// Process-wide, read-mostly mapping of mode name to the Methods declared
/// for it. Construct your own instance in tests; production code goes
/// through [`global`] plus [`crate::register_default_methods`].
#[derive(Default)]
pub struct Registry {
    by_mode: HashMap<&'static str, Vec<MethodDescriptor>>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `descriptor` to its mode's list.
    ///
    /// # Errors
    /// `ConfigError::InvalidMethod` if neither `enter_mode` nor
    /// `heartbeat` is defined; `ConfigError::DuplicateName` if any mode
    /// already holds a Method with this name.
    pub fn register(&mut self, descriptor: MethodDescriptor) -> Result<(), ConfigError> {
        if !descriptor.is_valid() {
            return Err(ConfigError::InvalidMethod {
                name: descriptor.name.to_owned(),
            });
        }

        let already_registered = self
            .by_mode
            .values()
            .flatten()
            .any(|existing| existing.name == descriptor.name);
        if already_registered {
            return Err(ConfigError::DuplicateName {
                name: descriptor.name.to_owned(),
            });
        }

        self.by_mode.entry(descriptor.mode_name).or_default().push(descriptor);
        Ok(())
    }

    /// Methods declared for `mode_name`, in registration order. Empty if
    /// the mode name is unknown.
    #[must_use]
    pub fn methods_for(&self, mode_name: &str) -> Vec<MethodDescriptor> {
        self.by_mode.get(mode_name).cloned().unwrap_or_default()
    }

    #[must_use]
    pub fn find(&self, mode_name: &str, method_name: &str) -> Option<MethodDescriptor> {
        self.by_mode
            .get(mode_name)?
            .iter()
            .find(|m| m.name == method_name)
            .cloned()
    }
}

static GLOBAL: OnceLock<Mutex<Registry>> = OnceLock::new();

/// The process-wide registry, created empty on first access.
///
/// Nothing registers itself implicitly at load time. Call
/// [`crate::register_default_methods`] once, early in `main`, to populate
/// it with the shipped platform Methods.
#[must_use]
pub fn global() -> &'static Mutex<Registry> {
    GLOBAL.get_or_init(|| Mutex::new(Registry::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::testing::{descriptor, TestMethodKind};

    #[test]
    fn register_preserves_order() {
        let mut registry = Registry::new();
        registry.register(descriptor("a", "keep.running", TestMethodKind::AlwaysSucceeds)).unwrap();
        registry.register(descriptor("b", "keep.running", TestMethodKind::AlwaysSucceeds)).unwrap();
        registry.register(descriptor("c", "keep.running", TestMethodKind::AlwaysSucceeds)).unwrap();

        let names: Vec<_> = registry.methods_for("keep.running").iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn duplicate_name_across_modes_rejected() {
        let mut registry = Registry::new();
        registry.register(descriptor("a", "keep.running", TestMethodKind::AlwaysSucceeds)).unwrap();
        let err = registry
            .register(descriptor("a", "keep.presenting", TestMethodKind::AlwaysSucceeds))
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateName { .. }));
    }

    #[test]
    fn unknown_mode_yields_empty_list() {
        let registry = Registry::new();
        assert!(registry.methods_for("no.such.mode").is_empty());
    }

    #[test]
    fn invalid_method_without_enter_or_heartbeat_rejected() {
        struct NoOp;
        impl crate::method::MethodInstance for NoOp {}

        let mut registry = Registry::new();
        let bad = crate::method::MethodDescriptor::builder("nothing", "keep.running")
            .platforms([crate::platform::PlatformTag::Any])
            .factory(|_ctx| Box::new(NoOp))
            .build();
        let err = registry.register(bad).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidMethod { .. }));
    }
}
