//! Cross-platform sleep/screensaver inhibition engine.
//!
//! Construct a [`Mode`], call [`Mode::enter`], and hold onto it for as
//! long as the system should stay awake; dropping it (or calling
//! [`Mode::exit`] explicitly) releases whatever inhibition it acquired.
//! [`register_default_methods`] must be called once, early in `main`,
//! before any Mode is entered.

pub mod dbus;
pub mod env;
pub mod error;
pub mod heartbeat;
pub mod method;
pub mod methods;
pub mod mode;
pub mod platform;
pub mod prioritize;
pub mod registry;
pub mod result;

pub use error::{ActivationError, ConfigError, DBusError, MethodError};
pub use method::{ActivationContext, MethodDescriptor, MethodInfo, MethodInstance};
pub use mode::{EnterError, Mode, ModeBuilder, OnFail};
pub use platform::PlatformTag;
pub use prioritize::Filter;
pub use registry::Registry;
pub use result::{ActivationResult, FailureTextStyle, MethodActivationResult, Stage};

/// Inhibits automatic idle suspend only.
pub const KEEP_RUNNING: &str = "keep.running";
/// Inhibits automatic idle suspend plus the screensaver/lock/display-off.
pub const KEEP_PRESENTING: &str = "keep.presenting";

/// Registers every shipped platform Method for both Mode names into the
/// process-wide [`registry::global`] registry. Idempotent to call once;
/// calling it twice fails with `ConfigError::DuplicateName` from the
/// second registration onward.
///
/// # Errors
/// Propagates `ConfigError` from [`registry::Registry::register`].
pub fn register_default_methods() -> Result<(), ConfigError> {
    let mut registry = registry::global().lock().unwrap();
    methods::register_all(&mut registry)
}

/// Convenience constructor for a `keep.running` [`ModeBuilder`].
#[must_use]
pub fn keep_running() -> ModeBuilder {
    Mode::builder(KEEP_RUNNING)
}

/// Convenience constructor for a `keep.presenting` [`ModeBuilder`].
#[must_use]
pub fn keep_presenting() -> ModeBuilder {
    Mode::builder(KEEP_PRESENTING)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_default_methods_populates_both_modes() {
        let mut registry = Registry::new();
        methods::register_all(&mut registry).unwrap();
        assert!(!registry.methods_for(KEEP_RUNNING).is_empty());
        assert!(!registry.methods_for(KEEP_PRESENTING).is_empty());
    }

    #[test]
    fn keep_running_and_keep_presenting_build_distinct_modes() {
        assert_eq!(keep_running().build().mode_name(), KEEP_RUNNING);
        assert_eq!(keep_presenting().build().mode_name(), KEEP_PRESENTING);
    }
}
