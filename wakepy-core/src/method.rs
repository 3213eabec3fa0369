//! The Method contract.
//!
//! A Method is modeled as a value, not a subclass: [`MethodDescriptor`] is
//! the class-level record (name, mode, supported platforms, which
//! lifecycle operations exist), and [`MethodInstance`] is the per-instance
//! trait object the orchestrator drives through one activation attempt.
//! `MethodDescriptor::build` constructs a fresh [`MethodInstance`] for
//! every activation; instances are never reused across Mode re-entries.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dbus::Adapter;
use crate::error::MethodError;
use crate::platform::PlatformTag;

pub mod fake;
pub mod testing;

/// Per-activation context threaded into every Method's factory, carrying
/// an optional Mode-level `dbus_adapter` override.
///
/// Methods that don't talk to D-Bus ignore this entirely; the
/// Freedesktop and GNOME Methods use `dbus_adapter` when set and fall
/// back to connecting [`crate::dbus::session::SessionAdapter`]
/// themselves, lazily, on first use otherwise.
#[derive(Clone, Default)]
pub struct ActivationContext {
    pub dbus_adapter: Option<Arc<dyn Adapter>>,
}

/// Default heartbeat period when a Method does not override it.
pub const DEFAULT_HEARTBEAT_PERIOD: Duration = Duration::from_secs(55);

/// Per-instance lifecycle operations the orchestrator invokes, in order:
/// `caniuse` → `enter_mode` → (scheduled) `heartbeat` → `exit_mode`.
///
/// All four have a default no-op implementation. Whether `enter_mode` or
/// `heartbeat` is "really" defined for a given Method is tracked
/// separately on [`MethodDescriptor`] (`has_enter` / `has_heartbeat`),
/// since that distinction drives the activation algorithm and the
/// "at least one of enter/heartbeat" registration invariant; `caniuse`
/// and `exit_mode` have no such distinction — both simply default to a
/// no-op pass.
pub trait MethodInstance: Send {
    fn caniuse(&mut self) -> Result<(), MethodError> {
        Ok(())
    }

    fn enter_mode(&mut self) -> Result<(), MethodError> {
        Ok(())
    }

    fn heartbeat(&mut self) -> Result<(), MethodError> {
        Ok(())
    }

    fn exit_mode(&mut self) -> Result<(), MethodError> {
        Ok(())
    }
}

/// Lightweight, `Clone`/`Serialize`-able handle identifying a Method,
/// suitable for embedding in [`crate::result::ActivationResult`] and for
/// `Display`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodInfo {
    pub name: String,
    pub mode_name: String,
}

impl std::fmt::Display for MethodInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Class-level descriptor for one activation technique.
///
/// Built via [`MethodDescriptor::builder`] and registered once at
/// `register_default_methods` time (or in tests); never mutated after
/// registration.
#[derive(Clone)]
pub struct MethodDescriptor {
    pub name: &'static str,
    pub mode_name: &'static str,
    pub supported_platforms: Vec<PlatformTag>,
    pub has_enter: bool,
    pub has_heartbeat: bool,
    pub heartbeat_period: Duration,
    factory: Arc<dyn Fn(&ActivationContext) -> Box<dyn MethodInstance> + Send + Sync>,
}

impl MethodDescriptor {
    #[must_use]
    pub fn builder(name: &'static str, mode_name: &'static str) -> MethodDescriptorBuilder {
        MethodDescriptorBuilder {
            name,
            mode_name,
            supported_platforms: vec![],
            has_enter: false,
            has_heartbeat: false,
            heartbeat_period: DEFAULT_HEARTBEAT_PERIOD,
            factory: None,
        }
    }

    #[must_use]
    pub fn info(&self) -> MethodInfo {
        MethodInfo {
            name: self.name.to_owned(),
            mode_name: self.mode_name.to_owned(),
        }
    }

    #[must_use]
    pub fn supports(&self, actual: PlatformTag) -> bool {
        self.supported_platforms
            .iter()
            .any(|&declared| PlatformTag::matches(actual, declared))
    }

    #[must_use]
    pub fn build(&self, context: &ActivationContext) -> Box<dyn MethodInstance> {
        (self.factory)(context)
    }

    /// A Method with neither `enter_mode` nor `heartbeat` defined is a
    /// configuration error.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.has_enter || self.has_heartbeat
    }
}

pub struct MethodDescriptorBuilder {
    name: &'static str,
    mode_name: &'static str,
    supported_platforms: Vec<PlatformTag>,
    has_enter: bool,
    has_heartbeat: bool,
    heartbeat_period: Duration,
    factory: Option<Arc<dyn Fn(&ActivationContext) -> Box<dyn MethodInstance> + Send + Sync>>,
}

impl MethodDescriptorBuilder {
    #[must_use]
    pub fn platforms(mut self, platforms: impl IntoIterator<Item = PlatformTag>) -> Self {
        self.supported_platforms = platforms.into_iter().collect();
        self
    }

    #[must_use]
    pub fn has_enter(mut self, value: bool) -> Self {
        self.has_enter = value;
        self
    }

    #[must_use]
    pub fn has_heartbeat(mut self, value: bool) -> Self {
        self.has_heartbeat = value;
        self
    }

    #[must_use]
    pub fn heartbeat_period(mut self, period: Duration) -> Self {
        self.heartbeat_period = period;
        self
    }

    #[must_use]
    pub fn factory(
        mut self,
        factory: impl Fn(&ActivationContext) -> Box<dyn MethodInstance> + Send + Sync + 'static,
    ) -> Self {
        self.factory = Some(Arc::new(factory));
        self
    }

    /// Finishes the descriptor. Panics if `factory` was never set — this
    /// is a programmer error (every shipped Method sets it), not a
    /// runtime configuration error.
    #[must_use]
    pub fn build(self) -> MethodDescriptor {
        MethodDescriptor {
            name: self.name,
            mode_name: self.mode_name,
            supported_platforms: self.supported_platforms,
            has_enter: self.has_enter,
            has_heartbeat: self.has_heartbeat,
            heartbeat_period: self.heartbeat_period,
            factory: self.factory.expect("MethodDescriptorBuilder::factory was never called"),
        }
    }
}
