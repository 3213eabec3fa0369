//! In-process test doubles used to drive Mode activation scenarios
//! end-to-end without touching a real session bus or OS.
//!
//! These are not registered by [`crate::register_default_methods`]; tests
//! build a private [`crate::registry::Registry`] and register whichever
//! doubles the scenario needs.

use crate::error::MethodError;
use crate::method::{MethodDescriptor, MethodInstance};
use crate::platform::PlatformTag;

struct AlwaysSucceeds;
impl MethodInstance for AlwaysSucceeds {
    fn enter_mode(&mut self) -> Result<(), MethodError> {
        Ok(())
    }
}

/// A Method whose `caniuse` always raises `RequirementsFailed`.
struct FailsRequirements;
impl MethodInstance for FailsRequirements {
    fn caniuse(&mut self) -> Result<(), MethodError> {
        Err(MethodError::RequirementsFailed("test double: requirements never met".into()))
    }

    fn enter_mode(&mut self) -> Result<(), MethodError> {
        Ok(())
    }
}

/// A Method whose `enter_mode` always raises `EnterFailed`.
struct FailsEnter;
impl MethodInstance for FailsEnter {
    fn enter_mode(&mut self) -> Result<(), MethodError> {
        Err(MethodError::EnterFailed("test double: enter_mode always fails".into()))
    }
}

/// A Method with `heartbeat` only, no `enter_mode` — used to exercise
/// the heartbeat-only activation path.
struct HeartbeatOnly;
impl MethodInstance for HeartbeatOnly {
    fn heartbeat(&mut self) -> Result<(), MethodError> {
        Ok(())
    }
}

/// A Method whose initial heartbeat tick fails synchronously.
struct HeartbeatFailsImmediately;
impl MethodInstance for HeartbeatFailsImmediately {
    fn heartbeat(&mut self) -> Result<(), MethodError> {
        Err(MethodError::HeartbeatFailed("test double: heartbeat always fails".into()))
    }
}

/// Builds a descriptor for one of the named test doubles, bound to
/// `mode_name` and supported on every platform.
#[must_use]
pub fn descriptor(name: &'static str, mode_name: &'static str, kind: TestMethodKind) -> MethodDescriptor {
    let builder = MethodDescriptor::builder(name, mode_name).platforms([PlatformTag::Any]);
    match kind {
        TestMethodKind::AlwaysSucceeds => builder
            .has_enter(true)
            .factory(|_ctx| Box::new(AlwaysSucceeds))
            .build(),
        TestMethodKind::FailsRequirements => builder
            .has_enter(true)
            .factory(|_ctx| Box::new(FailsRequirements))
            .build(),
        TestMethodKind::FailsEnter => builder
            .has_enter(true)
            .factory(|_ctx| Box::new(FailsEnter))
            .build(),
        TestMethodKind::HeartbeatOnly => builder
            .has_heartbeat(true)
            .factory(|_ctx| Box::new(HeartbeatOnly))
            .build(),
        TestMethodKind::HeartbeatFailsImmediately => builder
            .has_heartbeat(true)
            .factory(|_ctx| Box::new(HeartbeatFailsImmediately))
            .build(),
    }
}

#[derive(Debug, Clone, Copy)]
pub enum TestMethodKind {
    AlwaysSucceeds,
    FailsRequirements,
    FailsEnter,
    HeartbeatOnly,
    HeartbeatFailsImmediately,
}
