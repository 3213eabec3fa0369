//! `WakepyFakeSuccess`, the built-in no-op Method.
//!
//! Never registered into the process-wide registry and never auto-selected;
//! [`crate::prioritize::plan`] prepends it to the candidate list itself
//! when `WAKEPY_FAKE_SUCCESS` is truthy.

use crate::error::MethodError;
use crate::method::{MethodDescriptor, MethodInstance};
use crate::platform::PlatformTag;

pub const FAKE_SUCCESS_METHOD_NAME: &str = "WakepyFakeSuccess";

struct FakeSuccess;

impl MethodInstance for FakeSuccess {
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

/// Builds a fake-success descriptor scoped to `mode_name`. One is built
/// per activation attempt since `mode_name` varies by Mode.
#[must_use]
pub fn descriptor(mode_name: &'static str) -> MethodDescriptor {
    MethodDescriptor::builder(FAKE_SUCCESS_METHOD_NAME, mode_name)
        .platforms([PlatformTag::Any])
        .has_enter(true)
        .factory(|_ctx| Box::new(FakeSuccess))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_fails() {
        let d = descriptor("keep.running");
        let mut instance = d.build(&crate::method::ActivationContext::default());
        assert!(instance.caniuse().is_ok());
        assert!(instance.enter_mode().is_ok());
        assert!(instance.heartbeat().is_ok());
        assert!(instance.exit_mode().is_ok());
    }
}
