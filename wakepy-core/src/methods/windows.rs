//! Windows execution-state flags.
//!
//! `enter_mode` sets a thread-level execution state requesting
//! `ES_SYSTEM_REQUIRED` (and, for `keep.presenting`, `ES_DISPLAY_REQUIRED`
//! too) plus `ES_CONTINUOUS`; `exit_mode` clears it back to the
//! continuous-only baseline. The call is per-thread, so whichever thread
//! calls `enter_mode` must outlive the Active lifetime; the Mode
//! orchestrator drives `enter_mode`/`exit_mode` from the same caller
//! thread throughout, so no extra pinning is needed here.

use crate::error::MethodError;
use crate::method::{MethodDescriptor, MethodInstance};
use crate::methods::Scope;
use crate::platform::PlatformTag;

pub const METHOD_NAME: &str = "WindowsSetThreadExecutionState";

#[must_use]
pub fn descriptor(scope: Scope) -> MethodDescriptor {
    MethodDescriptor::builder(METHOD_NAME, scope.mode_name())
        .platforms([PlatformTag::Windows])
        .has_enter(true)
        .factory(move |_ctx| Box::new(imp::ExecutionStateGuard::new(scope)))
        .build()
}

#[cfg(target_os = "windows")]
mod imp {
    use super::{MethodError, MethodInstance, Scope};

    const ES_CONTINUOUS: u32 = 0x8000_0000;
    const ES_SYSTEM_REQUIRED: u32 = 0x0000_0001;
    const ES_DISPLAY_REQUIRED: u32 = 0x0000_0002;

    pub struct ExecutionStateGuard {
        scope: Scope,
        entered: bool,
    }

    impl ExecutionStateGuard {
        pub fn new(scope: Scope) -> Self {
            Self {
                scope,
                entered: false,
            }
        }

        fn flags(&self) -> u32 {
            let mut flags = ES_CONTINUOUS | ES_SYSTEM_REQUIRED;
            if self.scope == Scope::Presenting {
                flags |= ES_DISPLAY_REQUIRED;
            }
            flags
        }
    }

    impl MethodInstance for ExecutionStateGuard {
        fn enter_mode(&mut self) -> Result<(), MethodError> {
            // SAFETY: `SetThreadExecutionState` is documented to accept any
            // combination of the ES_* flags and simply returns the previous
            // state, or zero on failure; no pointers are involved.
            let previous = unsafe { windows_sys::Win32::System::Power::SetThreadExecutionState(self.flags()) };
            if previous == 0 {
                return Err(MethodError::EnterFailed("SetThreadExecutionState failed".into()));
            }
            self.entered = true;
            Ok(())
        }

        fn exit_mode(&mut self) -> Result<(), MethodError> {
            if !self.entered {
                return Ok(());
            }
            // SAFETY: restoring to the continuous-only baseline is always
            // well-defined.
            let previous = unsafe { windows_sys::Win32::System::Power::SetThreadExecutionState(ES_CONTINUOUS) };
            self.entered = false;
            if previous == 0 {
                return Err(MethodError::ExitFailed("SetThreadExecutionState failed while clearing flags".into()));
            }
            Ok(())
        }
    }
}

#[cfg(not(target_os = "windows"))]
mod imp {
    use super::{MethodError, MethodInstance, Scope};

    pub struct ExecutionStateGuard;

    impl ExecutionStateGuard {
        pub fn new(_scope: Scope) -> Self {
            Self
        }
    }

    impl MethodInstance for ExecutionStateGuard {
        fn caniuse(&mut self) -> Result<(), MethodError> {
            Err(MethodError::RequirementsFailed("SetThreadExecutionState is only available on Windows".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declares_windows_only() {
        let d = descriptor(Scope::Running);
        assert!(d.supports(PlatformTag::Windows));
        assert!(!d.supports(PlatformTag::Linux));
        assert!(!d.supports(PlatformTag::Macos));
    }

    #[test]
    fn is_a_valid_registration() {
        assert!(descriptor(Scope::Presenting).is_valid());
    }
}
