//! macOS helper process.
//!
//! `enter_mode` spawns a long-lived `caffeinate` helper and retains its
//! PID; `exit_mode` terminates it. `caffeinate -i` blocks idle sleep only
//! (`keep.running`); `caffeinate -d -i -s` additionally blocks display
//! sleep and system sleep (`keep.presenting`).

use std::process::{Child, Command, Stdio};

use crate::error::MethodError;
use crate::method::{MethodDescriptor, MethodInstance};
use crate::methods::Scope;
use crate::platform::PlatformTag;

pub const METHOD_NAME: &str = "CaffeinateHelperProcess";

#[must_use]
pub fn descriptor(scope: Scope) -> MethodDescriptor {
    MethodDescriptor::builder(METHOD_NAME, scope.mode_name())
        .platforms([PlatformTag::Macos])
        .has_enter(true)
        .factory(move |_ctx| Box::new(CaffeinateGuard::new(scope)))
        .build()
}

fn caffeinate_args(scope: Scope) -> &'static [&'static str] {
    match scope {
        Scope::Running => &["-i"],
        Scope::Presenting => &["-d", "-i", "-s"],
    }
}

pub struct CaffeinateGuard {
    scope: Scope,
    child: Option<Child>,
}

impl CaffeinateGuard {
    #[must_use]
    pub fn new(scope: Scope) -> Self {
        Self { scope, child: None }
    }
}

impl MethodInstance for CaffeinateGuard {
    fn caniuse(&mut self) -> Result<(), MethodError> {
        which::which("caffeinate")
            .map(|_| ())
            .map_err(|e| MethodError::RequirementsFailed(format!("caffeinate not found: {e}")))
    }

    fn enter_mode(&mut self) -> Result<(), MethodError> {
        let child = Command::new("caffeinate")
            .args(caffeinate_args(self.scope))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| MethodError::EnterFailed(format!("failed to spawn caffeinate: {e}")))?;
        self.child = Some(child);
        Ok(())
    }

    fn exit_mode(&mut self) -> Result<(), MethodError> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };

        // Already exited on its own: nothing to report.
        if let Ok(Some(_)) = child.try_wait() {
            return Ok(());
        }

        child
            .kill()
            .map_err(|e| MethodError::ExitFailed(format!("failed to terminate caffeinate: {e}")))?;
        let status = child
            .wait()
            .map_err(|e| MethodError::ExitFailed(format!("failed to reap caffeinate: {e}")))?;

        if status.success() {
            Ok(())
        } else {
            Err(MethodError::ExitFailed(format!("caffeinate exited with {status}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declares_macos_only() {
        let d = descriptor(Scope::Running);
        assert!(d.supports(PlatformTag::Macos));
        assert!(!d.supports(PlatformTag::Linux));
        assert!(!d.supports(PlatformTag::Windows));
    }

    #[test]
    fn running_uses_idle_only_flag() {
        assert_eq!(caffeinate_args(Scope::Running), &["-i"]);
    }

    #[test]
    fn presenting_blocks_display_and_system_sleep() {
        assert_eq!(caffeinate_args(Scope::Presenting), &["-d", "-i", "-s"]);
    }

    #[test]
    fn exit_before_enter_is_a_noop() {
        let mut guard = CaffeinateGuard::new(Scope::Running);
        assert!(guard.exit_mode().is_ok());
    }
}
