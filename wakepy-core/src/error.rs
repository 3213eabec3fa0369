//! Error taxonomy.
//!
//! Configuration errors are raised before any side effect and always
//! propagate to the caller. Per-attempt failures (platform, requirements,
//! activation) are never raised as errors; they are captured into a
//! [`crate::result::MethodActivationResult`] instead. [`ActivationError`]
//! is the sole error type raised out of the Mode orchestrator, and only
//! when every candidate failed and `on_fail = "error"`.

use thiserror::Error;

use crate::result::ActivationResult;

/// Raised while building a candidate list (registry load, prioritization),
/// before any Method is touched.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown method name {name:?} in mode {mode_name:?}")]
    UnknownMethodName { mode_name: String, name: String },

    #[error("method name {name:?} appears more than once in methods_priority")]
    DuplicatePriority { name: String },

    #[error("invalid methods_priority: {reason}")]
    InvalidMethodsPriority { reason: String },

    #[error("method name {name:?} is already registered for a mode")]
    DuplicateName { name: String },

    #[error("method {name:?} defines neither enter_mode nor heartbeat")]
    InvalidMethod { name: String },
}

/// Raised by a single Method's lifecycle operations.
#[derive(Debug, Error)]
pub enum MethodError {
    #[error("requirements not met: {0}")]
    RequirementsFailed(String),

    #[error("enter_mode failed: {0}")]
    EnterFailed(String),

    #[error("heartbeat failed: {0}")]
    HeartbeatFailed(String),

    #[error("exit_mode failed: {0}")]
    ExitFailed(String),
}

impl MethodError {
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            MethodError::RequirementsFailed(m)
            | MethodError::EnterFailed(m)
            | MethodError::HeartbeatFailed(m)
            | MethodError::ExitFailed(m) => m,
        }
    }
}

/// D-Bus transport errors.
///
/// These never escape the D-Bus adapter as-is; Methods map them into a
/// [`MethodError`] at the point of use (`ServiceUnknown`/`Disconnected` ⇒
/// `RequirementsFailed`, everything else during a call ⇒
/// `EnterFailed`/`ExitFailed`).
#[derive(Debug, Error)]
pub enum DBusError {
    #[error("D-Bus service unknown: {0}")]
    ServiceUnknown(String),

    #[error("D-Bus call timed out waiting for a reply")]
    NoReply,

    #[error("D-Bus call denied: {0}")]
    AccessDenied(String),

    #[error("D-Bus call had invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("D-Bus connection is disconnected")]
    Disconnected,

    #[error("D-Bus error {name}: {message}")]
    Other { name: String, message: String },
}

impl DBusError {
    /// `ServiceUnknown`/`Disconnected` mean the service genuinely isn't
    /// there, which is a precondition failure rather than a failed call.
    fn is_missing_service(&self) -> bool {
        matches!(self, DBusError::ServiceUnknown(_) | DBusError::Disconnected)
    }

    /// Maps a transport failure onto the Method lifecycle stage it was
    /// encountered at.
    #[must_use]
    pub fn into_requirements_failed(self) -> MethodError {
        MethodError::RequirementsFailed(self.to_string())
    }

    #[must_use]
    pub fn into_enter_failed(self) -> MethodError {
        MethodError::EnterFailed(self.to_string())
    }

    #[must_use]
    pub fn into_exit_failed(self) -> MethodError {
        MethodError::ExitFailed(self.to_string())
    }

    /// Maps an `enter_mode` call failure: `ServiceUnknown`/`Disconnected`
    /// ⇒ `RequirementsFailed`, everything else ⇒ `EnterFailed`.
    #[must_use]
    pub fn into_enter_call_failed(self) -> MethodError {
        if self.is_missing_service() {
            self.into_requirements_failed()
        } else {
            self.into_enter_failed()
        }
    }

    /// Maps an `exit_mode` call failure the same way
    /// [`DBusError::into_enter_call_failed`] does, but onto `ExitFailed`.
    #[must_use]
    pub fn into_exit_call_failed(self) -> MethodError {
        if self.is_missing_service() {
            self.into_requirements_failed()
        } else {
            self.into_exit_failed()
        }
    }
}

/// Raised from [`crate::mode::Mode::enter`] when activation fails and
/// `on_fail = OnFail::Error`.
#[derive(Debug, Error)]
#[error("failed to activate mode {}: {}", .0.mode_name, .0.get_failure_text(crate::result::FailureTextStyle::OneLine))]
pub struct ActivationError(pub ActivationResult);

impl ActivationError {
    #[must_use]
    pub fn result(&self) -> &ActivationResult {
        &self.0
    }

    #[must_use]
    pub fn into_result(self) -> ActivationResult {
        self.0
    }
}
