//! The Mode activation engine: builds a candidate list, tries each
//! Method in order, retains the winner, and guarantees cleanup on exit.
//!
//! `Mode` is itself the RAII guard: `enter` performs activation and
//! `exit` performs deactivation, but `exit` also runs from `Drop` so
//! cleanup happens on every path, including an unwinding panic, the way
//! [`crate::dbus::Adapter`]'s only real implementation is itself acquired
//! and released around a scope.

use std::sync::Arc;

use tracing::{info, warn};

use crate::dbus::Adapter;
use crate::env;
use crate::error::{ActivationError, ConfigError, MethodError};
use crate::heartbeat::HeartbeatTask;
use crate::method::{ActivationContext, MethodDescriptor, MethodInfo, MethodInstance};
use crate::platform::{self, PlatformTag};
use crate::prioritize::{self, Filter};
use crate::registry::Registry;
use crate::result::{ActivationResult, MethodActivationResult, Stage};

/// What to do when every candidate fails to activate.
pub enum OnFail {
    /// Raise [`ActivationError`] from [`Mode::enter`].
    Error,
    /// Log a warning built from `result.get_failure_text()`; leave the
    /// Mode inactive.
    Warn,
    /// Leave the Mode inactive, silently.
    Pass,
    /// Invoke the callback with the aggregate result; leave the Mode
    /// inactive. Exceptions from the callback propagate.
    Callback(Box<dyn FnMut(&ActivationResult) + Send>),
}

impl std::fmt::Debug for OnFail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OnFail::Error => write!(f, "OnFail::Error"),
            OnFail::Warn => write!(f, "OnFail::Warn"),
            OnFail::Pass => write!(f, "OnFail::Pass"),
            OnFail::Callback(_) => write!(f, "OnFail::Callback(..)"),
        }
    }
}

impl Default for OnFail {
    fn default() -> Self {
        OnFail::Warn
    }
}

/// A caller-held scope during which sleep (and optionally the
/// screensaver/display) is inhibited.
pub struct Mode {
    mode_name: &'static str,
    filter: Filter,
    methods_priority: Vec<String>,
    on_fail: OnFail,
    dbus_adapter: Option<Arc<dyn Adapter>>,

    active: bool,
    result: Option<ActivationResult>,
    method: Option<MethodInfo>,
    instance: Option<Box<dyn MethodInstance>>,
    heartbeat: Option<HeartbeatTask>,
}

impl Mode {
    #[must_use]
    pub fn builder(mode_name: &'static str) -> ModeBuilder {
        ModeBuilder {
            mode_name,
            filter: Filter::default(),
            methods_priority: vec![],
            on_fail: OnFail::default(),
            dbus_adapter: None,
        }
    }

    #[must_use]
    pub fn mode_name(&self) -> &'static str {
        self.mode_name
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[must_use]
    pub fn result(&self) -> Option<&ActivationResult> {
        self.result.as_ref()
    }

    #[must_use]
    pub fn method(&self) -> Option<&MethodInfo> {
        self.method.as_ref()
    }

    /// Runs the activation algorithm against the process-wide registry.
    ///
    /// # Errors
    /// Propagates a [`ConfigError`] raised while building the candidate
    /// list (unknown names, bad priority); raises [`ActivationError`] when
    /// every candidate fails and `on_fail = OnFail::Error`.
    pub fn enter(&mut self) -> Result<&mut Self, EnterError> {
        let registry = crate::registry::global().lock().unwrap();
        self.enter_with(&registry)
    }

    /// Runs activation against a caller-supplied registry (used by tests
    /// and by anything that wants an isolated, non-global method set).
    ///
    /// # Errors
    /// See [`Mode::enter`].
    pub fn enter_with(&mut self, registry: &Registry) -> Result<&mut Self, EnterError> {
        let fake_success = env::fake_success_requested();
        let force_failure = env::force_failure_requested();
        let current_platform = platform::current();

        let plan = prioritize::plan(
            registry,
            self.mode_name,
            &self.filter,
            &self.methods_priority,
            fake_success,
            current_platform,
        )?;

        let context = ActivationContext {
            dbus_adapter: self.dbus_adapter.clone(),
        };

        let mut results = plan.platform_unsupported;
        let mut winner: Option<(MethodDescriptor, Box<dyn MethodInstance>)> = None;

        for candidate in plan.candidates {
            let mut instance = candidate.build(&context);
            let outcome = activate_one(self.mode_name, &candidate, instance.as_mut(), force_failure);
            let succeeded = outcome.success;
            results.push(outcome);
            if succeeded {
                winner = Some((candidate, instance));
                break;
            }
        }

        let winner_info = winner.as_ref().map(|(d, _)| d.info());
        let result = ActivationResult::new(self.mode_name, results).with_winner(winner_info.clone());

        let Some((descriptor, instance)) = winner else {
            self.active = false;
            self.result = Some(result.clone());
            return match &mut self.on_fail {
                OnFail::Error => Err(EnterError::Activation(ActivationError(result))),
                OnFail::Warn => {
                    warn!(mode = self.mode_name, "{}", result.get_failure_text(crate::result::FailureTextStyle::OneLine));
                    Ok(self)
                },
                OnFail::Pass => Ok(self),
                OnFail::Callback(callback) => {
                    callback(&result);
                    Ok(self)
                },
            };
        };

        if descriptor.has_heartbeat {
            self.heartbeat = Some(HeartbeatTask::spawn(descriptor.name.to_owned(), descriptor.heartbeat_period, instance));
        } else {
            self.instance = Some(instance);
        }
        self.method = winner_info;
        self.active = true;
        self.result = Some(result);
        Ok(self)
    }

    /// Deactivates the Mode: stops the heartbeat (bounded wait), invokes
    /// `exit_mode` on the winner, and clears runtime state. Always runs
    /// to completion; `exit_mode` failures are logged, never raised.
    pub fn exit(&mut self) {
        if let Some(heartbeat) = self.heartbeat.take() {
            if let Some(instance) = heartbeat.stop() {
                self.instance = Some(instance);
            }
        }

        if let Some(mut instance) = self.instance.take() {
            if let Err(err) = instance.exit_mode() {
                warn!(mode = self.mode_name, error = %err, "exit_mode failed; continuing cleanup");
            } else if let Some(method) = &self.method {
                info!(mode = self.mode_name, method = %method.name, "deactivated");
            }
        }

        self.method = None;
        self.active = false;
    }
}

impl Drop for Mode {
    fn drop(&mut self) {
        if self.active || self.instance.is_some() || self.heartbeat.is_some() {
            self.exit();
        }
    }
}

/// Errors raised directly from [`Mode::enter`]/[`Mode::enter_with`],
/// distinct from the [`MethodActivationResult`]s captured per attempt.
#[derive(Debug, thiserror::Error)]
pub enum EnterError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Activation(#[from] ActivationError),
}

/// Runs the single-method activation sub-procedure: force-failure check,
/// `caniuse`, `enter_mode`, and (if declared) the synchronous initial
/// heartbeat tick.
fn activate_one(
    mode_name: &str,
    descriptor: &MethodDescriptor,
    instance: &mut dyn MethodInstance,
    force_failure: bool,
) -> MethodActivationResult {
    if force_failure {
        return MethodActivationResult::failure(
            mode_name,
            descriptor.name,
            Stage::Activation,
            "forced failure".to_owned(),
        );
    }

    if let Err(err) = instance.caniuse() {
        return MethodActivationResult::failure(mode_name, descriptor.name, Stage::Requirements, err.message().to_owned());
    }

    if descriptor.has_enter {
        if let Err(err) = instance.enter_mode() {
            return MethodActivationResult::failure(mode_name, descriptor.name, Stage::Activation, err.message().to_owned());
        }
    }

    if descriptor.has_heartbeat {
        if let Err(err) = run_initial_heartbeat(instance) {
            // Activation considered failed: best-effort exit_mode, then
            // report as an activation-stage failure.
            let _ = instance.exit_mode();
            return MethodActivationResult::failure(mode_name, descriptor.name, Stage::Activation, err.message().to_owned());
        }
    }

    MethodActivationResult::success(mode_name, descriptor.name)
}

/// The initial heartbeat tick runs synchronously, inline, as part of
/// activation, before the Mode is considered Active. Subsequent ticks
/// run on their declared period on the heartbeat thread.
fn run_initial_heartbeat(instance: &mut dyn MethodInstance) -> Result<(), MethodError> {
    instance.heartbeat()
}

pub struct ModeBuilder {
    mode_name: &'static str,
    filter: Filter,
    methods_priority: Vec<String>,
    on_fail: OnFail,
    dbus_adapter: Option<Arc<dyn Adapter>>,
}

impl ModeBuilder {
    #[must_use]
    pub fn methods(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.filter = Filter::Methods(names.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn omit(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.filter = Filter::Omit(names.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn methods_priority(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.methods_priority = names.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn on_fail(mut self, on_fail: OnFail) -> Self {
        self.on_fail = on_fail;
        self
    }

    #[must_use]
    pub fn dbus_adapter(mut self, adapter: Arc<dyn Adapter>) -> Self {
        self.dbus_adapter = Some(adapter);
        self
    }

    #[must_use]
    pub fn build(self) -> Mode {
        Mode {
            mode_name: self.mode_name,
            filter: self.filter,
            methods_priority: self.methods_priority,
            on_fail: self.on_fail,
            dbus_adapter: self.dbus_adapter,
            active: false,
            result: None,
            method: None,
            instance: None,
            heartbeat: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;
    use crate::method::testing::{descriptor, TestMethodKind};
    use crate::registry::Registry;

    fn registry_with(methods: &[(&'static str, TestMethodKind)], mode_name: &'static str) -> Registry {
        let mut registry = Registry::new();
        for (name, kind) in methods {
            registry.register(descriptor(name, mode_name, *kind)).unwrap();
        }
        registry
    }

    #[test]
    #[serial]
    fn s1_fake_success() {
        std::env::set_var(env::FAKE_SUCCESS, "yes");
        std::env::remove_var(env::FORCE_FAILURE);

        let registry = registry_with(&[("A", TestMethodKind::AlwaysSucceeds)], "keep.running");
        let mut mode = Mode::builder("keep.running").build();
        mode.enter_with(&registry).unwrap();

        let result = mode.result().unwrap();
        assert!(result.success);
        assert!(!result.real_success);
        assert_eq!(mode.method().unwrap().name, crate::method::fake::FAKE_SUCCESS_METHOD_NAME);

        mode.exit();
        std::env::remove_var(env::FAKE_SUCCESS);
    }

    #[test]
    #[serial]
    fn s2_forced_failure_overrides_fake_success() {
        std::env::set_var(env::FAKE_SUCCESS, "1");
        std::env::set_var(env::FORCE_FAILURE, "1");

        let registry = registry_with(&[("A", TestMethodKind::AlwaysSucceeds)], "keep.presenting");
        let mut mode = Mode::builder("keep.presenting").on_fail(OnFail::Pass).build();
        mode.enter_with(&registry).unwrap();

        let result = mode.result().unwrap();
        assert!(!result.success);
        assert!(!mode.is_active());

        std::env::remove_var(env::FAKE_SUCCESS);
        std::env::remove_var(env::FORCE_FAILURE);
    }

    #[test]
    #[serial]
    fn s3_priority_and_wildcard() {
        std::env::remove_var(env::FAKE_SUCCESS);
        std::env::remove_var(env::FORCE_FAILURE);

        let registry = registry_with(
            &[
                ("A", TestMethodKind::AlwaysSucceeds),
                ("B", TestMethodKind::FailsEnter),
                ("C", TestMethodKind::FailsEnter),
            ],
            "keep.running",
        );
        let mut mode = Mode::builder("keep.running")
            .methods_priority(["C", "*", "A"])
            .build();
        mode.enter_with(&registry).unwrap();

        let result = mode.result().unwrap();
        assert_eq!(result.results.len(), 3);
        let order: Vec<_> = result.results.iter().map(|r| r.method_name.as_str()).collect();
        assert_eq!(order, vec!["C", "B", "A"]);
        assert_eq!(mode.method().unwrap().name, "A");
    }

    #[test]
    #[serial]
    fn s4_on_fail_error() {
        std::env::remove_var(env::FAKE_SUCCESS);
        std::env::remove_var(env::FORCE_FAILURE);

        let registry = registry_with(&[("A", TestMethodKind::FailsEnter)], "keep.running");
        let mut mode = Mode::builder("keep.running").on_fail(OnFail::Error).build();
        let err = mode.enter_with(&registry).unwrap_err();
        assert!(matches!(err, EnterError::Activation(_)));
    }

    #[test]
    #[serial]
    fn s5_unsupported_platform_is_not_tried() {
        std::env::remove_var(env::FAKE_SUCCESS);
        std::env::remove_var(env::FORCE_FAILURE);

        let mut registry = Registry::new();
        registry
            .register(
                crate::method::MethodDescriptor::builder("windows-only", "keep.running")
                    .platforms([PlatformTag::Windows])
                    .has_enter(true)
                    .factory(|ctx| descriptor("windows-only", "keep.running", TestMethodKind::AlwaysSucceeds).build(ctx))
                    .build(),
            )
            .unwrap();

        let mut mode = Mode::builder("keep.running").on_fail(OnFail::Pass).build();
        mode.enter_with(&registry).unwrap();

        let result = mode.result().unwrap();
        if platform::current() != PlatformTag::Windows {
            assert!(!result.success);
            assert_eq!(result.results.len(), 1);
            assert_eq!(result.results[0].stage, Stage::PlatformSupport);
        }
    }

    #[test]
    #[serial]
    fn heartbeat_only_method_can_activate() {
        std::env::remove_var(env::FAKE_SUCCESS);
        std::env::remove_var(env::FORCE_FAILURE);

        let registry = registry_with(&[("hb", TestMethodKind::HeartbeatOnly)], "keep.running");
        let mut mode = Mode::builder("keep.running").build();
        mode.enter_with(&registry).unwrap();
        assert!(mode.is_active());
        mode.exit();
        assert!(!mode.is_active());
    }
}
