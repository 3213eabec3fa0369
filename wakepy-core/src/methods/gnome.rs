//! GNOME `SessionManager` inhibit.
//!
//! Calls `org.gnome.SessionManager.Inhibit(app, toplevel_xid, reason,
//! flags) -> cookie` on entry and `Uninhibit(cookie)` on exit. `flags` is
//! a bitmask: `keep.running` sets only the suspend-inhibit bit,
//! `keep.presenting` additionally sets the idle-inhibit bit.

use std::sync::Arc;

use crate::dbus::session::SessionAdapter;
use crate::dbus::{Adapter, Bus, Call, Value};
use crate::error::MethodError;
use crate::method::{ActivationContext, MethodDescriptor, MethodInstance};
use crate::methods::Scope;
use crate::platform::PlatformTag;

pub const METHOD_NAME: &str = "GnomeSessionManagerInhibit";

const SERVICE: &str = "org.gnome.SessionManager";
const OBJECT_PATH: &str = "/org/gnome/SessionManager";
const INTERFACE: &str = "org.gnome.SessionManager";
const APP_NAME: &str = "wakepy";
const REASON: &str = "wakepy keeps the system awake";
const TOPLEVEL_XID: u32 = 0;

/// `org.gnome.SessionManager` inhibit flag bits.
const INHIBIT_SUSPEND: u32 = 1 << 2;
const INHIBIT_IDLE: u32 = 1 << 3;

fn flags(scope: Scope) -> u32 {
    match scope {
        Scope::Running => INHIBIT_SUSPEND,
        Scope::Presenting => INHIBIT_SUSPEND | INHIBIT_IDLE,
    }
}

#[must_use]
pub fn descriptor(scope: Scope) -> MethodDescriptor {
    MethodDescriptor::builder(METHOD_NAME, scope.mode_name())
        .platforms([PlatformTag::Linux])
        .has_enter(true)
        .factory(move |ctx| Box::new(GnomeInhibitGuard::new(scope, ctx)))
        .build()
}

pub struct GnomeInhibitGuard {
    scope: Scope,
    adapter_override: Option<Arc<dyn Adapter>>,
    adapter: Option<Arc<dyn Adapter>>,
    cookie: Option<u32>,
}

impl GnomeInhibitGuard {
    #[must_use]
    pub fn new(scope: Scope, ctx: &ActivationContext) -> Self {
        Self {
            scope,
            adapter_override: ctx.dbus_adapter.clone(),
            adapter: None,
            cookie: None,
        }
    }

    fn adapter(&mut self) -> Result<Arc<dyn Adapter>, MethodError> {
        if let Some(adapter) = &self.adapter {
            return Ok(Arc::clone(adapter));
        }
        let adapter = match &self.adapter_override {
            Some(a) => Arc::clone(a),
            None => Arc::new(SessionAdapter::connect().map_err(crate::error::DBusError::into_requirements_failed)?)
                as Arc<dyn Adapter>,
        };
        self.adapter = Some(Arc::clone(&adapter));
        Ok(adapter)
    }
}

impl MethodInstance for GnomeInhibitGuard {
    fn caniuse(&mut self) -> Result<(), MethodError> {
        self.adapter().map(|_| ())
    }

    fn enter_mode(&mut self) -> Result<(), MethodError> {
        let adapter = self.adapter()?;
        let reply = adapter
            .call(Call {
                bus: Bus::Session,
                service: SERVICE,
                object_path: OBJECT_PATH,
                interface: INTERFACE,
                member: "Inhibit",
                args: &[
                    Value::Str(APP_NAME.to_owned()),
                    Value::U32(TOPLEVEL_XID),
                    Value::Str(REASON.to_owned()),
                    Value::U32(flags(self.scope)),
                ],
            })
            .map_err(crate::error::DBusError::into_enter_call_failed)?;

        let cookie = reply
            .first()
            .and_then(Value::as_u32)
            .ok_or_else(|| MethodError::EnterFailed("Inhibit did not return a cookie".into()))?;
        self.cookie = Some(cookie);
        Ok(())
    }

    fn exit_mode(&mut self) -> Result<(), MethodError> {
        let Some(cookie) = self.cookie.take() else {
            return Ok(());
        };
        let adapter = self.adapter()?;
        adapter
            .call(Call {
                bus: Bus::Session,
                service: SERVICE,
                object_path: OBJECT_PATH,
                interface: INTERFACE,
                member: "Uninhibit",
                args: &[Value::U32(cookie)],
            })
            .map_err(crate::error::DBusError::into_exit_call_failed)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dbus::fake::FakeAdapter;

    #[test]
    fn declares_linux_only() {
        let d = descriptor(Scope::Running);
        assert!(d.supports(PlatformTag::Linux));
        assert!(!d.supports(PlatformTag::Freebsd));
    }

    #[test]
    fn presenting_sets_both_flag_bits() {
        assert_eq!(flags(Scope::Presenting), INHIBIT_SUSPEND | INHIBIT_IDLE);
        assert_eq!(flags(Scope::Running), INHIBIT_SUSPEND);
    }

    #[test]
    fn enter_then_exit_round_trips_the_cookie() {
        let adapter: Arc<dyn Adapter> = Arc::new(FakeAdapter::always_replying(vec![Value::U32(7)]));
        let ctx = ActivationContext {
            dbus_adapter: Some(adapter),
        };
        let mut guard = GnomeInhibitGuard::new(Scope::Presenting, &ctx);
        guard.enter_mode().unwrap();
        assert_eq!(guard.cookie, Some(7));
        guard.exit_mode().unwrap();
        assert_eq!(guard.cookie, None);
    }

    #[test]
    fn service_unknown_maps_to_requirements_failed() {
        let adapter: Arc<dyn Adapter> = Arc::new(FakeAdapter::always_failing(crate::dbus::fake::FakeError::ServiceUnknown));
        let ctx = ActivationContext {
            dbus_adapter: Some(adapter),
        };
        let mut guard = GnomeInhibitGuard::new(Scope::Running, &ctx);
        let err = guard.enter_mode().unwrap_err();
        assert!(matches!(err, MethodError::RequirementsFailed(_)));
    }

    #[test]
    fn other_call_failure_maps_to_enter_failed() {
        let adapter: Arc<dyn Adapter> = Arc::new(FakeAdapter::always_failing(crate::dbus::fake::FakeError::Other));
        let ctx = ActivationContext {
            dbus_adapter: Some(adapter),
        };
        let mut guard = GnomeInhibitGuard::new(Scope::Running, &ctx);
        let err = guard.enter_mode().unwrap_err();
        assert!(matches!(err, MethodError::EnterFailed(_)));
    }
}
