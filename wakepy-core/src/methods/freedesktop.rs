//! Freedesktop power-management / screensaver inhibit.
//!
//! Calls `Inhibit(app, reason) -> cookie` on entry and `UnInhibit(cookie)`
//! on exit against `org.freedesktop.PowerManagement.Inhibit` (for
//! `keep.running`) or `org.freedesktop.ScreenSaver` (for
//! `keep.presenting`, which additionally blocks the screensaver/lock).
//! The cookie is owned by this instance for the Active lifetime.

use std::sync::Arc;

use crate::dbus::session::SessionAdapter;
use crate::dbus::{Adapter, Bus, Call, Value};
use crate::error::MethodError;
use crate::method::{ActivationContext, MethodDescriptor, MethodInstance};
use crate::methods::Scope;
use crate::platform::PlatformTag;

pub const METHOD_NAME: &str = "FreedesktopInhibit";

const APP_NAME: &str = "wakepy";
const REASON: &str = "wakepy keeps the system awake";

struct Target {
    service: &'static str,
    object_path: &'static str,
    interface: &'static str,
}

fn target(scope: Scope) -> Target {
    match scope {
        Scope::Running => Target {
            service: "org.freedesktop.PowerManagement.Inhibit",
            object_path: "/org/freedesktop/PowerManagement/Inhibit",
            interface: "org.freedesktop.PowerManagement.Inhibit",
        },
        Scope::Presenting => Target {
            service: "org.freedesktop.ScreenSaver",
            object_path: "/org/freedesktop/ScreenSaver",
            interface: "org.freedesktop.ScreenSaver",
        },
    }
}

#[must_use]
pub fn descriptor(scope: Scope) -> MethodDescriptor {
    MethodDescriptor::builder(METHOD_NAME, scope.mode_name())
        .platforms([PlatformTag::UnixLikeFoss])
        .has_enter(true)
        .factory(move |ctx| Box::new(FreedesktopInhibitGuard::new(scope, ctx)))
        .build()
}

pub struct FreedesktopInhibitGuard {
    scope: Scope,
    adapter_override: Option<Arc<dyn Adapter>>,
    adapter: Option<Arc<dyn Adapter>>,
    cookie: Option<u32>,
}

impl FreedesktopInhibitGuard {
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

impl MethodInstance for FreedesktopInhibitGuard {
    fn caniuse(&mut self) -> Result<(), MethodError> {
        self.adapter().map(|_| ())
    }

    fn enter_mode(&mut self) -> Result<(), MethodError> {
        let adapter = self.adapter()?;
        let target = target(self.scope);
        let reply = adapter
            .call(Call {
                bus: Bus::Session,
                service: target.service,
                object_path: target.object_path,
                interface: target.interface,
                member: "Inhibit",
                args: &[Value::Str(APP_NAME.to_owned()), Value::Str(REASON.to_owned())],
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
        let target = target(self.scope);
        adapter
            .call(Call {
                bus: Bus::Session,
                service: target.service,
                object_path: target.object_path,
                interface: target.interface,
                member: "UnInhibit",
                args: &[Value::U32(cookie)],
            })
            .map_err(crate::error::DBusError::into_exit_call_failed)?;
        Ok(())
    }
}
