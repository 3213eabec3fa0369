//! The default [`super::Adapter`]: a session/system-bus client backed by
//! the `dbus` crate on Linux.
//!
//! On every other platform there is no session bus to speak of, so
//! `SessionAdapter::connect` always surfaces a `RequirementsFailed`-mapped
//! error; the Freedesktop and GNOME Methods that depend on this adapter
//! are declared `supported_platforms = [UnixLikeFoss]` or `[Linux]`, so
//! this path is only reachable if a caller constructs one directly
//! off-platform.

use super::{Adapter, Bus, Call, DBusError, Value};

#[cfg(target_os = "linux")]
pub struct SessionAdapter {
    session: dbus::blocking::Connection,
    system: dbus::blocking::Connection,
}

#[cfg(target_os = "linux")]
impl SessionAdapter {
    /// Connects to both the session and system buses.
    ///
    /// # Errors
    /// `DBusError::ServiceUnknown` if the session bus address published
    /// in the environment is absent or unreachable; callers map this to
    /// `RequirementsFailed` on first use.
    pub fn connect() -> Result<Self, DBusError> {
        let session = dbus::blocking::Connection::new_session()
            .map_err(|e| DBusError::ServiceUnknown(e.to_string()))?;
        let system = dbus::blocking::Connection::new_system()
            .map_err(|e| DBusError::ServiceUnknown(e.to_string()))?;
        Ok(Self { session, system })
    }

    fn map_call_error(err: dbus::Error) -> DBusError {
        match err.name() {
            Some("org.freedesktop.DBus.Error.ServiceUnknown") => {
                DBusError::ServiceUnknown(err.message().unwrap_or_default().to_owned())
            },
            Some("org.freedesktop.DBus.Error.NoReply") => DBusError::NoReply,
            Some("org.freedesktop.DBus.Error.AccessDenied") => {
                DBusError::AccessDenied(err.message().unwrap_or_default().to_owned())
            },
            Some("org.freedesktop.DBus.Error.InvalidArgs") => {
                DBusError::InvalidArgs(err.message().unwrap_or_default().to_owned())
            },
            Some("org.freedesktop.DBus.Error.Disconnected") | Some("org.freedesktop.DBus.Error.NoServer") => {
                DBusError::Disconnected
            },
            Some(name) => DBusError::Other {
                name: name.to_owned(),
                message: err.message().unwrap_or_default().to_owned(),
            },
            None => DBusError::Other {
                name: "unknown".to_owned(),
                message: err.message().unwrap_or_default().to_owned(),
            },
        }
    }
}

#[cfg(target_os = "linux")]
impl Adapter for SessionAdapter {
    /// Dispatches on the shape of `call.args`, matching one of three
    /// method signatures: `ss -> u` (Freedesktop `Inhibit`), `u -> ()`
    /// (`UnInhibit`), and `ssuu -> u` (GNOME `SessionManager.Inhibit` —
    /// app name, toplevel xid, reason, flags).
    fn call(&self, call: Call<'_>) -> Result<Vec<Value>, DBusError> {
        use std::time::Duration;

        let connection = match call.bus {
            Bus::Session => &self.session,
            Bus::System => &self.system,
        };
        let proxy = connection.with_proxy(call.service, call.object_path, Duration::from_secs(5));

        match call.args {
            [Value::Str(app), Value::Str(reason)] => {
                let (cookie,): (u32,) = proxy
                    .method_call(call.interface, call.member, (app.as_str(), reason.as_str()))
                    .map_err(Self::map_call_error)?;
                Ok(vec![Value::U32(cookie)])
            },
            [Value::U32(cookie)] => {
                let (): () = proxy
                    .method_call(call.interface, call.member, (*cookie,))
                    .map_err(Self::map_call_error)?;
                Ok(vec![Value::Unit])
            },
            [Value::Str(app), Value::U32(xid), Value::Str(reason), Value::U32(flags)] => {
                let (cookie,): (u32,) = proxy
                    .method_call(call.interface, call.member, (app.as_str(), *xid, reason.as_str(), *flags))
                    .map_err(Self::map_call_error)?;
                Ok(vec![Value::U32(cookie)])
            },
            _ => Err(DBusError::InvalidArgs(format!(
                "unsupported argument shape for {}.{}",
                call.interface, call.member
            ))),
        }
    }
}

#[cfg(not(target_os = "linux"))]
pub struct SessionAdapter;

#[cfg(not(target_os = "linux"))]
impl SessionAdapter {
    pub fn connect() -> Result<Self, DBusError> {
        Err(DBusError::ServiceUnknown("no session bus on this platform".into()))
    }
}

#[cfg(not(target_os = "linux"))]
impl Adapter for SessionAdapter {
    fn call(&self, _call: Call<'_>) -> Result<Vec<Value>, DBusError> {
        Err(DBusError::ServiceUnknown("no session bus on this platform".into()))
    }
}
