//! Abstract D-Bus client, the dependency the Freedesktop and GNOME
//! Methods use to talk to the session bus.
//!
//! The transport is expressed as an [`Adapter`] trait rather than a
//! concrete client so Methods never depend on which D-Bus binding is in
//! use; [`session::SessionAdapter`] is the one default implementation,
//! available on Linux.

pub mod session;

pub use crate::error::DBusError;

/// Which bus to call on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bus {
    Session,
    System,
}

/// A minimally-typed D-Bus argument/return value, covering the standard
/// type signatures these Methods need: `s` (string), `u` (uint32), and
/// the empty-tuple `()` return of a void method call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Str(String),
    U32(u32),
    Unit,
}

impl Value {
    #[must_use]
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Value::U32(v) => Some(*v),
            _ => None,
        }
    }
}

/// A single D-Bus method call: `service`/`object_path`/`interface`
/// describe the destination, `member` the method name, `args` its
/// marshalled arguments.
pub struct Call<'a> {
    pub bus: Bus,
    pub service: &'a str,
    pub object_path: &'a str,
    pub interface: &'a str,
    pub member: &'a str,
    pub args: &'a [Value],
}

/// The transport binding Methods call through.
///
/// One default implementation ([`session::SessionAdapter`]) suffices;
/// implementers may plug another by implementing this trait, e.g. to
/// fake D-Bus entirely in tests.
pub trait Adapter: Send + Sync {
    /// Invokes one D-Bus method call and returns its (possibly empty)
    /// reply tuple.
    ///
    /// # Errors
    /// Any [`DBusError`] variant; callers map `ServiceUnknown` and
    /// `Disconnected` onto `RequirementsFailed`, everything else onto
    /// `EnterFailed`/`ExitFailed`.
    fn call(&self, call: Call<'_>) -> Result<Vec<Value>, DBusError>;
}

#[cfg(test)]
pub mod fake {
    //! A scriptable in-memory [`Adapter`] for testing Methods that call
    //! through it, without a real session bus.
    use std::sync::Mutex;

    use super::{Adapter, Call, DBusError, Value};

    pub struct FakeAdapter {
        pub next_reply: Mutex<Option<Result<Vec<Value>, FakeError>>>,
    }

    #[derive(Clone)]
    pub enum FakeError {
        ServiceUnknown,
        Other,
    }

    impl Default for FakeAdapter {
        fn default() -> Self {
            Self {
                next_reply: Mutex::new(Some(Ok(vec![Value::U32(1)]))),
            }
        }
    }

    impl FakeAdapter {
        #[must_use]
        pub fn always_replying(reply: Vec<Value>) -> Self {
            Self {
                next_reply: Mutex::new(Some(Ok(reply))),
            }
        }

        #[must_use]
        pub fn always_failing(error: FakeError) -> Self {
            Self {
                next_reply: Mutex::new(Some(Err(error))),
            }
        }
    }

    impl Adapter for FakeAdapter {
        fn call(&self, _call: Call<'_>) -> Result<Vec<Value>, DBusError> {
            match self.next_reply.lock().unwrap().clone() {
                Some(Ok(values)) => Ok(values),
                Some(Err(FakeError::ServiceUnknown)) => {
                    Err(DBusError::ServiceUnknown("org.freedesktop.Fake".into()))
                },
                Some(Err(FakeError::Other)) => Err(DBusError::Other {
                    name: "org.freedesktop.DBus.Error.Failed".into(),
                    message: "fake failure".into(),
                }),
                None => Err(DBusError::Disconnected),
            }
        }
    }

}
