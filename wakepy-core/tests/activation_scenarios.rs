//! End-to-end activation scenarios driven through the public `Mode` API
//! against a private `Registry`, bypassing the process-wide global one.

use std::panic;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use wakepy_core::error::MethodError;
use wakepy_core::method::{ActivationContext, MethodDescriptor, MethodInstance};
use wakepy_core::platform::PlatformTag;
use wakepy_core::registry::Registry;
use wakepy_core::{Mode, OnFail};

const MODE_NAME: &str = "test.mode";

struct ExitCounting {
    exits: Arc<AtomicUsize>,
}

impl MethodInstance for ExitCounting {
    fn enter_mode(&mut self) -> Result<(), MethodError> {
        Ok(())
    }

    fn exit_mode(&mut self) -> Result<(), MethodError> {
        self.exits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn exit_counting_descriptor(exits: Arc<AtomicUsize>) -> MethodDescriptor {
    MethodDescriptor::builder("ExitCounting", MODE_NAME)
        .platforms([PlatformTag::Any])
        .has_enter(true)
        .factory(move |_ctx: &ActivationContext| {
            Box::new(ExitCounting {
                exits: Arc::clone(&exits),
            }) as Box<dyn MethodInstance>
        })
        .build()
}

fn registry_with_exit_counting(exits: Arc<AtomicUsize>) -> Registry {
    let mut registry = Registry::new();
    registry.register(exit_counting_descriptor(exits)).unwrap();
    registry
}

/// S6: a panic raised by user code while a Mode is held must still run
/// `exit_mode` on the winning Method exactly once, via `Mode`'s `Drop`.
#[test]
fn s6_panic_in_user_code_still_exits_the_winner_exactly_once() {
    let exits = Arc::new(AtomicUsize::new(0));
    let registry = registry_with_exit_counting(Arc::clone(&exits));

    let result = panic::catch_unwind(panic::AssertUnwindSafe(|| {
        let mut mode = Mode::builder(MODE_NAME).on_fail(OnFail::Error).build();
        mode.enter_with(&registry).unwrap();
        assert!(mode.is_active());
        panic!("user code blew up while the mode was held");
    }));

    assert!(result.is_err());
    assert_eq!(exits.load(Ordering::SeqCst), 1);
}

/// Calling `exit` explicitly and then letting the `Mode` drop must not
/// run `exit_mode` a second time.
#[test]
fn explicit_exit_then_drop_runs_exit_mode_once() {
    let exits = Arc::new(AtomicUsize::new(0));
    let registry = registry_with_exit_counting(Arc::clone(&exits));

    {
        let mut mode = Mode::builder(MODE_NAME).on_fail(OnFail::Error).build();
        mode.enter_with(&registry).unwrap();
        mode.exit();
        assert!(!mode.is_active());
        assert_eq!(exits.load(Ordering::SeqCst), 1);
    }

    assert_eq!(exits.load(Ordering::SeqCst), 1);
}

/// A `Mode` that was built but never entered must not panic or block on
/// drop: there is no winner to clean up.
#[test]
fn drop_without_ever_entering_is_a_no_op() {
    let mode = Mode::builder(MODE_NAME).on_fail(OnFail::Pass).build();
    drop(mode);
}
