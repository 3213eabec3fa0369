//! Environment-variable overrides used by the activation engine.
//!
//! Both variables are read fresh on every activation attempt rather than
//! cached, so tests can flip them between calls without restarting the
//! process.

use std::env;

pub const FAKE_SUCCESS: &str = "WAKEPY_FAKE_SUCCESS";
pub const FORCE_FAILURE: &str = "WAKEPY_FORCE_FAILURE";

/// Case-insensitive truthy/falsy rule.
///
/// Falsy: `"" | "0" | "no" | "n" | "false" | "f"`. Anything else,
/// including an unset variable being treated as absent (not falsy) by the
/// caller, is truthy.
#[must_use]
pub fn is_truthy(value: &str) -> bool {
    !matches!(
        value.to_ascii_lowercase().as_str(),
        "" | "0" | "no" | "n" | "false" | "f"
    )
}

/// Reads `name` from the environment and applies [`is_truthy`]; an unset
/// variable is falsy.
#[must_use]
pub fn flag(name: &str) -> bool {
    env::var(name).map(|v| is_truthy(&v)).unwrap_or(false)
}

#[must_use]
pub fn fake_success_requested() -> bool {
    flag(FAKE_SUCCESS)
}

#[must_use]
pub fn force_failure_requested() -> bool {
    flag(FORCE_FAILURE)
}
