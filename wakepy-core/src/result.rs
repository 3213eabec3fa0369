//! Activation result and diagnostics model.

use serde::{Deserialize, Serialize};

use crate::method::MethodInfo;

/// Which stage of the single-method activation procedure produced a
/// [`MethodActivationResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    PlatformSupport,
    Requirements,
    Activation,
    None,
}

/// Per-method attempt record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodActivationResult {
    pub method_name: String,
    pub mode_name: String,
    pub stage: Stage,
    pub success: bool,
    pub failure_reason: Option<String>,
}

impl MethodActivationResult {
    #[must_use]
    pub fn unsupported(mode_name: &str, method_name: &str, platform: &str) -> Self {
        Self {
            method_name: method_name.to_owned(),
            mode_name: mode_name.to_owned(),
            stage: Stage::PlatformSupport,
            success: false,
            failure_reason: Some(format!("unsupported on {platform}")),
        }
    }

    #[must_use]
    pub fn failure(mode_name: &str, method_name: &str, stage: Stage, reason: String) -> Self {
        debug_assert_ne!(stage, Stage::None);
        Self {
            method_name: method_name.to_owned(),
            mode_name: mode_name.to_owned(),
            stage,
            success: false,
            failure_reason: Some(reason),
        }
    }

    #[must_use]
    pub fn success(mode_name: &str, method_name: &str) -> Self {
        Self {
            method_name: method_name.to_owned(),
            mode_name: mode_name.to_owned(),
            stage: Stage::Activation,
            success: true,
            failure_reason: None,
        }
    }
}

/// How [`ActivationResult::get_failure_text`] renders its report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureTextStyle {
    /// Multi-line report, one entry per attempted method. Default.
    #[default]
    Block,
    /// Single-line summary, suitable for a warning or log line.
    OneLine,
}

/// Aggregates every attempt made while activating a [`crate::mode::Mode`],
/// plus the winner, if any.
///
/// Invariant: `success` is true iff exactly one element of `results` has
/// `success = true && stage = Stage::Activation`; `method` identifies
/// that element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivationResult {
    pub mode_name: String,
    pub results: Vec<MethodActivationResult>,
    pub method: Option<MethodInfo>,
    pub success: bool,
    /// False when the winner is the built-in fake-success sentinel.
    pub real_success: bool,
}

impl ActivationResult {
    #[must_use]
    pub fn new(mode_name: impl Into<String>, results: Vec<MethodActivationResult>) -> Self {
        let winner = results
            .iter()
            .find(|r| r.success && r.stage == Stage::Activation)
            .cloned();
        let success = winner.is_some();
        Self {
            mode_name: mode_name.into(),
            results,
            method: None,
            success,
            real_success: success,
        }
    }

    /// Attaches the winning [`MethodInfo`] and computes `real_success`
    /// (false for the built-in fake-success method).
    #[must_use]
    pub fn with_winner(mut self, winner: Option<MethodInfo>) -> Self {
        self.real_success = self.success
            && winner
                .as_ref()
                .is_some_and(|m| m.name != crate::method::fake::FAKE_SUCCESS_METHOD_NAME);
        self.method = winner;
        self
    }

    #[must_use]
    pub fn get_failure_text(&self, style: FailureTextStyle) -> String {
        if self.success {
            return match style {
                FailureTextStyle::Block => format!(
                    "Activated mode {:?} using method {:?}.",
                    self.mode_name,
                    self.method.as_ref().map(|m| m.name.as_str()).unwrap_or("?")
                ),
                FailureTextStyle::OneLine => format!(
                    "activated via {}",
                    self.method.as_ref().map(|m| m.name.as_str()).unwrap_or("?")
                ),
            };
        }

        match style {
            FailureTextStyle::Block => {
                let mut lines = vec![format!(
                    "Could not activate mode {:?}; attempted {} method(s):",
                    self.mode_name,
                    self.results.len()
                )];
                for r in &self.results {
                    let reason = r.failure_reason.as_deref().unwrap_or("no reason given");
                    lines.push(format!("  - {} [{:?}]: {}", r.method_name, r.stage, reason));
                }
                lines.join("\n")
            },
            FailureTextStyle::OneLine => {
                let names = self
                    .results
                    .iter()
                    .map(|r| r.method_name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!(
                    "no method could activate mode {:?} (tried: {names})",
                    self.mode_name
                )
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_invariant_holds() {
        let results = vec![
            MethodActivationResult::unsupported("keep.running", "a", "LINUX"),
            MethodActivationResult::failure(
                "keep.running",
                "b",
                Stage::Requirements,
                "missing binary".into(),
            ),
            MethodActivationResult::success("keep.running", "c"),
        ];
        let result = ActivationResult::new("keep.running", results);
        assert!(result.success);
    }

    #[test]
    fn failure_text_block_lists_every_attempt() {
        let results = vec![MethodActivationResult::failure(
            "keep.running",
            "a",
            Stage::Activation,
            "boom".into(),
        )];
        let result = ActivationResult::new("keep.running", results);
        let text = result.get_failure_text(FailureTextStyle::Block);
        assert!(text.contains('a'));
        assert!(text.contains("boom"));
    }
}
