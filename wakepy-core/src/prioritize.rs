//! Candidate selection and ordering for one activation attempt.

use itertools::Itertools;

use crate::error::ConfigError;
use crate::method::MethodDescriptor;
use crate::method::fake;
use crate::platform::PlatformTag;
use crate::registry::Registry;
use crate::result::MethodActivationResult;

/// The sentinel in `methods_priority` standing for "all remaining
/// selected methods, in registry order".
pub const WILDCARD: &str = "*";

/// Which of the two mutually-exclusive candidate filters is active:
/// at most one of an allow-list or a deny-list, never both.
#[derive(Debug, Clone, Default)]
pub enum Filter {
    #[default]
    None,
    /// Allow-list: restrict to exactly these method names.
    Methods(Vec<String>),
    /// Deny-list: remove these method names.
    Omit(Vec<String>),
}

/// The result of selecting and ordering candidates for one activation
/// attempt: the ordered, platform-supported candidates to try, plus the
/// diagnostics for the ones dropped at the platform-support stage.
pub struct Plan {
    pub candidates: Vec<MethodDescriptor>,
    pub platform_unsupported: Vec<MethodActivationResult>,
}

/// Runs the full prioritization algorithm for one activation attempt.
///
/// # Errors
/// `ConfigError::UnknownMethodName` if `filter` or `methods_priority`
/// names a method not registered for `mode_name`;
/// `ConfigError::DuplicatePriority` if a name appears twice in
/// `methods_priority`; `ConfigError::InvalidMethodsPriority` if more than
/// one `"*"` is present.
pub fn plan(
    registry: &Registry,
    mode_name: &'static str,
    filter: &Filter,
    methods_priority: &[String],
    fake_success: bool,
    current_platform: PlatformTag,
) -> Result<Plan, ConfigError> {
    // 1. Select.
    let mut selected = select(registry, mode_name, filter)?;

    // 2. Inject fake-success.
    if fake_success {
        selected.insert(0, fake::descriptor(mode_name));
    }

    // 3. Apply priority.
    let ordered = apply_priority(selected, methods_priority, mode_name)?;

    // 4. Platform filter.
    let (candidates, platform_unsupported) = split_by_platform(ordered, mode_name, current_platform);

    Ok(Plan {
        candidates,
        platform_unsupported,
    })
}

fn select(
    registry: &Registry,
    mode_name: &'static str,
    filter: &Filter,
) -> Result<Vec<MethodDescriptor>, ConfigError> {
    let all = registry.methods_for(mode_name);

    match filter {
        Filter::None => Ok(all),
        Filter::Methods(names) => {
            for name in names {
                if !all.iter().any(|m| m.name == name) {
                    return Err(ConfigError::UnknownMethodName {
                        mode_name: mode_name.to_owned(),
                        name: name.clone(),
                    });
                }
            }
            Ok(all.into_iter().filter(|m| names.iter().any(|n| n == m.name)).collect())
        },
        Filter::Omit(names) => {
            for name in names {
                if !all.iter().any(|m| m.name == name) {
                    return Err(ConfigError::UnknownMethodName {
                        mode_name: mode_name.to_owned(),
                        name: name.clone(),
                    });
                }
            }
            Ok(all.into_iter().filter(|m| !names.iter().any(|n| n == m.name)).collect())
        },
    }
}

fn apply_priority(
    selected: Vec<MethodDescriptor>,
    methods_priority: &[String],
    mode_name: &str,
) -> Result<Vec<MethodDescriptor>, ConfigError> {
    if methods_priority.is_empty() {
        return Ok(selected);
    }

    let wildcard_positions = methods_priority.iter().filter(|n| n.as_str() == WILDCARD).count();
    if wildcard_positions > 1 {
        return Err(ConfigError::InvalidMethodsPriority {
            reason: format!("\"{WILDCARD}\" may appear at most once, found {wildcard_positions}"),
        });
    }

    let wildcard_index = methods_priority.iter().position(|n| n.as_str() == WILDCARD);
    let head: Vec<&str> = methods_priority[..wildcard_index.unwrap_or(methods_priority.len())]
        .iter()
        .map(String::as_str)
        .collect();
    let tail: Vec<&str> = match wildcard_index {
        Some(i) => methods_priority[i + 1..].iter().map(String::as_str).collect(),
        None => vec![],
    };

    let mut seen = std::collections::HashSet::new();
    for name in head.iter().chain(tail.iter()) {
        if !seen.insert(*name) {
            return Err(ConfigError::DuplicatePriority {
                name: (*name).to_owned(),
            });
        }
    }

    let lookup = |name: &str| -> Result<MethodDescriptor, ConfigError> {
        selected
            .iter()
            .find(|m| m.name == name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownMethodName {
                mode_name: mode_name.to_owned(),
                name: name.to_owned(),
            })
    };

    let head_resolved: Vec<MethodDescriptor> = head.iter().map(|n| lookup(n)).try_collect()?;
    let tail_resolved: Vec<MethodDescriptor> = tail.iter().map(|n| lookup(n)).try_collect()?;

    let mentioned: std::collections::HashSet<&str> = head.iter().chain(tail.iter()).copied().collect();
    let remaining: Vec<MethodDescriptor> =
        selected.iter().filter(|m| !mentioned.contains(m.name)).cloned().collect();

    Ok(head_resolved.into_iter().chain(remaining).chain(tail_resolved).collect())
}

fn split_by_platform(
    ordered: Vec<MethodDescriptor>,
    mode_name: &str,
    current_platform: PlatformTag,
) -> (Vec<MethodDescriptor>, Vec<MethodActivationResult>) {
    let mut candidates = Vec::with_capacity(ordered.len());
    let mut unsupported = Vec::new();

    for method in ordered {
        if method.supports(current_platform) {
            candidates.push(method);
        } else {
            unsupported.push(MethodActivationResult::unsupported(
                mode_name,
                method.name,
                &current_platform.to_string(),
            ));
        }
    }

    (candidates, unsupported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::testing::{descriptor, TestMethodKind};

    fn registry_with(methods: &[&'static str]) -> Registry {
        let mut registry = Registry::new();
        for name in methods {
            registry
                .register(descriptor(name, "keep.running", TestMethodKind::AlwaysSucceeds))
                .unwrap();
        }
        registry
    }

    #[test]
    fn s3_priority_with_wildcard() {
        let registry = registry_with(&["A", "B", "C"]);
        let priority = vec!["C".to_string(), WILDCARD.to_string(), "A".to_string()];
        let plan = plan(&registry, "keep.running", &Filter::None, &priority, false, PlatformTag::Any).unwrap();
        let names: Vec<_> = plan.candidates.iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["C", "B", "A"]);
    }

    #[test]
    fn no_wildcard_implies_trailing_wildcard() {
        let registry = registry_with(&["A", "B", "C"]);
        let priority = vec!["B".to_string()];
        let plan = plan(&registry, "keep.running", &Filter::None, &priority, false, PlatformTag::Any).unwrap();
        let names: Vec<_> = plan.candidates.iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["B", "A", "C"]);
    }

    #[test]
    fn duplicate_priority_name_rejected() {
        let registry = registry_with(&["A", "B"]);
        let priority = vec!["A".to_string(), "A".to_string()];
        let err = plan(&registry, "keep.running", &Filter::None, &priority, false, PlatformTag::Any).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicatePriority { .. }));
    }

    #[test]
    fn unknown_name_in_priority_rejected() {
        let registry = registry_with(&["A"]);
        let priority = vec!["Z".to_string()];
        let err = plan(&registry, "keep.running", &Filter::None, &priority, false, PlatformTag::Any).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownMethodName { .. }));
    }

    #[test]
    fn two_wildcards_rejected() {
        let registry = registry_with(&["A", "B"]);
        let priority = vec![WILDCARD.to_string(), WILDCARD.to_string()];
        let err = plan(&registry, "keep.running", &Filter::None, &priority, false, PlatformTag::Any).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidMethodsPriority { .. }));
    }

    #[test]
    fn fake_success_is_prepended_before_real_methods() {
        let registry = registry_with(&["A", "B"]);
        let plan = plan(&registry, "keep.running", &Filter::None, &[], true, PlatformTag::Any).unwrap();
        assert_eq!(plan.candidates[0].name, fake::FAKE_SUCCESS_METHOD_NAME);
    }

    #[test]
    fn unsupported_platform_is_dropped_and_recorded() {
        let mut registry = Registry::new();
        registry
            .register(
                MethodDescriptor::builder("windows-only", "keep.running")
                    .platforms([PlatformTag::Windows])
                    .has_enter(true)
                    .factory(|ctx| crate::method::testing::descriptor("x", "keep.running", TestMethodKind::AlwaysSucceeds).build(ctx))
                    .build(),
            )
            .unwrap();
        let plan = plan(&registry, "keep.running", &Filter::None, &[], false, PlatformTag::Linux).unwrap();
        assert!(plan.candidates.is_empty());
        assert_eq!(plan.platform_unsupported.len(), 1);
        assert_eq!(plan.platform_unsupported[0].method_name, "windows-only");
    }
}
