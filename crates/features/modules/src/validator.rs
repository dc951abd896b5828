use crate::error::ModuleError;
use crate::registry::ModuleRegistry;
use crate::resolver::{ResolutionInput, ResolvedModuleSet, resolve};
use factgate_domain::conflict::{Conflict, ConflictKind};
use factgate_domain::module::{ModuleFlags, ModuleId, Origin, ValidationMode};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Outcome of a successful validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    /// The set to run with; repaired in warn mode, untouched in fail mode.
    pub modules: ResolvedModuleSet,
    /// Everything that was repaired. Always empty in fail mode.
    pub conflicts: Vec<Conflict>,
}

/// Checks a resolved set against the module tree and mode constraints.
///
/// One pass in registration order over a working copy. Each module yields at most one conflict
/// and is disabled in the copy as soon as it does, so its descendants are caught in the same
/// pass. Repairs only ever disable, which makes the result a fixed point.
///
/// # Errors
/// In [`ValidationMode::Fail`], returns [`ModuleError::Configuration`] with every conflict found.
pub fn validate(
    resolved: ResolvedModuleSet,
    mode: ValidationMode,
    native_strict: bool,
) -> Result<Validation, ModuleError> {
    let registry = Arc::clone(resolved.registry());
    let mut working = resolved;
    let mut conflicts = Vec::new();

    for id in registry.all_modules() {
        if !working.is_enabled(id) {
            continue;
        }

        let found = native_strict_violation(&registry, id, native_strict)
            .or_else(|| exclusive_violation(&registry, &working, id))
            .or_else(|| orphan(&registry, &working, id));

        if let Some(conflict) = found {
            working.set(id, false, Origin::Repaired);
            conflicts.push(conflict);
        }
    }

    if conflicts.is_empty() {
        info!(enabled = working.enabled_count(), "Module configuration is consistent");
        return Ok(Validation { modules: working, conflicts });
    }

    match mode {
        ValidationMode::Fail => {
            error!(conflicts = conflicts.len(), "Module configuration rejected");
            Err(ModuleError::Configuration { conflicts, context: None })
        },
        ValidationMode::Warn => {
            for conflict in &conflicts {
                warn!(
                    module = %conflict.path,
                    kind = %conflict.kind,
                    detail = %conflict.detail,
                    hint = %conflict.hint,
                    "Module disabled to resolve a conflict"
                );
            }
            Ok(Validation { modules: working, conflicts })
        },
    }
}

/// Resolves `input` and validates the result: the startup entry point.
///
/// # Errors
/// Propagates [`resolve`] and [`validate`] failures.
pub fn resolve_and_validate(
    registry: &Arc<ModuleRegistry>,
    input: &ResolutionInput,
    mode: ValidationMode,
    native_strict: bool,
) -> Result<Validation, ModuleError> {
    validate(resolve(registry, input)?, mode, native_strict)
}

fn native_strict_violation(
    registry: &ModuleRegistry,
    id: ModuleId,
    native_strict: bool,
) -> Option<Conflict> {
    if !native_strict || !registry.flags(id).contains(ModuleFlags::NATIVE_ACCESS) {
        return None;
    }
    let path = registry.path(id);
    Some(Conflict::new(
        path,
        ConflictKind::NativeStrictViolation,
        "module needs unhinted native access, which native-strict mode forbids",
        format!("disable `{path}` or turn off validation.native_strict"),
    ))
}

fn exclusive_violation(
    registry: &ModuleRegistry,
    working: &ResolvedModuleSet,
    id: ModuleId,
) -> Option<Conflict> {
    let partner = registry
        .exclusive_partners(id)
        .filter(|&partner| partner < id && working.is_enabled(partner))
        .min()?;
    let path = registry.path(id);
    let partner_path = registry.path(partner);
    Some(Conflict::new(
        path,
        ConflictKind::MutuallyExclusiveModes,
        format!("cannot run together with `{partner_path}`"),
        format!("disable either `{path}` or `{partner_path}`"),
    ))
}

fn orphan(registry: &ModuleRegistry, working: &ResolvedModuleSet, id: ModuleId) -> Option<Conflict> {
    let parent = registry.parent_of(id)?;
    let state = working.state(parent)?;
    if state.enabled {
        return None;
    }

    let path = registry.path(id);
    let parent_path = registry.path(parent);
    let detail = if state.origin == Origin::Repaired {
        format!("parent `{parent_path}` was disabled by an earlier conflict")
    } else {
        format!("parent `{parent_path}` is disabled")
    };
    Some(Conflict::new(
        path,
        ConflictKind::ParentDisabledChildEnabled,
        detail,
        format!("enable `{parent_path}` or disable `{path}`"),
    ))
}
