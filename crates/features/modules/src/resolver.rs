use crate::error::ModuleError;
use crate::registry::{ModuleRegistry, normalize};
use factgate_domain::config::ModulesConfig;
use factgate_domain::module::{ModuleFlags, ModuleId, Origin, Preset};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Raw enablement inputs, applied in field order (later wins).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionInput {
    pub preset: Preset,
    pub enabled: BTreeSet<String>,
    pub disabled: BTreeSet<String>,
    /// Applied in sequence; the last entry for a module wins.
    pub overrides: Vec<(String, bool)>,
}

impl ResolutionInput {
    pub fn new(preset: Preset) -> Self {
        Self { preset, ..Self::default() }
    }

    #[must_use]
    pub fn enable(mut self, path: impl Into<String>) -> Self {
        self.enabled.insert(path.into());
        self
    }

    #[must_use]
    pub fn disable(mut self, path: impl Into<String>) -> Self {
        self.disabled.insert(path.into());
        self
    }

    #[must_use]
    pub fn set(mut self, path: impl Into<String>, enabled: bool) -> Self {
        self.overrides.push((path.into(), enabled));
        self
    }
}

impl From<&ModulesConfig> for ResolutionInput {
    fn from(config: &ModulesConfig) -> Self {
        Self {
            preset: config.preset,
            enabled: config.enabled.iter().cloned().collect(),
            disabled: config.disabled.iter().cloned().collect(),
            overrides: config.overrides.iter().map(|(path, on)| (path.clone(), *on)).collect(),
        }
    }
}

/// Final state of one module and the step that decided it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleState {
    pub enabled: bool,
    pub origin: Origin,
}

/// Total mapping from every registered module to its final state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModuleSet {
    registry: Arc<ModuleRegistry>,
    states: Vec<ModuleState>,
}

impl ResolvedModuleSet {
    fn seeded(registry: &Arc<ModuleRegistry>, preset: Preset) -> Self {
        let states = registry
            .all_modules()
            .map(|id| {
                let enabled = match preset {
                    Preset::None => false,
                    Preset::Common => registry.flags(id).contains(ModuleFlags::COMMON),
                    Preset::All => true,
                };
                ModuleState { enabled, origin: Origin::Preset }
            })
            .collect();
        Self { registry: Arc::clone(registry), states }
    }

    #[must_use]
    pub const fn registry(&self) -> &Arc<ModuleRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn state(&self, id: ModuleId) -> Option<ModuleState> {
        self.states.get(id.index()).copied()
    }

    /// `false` for handles the registry never issued.
    #[must_use]
    pub fn is_enabled(&self, id: ModuleId) -> bool {
        self.state(id).is_some_and(|state| state.enabled)
    }

    /// `None` when the path is unknown.
    #[must_use]
    pub fn is_enabled_path(&self, path: &str) -> Option<bool> {
        self.registry.id(path).map(|id| self.is_enabled(id))
    }

    /// Every module with its path and state, parents before children.
    pub fn iter(&self) -> impl Iterator<Item = (ModuleId, &str, ModuleState)> + '_ {
        self.registry.iter().zip(self.states.iter()).map(|((id, path), state)| (id, path, *state))
    }

    pub fn enabled(&self) -> impl Iterator<Item = ModuleId> + '_ {
        self.iter().filter(|(_, _, state)| state.enabled).map(|(id, _, _)| id)
    }

    #[must_use]
    pub fn enabled_count(&self) -> usize {
        self.states.iter().filter(|state| state.enabled).count()
    }

    pub(crate) fn set(&mut self, id: ModuleId, enabled: bool, origin: Origin) {
        if let Some(state) = self.states.get_mut(id.index()) {
            *state = ModuleState { enabled, origin };
        }
    }
}

/// Folds `input` over `registry` into a total, deterministic module set.
///
/// Precedence, later wins: preset, enabled list, disabled list, overrides in order.
///
/// # Errors
/// Returns [`ModuleError::UnknownModule`] naming every unrecognised id across all lists, with the
/// offending lists in its context; nothing is resolved in that case.
pub fn resolve(
    registry: &Arc<ModuleRegistry>,
    input: &ResolutionInput,
) -> Result<ResolvedModuleSet, ModuleError> {
    let mut unknown = Unknown::default();
    let enabled = unknown.lookup(registry, input.enabled.iter(), "enabled");
    let disabled = unknown.lookup(registry, input.disabled.iter(), "disabled");
    let overridden =
        unknown.lookup(registry, input.overrides.iter().map(|(path, _)| path), "overrides");
    unknown.into_result()?;

    let mut resolved = ResolvedModuleSet::seeded(registry, input.preset);
    for id in enabled {
        resolved.set(id, true, Origin::EnabledList);
    }
    for id in disabled {
        resolved.set(id, false, Origin::DisabledList);
    }
    for (id, (_, on)) in overridden.into_iter().zip(&input.overrides) {
        resolved.set(id, *on, Origin::Override);
    }

    for (_, path, state) in resolved.iter() {
        debug!(module = path, enabled = state.enabled, origin = %state.origin, "Module resolved");
    }
    info!(
        preset = %input.preset,
        enabled = resolved.enabled_count(),
        total = registry.len(),
        "Module set resolved"
    );

    Ok(resolved)
}

#[derive(Default)]
struct Unknown {
    paths: Vec<String>,
    lists: Vec<&'static str>,
}

impl Unknown {
    fn lookup<'a>(
        &mut self,
        registry: &ModuleRegistry,
        paths: impl Iterator<Item = &'a String>,
        list: &'static str,
    ) -> Vec<ModuleId> {
        let mut ids = Vec::new();
        for path in paths {
            match registry.id(path) {
                Some(id) => ids.push(id),
                None => {
                    self.paths.push(format!("`{}`", normalize(path)));
                    if self.lists.last() != Some(&list) {
                        self.lists.push(list);
                    }
                },
            }
        }
        ids
    }

    fn into_result(self) -> Result<(), ModuleError> {
        if self.paths.is_empty() {
            return Ok(());
        }
        Err(ModuleError::UnknownModule {
            message: self.paths.join(", ").into(),
            context: Some(format!("modules.{}", self.lists.join(", modules.")).into()),
        })
    }
}
