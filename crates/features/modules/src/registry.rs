use crate::catalog;
use crate::error::ModuleError;
use factgate_domain::constants::PATH_SEPARATOR;
use factgate_domain::module::{ModuleFlags, ModuleId};
use fxhash::FxHashMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
struct ModuleEntry {
    path: Box<str>,
    parent: Option<ModuleId>,
    children: Vec<ModuleId>,
    flags: ModuleFlags,
}

/// Static tree of fact sections.
///
/// Modules are addressed by [`ModuleId`] handles issued in registration order; every parent
/// precedes its children. The registry is immutable once built and freely shareable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRegistry {
    modules: Vec<ModuleEntry>,
    index: FxHashMap<Box<str>, ModuleId>,
    exclusive: Vec<(ModuleId, ModuleId)>,
}

impl ModuleRegistry {
    pub fn builder() -> ModuleRegistryBuilder {
        ModuleRegistryBuilder::default()
    }

    /// The built-in catalog of hardware and OS sections.
    ///
    /// # Panics
    /// Only if the compiled-in catalog is malformed, which its unit tests rule out.
    #[must_use]
    pub fn standard() -> Arc<Self> {
        catalog::standard()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Every module handle, parents before children.
    pub fn all_modules(&self) -> impl ExactSizeIterator<Item = ModuleId> + '_ {
        (0..self.modules.len()).map(to_id)
    }

    /// Handles paired with their dotted paths, parents before children.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (ModuleId, &str)> + '_ {
        self.modules.iter().enumerate().map(|(i, entry)| (to_id(i), entry.path.as_ref()))
    }

    /// Looks up a path after trimming and lower-casing it.
    #[must_use]
    pub fn id(&self, path: &str) -> Option<ModuleId> {
        let normalized = normalize(path);
        self.index.get(normalized.as_str()).copied()
    }

    #[must_use]
    pub fn is_known(&self, path: &str) -> bool {
        self.id(path).is_some()
    }

    /// Dotted path of `id`, or `"<unknown>"` for a handle from another registry.
    #[must_use]
    pub fn path(&self, id: ModuleId) -> &str {
        self.modules.get(id.index()).map_or("<unknown>", |entry| entry.path.as_ref())
    }

    #[must_use]
    pub fn parent_of(&self, id: ModuleId) -> Option<ModuleId> {
        self.modules.get(id.index()).and_then(|entry| entry.parent)
    }

    #[must_use]
    pub fn children_of(&self, id: ModuleId) -> &[ModuleId] {
        match self.modules.get(id.index()) {
            Some(entry) => entry.children.as_slice(),
            None => &[],
        }
    }

    #[must_use]
    pub fn flags(&self, id: ModuleId) -> ModuleFlags {
        self.modules.get(id.index()).map_or(ModuleFlags::empty(), |entry| entry.flags)
    }

    /// Declared pairs, each stored with the earlier-registered module first.
    #[must_use]
    pub fn exclusive_pairs(&self) -> &[(ModuleId, ModuleId)] {
        &self.exclusive
    }

    /// Modules that may not be enabled together with `id`.
    pub fn exclusive_partners(&self, id: ModuleId) -> impl Iterator<Item = ModuleId> + '_ {
        self.exclusive.iter().filter_map(move |&(a, b)| match (a == id, b == id) {
            (true, _) => Some(b),
            (_, true) => Some(a),
            _ => None,
        })
    }
}

impl ModuleRegistry {
    fn insert(
        &mut self,
        path: String,
        parent: Option<ModuleId>,
        flags: ModuleFlags,
    ) -> Result<(), ModuleError> {
        let id = to_id(self.modules.len());
        let key: Box<str> = path.into_boxed_str();
        if self.index.insert(key.clone(), id).is_some() {
            return Err(ModuleError::InvalidRegistry {
                message: format!("module `{key}` is registered twice").into(),
                context: None,
            });
        }
        if let Some(entry) = parent.and_then(|parent| self.modules.get_mut(parent.index())) {
            entry.children.push(id);
        }
        self.modules.push(ModuleEntry { path: key, parent, children: Vec::new(), flags });
        Ok(())
    }
}

/// Collects module definitions and validates them into a [`ModuleRegistry`].
#[must_use = "builders do nothing unless you call .build()"]
#[derive(Debug, Default, Clone)]
pub struct ModuleRegistryBuilder {
    modules: Vec<(String, ModuleFlags)>,
    exclusive: Vec<(String, String)>,
}

impl ModuleRegistryBuilder {
    /// Registers a module. Parents may be declared after their children.
    pub fn module(mut self, path: impl Into<String>, flags: ModuleFlags) -> Self {
        self.modules.push((path.into(), flags));
        self
    }

    /// Declares two modules that must never be enabled together.
    pub fn exclusive(mut self, a: impl Into<String>, b: impl Into<String>) -> Self {
        self.exclusive.push((a.into(), b.into()));
        self
    }

    /// Validates the definitions and assigns handles.
    ///
    /// # Errors
    /// Returns [`ModuleError::InvalidRegistry`] on duplicate paths, empty segments, a parent that
    /// is never registered, an exclusivity pair naming an unknown module, or more modules than a
    /// handle can address.
    pub fn build(self) -> Result<ModuleRegistry, ModuleError> {
        let mut defs = Vec::with_capacity(self.modules.len());
        for (raw, flags) in self.modules {
            let path = normalize(&raw);
            if path.split(PATH_SEPARATOR).any(str::is_empty) {
                return Err(ModuleError::InvalidRegistry {
                    message: format!("module path `{raw}` has an empty segment").into(),
                    context: None,
                });
            }
            defs.push((path, flags));
        }

        if u16::try_from(defs.len()).is_err() {
            return Err(ModuleError::InvalidRegistry {
                message: format!("{} modules exceed the addressable maximum", defs.len()).into(),
                context: None,
            });
        }

        let mut registry = ModuleRegistry {
            modules: Vec::with_capacity(defs.len()),
            index: FxHashMap::default(),
            exclusive: Vec::with_capacity(self.exclusive.len()),
        };

        // Declaration order is kept; a module whose parent comes later is deferred to the next
        // round. A round without progress means some parent is never registered.
        let mut pending = defs;
        while !pending.is_empty() {
            let before = pending.len();
            let mut deferred = Vec::new();
            for (path, flags) in pending {
                let parent = match path.rsplit_once(PATH_SEPARATOR) {
                    Some((parent_path, _)) => match registry.index.get(parent_path) {
                        Some(&parent) => Some(parent),
                        None => {
                            deferred.push((path, flags));
                            continue;
                        },
                    },
                    None => None,
                };
                registry.insert(path, parent, flags)?;
            }

            if deferred.len() == before {
                let (path, _) = &deferred[0];
                let parent_path = path.rsplit_once(PATH_SEPARATOR).map_or("", |(p, _)| p);
                return Err(ModuleError::InvalidRegistry {
                    message: format!("module `{path}` has no registered parent `{parent_path}`")
                        .into(),
                    context: None,
                });
            }
            pending = deferred;
        }

        for (a, b) in self.exclusive {
            let pair = match (registry.id(&a), registry.id(&b)) {
                (Some(x), Some(y)) if x != y => (x.min(y), x.max(y)),
                (Some(_), Some(_)) => {
                    return Err(ModuleError::InvalidRegistry {
                        message: format!("module `{a}` cannot exclude itself").into(),
                        context: None,
                    });
                },
                _ => {
                    return Err(ModuleError::InvalidRegistry {
                        message: format!("exclusive pair `{a}` / `{b}` names an unknown module")
                            .into(),
                        context: None,
                    });
                },
            };
            if !registry.exclusive.contains(&pair) {
                registry.exclusive.push(pair);
            }
        }

        debug!(
            modules = registry.modules.len(),
            exclusive = registry.exclusive.len(),
            "Module registry built"
        );

        Ok(registry)
    }
}

pub(crate) fn normalize(path: &str) -> String {
    path.trim().to_ascii_lowercase()
}

#[allow(clippy::cast_possible_truncation)]
const fn to_id(index: usize) -> ModuleId {
    // Bounded by the size check in `build`.
    ModuleId::new(index as u16)
}
