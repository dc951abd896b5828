use crate::error::CacheError;
use factgate_domain::config::CacheConfig;
use factgate_domain::module::ModuleId;
use factgate_modules::ModuleRegistry;
use fxhash::FxHashMap;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Shortest lifetime any entry gets.
pub const TTL_FLOOR: Duration = Duration::from_millis(50);

/// Clamps `ttl` to [`TTL_FLOOR`].
#[must_use]
pub fn floor_ttl(ttl: Duration) -> Duration {
    ttl.max(TTL_FLOOR)
}

/// Validated tuning of a [`crate::CacheManager`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    pub default_ttl: Duration,
    /// `None` caches failures for the section TTL.
    pub failure_ttl: Option<Duration>,
    pub compute_timeout: Duration,
    pub max_concurrent: usize,
    pub max_entries: u64,
    pub section_ttls: FxHashMap<ModuleId, Duration>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        let config = CacheConfig::default();
        Self {
            default_ttl: config.default_ttl(),
            failure_ttl: config.failure_ttl(),
            compute_timeout: config.compute_timeout(),
            max_concurrent: config.max_concurrent,
            max_entries: config.max_entries,
            section_ttls: FxHashMap::default(),
        }
    }
}

impl CacheSettings {
    /// Maps configured section paths onto registry handles.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidSettings`] if a section TTL names an unknown module or a
    /// bound is zero.
    pub fn from_config(config: &CacheConfig, registry: &ModuleRegistry) -> Result<Self, CacheError> {
        let mut section_ttls = FxHashMap::default();
        for (path, ttl) in config.section_ttls() {
            let Some(id) = registry.id(path) else {
                return Err(CacheError::InvalidSettings {
                    message: format!("unknown module `{path}`").into(),
                    context: Some("cache.section_ttl_ms".into()),
                });
            };
            section_ttls.insert(id, ttl);
        }

        let settings = Self {
            default_ttl: config.default_ttl(),
            failure_ttl: config.failure_ttl(),
            compute_timeout: config.compute_timeout(),
            max_concurrent: config.max_concurrent,
            max_entries: config.max_entries,
            section_ttls,
        };
        settings.check()?;
        Ok(settings)
    }

    pub(crate) fn check(&self) -> Result<(), CacheError> {
        let zero = if self.max_concurrent == 0 {
            Some("max_concurrent")
        } else if self.compute_timeout.is_zero() {
            Some("compute_timeout")
        } else if self.max_entries == 0 {
            Some("max_entries")
        } else {
            None
        };

        match zero {
            Some(field) => Err(CacheError::InvalidSettings {
                message: format!("`{field}` must be greater than zero").into(),
                context: None,
            }),
            None if self.max_concurrent > Semaphore::MAX_PERMITS => Err(CacheError::InvalidSettings {
                message: format!("`max_concurrent` exceeds {}", Semaphore::MAX_PERMITS).into(),
                context: None,
            }),
            None => Ok(()),
        }
    }

    /// Per-section override or the default, floored.
    #[must_use]
    pub fn ttl_for(&self, module: ModuleId) -> Duration {
        floor_ttl(self.section_ttls.get(&module).copied().unwrap_or(self.default_ttl))
    }

    /// Lifetime of a cached failure for a section read with `ttl`, floored.
    #[must_use]
    pub fn failure_ttl_for(&self, ttl: Duration) -> Duration {
        floor_ttl(self.failure_ttl.unwrap_or(ttl))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn ttls_are_floored() {
        let settings = CacheSettings { default_ttl: Duration::from_millis(1), ..Default::default() };
        assert_eq!(settings.ttl_for(ModuleId::new(0)), TTL_FLOOR);
        assert_eq!(settings.failure_ttl_for(Duration::ZERO), TTL_FLOOR);
    }

    #[test]
    fn section_overrides_resolve_against_the_registry() {
        let registry = ModuleRegistry::standard();
        let config = CacheConfig {
            section_ttl_ms: BTreeMap::from([("os.processes".to_owned(), 500)]),
            ..CacheConfig::default()
        };
        let settings = CacheSettings::from_config(&config, &registry).unwrap();
        let processes = registry.id("os.processes").unwrap();
        let memory = registry.id("hardware.memory").unwrap();

        assert_eq!(settings.ttl_for(processes), Duration::from_millis(500));
        assert_eq!(settings.ttl_for(memory), config.default_ttl());
    }

    #[test]
    fn unknown_sections_and_zero_bounds_are_rejected() {
        let registry = ModuleRegistry::standard();
        let unknown = CacheConfig {
            section_ttl_ms: BTreeMap::from([("os.kernel".to_owned(), 500)]),
            ..CacheConfig::default()
        };
        assert!(CacheSettings::from_config(&unknown, &registry).is_err());

        let zero = CacheConfig { max_concurrent: 0, ..CacheConfig::default() };
        let err = CacheSettings::from_config(&zero, &registry).unwrap_err();
        assert!(err.to_string().contains("max_concurrent"));
    }
}
