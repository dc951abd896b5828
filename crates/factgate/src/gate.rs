use crate::error::{FactGateError, FactGateErrorExt};
use factgate_cache::{CacheKey, CacheManager, CacheSettings, FactSource, SnapshotCoordinator};
use factgate_domain::config::FactsConfig;
use factgate_domain::conflict::Conflict;
use factgate_domain::outcome::FactResult;
use factgate_modules::{ModuleRegistry, ResolutionInput, ResolvedModuleSet, resolve_and_validate};
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// The assembled read path: validated modules, section cache and optional snapshots.
///
/// Everything is decided in [`FactGateBuilder::build`]; afterwards the module set is fixed for
/// the life of the gateway.
pub struct FactGate<T> {
    config: FactsConfig,
    modules: ResolvedModuleSet,
    conflicts: Vec<Conflict>,
    cache: CacheManager,
    snapshot: Option<SnapshotCoordinator<T>>,
    source: Arc<dyn FactSource<T>>,
}

impl<T> fmt::Debug for FactGate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactGate")
            .field("enabled", &self.modules.enabled_count())
            .field("conflicts", &self.conflicts.len())
            .field("cache", &self.cache)
            .field("snapshot", &self.snapshot)
            .finish_non_exhaustive()
    }
}

impl<T> FactGate<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn builder() -> FactGateBuilder<T> {
        FactGateBuilder { config: FactsConfig::default(), registry: None, source: None }
    }

    /// Reads one key through the snapshot window when enabled, otherwise through the cache.
    pub async fn fetch(&self, key: &CacheKey) -> FactResult<T> {
        if let Some(snapshot) = &self.snapshot {
            return snapshot.read(key).await;
        }
        let source = Arc::clone(&self.source);
        let owned = key.clone();
        self.cache.get(key, self.cache.ttl_for(key.module()), move || source.compute(&owned)).await
    }

    /// Reads a whole section by its dotted path.
    ///
    /// # Errors
    /// Returns [`FactGateError::UnknownSection`] if no module has that path. Disabled sections
    /// are not an error; they read as `Unavailable`.
    pub async fn section(&self, path: &str) -> Result<FactResult<T>, FactGateError> {
        let key = self.key(path)?;
        Ok(self.fetch(&key).await)
    }

    /// Whole-section key for `path`.
    ///
    /// # Errors
    /// Returns [`FactGateError::UnknownSection`] if no module has that path.
    pub fn key(&self, path: &str) -> Result<CacheKey, FactGateError> {
        self.registry().id(path).map(CacheKey::section).ok_or_else(|| {
            FactGateError::UnknownSection { message: format!("`{}`", path.trim()).into(), context: None }
        })
    }

    /// Publishes a first snapshot window and starts the refresher. No-op without snapshots.
    pub async fn start(&self) {
        if let Some(snapshot) = &self.snapshot {
            snapshot.refresh().await;
            snapshot.start();
        }
    }

    /// Stops the refresher and drops every cached entry.
    pub async fn shutdown(&self) {
        if let Some(snapshot) = &self.snapshot {
            snapshot.shutdown().await;
        }
        self.cache.shutdown();
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<ModuleRegistry> {
        self.modules.registry()
    }

    #[must_use]
    pub const fn modules(&self) -> &ResolvedModuleSet {
        &self.modules
    }

    /// Conflicts repaired at startup; always empty in fail mode.
    #[must_use]
    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    #[must_use]
    pub const fn cache(&self) -> &CacheManager {
        &self.cache
    }

    #[must_use]
    pub const fn snapshot(&self) -> Option<&SnapshotCoordinator<T>> {
        self.snapshot.as_ref()
    }

    #[must_use]
    pub const fn config(&self) -> &FactsConfig {
        &self.config
    }
}

/// Wires configuration, registry and source into a [`FactGate`].
#[must_use = "builders do nothing unless you call .build()"]
pub struct FactGateBuilder<T> {
    config: FactsConfig,
    registry: Option<Arc<ModuleRegistry>>,
    source: Option<Arc<dyn FactSource<T>>>,
}

impl<T> fmt::Debug for FactGateBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactGateBuilder")
            .field("config", &self.config)
            .field("registry", &self.registry.as_ref().map(|r| r.len()))
            .field("source", &self.source.is_some())
            .finish()
    }
}

impl<T> FactGateBuilder<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn config(mut self, config: FactsConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the built-in catalog.
    pub fn registry(mut self, registry: Arc<ModuleRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn source(mut self, source: impl FactSource<T>) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    /// Resolves and validates the modules, then builds the cache and snapshot coordinator.
    ///
    /// # Errors
    /// Returns [`FactGateError::Modules`] for unknown ids or rejected conflicts,
    /// [`FactGateError::Cache`] for invalid cache settings and [`FactGateError::Setup`] when no
    /// source was given.
    pub fn build(self) -> Result<FactGate<T>, FactGateError> {
        let Self { config, registry, source } = self;
        let Some(source) = source else {
            return Err(FactGateError::Setup {
                message: "a fact source is required".into(),
                context: None,
            });
        };
        let registry = registry.unwrap_or_else(ModuleRegistry::standard);

        let input = ResolutionInput::from(&config.modules);
        let validation = resolve_and_validate(
            &registry,
            &input,
            config.validation.mode,
            config.validation.native_strict,
        )
        .context("resolving [modules]")?;

        let settings =
            CacheSettings::from_config(&config.cache, &registry).context("reading [cache]")?;
        let cache = CacheManager::builder(validation.modules.clone()).settings(settings).build()?;

        let snapshot = config.snapshot.enabled.then(|| {
            let shared = Arc::clone(&source);
            SnapshotCoordinator::new(
                cache.clone(),
                move |key: &CacheKey| shared.compute(key),
                &config.snapshot,
            )
        });

        info!(
            enabled = validation.modules.enabled_count(),
            repaired = validation.conflicts.len(),
            snapshot = snapshot.is_some(),
            "Fact gateway ready"
        );

        Ok(FactGate {
            config,
            modules: validation.modules,
            conflicts: validation.conflicts,
            cache,
            snapshot,
            source,
        })
    }
}
