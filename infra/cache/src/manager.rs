use crate::entry::CacheEntry;
use crate::error::CacheError;
use crate::key::CacheKey;
use crate::settings::{CacheSettings, floor_ttl};
use factgate_domain::module::ModuleId;
use factgate_domain::outcome::{FactResult, FailureCode, UnavailableReason};
use factgate_modules::ResolvedModuleSet;
use moka::Expiry;
use moka::future::Cache;
use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, trace, warn};

/// Type-erased cache value; each key holds one concrete `CacheEntry<T>`.
#[derive(Clone)]
struct Slot {
    entry: Arc<dyn Any + Send + Sync>,
    ttl: Duration,
    failed: bool,
}

impl Slot {
    fn of<T: Send + Sync + 'static>(entry: CacheEntry<T>, ttl: Duration) -> Self {
        let failed = entry.value().is_failure();
        Self { entry: Arc::new(entry), ttl, failed }
    }

    fn downcast<T: 'static>(&self) -> Option<&CacheEntry<T>> {
        self.entry.downcast_ref::<CacheEntry<T>>()
    }
}

/// Every slot lives exactly as long as the TTL it was stored with.
struct SlotExpiry;

impl Expiry<CacheKey, Slot> for SlotExpiry {
    fn expire_after_create(&self, _key: &CacheKey, value: &Slot, _created_at: Instant) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &CacheKey,
        value: &Slot,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

#[derive(Default)]
struct Counters {
    requests: AtomicU64,
    computations: AtomicU64,
    timeouts: AtomicU64,
}

/// Point-in-time counters of a [`CacheManager`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Calls to [`CacheManager::get`].
    pub requests: u64,
    /// Computes started, including forced ones.
    pub computations: u64,
    pub timeouts: u64,
    /// Approximate; expired entries are evicted lazily.
    pub entries: u64,
}

struct CacheInner {
    cache: Cache<CacheKey, Slot>,
    modules: ResolvedModuleSet,
    settings: CacheSettings,
    permits: Arc<Semaphore>,
    counters: Counters,
}

/// Per-key TTL cache with single-flight computes over a bounded blocking pool.
///
/// Concurrent misses on one key share a single compute. Computes run on Tokio's blocking pool,
/// at most `max_concurrent` at a time, and each is bounded by `compute_timeout` including the
/// wait for a permit. Failures are cached for the failure TTL; timeouts are not cached at all.
///
/// Cloning is cheap and every clone shares the same store.
#[derive(Clone)]
pub struct CacheManager {
    inner: Arc<CacheInner>,
}

impl fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheManager")
            .field("settings", &self.inner.settings)
            .field("entries", &self.inner.cache.entry_count())
            .field("available_permits", &self.inner.permits.available_permits())
            .finish_non_exhaustive()
    }
}

impl CacheManager {
    /// Starts a builder serving the modules enabled in `modules`.
    pub fn builder(modules: ResolvedModuleSet) -> CacheManagerBuilder {
        CacheManagerBuilder { modules, settings: CacheSettings::default() }
    }

    /// Returns the live value for `key`, computing it on a miss.
    ///
    /// `ttl` is floored at 50 ms. A disabled module yields
    /// [`UnavailableReason::ModuleDisabled`] without running `compute`; a compute that panics
    /// yields [`FailureCode::NativeCallError`]; one that misses its deadline yields
    /// [`FailureCode::Timeout`] for every waiter. Dropping the returned future does not cancel
    /// a compute other readers are waiting on.
    pub async fn get<T, F>(&self, key: &CacheKey, ttl: Duration, compute: F) -> FactResult<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> FactResult<T> + Send + 'static,
    {
        self.inner.counters.requests.fetch_add(1, Ordering::Relaxed);
        if let Some(disabled) = self.disabled(key) {
            return disabled;
        }

        let ttl = floor_ttl(ttl);
        let manager = self.clone();
        let owned = key.clone();
        // The shared compute runs in its own task and outlives any cancelled caller.
        let flight = tokio::spawn(async move {
            let init = async {
                let (entry, ttl) = manager.load(&owned, ttl, compute).await?;
                Ok::<_, CacheError>(Slot::of(entry, ttl))
            };
            manager.inner.cache.try_get_with(owned.clone(), init).await
        });

        match flight.await {
            Ok(Ok(slot)) => match slot.downcast::<T>() {
                Some(entry) => entry.value().clone(),
                None => type_mismatch::<T>(key),
            },
            Ok(Err(err)) => aborted(&err),
            Err(err) => {
                error!(key = %key, error = %err, "Section read task failed");
                FactResult::failure_caused_by(
                    FailureCode::TransientFailure,
                    format!("read of {key} was interrupted"),
                    err,
                )
            },
        }
    }

    /// Recomputes `key` unconditionally and replaces whatever is cached.
    ///
    /// Disabled modules are not computed; their `Unavailable` entry is returned uncached.
    ///
    /// # Errors
    /// Returns [`CacheError::Timeout`] if the compute misses its deadline (nothing is stored), or
    /// [`CacheError::Closed`] after [`CacheManager::shutdown`].
    pub async fn prime<T, F>(
        &self,
        key: &CacheKey,
        ttl: Duration,
        compute: F,
    ) -> Result<CacheEntry<T>, CacheError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> FactResult<T> + Send + 'static,
    {
        let ttl = floor_ttl(ttl);
        if let Some(disabled) = self.disabled(key) {
            return Ok(CacheEntry::new(disabled, ttl));
        }

        let (entry, ttl) = self.load(key, ttl, compute).await?;
        self.inner.cache.insert(key.clone(), Slot::of(entry.clone(), ttl)).await;
        Ok(entry)
    }

    /// The live entry for `key`, if any, without computing.
    pub async fn entry<T: Clone + 'static>(&self, key: &CacheKey) -> Option<CacheEntry<T>> {
        self.inner.cache.get(key).await.and_then(|slot| slot.downcast::<T>().cloned())
    }

    /// `true` only for a live, non-failure entry.
    pub async fn is_fresh(&self, key: &CacheKey) -> bool {
        self.inner.cache.get(key).await.is_some_and(|slot| !slot.failed)
    }

    pub async fn invalidate(&self, key: &CacheKey) {
        self.inner.cache.invalidate(key).await;
    }

    pub fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
    }

    /// Configured TTL for `module`, floored.
    #[must_use]
    pub fn ttl_for(&self, module: ModuleId) -> Duration {
        self.inner.settings.ttl_for(module)
    }

    #[must_use]
    pub fn modules(&self) -> &ResolvedModuleSet {
        &self.inner.modules
    }

    #[must_use]
    pub fn settings(&self) -> &CacheSettings {
        &self.inner.settings
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let counters = &self.inner.counters;
        CacheStats {
            requests: counters.requests.load(Ordering::Relaxed),
            computations: counters.computations.load(Ordering::Relaxed),
            timeouts: counters.timeouts.load(Ordering::Relaxed),
            entries: self.inner.cache.entry_count(),
        }
    }

    /// Refuses new computes and drops every entry. Computes already running finish on their own.
    pub fn shutdown(&self) {
        self.inner.permits.close();
        self.inner.cache.invalidate_all();
        info!(stats = ?self.stats(), "Cache manager shut down");
    }

    fn disabled<T>(&self, key: &CacheKey) -> Option<FactResult<T>> {
        let module = key.module();
        if self.inner.modules.is_enabled(module) {
            return None;
        }
        let path = self.inner.modules.registry().path(module);
        trace!(key = %key, module = path, "Read of disabled module");
        Some(FactResult::unavailable_with(
            UnavailableReason::ModuleDisabled,
            format!("module `{path}` is disabled"),
        ))
    }

    async fn load<T, F>(
        &self,
        key: &CacheKey,
        ttl: Duration,
        compute: F,
    ) -> Result<(CacheEntry<T>, Duration), CacheError>
    where
        T: Send + 'static,
        F: FnOnce() -> FactResult<T> + Send + 'static,
    {
        let inner = &self.inner;
        inner.counters.computations.fetch_add(1, Ordering::Relaxed);

        let deadline = inner.settings.compute_timeout;
        let permits = Arc::clone(&inner.permits);
        let run = async move {
            let permit = permits.acquire_owned().await.map_err(|_| CacheError::Closed {
                message: "compute permits are closed".into(),
                context: None,
            })?;
            // The permit moves into the blocking call so it is held until `compute` returns,
            // even when the caller has already given up on it.
            let handle = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                compute()
            });
            Ok::<_, CacheError>(handle.await)
        };

        let joined = match tokio::time::timeout(deadline, run).await {
            Ok(joined) => joined?,
            Err(_) => {
                inner.counters.timeouts.fetch_add(1, Ordering::Relaxed);
                warn!(key = %key, timeout_ms = deadline.as_millis(), "Section compute timed out");
                return Err(CacheError::Timeout {
                    message: format!("{key} took longer than {}ms", deadline.as_millis()).into(),
                    context: None,
                });
            },
        };

        let value = joined.unwrap_or_else(|err| {
            error!(key = %key, error = %err, "Section compute panicked");
            FactResult::failure_caused_by(
                FailureCode::NativeCallError,
                format!("compute for {key} panicked"),
                err,
            )
        });

        let ttl = if value.is_failure() {
            let ttl = inner.settings.failure_ttl_for(ttl);
            debug!(key = %key, code = ?value.failure_code(), ttl_ms = ttl.as_millis(), "Caching failure");
            ttl
        } else {
            ttl
        };

        Ok((CacheEntry::new(value, ttl), ttl))
    }
}

fn type_mismatch<T>(key: &CacheKey) -> FactResult<T> {
    warn!(key = %key, expected = type_name::<T>(), "Cached value has a different type");
    FactResult::failure(
        FailureCode::ParseError,
        format!("cached value for {key} is not a `{}`", type_name::<T>()),
    )
}

fn aborted<T>(err: &Arc<CacheError>) -> FactResult<T> {
    let code = match err.as_ref() {
        CacheError::Timeout { .. } => FailureCode::Timeout,
        CacheError::InvalidSettings { .. } | CacheError::Closed { .. } => {
            FailureCode::TransientFailure
        },
    };
    FactResult::failure_caused_by(code, err.to_string(), Arc::clone(err))
}

/// Configures and creates a [`CacheManager`].
#[must_use = "builders do nothing unless you call .build()"]
#[derive(Debug, Clone)]
pub struct CacheManagerBuilder {
    modules: ResolvedModuleSet,
    settings: CacheSettings,
}

impl CacheManagerBuilder {
    pub fn settings(mut self, settings: CacheSettings) -> Self {
        self.settings = settings;
        self
    }

    pub const fn default_ttl(mut self, ttl: Duration) -> Self {
        self.settings.default_ttl = ttl;
        self
    }

    pub const fn failure_ttl(mut self, ttl: Duration) -> Self {
        self.settings.failure_ttl = Some(ttl);
        self
    }

    pub const fn compute_timeout(mut self, timeout: Duration) -> Self {
        self.settings.compute_timeout = timeout;
        self
    }

    pub const fn max_concurrent(mut self, permits: usize) -> Self {
        self.settings.max_concurrent = permits;
        self
    }

    pub const fn max_entries(mut self, entries: u64) -> Self {
        self.settings.max_entries = entries;
        self
    }

    pub fn section_ttl(mut self, module: ModuleId, ttl: Duration) -> Self {
        self.settings.section_ttls.insert(module, ttl);
        self
    }

    /// # Errors
    /// Returns [`CacheError::InvalidSettings`] if a bound is zero.
    pub fn build(self) -> Result<CacheManager, CacheError> {
        let Self { modules, settings } = self;
        settings.check()?;

        let cache = Cache::builder()
            .name("factgate-sections")
            .max_capacity(settings.max_entries)
            .expire_after(SlotExpiry)
            .build();

        info!(
            default_ttl_ms = settings.default_ttl.as_millis(),
            compute_timeout_ms = settings.compute_timeout.as_millis(),
            max_concurrent = settings.max_concurrent,
            max_entries = settings.max_entries,
            enabled = modules.enabled_count(),
            "Cache manager ready"
        );

        Ok(CacheManager {
            inner: Arc::new(CacheInner {
                cache,
                permits: Arc::new(Semaphore::new(settings.max_concurrent)),
                modules,
                settings,
                counters: Counters::default(),
            }),
        })
    }
}
