use crate::entry::CacheEntry;
use crate::key::CacheKey;
use crate::manager::CacheManager;
use crate::settings::TTL_FLOOR;
use crate::source::FactSource;
use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use factgate_domain::config::SnapshotConfig;
use factgate_domain::module::ModuleFlags;
use factgate_domain::outcome::FactResult;
use fxhash::FxHashMap;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Sections sampled in one refresh cycle, readable as one consistent point in time.
#[derive(Debug)]
pub struct SnapshotWindow<T> {
    created_at: DateTime<Utc>,
    created: Instant,
    ttl: Duration,
    sections: FxHashMap<CacheKey, CacheEntry<T>>,
}

impl<T> SnapshotWindow<T> {
    /// Wall-clock start of the refresh cycle that produced this window.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Maximum age at which reads still trust this window.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    #[must_use]
    pub fn age(&self) -> Duration {
        self.created.elapsed()
    }

    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.age() > self.ttl
    }

    #[must_use]
    pub fn get(&self, key: &CacheKey) -> Option<&CacheEntry<T>> {
        self.sections.get(key)
    }

    #[must_use]
    pub fn value(&self, key: &CacheKey) -> Option<&FactResult<T>> {
        self.get(key).map(CacheEntry::value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &CacheKey> {
        self.sections.keys()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

struct Refresher {
    handle: JoinHandle<()>,
    stop: watch::Sender<bool>,
}

struct SnapshotInner<T> {
    cache: CacheManager,
    source: Arc<dyn FactSource<T>>,
    sections: Vec<CacheKey>,
    refresh_interval: Duration,
    max_staleness: Duration,
    window: ArcSwapOption<SnapshotWindow<T>>,
    refresher: Mutex<Option<Refresher>>,
}

/// Periodically primes every snapshot section and publishes the results as one window.
///
/// Readers never wait for a refresh: they get the current window if it is fresh enough and holds
/// the key, and otherwise go through the [`CacheManager`]. Windows are swapped in whole, so a
/// reader sees either the previous cycle or the next one, never a mix.
pub struct SnapshotCoordinator<T> {
    inner: Arc<SnapshotInner<T>>,
}

impl<T> Clone for SnapshotCoordinator<T> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<T> fmt::Debug for SnapshotCoordinator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotCoordinator")
            .field("sections", &self.inner.sections.len())
            .field("refresh_interval", &self.inner.refresh_interval)
            .field("max_staleness", &self.inner.max_staleness)
            .field("running", &self.inner.refresher.lock().is_some())
            .finish_non_exhaustive()
    }
}

impl<T> SnapshotCoordinator<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Covers every enabled module flagged [`ModuleFlags::SNAPSHOT`], one section key each.
    pub fn new(cache: CacheManager, source: impl FactSource<T>, config: &SnapshotConfig) -> Self {
        let modules = cache.modules();
        let registry = modules.registry();
        let sections: Vec<CacheKey> = modules
            .enabled()
            .filter(|id| registry.flags(*id).contains(ModuleFlags::SNAPSHOT))
            .map(CacheKey::section)
            .collect();

        debug!(sections = sections.len(), "Snapshot coordinator created");

        Self {
            inner: Arc::new(SnapshotInner {
                cache,
                source: Arc::new(source),
                sections,
                refresh_interval: config.refresh_interval(),
                max_staleness: config.max_staleness(),
                window: ArcSwapOption::empty(),
                refresher: Mutex::new(None),
            }),
        }
    }

    /// Section keys primed on every cycle.
    #[must_use]
    pub fn sections(&self) -> &[CacheKey] {
        &self.inner.sections
    }

    /// The current window, stale or not.
    #[must_use]
    pub fn window(&self) -> Option<Arc<SnapshotWindow<T>>> {
        self.inner.window.load_full()
    }

    /// Serves `key` from a fresh window, falling back to the cache.
    pub async fn read(&self, key: &CacheKey) -> FactResult<T> {
        if let Some(window) = self.inner.window.load_full() {
            let age = window.age();
            if age <= self.inner.max_staleness {
                if let Some(entry) = window.get(key) {
                    return entry.value().clone();
                }
            } else {
                debug!(key = %key, age_ms = age.as_millis(), "Snapshot window is stale");
            }
        }

        let source = Arc::clone(&self.inner.source);
        let owned = key.clone();
        let ttl = self.inner.cache.ttl_for(key.module());
        self.inner.cache.get(key, ttl, move || source.compute(&owned)).await
    }

    /// Runs one cycle now: primes every section concurrently, then publishes the window.
    ///
    /// Sections whose compute times out are left out of the window; reads of them fall back to
    /// the cache. Dropping the returned future before it completes publishes nothing.
    pub async fn refresh(&self) -> Arc<SnapshotWindow<T>> {
        let created_at = Utc::now();
        let created = Instant::now();

        let mut tasks = JoinSet::new();
        for key in &self.inner.sections {
            let cache = self.inner.cache.clone();
            let source = Arc::clone(&self.inner.source);
            let key = key.clone();
            tasks.spawn(async move {
                let ttl = cache.ttl_for(key.module());
                let compute_key = key.clone();
                let primed = cache.prime(&key, ttl, move || source.compute(&compute_key)).await;
                (key, primed)
            });
        }

        let mut sections = FxHashMap::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((key, Ok(entry))) => {
                    sections.insert(key, entry);
                },
                Ok((key, Err(err))) => {
                    warn!(key = %key, error = %err, "Section left out of snapshot window");
                },
                Err(err) => {
                    warn!(error = %err, "Snapshot priming task failed");
                },
            }
        }

        let window = Arc::new(SnapshotWindow {
            created_at,
            created,
            ttl: self.inner.max_staleness,
            sections,
        });
        self.inner.window.store(Some(Arc::clone(&window)));

        debug!(
            sections = window.len(),
            elapsed_ms = created.elapsed().as_millis(),
            "Snapshot window published"
        );
        window
    }

    /// Spawns the periodic refresher on the current runtime. Calling it again is a no-op.
    ///
    /// The refresher holds no strong reference between cycles; it stops once the last
    /// coordinator handle is dropped, even without [`SnapshotCoordinator::shutdown`].
    pub fn start(&self) {
        let mut refresher = self.inner.refresher.lock();
        if refresher.is_some() {
            return;
        }

        let (stop, mut stopped) = watch::channel(false);
        let weak = Arc::downgrade(&self.inner);
        let period = self.inner.refresh_interval.max(TTL_FLOOR);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    biased;
                    _ = stopped.changed() => break,
                    _ = ticker.tick() => {
                        let Some(inner) = weak.upgrade() else { break };
                        let this = Self { inner };
                        tokio::select! {
                            biased;
                            _ = stopped.changed() => break,
                            _ = this.refresh() => {},
                        }
                    },
                }
            }
            debug!("Snapshot refresher stopped");
        });

        info!(
            interval_ms = period.as_millis(),
            sections = self.inner.sections.len(),
            "Snapshot refresher started"
        );
        *refresher = Some(Refresher { handle, stop });
    }

    /// Stops the refresher and waits for it. An in-flight cycle is dropped unpublished.
    pub async fn shutdown(&self) {
        let running = self.inner.refresher.lock().take();
        let Some(Refresher { handle, stop }) = running else {
            return;
        };
        let _ = stop.send(true);
        if let Err(err) = handle.await {
            warn!(error = %err, "Snapshot refresher ended abnormally");
        }
        info!("Snapshot refresher shut down");
    }
}
