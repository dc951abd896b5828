use factgate_cache::{CacheKey, CacheManager, CacheManagerBuilder};
use factgate_domain::module::Preset;
use factgate_domain::outcome::FactResult;
use factgate_modules::{ModuleRegistry, ResolutionInput, resolve};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const MEMORY: &str = "hardware.memory";
pub const PROCESSES: &str = "os.processes";

/// Builder over the standard catalog with the `common` preset.
pub fn builder() -> CacheManagerBuilder {
    let registry = ModuleRegistry::standard();
    let modules = resolve(&registry, &ResolutionInput::new(Preset::Common)).unwrap();
    CacheManager::builder(modules)
}

pub fn manager() -> CacheManager {
    builder().build().unwrap()
}

pub fn key(path: &str) -> CacheKey {
    CacheKey::section(ModuleRegistry::standard().id(path).unwrap())
}

/// Counts how often a compute actually runs.
#[derive(Debug, Clone, Default)]
pub struct Calls(Arc<AtomicUsize>);

impl Calls {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    /// A compute that sleeps for `delay` and then returns `value`.
    pub fn slow<T: Send + 'static>(
        &self,
        delay: Duration,
        value: T,
    ) -> impl FnOnce() -> FactResult<T> + Send + 'static {
        let calls = Arc::clone(&self.0);
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(delay);
            FactResult::success(value)
        }
    }

    pub fn returning<T: Send + 'static>(
        &self,
        result: FactResult<T>,
    ) -> impl FnOnce() -> FactResult<T> + Send + 'static {
        let calls = Arc::clone(&self.0);
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            result
        }
    }
}
