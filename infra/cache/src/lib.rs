//! # Cache
//!
//! Keeps fact sections from being recomputed on every read.
//!
//! * [`CacheManager`]: per-key TTL cache with single-flight computes, failure caching, compute
//!   deadlines and a bounded blocking pool, built on [`moka`].
//! * [`SnapshotCoordinator`]: refreshes every snapshot section on a timer and publishes them
//!   together as one [`SnapshotWindow`].
//!
//! ## Example
//!
//! ```rust
//! use factgate_cache::{CacheKey, CacheManager};
//! use factgate_domain::module::Preset;
//! use factgate_domain::outcome::FactResult;
//! use factgate_modules::{ModuleRegistry, ResolutionInput, resolve};
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = ModuleRegistry::standard();
//! let modules = resolve(&registry, &ResolutionInput::new(Preset::Common))?;
//! let cache = CacheManager::builder(modules).build()?;
//!
//! let memory = registry.id("hardware.memory").ok_or("unknown module")?;
//! let key = CacheKey::section(memory);
//! let total = cache.get(&key, Duration::from_secs(5), || FactResult::success(16_u64)).await;
//! assert_eq!(total.value(), Some(&16));
//! # Ok(())
//! # }
//! ```

mod entry;
mod error;
mod key;
mod manager;
mod settings;
mod snapshot;
mod source;

pub use entry::CacheEntry;
pub use error::{CacheError, CacheErrorExt};
pub use key::{CacheKey, SECTION_METHOD};
pub use manager::{CacheManager, CacheManagerBuilder, CacheStats};
pub use settings::{CacheSettings, TTL_FLOOR, floor_ttl};
pub use snapshot::{SnapshotCoordinator, SnapshotWindow};
pub use source::FactSource;
