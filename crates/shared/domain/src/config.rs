use crate::module::{Preset, ValidationMode};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Top-level configuration consumed at startup.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FactsConfigInner {
    pub modules: ModulesConfig,
    pub cache: CacheConfig,
    pub snapshot: SnapshotConfig,
    pub validation: ValidationConfig,
    pub logging: LoggingConfig,
}

/// Thin Arc-wrapped config for inexpensive cloning into subsystems.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct FactsConfig {
    #[serde(flatten, default)]
    inner: Arc<FactsConfigInner>,
}

impl Deref for FactsConfig {
    type Target = FactsConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for FactsConfig {
    fn deref_mut(&mut self) -> &mut FactsConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// Module selection inputs, applied in field order by the resolver.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModulesConfig {
    pub preset: Preset,
    pub enabled: Vec<String>,
    pub disabled: Vec<String>,
    /// Per-module booleans keyed by module path (`"hardware.memory" = true`).
    pub overrides: BTreeMap<String, bool>,
}

/// Section cache tuning. Durations are plain milliseconds on the wire.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub default_ttl_ms: u64,
    /// How long a failed compute is served before retrying; defaults to the section TTL.
    pub failure_ttl_ms: Option<u64>,
    pub compute_timeout_ms: u64,
    pub max_concurrent: usize,
    pub max_entries: u64,
    pub section_ttl_ms: BTreeMap<String, u64>,
}

/// Background snapshot refresher.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    pub enabled: bool,
    pub refresh_interval_ms: u64,
    pub max_staleness_ms: u64,
}

#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub mode: ValidationMode,
    pub native_strict: bool,
}

/// Output format of console logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    /// Rolling log files are written here when set.
    pub directory: Option<PathBuf>,
}

// --- Durations ---

impl CacheConfig {
    #[must_use]
    pub const fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }

    #[must_use]
    pub fn failure_ttl(&self) -> Option<Duration> {
        self.failure_ttl_ms.map(Duration::from_millis)
    }

    #[must_use]
    pub const fn compute_timeout(&self) -> Duration {
        Duration::from_millis(self.compute_timeout_ms)
    }

    /// Per-section TTL overrides as typed durations.
    pub fn section_ttls(&self) -> impl Iterator<Item = (&str, Duration)> {
        self.section_ttl_ms.iter().map(|(path, ms)| (path.as_str(), Duration::from_millis(*ms)))
    }
}

impl SnapshotConfig {
    #[must_use]
    pub const fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    #[must_use]
    pub const fn max_staleness(&self) -> Duration {
        Duration::from_millis(self.max_staleness_ms)
    }
}

// --- Default ---

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_ms: 5_000,
            failure_ttl_ms: None,
            compute_timeout_ms: 10_000,
            max_concurrent: 4,
            max_entries: 10_000,
            section_ttl_ms: BTreeMap::new(),
        }
    }
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self { enabled: false, refresh_interval_ms: 5_000, max_staleness_ms: 15_000 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_owned(), format: LogFormat::Compact, directory: None }
    }
}
