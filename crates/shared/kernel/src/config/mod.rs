use config::{Config, Environment, File, FileFormat};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Prefix of environment overrides (`FACTGATE__CACHE__MAX_CONCURRENT=8`).
pub const ENV_PREFIX: &str = "FACTGATE";
/// File stem looked up when no explicit path is given.
pub const DEFAULT_CONFIG: &str = "factgate";

/// Custom error type for config loading.
#[factgate_derive::factgate_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Loads configuration from a file layered under environment overrides.
///
/// 1. **Base File**: `path`, or the `factgate` file in the working directory. The format follows
///    the extension (`.toml`, `.yaml`, `.json`); without an extension every supported one is tried.
/// 2. **Environment Overrides**: variables prefixed with `FACTGATE__`, nested with double
///    underscores (`FACTGATE__SNAPSHOT__ENABLED=true` maps to `snapshot.enabled`).
///
/// # Errors
/// Returns [`ConfigError::Config`] if the file is missing or its content does not match `T`.
///
/// # Example
/// ```rust,no_run
/// use factgate_kernel::config::load_config;
///
/// #[derive(Default, serde::Deserialize)]
/// struct Probe {
///     interval_ms: u64,
/// }
///
/// let cfg: Probe = load_config(Some("config/local")).unwrap_or_default();
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let effective_path =
        path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG), |p| p.as_ref().to_path_buf());

    info!(path = %effective_path.display(), "Loading configuration");

    Config::builder()
        .add_source(File::from(effective_path.as_path()).required(true))
        .add_source(environment())
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")
}

/// Parses an in-memory TOML document, still honouring environment overrides.
///
/// # Errors
/// Returns [`ConfigError::Config`] on malformed TOML or a shape mismatch.
pub fn load_config_str<T>(toml: &str) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    debug!(bytes = toml.len(), "Loading inline configuration");

    Config::builder()
        .add_source(File::from_str(toml, FileFormat::Toml))
        .add_source(environment())
        .build()
        .context("Failed to parse inline config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize inline config")
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
        .convert_case(config::Case::Snake)
}
