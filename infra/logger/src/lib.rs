//! # Logger
//!
//! Installs the process-wide `tracing` subscriber.
//!
//! Console output goes to stderr in one of the [`LogFormat`]s, so command output on stdout stays
//! clean. When a directory is configured, a daily-rolling file layer is added behind a
//! non-blocking writer; keep the returned [`Logger`] alive so it can flush on exit.
//!
//! The level accepts either a bare level (`"debug"`) or filter directives
//! (`"info,factgate_cache=trace"`). `RUST_LOG` still applies on top of a bare level.
//!
//! ## Example
//!
//! ```rust
//! use factgate_logger::{LevelFilter, LogFormat, Logger};
//!
//! let _logger = Logger::builder()
//!     .name("factgate")
//!     .format(LogFormat::Compact)
//!     .level(LevelFilter::DEBUG)
//!     .init()
//!     .unwrap();
//! ```

mod error;

pub use crate::error::{LoggerError, LoggerErrorExt};
pub use factgate_domain::config::LogFormat;
pub use tracing::level_filters::LevelFilter;
pub use tracing_appender::rolling::Rotation;

use factgate_domain::config::LoggingConfig;
use private::Sealed;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

const DEFAULT_MAX_FILES: usize = 7;
const LOG_FILE_SUFFIX: &str = "log";

#[derive(Debug)]
struct Settings {
    console: bool,
    format: LogFormat,
    level: LevelFilter,
    directives: Option<String>,
    directory: Option<PathBuf>,
    rotation: Rotation,
    max_files: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            console: true,
            format: LogFormat::Compact,
            level: LevelFilter::INFO,
            directives: None,
            directory: None,
            rotation: Rotation::DAILY,
            max_files: DEFAULT_MAX_FILES,
        }
    }
}

#[derive(Debug)]
pub struct NoName;
#[derive(Debug)]
pub struct WithName(String);

mod private {
    pub trait Sealed {}
}
impl Sealed for NoName {}
impl Sealed for WithName {}

/// Configures the global subscriber. A name is required before [`LoggerBuilder::init`].
#[must_use = "builders do nothing unless you call .init()"]
#[derive(Debug)]
pub struct LoggerBuilder<N: Sealed = NoName> {
    settings: Settings,
    name: N,
}

impl LoggerBuilder<NoName> {
    /// Names the process; the name prefixes rolling files (`factgate.2026-01-31.log`).
    pub fn name(self, name: impl Into<String>) -> LoggerBuilder<WithName> {
        LoggerBuilder { settings: self.settings, name: WithName(name.into()) }
    }
}

impl<N: Sealed> LoggerBuilder<N> {
    pub const fn level(mut self, level: LevelFilter) -> Self {
        self.settings.level = level;
        self
    }

    /// Explicit filter directives; they replace both the level and `RUST_LOG`.
    pub fn directives(mut self, directives: impl Into<String>) -> Self {
        self.settings.directives = Some(directives.into());
        self
    }

    pub const fn format(mut self, format: LogFormat) -> Self {
        self.settings.format = format;
        self
    }

    pub const fn console(mut self, enabled: bool) -> Self {
        self.settings.console = enabled;
        self
    }

    /// Adds rolling log files under `directory`.
    pub fn directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.settings.directory = Some(directory.into());
        self
    }

    pub const fn rotation(mut self, rotation: Rotation) -> Self {
        self.settings.rotation = rotation;
        self
    }

    pub const fn max_files(mut self, max: usize) -> Self {
        self.settings.max_files = max;
        self
    }

    /// Applies the `[logging]` section: level or directives, format and directory.
    pub fn config(mut self, config: &LoggingConfig) -> Self {
        let level = config.level.trim();
        match LevelFilter::from_str(level) {
            Ok(parsed) => {
                self.settings.level = parsed;
                self.settings.directives = None;
            },
            Err(_) => self.settings.directives = Some(level.to_owned()),
        }
        self.settings.format = config.format;
        self.settings.directory.clone_from(&config.directory);
        self
    }
}

impl LoggerBuilder<WithName> {
    /// Installs the subscriber.
    ///
    /// # Errors
    /// Returns [`LoggerError::Subscriber`] if a global subscriber is already set,
    /// [`LoggerError::InvalidConfiguration`] for bad directives or when no output is enabled, and
    /// [`LoggerError::Io`] or [`LoggerError::Appender`] if the log directory is unusable.
    pub fn init(self) -> Result<Logger, LoggerError> {
        let Self { settings, name: WithName(name) } = self;
        check(&settings, &name)?;

        let filter = env_filter(&settings)?;
        let mut layers = Vec::new();

        if settings.console {
            let console = fmt::layer().with_writer(std::io::stderr);
            layers.push(match settings.format {
                LogFormat::Compact => console.compact().boxed(),
                LogFormat::Pretty => console.pretty().boxed(),
                LogFormat::Json => console.json().with_ansi(false).boxed(),
            });
        }

        let guard = match &settings.directory {
            Some(directory) => {
                fs::create_dir_all(directory)
                    .context(format!("creating {}", directory.display()))?;

                let appender = RollingFileAppender::builder()
                    .rotation(settings.rotation.clone())
                    .filename_prefix(&name)
                    .filename_suffix(LOG_FILE_SUFFIX)
                    .max_log_files(settings.max_files)
                    .build(directory)?;
                let (writer, guard) = tracing_appender::non_blocking(appender);

                let file = fmt::layer().with_writer(writer).with_ansi(false);
                layers.push(match settings.format {
                    LogFormat::Json => file.json().boxed(),
                    LogFormat::Compact | LogFormat::Pretty => file.boxed(),
                });
                Some(guard)
            },
            None => None,
        };

        if layers.is_empty() {
            return Err(LoggerError::InvalidConfiguration {
                message: "console and file output are both disabled".into(),
                context: None,
            });
        }

        tracing_subscriber::registry().with(filter).with(layers).try_init()?;
        tracing::debug!(name = %name, format = ?settings.format, files = guard.is_some(), "Logging initialised");

        Ok(Logger { guard })
    }
}

/// Keeps the file writer alive. Dropping it flushes and stops background logging.
#[must_use = "dropping this handle stops file logging"]
#[derive(Debug)]
pub struct Logger {
    guard: Option<WorkerGuard>,
}

impl Logger {
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder { settings: Settings::default(), name: NoName }
    }

    /// `true` when rolling files are being written.
    #[must_use]
    pub const fn writes_files(&self) -> bool {
        self.guard.is_some()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if self.guard.is_some() {
            tracing::debug!("Flushing log files");
        }
    }
}

fn check(settings: &Settings, name: &str) -> Result<(), LoggerError> {
    if name.trim().is_empty() {
        return Err(LoggerError::InvalidConfiguration {
            message: "logger name cannot be empty".into(),
            context: None,
        });
    }
    if settings.directory.is_some() && settings.max_files == 0 {
        return Err(LoggerError::InvalidConfiguration {
            message: "max_files must be greater than zero".into(),
            context: None,
        });
    }
    Ok(())
}

fn env_filter(settings: &Settings) -> Result<EnvFilter, LoggerError> {
    let builder = EnvFilter::builder().with_default_directive(settings.level.into());
    match &settings.directives {
        None => Ok(builder.from_env_lossy()),
        Some(directives) => builder.parse(directives).map_err(|e| {
            LoggerError::InvalidConfiguration {
                message: format!("invalid filter `{directives}`: {e}").into(),
                context: None,
            }
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn bare_levels_become_the_default_directive() {
        let config = LoggingConfig { level: " debug ".to_owned(), ..LoggingConfig::default() };
        let builder = Logger::builder().directives("x=trace").config(&config);
        assert_eq!(builder.settings.level, LevelFilter::DEBUG);
        assert!(builder.settings.directives.is_none());
    }

    #[test]
    fn directive_strings_are_kept_verbatim() {
        let config = LoggingConfig {
            level: "info,factgate_cache=trace".to_owned(),
            format: LogFormat::Json,
            directory: Some("/var/log/factgate".into()),
        };
        let builder = Logger::builder().config(&config);
        assert_eq!(builder.settings.directives.as_deref(), Some("info,factgate_cache=trace"));
        assert_eq!(builder.settings.format, LogFormat::Json);
        assert_eq!(builder.settings.directory.as_deref(), Some(Path::new("/var/log/factgate")));
    }

    #[test]
    fn invalid_directives_are_rejected() {
        let settings = Settings { directives: Some("factgate=loud".to_owned()), ..Settings::default() };
        assert!(matches!(env_filter(&settings), Err(LoggerError::InvalidConfiguration { .. })));
    }

    #[test]
    fn empty_names_are_rejected() {
        let err = check(&Settings::default(), "  ").unwrap_err();
        assert!(err.to_string().contains("name cannot be empty"));
    }
}
