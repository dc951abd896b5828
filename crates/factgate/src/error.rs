use factgate_cache::CacheError;
use factgate_kernel::config::ConfigError;
use factgate_modules::ModuleError;
use std::borrow::Cow;

/// Startup and lookup failures of a [`crate::FactGate`].
///
/// Section reads never fail through this type; absence and failure travel inside
/// [`factgate_domain::outcome::FactResult`].
#[factgate_derive::factgate_error]
pub enum FactGateError {
    #[error("Module setup failed{}: {source}", format_context(.context))]
    Modules { source: ModuleError, context: Option<Cow<'static, str>> },

    #[error("Cache setup failed{}: {source}", format_context(.context))]
    Cache { source: CacheError, context: Option<Cow<'static, str>> },

    #[error("Configuration failed{}: {source}", format_context(.context))]
    Config { source: ConfigError, context: Option<Cow<'static, str>> },

    #[error("Unknown section{}: {message}", format_context(.context))]
    UnknownSection { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Incomplete gateway setup{}: {message}", format_context(.context))]
    Setup { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl FactGateError {
    /// Validation conflicts behind a rejected module configuration, if that is the cause.
    #[must_use]
    pub fn conflicts(&self) -> &[factgate_domain::conflict::Conflict] {
        match self {
            Self::Modules { source, .. } => source.conflicts(),
            _ => &[],
        }
    }
}
