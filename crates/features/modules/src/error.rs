use factgate_domain::conflict::Conflict;
use std::borrow::Cow;
use std::fmt::Write;

/// A specialized [`ModuleError`] enum of this crate.
#[factgate_derive::factgate_error]
pub enum ModuleError {
    /// The registry definition is not a tree of unique, well-formed paths.
    #[error("Invalid module registry{}: {message}", format_context(.context))]
    InvalidRegistry { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Configuration names a module the registry does not know.
    #[error("Unknown module{}: {message}", format_context(.context))]
    UnknownModule { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Fail-mode validation found conflicts; startup must not continue.
    #[error(
        "Module configuration rejected{}: {}",
        format_context(.context),
        format_conflicts(.conflicts)
    )]
    Configuration { conflicts: Vec<Conflict>, context: Option<Cow<'static, str>> },
}

impl ModuleError {
    /// Conflicts carried by a configuration failure, empty for other variants.
    #[must_use]
    pub fn conflicts(&self) -> &[Conflict] {
        match self {
            Self::Configuration { conflicts, .. } => conflicts,
            Self::InvalidRegistry { .. } | Self::UnknownModule { .. } => &[],
        }
    }
}

fn format_conflicts(conflicts: &[Conflict]) -> String {
    let mut out = format!("{} conflict(s)", conflicts.len());
    for conflict in conflicts {
        let _ = write!(out, "\n  - {conflict}");
    }
    out
}
