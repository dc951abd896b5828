use serde::{Deserialize, Serialize};
use std::fmt;

/// The rule a module configuration broke.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictKind {
    /// A module is enabled while its parent is disabled.
    ParentDisabledChildEnabled,
    /// Native-strict mode forbids a module that needs unhinted native access.
    NativeStrictViolation,
    /// Two modules declared as mutually exclusive are both enabled.
    MutuallyExclusiveModes,
}

/// One validation finding, with a suggested fix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub path: String,
    pub kind: ConflictKind,
    pub detail: String,
    pub hint: String,
}

impl Conflict {
    pub fn new(
        path: impl Into<String>,
        kind: ConflictKind,
        detail: impl Into<String>,
        hint: impl Into<String>,
    ) -> Self {
        Self { path: path.into(), kind, detail: detail.into(), hint: hint.into() }
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {} (fix: {})", self.kind, self.path, self.detail, self.hint)
    }
}
