use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

bitflags! {
    /// Static metadata attached to a module at registration time.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
    pub struct ModuleFlags: u8 {
        /// Member of the `common` preset.
        const COMMON = 1 << 0;
        /// Needs unhinted reflection or raw native access to gather its facts.
        const NATIVE_ACCESS = 1 << 1;
        /// May be precomputed into snapshot windows.
        const SNAPSHOT = 1 << 2;
    }
}

/// Opaque handle to a registered module.
///
/// Handles are dense indices assigned in registration order, so a parent always has a
/// smaller handle than its children. They are only meaningful for the registry that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModuleId(u16);

impl ModuleId {
    #[must_use]
    pub const fn new(index: u16) -> Self {
        Self(index)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Named default enablement template applied before explicit overrides.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Preset {
    /// Every module starts disabled.
    None,
    /// Modules flagged [`ModuleFlags::COMMON`] start enabled.
    #[default]
    Common,
    /// Every module starts enabled.
    All,
}

/// What the validator does with conflicts.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ValidationMode {
    /// Abort startup on the first inconsistent configuration.
    #[default]
    Fail,
    /// Disable conflicting modules and log each repair.
    Warn,
}

/// Which resolution step decided a module's final state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Origin {
    Preset,
    EnabledList,
    DisabledList,
    Override,
    Repaired,
}
