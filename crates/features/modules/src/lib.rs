//! # Modules
//!
//! Decides, once at startup, which fact sections are active.
//!
//! 1. [`ModuleRegistry`] holds the static tree of sections (`hardware` → `hardware.memory`).
//! 2. [`resolve`] folds a preset, enable/disable lists and per-module overrides into a total
//!    [`ResolvedModuleSet`].
//! 3. [`validate`] checks the result against the tree and mode constraints, failing fast or
//!    repairing in a single pass.
//!
//! ## Example
//!
//! ```rust
//! use factgate_modules::{ModuleRegistry, ResolutionInput, resolve_and_validate};
//! use factgate_domain::module::{Preset, ValidationMode};
//!
//! let registry = ModuleRegistry::standard();
//! let input = ResolutionInput::new(Preset::Common).disable("os.filesystem");
//! let validation = resolve_and_validate(&registry, &input, ValidationMode::Fail, false)?;
//!
//! assert_eq!(validation.modules.is_enabled_path("hardware.memory"), Some(true));
//! assert_eq!(validation.modules.is_enabled_path("os.filesystem"), Some(false));
//! # Ok::<(), factgate_modules::ModuleError>(())
//! ```

mod catalog;
mod error;
mod registry;
mod resolver;
mod validator;

pub use error::{ModuleError, ModuleErrorExt};
pub use registry::{ModuleRegistry, ModuleRegistryBuilder};
pub use resolver::{ModuleState, ResolutionInput, ResolvedModuleSet, resolve};
pub use validator::{Validation, resolve_and_validate, validate};
