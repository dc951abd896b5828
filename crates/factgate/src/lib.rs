//! Facade crate for `FactGate`.
//! Re-exports the domain, module, cache and kernel crates and assembles them into a [`FactGate`].
//! Keep this crate thin: it should compose other crates, not implement business logic.
//!
//! ## Usage
//!
//! ```rust
//! use factgate::FactGate;
//! use factgate::domain::outcome::FactResult;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), factgate::FactGateError> {
//! let config = factgate::kernel::config::load_config_str("[modules]\npreset = \"common\"\n")?;
//! let gate = FactGate::builder()
//!     .config(config)
//!     .source(|_: &factgate::cache::CacheKey| FactResult::success(42_u64))
//!     .build()?;
//!
//! let memory = gate.section("hardware.memory").await?;
//! assert_eq!(memory.value(), Some(&42));
//! gate.shutdown().await;
//! # Ok(())
//! # }
//! ```

mod error;
mod gate;

pub use error::{FactGateError, FactGateErrorExt};
pub use gate::{FactGate, FactGateBuilder};

pub use factgate_cache as cache;
pub use factgate_domain as domain;
pub use factgate_kernel as kernel;
#[cfg(feature = "logger")]
pub use factgate_logger as logger;
pub use factgate_modules as modules;
