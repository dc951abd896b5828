//! Kernel utilities shared by the `FactGate` entry points.
//! Keep this crate lightweight; it re-exports the domain types and owns configuration loading.
//!
//! ## Config loading
//! ```rust,no_run
//! use factgate_kernel::config::load_config;
//! use factgate_kernel::domain::config::FactsConfig;
//!
//! let cfg: FactsConfig = load_config(Some("factgate.toml")).unwrap_or_default();
//! assert!(cfg.cache.max_concurrent > 0);
//! ```

pub mod config;

pub use factgate_domain as domain;
