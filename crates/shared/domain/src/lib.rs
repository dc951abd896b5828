//! # Domain Models
//!
//! Pure data shared by every `FactGate` crate: the [`outcome::FactResult`] union returned by
//! section reads, module metadata, validation conflicts and the typed configuration tree.
//! Keep it lean: no I/O, networking, or heavy logic, just data and simple helpers.

pub mod config;
pub mod conflict;
pub mod constants;
pub mod module;
pub mod outcome;
