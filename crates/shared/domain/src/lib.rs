//! # Domain Models
//!
//! This crate contains pure domain types for the shell host with minimal dependencies
//! (`serde`, `serde_json`, `bitflags`). Keep it lean: no I/O, no locking, no containers.
//! Just identifiers, settings records and the per-request resolution signals.

pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod resolution;
pub mod shell;

pub use error::{DomainError, DomainErrorExt};
pub use ids::{FeatureId, ShellId};
