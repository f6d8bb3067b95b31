//! # Config module
//!
//! Construction-time [`SimulationConfig`] (spec §6, §10.3): the engine's
//! external interface for `interval`, `seed`, file paths, feature flags,
//! and worker count.
pub mod config;

pub use self::config::*;
