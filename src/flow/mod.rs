//! # Flow module
//!
//! Periodic vehicle injection (spec §3, §4.1 stage 1, component C8). A
//! [`Flow`] owns a vehicle template and an emission schedule; the engine
//! asks each flow to `advance` once per step and constructs a
//! [`crate::agents::Vehicle`] per returned id.
pub mod flow;

pub use self::flow::*;
