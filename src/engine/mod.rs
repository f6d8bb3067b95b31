//! # Engine module
//!
//! The simulation clock: wires [`crate::roadnet::RoadNet`],
//! [`crate::agents::Vehicle`] pool, [`crate::flow::Flow`]s, and
//! [`crate::config::SimulationConfig`] together and drives the fourteen
//! ordered stages of a single step (spec §4.1).
pub mod archive;
pub mod engine;
pub mod error;
pub mod pipeline;

pub use self::{archive::*, engine::*, error::*, pipeline::*};
