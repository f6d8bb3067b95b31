//! # Utils module
//!
//! Synthetic [`crate::roadnet::RoadNet`] builders used by tests and
//! benches: a straight multi-lane corridor and a single four-way
//! intersection, grounded on the fixtures
//! [`crate::shortest_path::router`]'s own tests build inline.
pub mod generators;
