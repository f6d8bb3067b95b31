//! # kinetic_traffic_kernel
//!
//! A microscopic, time-stepped urban traffic simulation core. A
//! [`roadnet::RoadNet`] of roads/lanes/intersections is populated by
//! [`flow::Flow`]s that periodically inject [`agents::Vehicle`]s, and
//! [`engine::Engine::step`] advances every vehicle one `interval` at a
//! time through car-following, lane-changing, intersection-crossing, and
//! traffic-light logic.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use kinetic_traffic_kernel::config::SimulationConfig;
//! use kinetic_traffic_kernel::engine::Engine;
//! use kinetic_traffic_kernel::roadnet::RoadNet;
//!
//! let config = SimulationConfig::new("sim", "roadnet.json", "flow.json").build();
//! let net = RoadNet::new();
//! let mut engine = Engine::new(config, net, Vec::new());
//! engine.step().unwrap();
//! ```
//!
//! ## Modules
//!
//! - [`agents`] - vehicle state and per-step write buffers
//! - [`config`] - `SimulationConfig` and its JSON loading/validation
//! - [`engine`] - the fourteen-stage simulation clock
//! - [`flow`] - periodic vehicle emission
//! - [`geom`] - planar geometry primitives
//! - [`lane_change`] - the propose/arbitrate/commit handshake
//! - [`roadnet`] - the static road/lane/intersection graph
//! - [`shortest_path`] - route planning
//! - [`utils`] - synthetic network builders for tests and benches
//! - [`verbose`] - structured logging

pub mod agents;
pub mod config;
pub mod engine;
pub mod flow;
pub mod geom;
pub mod lane_change;
pub mod roadnet;
pub mod shortest_path;
pub mod utils;
pub mod verbose;
