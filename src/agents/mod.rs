// src/agents/mod.rs
//! # Agents Module
//!
//! The vehicle agent: continuous-kinematics state, longitudinal controller
//! state, lane-change state, and the per-step write-buffer that lets worker
//! threads compute a vehicle's next state without mutating it in place
//! (spec §3, §4.3).
//!
//! ## Key Components
//!
//! - [`Vehicle`] - position, speed, and template parameters of a single vehicle
//! - [`ControllerInfo`] - current drivable, leader/gap/blocker, route cursor
//! - [`LaneChangeInfo`] - shadow/real partner bookkeeping during a lane change
//! - [`WriteBuffer`] - staged next-step writes, applied at the barrier
//! - [`VehicleInfo`] - read-only snapshot for introspection
mod buffer;
mod controller_info;
mod lane_change_info;
mod signal;
mod vehicle;
mod vehicle_info;

pub use self::{buffer::*, controller_info::*, lane_change_info::*, signal::*, vehicle::*, vehicle_info::*};
