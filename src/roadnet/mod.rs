//! # Road network module
//!
//! The static graph vehicles move over: roads and their lanes, intersections
//! and their road-links/lane-links/crosses, and traffic lights. Built once
//! per simulation and, aside from traffic-light state and the transient
//! per-drivable vehicle lists, read-only during stepping (spec §3).

pub mod cross;
pub mod drivable;
pub mod error;
pub mod intersection;
pub mod lane;
pub mod lane_link;
pub mod road;
pub mod road_link;
pub mod roadnet;
pub mod traffic_light;

pub use self::{
    cross::*, drivable::*, error::*, intersection::*, lane::*, lane_link::*, road::*, road_link::*, roadnet::*,
    traffic_light::*,
};
