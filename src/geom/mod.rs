//! # Geometry Module
//!
//! Planar Euclidean primitives used to build road/lane/lane-link geometry
//! and to locate vehicles along a drivable's centerline.
//!
//! ## Key Components
//!
//! - [`Point`] - a 2-D Euclidean point/vector with the usual arithmetic,
//!   plus `unit`, `normal`, `angle_to`, `lerp`.
//! - [`segment_intersection`] - parametric line-segment crossing test, used
//!   to enumerate crosses between lane links.
//! - [`polyline_length`] / [`point_at_distance`] - arc-length queries over a
//!   drivable's centerline.
//! - [`offset_polyline`] - bisector-based polyline offsetting, used to
//!   derive individual lane centerlines from a road's centerline.
//! - [`bezier_lane_link_polyline`] - cubic-Bezier-like interpolation used to
//!   build the geometry of a lane link crossing an intersection.
//! - [`get_bearing`] - planar bearing between two points, used for replay
//!   heading output.

mod point;
mod spatial;

pub use self::{point::*, spatial::*};
