//! # Lane-change subsystem
//!
//! The 3-phase propose/arbitrate/commit handshake that lets a vehicle move
//! laterally between adjacent lanes on the same road without ever being
//! removed from either lane's vehicle list mid-change (spec §4.4,
//! component C5). [`crate::lane_change::controller::LaneChangeController`]
//! holds the per-vehicle handshake state; the shadow mechanism itself is
//! expressed through [`crate::agents::LaneChangeInfo`].
pub mod controller;

pub use self::controller::*;
