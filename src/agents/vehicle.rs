use std::fmt;

use crate::agents::buffer::WriteBuffer;
use crate::agents::controller_info::ControllerInfo;
use crate::agents::lane_change_info::LaneChangeInfo;
use crate::agents::vehicle_info::VehicleInfo;
use crate::lane_change::controller::LaneChangeController;
use crate::roadnet::drivable::VehicleHandle;
use crate::roadnet::roadnet::RoadNet;
use crate::shortest_path::Router;

pub type VehicleID = String;

#[derive(Debug, Clone)]
pub enum VehicleError {
    UnknownVehicle(VehicleID),
    RouteInfeasible(VehicleID),
}

impl fmt::Display for VehicleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VehicleError::UnknownVehicle(id) => write!(f, "unknown vehicle id '{}'", id),
            VehicleError::RouteInfeasible(id) => write!(f, "vehicle '{}' has no feasible route", id),
        }
    }
}

impl std::error::Error for VehicleError {}

/// A single simulated vehicle (spec §3). Inter-vehicle references (leader,
/// blocker, lane-change partner) are resolved through the engine's vehicle
/// pool by `priority`, never held directly — see [`crate::roadnet::drivable::VehicleHandle`].
#[derive(Debug, Clone)]
pub struct Vehicle {
    pub id: VehicleID,
    pub priority: VehicleHandle,

    pub distance: f64,
    pub speed: f64,
    pub custom_speed: Option<f64>,

    pub length: f64,
    pub width: f64,
    pub max_speed: f64,
    pub max_pos_acc: f64,
    pub max_neg_acc: f64,
    pub usual_pos_acc: f64,
    pub usual_neg_acc: f64,
    pub min_gap: f64,
    pub headway_time: f64,
    pub yield_distance: f64,

    pub controller_info: ControllerInfo,
    pub lane_change_info: LaneChangeInfo,
    pub lane_change_controller: LaneChangeController,
    pub write_buffer: WriteBuffer,

    pub enter_time: f64,
    pub flow_id: Option<String>,
}

pub struct VehicleBuilder {
    vehicle: Vehicle,
}

impl Vehicle {
    pub fn new(id: impl Into<String>, priority: VehicleHandle, first_drivable: impl Into<String>, anchors: Vec<String>) -> VehicleBuilder {
        VehicleBuilder {
            vehicle: Vehicle {
                id: id.into(),
                priority,
                distance: 0.0,
                speed: 0.0,
                custom_speed: None,
                length: 5.0,
                width: 2.0,
                max_speed: 16.7,
                max_pos_acc: 2.0,
                max_neg_acc: 4.5,
                usual_pos_acc: 2.0,
                usual_neg_acc: 4.5,
                min_gap: 2.5,
                headway_time: 1.5,
                yield_distance: 5.0,
                controller_info: ControllerInfo::new(first_drivable, Router::new(anchors)),
                lane_change_info: LaneChangeInfo::default(),
                lane_change_controller: LaneChangeController::default(),
                write_buffer: WriteBuffer::default(),
                enter_time: 0.0,
                flow_id: None,
            },
        }
    }

    pub fn min_brake_distance(&self) -> f64 {
        (self.speed * self.speed) / (2.0 * self.max_neg_acc)
    }

    /// Projects a forward displacement `delta` over the vehicle's planned
    /// drivable sequence, consuming each drivable's remaining length in
    /// turn (spec §4.3 `setDeltaDistance`). Writes the final drivable and
    /// residual distance into the write-buffer; sets `end` when the route's
    /// last drivable is exhausted.
    pub fn set_delta_distance(&mut self, delta: f64, net: &RoadNet, next_drivable_id: impl Fn(&str) -> Option<String>) {
        let mut remaining = self.distance + delta;
        let mut drivable_id = self.controller_info.current_drivable.clone();

        loop {
            let Some(drivable) = net.get_drivable(&drivable_id) else {
                self.write_buffer.end = Some(true);
                return;
            };
            if remaining <= drivable.length() || next_drivable_id(&drivable_id).is_none() {
                self.write_buffer.drivable = Some(drivable_id.clone());
                self.write_buffer.distance = Some(remaining.min(drivable.length()));
                if remaining > drivable.length() && next_drivable_id(&drivable_id).is_none() {
                    self.write_buffer.end = Some(true);
                }
                return;
            }
            remaining -= drivable.length();
            drivable_id = next_drivable_id(&drivable_id).expect("checked above");
        }
    }

    pub fn get_info(&self, net: &RoadNet) -> VehicleInfo {
        let (road, intersection) = match net.get_drivable(&self.controller_info.current_drivable) {
            Some(crate::roadnet::Drivable::Lane(lane)) => (Some(lane.road_id.clone()), None),
            Some(crate::roadnet::Drivable::LaneLink(link)) => {
                let intersection_id = net
                    .intersections
                    .values()
                    .find(|i| i.lane_link_ids.contains(&link.id))
                    .map(|i| i.id.clone());
                (None, intersection_id)
            }
            None => (None, None),
        };
        VehicleInfo {
            running: self.controller_info.running,
            distance: self.distance,
            speed: self.speed,
            drivable: self.controller_info.current_drivable.clone(),
            road,
            intersection,
            route: self.controller_info.router.planned_roads.clone(),
        }
    }
}

impl VehicleBuilder {
    pub fn with_length(mut self, length: f64) -> Self {
        self.vehicle.length = length;
        self
    }
    pub fn with_width(mut self, width: f64) -> Self {
        self.vehicle.width = width;
        self
    }
    pub fn with_max_speed(mut self, max_speed: f64) -> Self {
        self.vehicle.max_speed = max_speed;
        self
    }
    pub fn with_max_pos_acc(mut self, v: f64) -> Self {
        self.vehicle.max_pos_acc = v;
        self
    }
    pub fn with_max_neg_acc(mut self, v: f64) -> Self {
        self.vehicle.max_neg_acc = v;
        self
    }
    pub fn with_usual_pos_acc(mut self, v: f64) -> Self {
        self.vehicle.usual_pos_acc = v;
        self
    }
    pub fn with_usual_neg_acc(mut self, v: f64) -> Self {
        self.vehicle.usual_neg_acc = v;
        self
    }
    pub fn with_min_gap(mut self, v: f64) -> Self {
        self.vehicle.min_gap = v;
        self
    }
    pub fn with_headway_time(mut self, v: f64) -> Self {
        self.vehicle.headway_time = v;
        self
    }
    pub fn with_yield_distance(mut self, v: f64) -> Self {
        self.vehicle.yield_distance = v;
        self
    }
    pub fn with_enter_time(mut self, v: f64) -> Self {
        self.vehicle.enter_time = v;
        self
    }
    pub fn with_flow_id(mut self, flow_id: impl Into<String>) -> Self {
        self.vehicle.flow_id = Some(flow_id.into());
        self
    }
    pub fn build(self) -> Vehicle {
        self.vehicle
    }
}

/// The smaller real root of the no-collision quadratic (spec §4.3), plus
/// the secondary linear bound, and the headway-time bound — the three are
/// combined by [`car_follow_speed`].
pub fn no_collision_speed(v_leader: f64, decel_leader: f64, v_follower: f64, decel_follower: f64, gap: f64, dt: f64, target_gap: f64) -> f64 {
    let c = v_follower * dt / 2.0 + target_gap - (v_leader * v_leader) / (2.0 * decel_leader) - gap;
    let a = 0.5 / decel_follower.max(1e-6);
    let b = 0.5 * dt;
    let quadratic_root = if b * b - 4.0 * a * c >= 0.0 {
        let disc = (b * b - 4.0 * a * c).sqrt();
        ((-b - disc) / (2.0 * a)).min((-b + disc) / (2.0 * a))
    } else {
        v_leader
    };
    let linear_bound = 2.0 * v_leader - decel_leader * dt + 2.0 * (gap - target_gap) / dt.max(1e-6);
    quadratic_root.min(linear_bound)
}

/// The car-following speed component of `getAction` (spec §4.1 stage 9,
/// §4.3). With no leader, falls back to the custom-speed override or vmax.
pub fn car_follow_speed(follower: &Vehicle, leader: Option<&Vehicle>, gap: f64, dt: f64) -> f64 {
    let Some(leader) = leader else {
        return follower.custom_speed.unwrap_or(follower.max_speed);
    };
    let nc = no_collision_speed(leader.speed, leader.usual_neg_acc, follower.speed, follower.usual_neg_acc, gap, dt, follower.min_gap);
    let assume_decel = leader.usual_neg_acc;
    let headway_bound = (gap + (leader.speed + assume_decel / 2.0) * dt - follower.speed * dt / 2.0) / (follower.headway_time + dt / 2.0);
    nc.min(headway_bound)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vehicle(id: &str, priority: VehicleHandle) -> Vehicle {
        Vehicle::new(id, priority, "lane_0", vec!["road_0".to_string()]).build()
    }

    #[test]
    fn test_no_leader_uses_vmax() {
        let v = vehicle("v0", 1);
        assert!((car_follow_speed(&v, None, 0.0, 1.0) - v.max_speed).abs() < 1e-9);
    }

    #[test]
    fn test_no_leader_respects_custom_speed() {
        let mut v = vehicle("v0", 1);
        v.custom_speed = Some(3.0);
        assert!((car_follow_speed(&v, None, 0.0, 1.0) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_car_follow_speed_bounded_below_leader_when_gap_small() {
        let leader = vehicle("lead", 2);
        let mut follower = vehicle("foll", 1);
        follower.speed = 10.0;
        let speed = car_follow_speed(&follower, Some(&leader), 1.0, 1.0);
        assert!(speed < follower.speed);
    }

    #[test]
    fn test_min_brake_distance_grows_with_speed() {
        let mut v = vehicle("v0", 1);
        v.speed = 10.0;
        let d1 = v.min_brake_distance();
        v.speed = 20.0;
        let d2 = v.min_brake_distance();
        assert!(d2 > d1);
    }
}
