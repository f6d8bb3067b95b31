use crate::geom::Point;
use crate::roadnet::drivable::VehicleHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoadLinkType {
    Straight,
    TurnLeft,
    TurnRight,
}

impl RoadLinkType {
    /// Priority order used by the cross-conflict resolver (spec §4.5):
    /// straight > turn-left > turn-right.
    pub fn priority(self) -> u8 {
        match self {
            RoadLinkType::Straight => 3,
            RoadLinkType::TurnLeft => 2,
            RoadLinkType::TurnRight => 1,
        }
    }
}

/// A single lane-to-lane connector crossing an intersection.
#[derive(Debug, Clone)]
pub struct LaneLink {
    pub id: String,
    pub road_link_id: String,
    pub start_lane_id: String,
    pub end_lane_id: String,
    pub kind: RoadLinkType,
    pub width: f64,
    pub max_speed: f64,
    pub length: f64,
    pub points: Vec<Point>,
    /// Indices into the owning [`Intersection`](super::intersection::Intersection)'s
    /// `crosses` this lane-link participates in.
    pub cross_indices: Vec<usize>,
    pub vehicles: Vec<VehicleHandle>,
}

pub struct LaneLinkBuilder {
    id: String,
    road_link_id: String,
    start_lane_id: String,
    end_lane_id: String,
    kind: RoadLinkType,
    width: f64,
    max_speed: f64,
    points: Vec<Point>,
}

impl LaneLink {
    pub fn new(
        id: impl Into<String>,
        road_link_id: impl Into<String>,
        start_lane_id: impl Into<String>,
        end_lane_id: impl Into<String>,
        kind: RoadLinkType,
    ) -> LaneLinkBuilder {
        LaneLinkBuilder {
            id: id.into(),
            road_link_id: road_link_id.into(),
            start_lane_id: start_lane_id.into(),
            end_lane_id: end_lane_id.into(),
            kind,
            width: 4.0,
            max_speed: 16.7,
            points: Vec::new(),
        }
    }

    pub fn turn_speed_cap(&self) -> f64 {
        match self.kind {
            RoadLinkType::Straight => self.max_speed,
            RoadLinkType::TurnLeft | RoadLinkType::TurnRight => (self.max_speed * 0.5).max(2.0),
        }
    }

    pub fn insert_sorted(&mut self, handle: VehicleHandle, distance: f64, distance_of: impl Fn(VehicleHandle) -> f64) {
        let pos = self
            .vehicles
            .iter()
            .position(|&v| distance_of(v) < distance)
            .unwrap_or(self.vehicles.len());
        self.vehicles.insert(pos, handle);
    }

    pub fn remove_vehicle(&mut self, handle: VehicleHandle) {
        self.vehicles.retain(|&v| v != handle);
    }
}

impl LaneLinkBuilder {
    pub fn with_width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }

    pub fn with_max_speed(mut self, max_speed: f64) -> Self {
        self.max_speed = max_speed;
        self
    }

    pub fn with_points(mut self, points: Vec<Point>) -> Self {
        self.points = points;
        self
    }

    pub fn build(self) -> LaneLink {
        let length = crate::geom::polyline_length(&self.points);
        LaneLink {
            id: self.id,
            road_link_id: self.road_link_id,
            start_lane_id: self.start_lane_id,
            end_lane_id: self.end_lane_id,
            kind: self.kind,
            width: self.width,
            max_speed: self.max_speed,
            length,
            points: self.points,
            cross_indices: Vec::new(),
            vehicles: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_speed_cap_lower_than_straight() {
        let straight = LaneLink::new("ll0", "rl0", "a", "b", RoadLinkType::Straight)
            .with_max_speed(16.0)
            .with_points(vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)])
            .build();
        let left = LaneLink::new("ll1", "rl0", "a", "c", RoadLinkType::TurnLeft)
            .with_max_speed(16.0)
            .with_points(vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)])
            .build();
        assert!(left.turn_speed_cap() < straight.turn_speed_cap());
    }

    #[test]
    fn test_priority_order() {
        assert!(RoadLinkType::Straight.priority() > RoadLinkType::TurnLeft.priority());
        assert!(RoadLinkType::TurnLeft.priority() > RoadLinkType::TurnRight.priority());
    }
}
