use crate::geom::Point;
use crate::roadnet::drivable::VehicleHandle;

/// A directed road between two intersections, owning an ordered set of
/// lanes (index 0 = innermost, spec §3).
#[derive(Debug, Clone)]
pub struct Road {
    pub id: String,
    pub start_intersection: String,
    pub end_intersection: String,
    pub points: Vec<Point>,
    pub lane_ids: Vec<String>,
    /// Vehicles whose route is being materialized this step (stage
    /// `planRoute`, spec §4.1).
    pub plan_route_buffer: Vec<VehicleHandle>,
}

pub struct RoadBuilder {
    id: String,
    start_intersection: String,
    end_intersection: String,
    points: Vec<Point>,
    lane_ids: Vec<String>,
}

impl Road {
    pub fn new(id: impl Into<String>, start_intersection: impl Into<String>, end_intersection: impl Into<String>) -> RoadBuilder {
        RoadBuilder {
            id: id.into(),
            start_intersection: start_intersection.into(),
            end_intersection: end_intersection.into(),
            points: Vec::new(),
            lane_ids: Vec::new(),
        }
    }

    pub fn length(&self) -> f64 {
        crate::geom::polyline_length(&self.points)
    }
}

impl RoadBuilder {
    pub fn with_points(mut self, points: Vec<Point>) -> Self {
        self.points = points;
        self
    }

    pub fn with_lane_ids(mut self, lane_ids: Vec<String>) -> Self {
        self.lane_ids = lane_ids;
        self
    }

    pub fn build(self) -> Road {
        Road {
            id: self.id,
            start_intersection: self.start_intersection,
            end_intersection: self.end_intersection,
            points: self.points,
            lane_ids: self.lane_ids,
            plan_route_buffer: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_road_length() {
        let road = Road::new("r0", "i0", "i1")
            .with_points(vec![Point::new(0.0, 0.0), Point::new(0.0, 200.0)])
            .build();
        assert!((road.length() - 200.0).abs() < 1e-9);
    }
}
