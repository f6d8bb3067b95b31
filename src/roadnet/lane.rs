use std::collections::VecDeque;

use crate::geom::Point;
use crate::roadnet::drivable::VehicleHandle;

/// Number of (vehicleCount, averageSpeed) samples kept in a lane's rolling
/// history ring (spec §3).
pub const LANE_HISTORY_WINDOW: usize = 240;

/// Upper bound on the number of vehicles a single lane segment is expected
/// to hold; segment length is derived from this so spatial queries over a
/// segment stay roughly O(1).
pub const SEGMENT_CAR_CAPACITY: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneHistorySample {
    pub vehicle_count: usize,
    pub average_speed: f64,
}

/// An equal-length slice of a lane's centerline, caching the vehicles
/// currently within its span so spatial queries don't have to scan the
/// whole lane.
#[derive(Debug, Clone)]
pub struct LaneSegment {
    pub start_distance: f64,
    pub end_distance: f64,
    pub vehicle_indices: Vec<usize>,
}

/// A single drivable lane of a [`Road`](super::road::Road).
#[derive(Debug, Clone)]
pub struct Lane {
    pub id: String,
    pub road_id: String,
    pub index: usize,
    pub width: f64,
    pub max_speed: f64,
    pub length: f64,
    pub points: Vec<Point>,
    pub lane_link_ids: Vec<String>,
    /// Vehicles currently on this lane, sorted by descending distance; the
    /// head is nearest the lane's exit.
    pub vehicles: Vec<VehicleHandle>,
    /// Vehicles queued to enter the lane but not yet admitted (stage
    /// `handleWaiting`, spec §4.1).
    pub waiting_buffer: VecDeque<VehicleHandle>,
    pub segments: Vec<LaneSegment>,
    pub history: VecDeque<LaneHistorySample>,
    /// Crosses along this lane's outgoing lane-links, sorted by distance
    /// from the lane start (spec §4.2).
    pub cross_distances: Vec<(usize, f64)>,
}

pub struct LaneBuilder {
    id: String,
    road_id: String,
    index: usize,
    width: f64,
    max_speed: f64,
    points: Vec<Point>,
    lane_link_ids: Vec<String>,
}

impl Lane {
    pub fn new(id: impl Into<String>, road_id: impl Into<String>, index: usize) -> LaneBuilder {
        LaneBuilder {
            id: id.into(),
            road_id: road_id.into(),
            index,
            width: 4.0,
            max_speed: 16.7,
            points: Vec::new(),
            lane_link_ids: Vec::new(),
        }
    }

    /// Inserts a vehicle handle at the position that keeps `vehicles` sorted
    /// by descending distance, given the handle's current distance.
    pub fn insert_sorted(&mut self, handle: VehicleHandle, distance: f64, distance_of: impl Fn(VehicleHandle) -> f64) {
        let pos = self
            .vehicles
            .iter()
            .position(|&v| distance_of(v) < distance)
            .unwrap_or(self.vehicles.len());
        self.vehicles.insert(pos, handle);
    }

    /// Inserts `handle` immediately in front of the vehicle at `index`
    /// (i.e. at `index`, pushing it and everything behind it back). Used by
    /// `insertShadow` (spec §4.4, Open Question 1).
    pub fn insert_before(&mut self, index: usize, handle: VehicleHandle) {
        let index = index.min(self.vehicles.len());
        self.vehicles.insert(index, handle);
    }

    pub fn remove_vehicle(&mut self, handle: VehicleHandle) {
        self.vehicles.retain(|&v| v != handle);
    }

    pub fn rebuild_segments(&mut self, vehicle_distance: impl Fn(VehicleHandle) -> f64) {
        let segment_len = (self.length / ((self.vehicles.len() / SEGMENT_CAR_CAPACITY).max(1) as f64)).max(1.0);
        let segment_count = (self.length / segment_len).ceil().max(1.0) as usize;
        let mut segments: Vec<LaneSegment> = (0..segment_count)
            .map(|i| LaneSegment {
                start_distance: i as f64 * segment_len,
                end_distance: ((i + 1) as f64 * segment_len).min(self.length),
                vehicle_indices: Vec::new(),
            })
            .collect();
        for (vi, &handle) in self.vehicles.iter().enumerate() {
            let d = vehicle_distance(handle);
            let seg_idx = ((d / segment_len) as usize).min(segments.len().saturating_sub(1));
            segments[seg_idx].vehicle_indices.push(vi);
        }
        self.segments = segments;
    }

    pub fn push_history_sample(&mut self, sample: LaneHistorySample) {
        self.history.push_back(sample);
        while self.history.len() > LANE_HISTORY_WINDOW {
            self.history.pop_front();
        }
    }

    pub fn history_average_speed(&self) -> f64 {
        let total_count: usize = self.history.iter().map(|s| s.vehicle_count).sum();
        if total_count == 0 {
            return 0.0;
        }
        let weighted: f64 = self.history.iter().map(|s| s.vehicle_count as f64 * s.average_speed).sum();
        weighted / total_count as f64
    }
}

impl LaneBuilder {
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

    pub fn with_lane_link_ids(mut self, ids: Vec<String>) -> Self {
        self.lane_link_ids = ids;
        self
    }

    pub fn build(self) -> Lane {
        let length = crate::geom::polyline_length(&self.points);
        Lane {
            id: self.id,
            road_id: self.road_id,
            index: self.index,
            width: self.width,
            max_speed: self.max_speed,
            length,
            points: self.points,
            lane_link_ids: self.lane_link_ids,
            vehicles: Vec::new(),
            waiting_buffer: VecDeque::new(),
            segments: Vec::new(),
            history: VecDeque::new(),
            cross_distances: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lane() -> Lane {
        Lane::new("lane_0", "road_0", 0)
            .with_width(3.5)
            .with_points(vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)])
            .build()
    }

    #[test]
    fn test_length_derived_from_points() {
        let l = lane();
        assert!((l.length - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_insert_sorted_keeps_descending_order() {
        let mut l = lane();
        let distances = [10.0_f64, 50.0, 30.0];
        for (i, d) in distances.iter().enumerate() {
            let handle = i as VehicleHandle;
            let d = *d;
            l.insert_sorted(handle, d, |h| distances[h as usize]);
        }
        let ordered: Vec<f64> = l.vehicles.iter().map(|&h| distances[h as usize]).collect();
        assert_eq!(ordered, vec![50.0, 30.0, 10.0]);
    }

    #[test]
    fn test_history_average_speed_weighted() {
        let mut l = lane();
        l.push_history_sample(LaneHistorySample { vehicle_count: 2, average_speed: 10.0 });
        l.push_history_sample(LaneHistorySample { vehicle_count: 1, average_speed: 4.0 });
        assert!((l.history_average_speed() - 8.0).abs() < 1e-9);
    }
}
