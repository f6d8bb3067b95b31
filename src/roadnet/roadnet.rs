use indexmap::IndexMap;

use crate::geom::{offset_polyline, segment_intersection};
use crate::roadnet::cross::Cross;
use crate::roadnet::drivable::Drivable;
use crate::roadnet::error::RoadNetError;
use crate::roadnet::intersection::Intersection;
use crate::roadnet::lane::Lane;
use crate::roadnet::lane_link::LaneLink;
use crate::roadnet::road::Road;

/// Minimum gap left between a lane-link's generated control points and its
/// endpoints (spec §4.2).
pub const LANE_LINK_MIN_CONTROL_GAP: f64 = 5.0;

/// Owns the whole road-network graph: roads (and their lanes), intersections
/// (and their road-links, lane-links and crosses), and the flat drivable
/// registry used for O(1) lookups by id during stepping (spec §3).
#[derive(Debug, Clone, Default)]
pub struct RoadNet {
    pub roads: IndexMap<String, Road>,
    pub intersections: IndexMap<String, Intersection>,
    pub drivables: IndexMap<String, Drivable>,
}

impl RoadNet {
    pub fn new() -> Self {
        RoadNet::default()
    }

    pub fn add_road(&mut self, road: Road, lanes: Vec<Lane>) -> Result<(), RoadNetError> {
        if road.points.len() < 2 {
            return Err(RoadNetError::DegenerateGeometry { entity: road.id.clone() });
        }
        for lane in lanes {
            self.drivables.insert(lane.id.clone(), Drivable::Lane(lane));
        }
        self.roads.insert(road.id.clone(), road);
        Ok(())
    }

    pub fn add_intersection(&mut self, intersection: Intersection, lane_links: Vec<LaneLink>) {
        for link in lane_links {
            self.drivables.insert(link.id.clone(), Drivable::LaneLink(link));
        }
        self.intersections.insert(intersection.id.clone(), intersection);
    }

    pub fn get_drivable(&self, id: &str) -> Option<&Drivable> {
        self.drivables.get(id)
    }

    pub fn get_drivable_mut(&mut self, id: &str) -> Option<&mut Drivable> {
        self.drivables.get_mut(id)
    }

    pub fn get_road(&self, id: &str) -> Option<&Road> {
        self.roads.get(id)
    }

    pub fn get_road_mut(&mut self, id: &str) -> Option<&mut Road> {
        self.roads.get_mut(id)
    }

    pub fn get_intersection(&self, id: &str) -> Option<&Intersection> {
        self.intersections.get(id)
    }

    pub fn get_intersection_mut(&mut self, id: &str) -> Option<&mut Intersection> {
        self.intersections.get_mut(id)
    }

    /// Derives a lane's centerline by offsetting the road centerline by the
    /// accumulated half-widths of the lanes to its side (spec §4.2). `index`
    /// is 0-based from the innermost lane; `offset_to_center` is the signed
    /// distance from the road centerline to this lane's centerline.
    pub fn derive_lane_points(road_points: &[crate::geom::Point], offset_to_center: f64) -> Vec<crate::geom::Point> {
        offset_polyline(road_points, offset_to_center)
    }

    /// Builds lane-link geometry via the cubic interpolation described in
    /// spec §4.2, when explicit points were not supplied by the loader.
    pub fn build_lane_link_points(
        start_lane: &Lane,
        end_lane: &Lane,
    ) -> Vec<crate::geom::Point> {
        let start = *start_lane.points.last().unwrap_or(&crate::geom::Point::zero());
        let start_tangent = if start_lane.points.len() >= 2 {
            start - start_lane.points[start_lane.points.len() - 2]
        } else {
            crate::geom::Point::new(1.0, 0.0)
        };
        let end = *end_lane.points.first().unwrap_or(&crate::geom::Point::zero());
        let end_tangent = if end_lane.points.len() >= 2 {
            end_lane.points[1] - end
        } else {
            crate::geom::Point::new(1.0, 0.0)
        };
        crate::geom::bezier_lane_link_polyline(start, start_tangent, end, end_tangent, 12, LANE_LINK_MIN_CONTROL_GAP)
    }

    /// Enumerates all unordered lane-link pairs within each intersection,
    /// finds their first on-segment crossing, and records a [`Cross`] at
    /// that point, then sorts each lane-link's cross list by distance along
    /// that lane-link (spec §4.2).
    pub fn init_crosses(&mut self) {
        let intersection_ids: Vec<String> = self.intersections.keys().cloned().collect();
        for intersection_id in intersection_ids {
            let lane_link_ids = self.intersections[&intersection_id].lane_link_ids.clone();
            let mut new_crosses: Vec<Cross> = Vec::new();
            let mut per_link_indices: IndexMap<String, Vec<usize>> = IndexMap::new();

            for i in 0..lane_link_ids.len() {
                for j in (i + 1)..lane_link_ids.len() {
                    let id_a = &lane_link_ids[i];
                    let id_b = &lane_link_ids[j];
                    let (Some(Drivable::LaneLink(a)), Some(Drivable::LaneLink(b))) =
                        (self.drivables.get(id_a), self.drivables.get(id_b))
                    else {
                        continue;
                    };
                    if a.start_lane_id == b.start_lane_id || a.end_lane_id == b.end_lane_id {
                        // Same origin or destination: not a conflicting cross.
                        continue;
                    }
                    if let Some((dist_a, dist_b, angle)) = first_crossing(&a.points, &b.points) {
                        let cross = Cross::new(id_a.clone(), id_b.clone(), dist_a, dist_b, a.width, b.width, angle);
                        let cross_index = new_crosses.len();
                        new_crosses.push(cross);
                        per_link_indices.entry(id_a.clone()).or_default().push(cross_index);
                        per_link_indices.entry(id_b.clone()).or_default().push(cross_index);
                    }
                }
            }

            for (link_id, mut indices) in per_link_indices {
                indices.sort_by(|&ia, &ib| {
                    let da = distance_for_link(&new_crosses[ia], &link_id);
                    let db = distance_for_link(&new_crosses[ib], &link_id);
                    da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
                });
                if let Some(Drivable::LaneLink(link)) = self.drivables.get_mut(&link_id) {
                    link.cross_indices = indices;
                }
            }

            if let Some(intersection) = self.intersections.get_mut(&intersection_id) {
                intersection.crosses = new_crosses;
            }
        }
    }

    /// Sanity pass flagging lanes shorter than 50m or with a max speed
    /// above 30 m/s (spec §10.5). Returns human-readable diagnostics rather
    /// than printing them.
    pub fn check_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        for drivable in self.drivables.values() {
            if let Drivable::Lane(lane) = drivable {
                if lane.length < 50.0 {
                    warnings.push(format!("lane '{}' is shorter than 50m ({:.1}m)", lane.id, lane.length));
                }
                if lane.max_speed > 30.0 {
                    warnings.push(format!("lane '{}' has max speed above 30 m/s ({:.1})", lane.id, lane.max_speed));
                }
            }
        }
        warnings
    }

    pub fn clear_cross_notifications(&mut self) {
        for intersection in self.intersections.values_mut() {
            for cross in &mut intersection.crosses {
                cross.clear_notify();
            }
        }
    }
}

fn distance_for_link(cross: &Cross, link_id: &str) -> f64 {
    if cross.lane_links[0] == link_id {
        cross.distances[0]
    } else {
        cross.distances[1]
    }
}

/// Returns `(distance_along_a, distance_along_b, angle)` for the first pair
/// of segments (in traversal order) at which polylines `a` and `b` cross.
fn first_crossing(a: &[crate::geom::Point], b: &[crate::geom::Point]) -> Option<(f64, f64, f64)> {
    let mut len_a = 0.0;
    for wa in a.windows(2) {
        let mut len_b = 0.0;
        for wb in b.windows(2) {
            if let Some(hit) = segment_intersection(wa[0], wa[1], wb[0], wb[1]) {
                let dist_a = len_a + wa[0].distance_to(&hit.point);
                let dist_b = len_b + wb[0].distance_to(&hit.point);
                let dir_a = (wa[1] - wa[0]).unit();
                let dir_b = (wb[1] - wb[0]).unit();
                let angle = dir_a.angle_to(&dir_b);
                return Some((dist_a, dist_b, angle));
            }
            len_b += wb[0].distance_to(&wb[1]);
        }
        len_a += wa[0].distance_to(&wa[1]);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Point;
    use crate::roadnet::lane_link::RoadLinkType;

    #[test]
    fn test_init_crosses_finds_perpendicular_links() {
        let mut net = RoadNet::new();
        let intersection = Intersection::new("i0", Point::zero())
            .with_road_links(vec![])
            .build();
        net.intersections.insert("i0".to_string(), intersection);

        let link_a = LaneLink::new("ll_a", "rl0", "lane_a_in", "lane_a_out", RoadLinkType::Straight)
            .with_width(3.0)
            .with_points(vec![Point::new(-10.0, 0.0), Point::new(10.0, 0.0)])
            .build();
        let link_b = LaneLink::new("ll_b", "rl1", "lane_b_in", "lane_b_out", RoadLinkType::TurnLeft)
            .with_width(3.0)
            .with_points(vec![Point::new(0.0, -10.0), Point::new(0.0, 10.0)])
            .build();
        net.drivables.insert("ll_a".to_string(), Drivable::LaneLink(link_a));
        net.drivables.insert("ll_b".to_string(), Drivable::LaneLink(link_b));
        net.intersections.get_mut("i0").unwrap().lane_link_ids = vec!["ll_a".to_string(), "ll_b".to_string()];

        net.init_crosses();

        assert_eq!(net.intersections["i0"].crosses.len(), 1);
        let cross = &net.intersections["i0"].crosses[0];
        assert!((cross.distances[0] - 10.0).abs() < 1e-6);
        assert!((cross.distances[1] - 10.0).abs() < 1e-6);
    }
}
