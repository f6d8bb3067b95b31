use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;

use indexmap::IndexMap;

use crate::roadnet::roadnet::RoadNet;

#[derive(Debug, Clone)]
pub enum RouterError {
    NoPathFound { start_road: String, end_road: String },
    UnknownRoad(String),
    RouteTooShort,
}

impl fmt::Display for RouterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouterError::NoPathFound { start_road, end_road } => {
                write!(f, "no route found between road '{}' and road '{}'", start_road, end_road)
            }
            RouterError::UnknownRoad(id) => write!(f, "unknown road id '{}'", id),
            RouterError::RouteTooShort => write!(f, "planned route has length <= 1"),
        }
    }
}

impl std::error::Error for RouterError {}

#[derive(Debug, Clone)]
struct DijkstraNode {
    road_id: String,
    cost: f64,
}

impl PartialEq for DijkstraNode {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost
    }
}
impl Eq for DijkstraNode {}

impl PartialOrd for DijkstraNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DijkstraNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so BinaryHeap (a max-heap) pops the smallest cost first.
        other.cost.partial_cmp(&self.cost).unwrap_or(Ordering::Equal).then_with(|| self.road_id.cmp(&other.road_id))
    }
}

/// Road-sequence planner: plain Dijkstra over the road graph (no heuristic —
/// roads aren't laid out on a lattice with a usable geometric lower bound,
/// unlike the teacher's cell-grid A*). Cost between two roads sharing an
/// intersection is the destination road's free-flow travel time
/// (length / maxSpeed), the "duration-weighted shortest path" noted in
/// spec §9.
pub fn shortest_road_path(net: &RoadNet, start_road: &str, end_road: &str) -> Result<Vec<String>, RouterError> {
    if !net.roads.contains_key(start_road) {
        return Err(RouterError::UnknownRoad(start_road.to_string()));
    }
    if !net.roads.contains_key(end_road) {
        return Err(RouterError::UnknownRoad(end_road.to_string()));
    }
    if start_road == end_road {
        return Ok(vec![start_road.to_string()]);
    }

    let mut g_score: IndexMap<String, f64> = IndexMap::new();
    let mut came_from: IndexMap<String, String> = IndexMap::new();
    let mut heap = BinaryHeap::new();

    g_score.insert(start_road.to_string(), 0.0);
    heap.push(DijkstraNode { road_id: start_road.to_string(), cost: 0.0 });

    while let Some(DijkstraNode { road_id, cost }) = heap.pop() {
        if road_id == end_road {
            return Ok(reconstruct(&came_from, &road_id));
        }
        if cost > *g_score.get(&road_id).unwrap_or(&f64::INFINITY) {
            continue;
        }
        for next_id in successor_roads(net, &road_id) {
            let next_cost = cost + road_duration(net, &next_id);
            if next_cost < *g_score.get(&next_id).unwrap_or(&f64::INFINITY) {
                g_score.insert(next_id.clone(), next_cost);
                came_from.insert(next_id.clone(), road_id.clone());
                heap.push(DijkstraNode { road_id: next_id, cost: next_cost });
            }
        }
    }

    Err(RouterError::NoPathFound { start_road: start_road.to_string(), end_road: end_road.to_string() })
}

fn road_duration(net: &RoadNet, road_id: &str) -> f64 {
    let Some(road) = net.get_road(road_id) else { return f64::INFINITY };
    let max_speed = road
        .lane_ids
        .iter()
        .filter_map(|id| net.get_drivable(id))
        .filter_map(|d| d.as_lane())
        .map(|l| l.max_speed)
        .fold(0.0_f64, f64::max)
        .max(1.0);
    road.length() / max_speed
}

fn successor_roads(net: &RoadNet, road_id: &str) -> Vec<String> {
    let Some(road) = net.get_road(road_id) else { return Vec::new() };
    let Some(intersection) = net.get_intersection(&road.end_intersection) else { return Vec::new() };
    intersection
        .road_links
        .iter()
        .filter(|rl| rl.start_road == road_id)
        .map(|rl| rl.end_road.clone())
        .collect()
}

fn reconstruct(came_from: &IndexMap<String, String>, goal: &str) -> Vec<String> {
    let mut path = vec![goal.to_string()];
    let mut current = goal;
    while let Some(prev) = came_from.get(current) {
        path.push(prev.clone());
        current = prev;
    }
    path.reverse();
    path
}

/// Plans, tracks, and advances a single vehicle's route through the road
/// network (spec §3's "router instance").
#[derive(Debug, Clone)]
pub struct Router {
    /// The anchor roads supplied by the flow/`set_route` (possibly just the
    /// endpoints; multi-road anchors are spliced together by Dijkstra).
    pub anchors: Vec<String>,
    /// The fully resolved road sequence after planning.
    pub planned_roads: Vec<String>,
    pub cursor: usize,
}

impl Router {
    pub fn new(anchors: Vec<String>) -> Self {
        Router { anchors, planned_roads: Vec::new(), cursor: 0 }
    }

    /// Resolves `anchors` into `planned_roads`, invoking Dijkstra between
    /// each consecutive pair when more than one road is given. A single
    /// anchor is a valid, if degenerate, route: drive that one road to its
    /// end and exit the network there.
    pub fn plan(&mut self, net: &RoadNet) -> Result<(), RouterError> {
        if self.anchors.is_empty() {
            return Err(RouterError::RouteTooShort);
        }
        self.cursor = 0;
        if self.anchors.len() == 1 {
            self.planned_roads = self.anchors.clone();
            return Ok(());
        }
        let mut roads = vec![self.anchors[0].clone()];
        for pair in self.anchors.windows(2) {
            let segment = shortest_road_path(net, &pair[0], &pair[1])?;
            roads.extend(segment.into_iter().skip(1));
        }
        self.planned_roads = roads;
        if self.planned_roads.len() <= 1 {
            return Err(RouterError::RouteTooShort);
        }
        Ok(())
    }

    pub fn current_road(&self) -> Option<&str> {
        self.planned_roads.get(self.cursor).map(String::as_str)
    }

    pub fn is_last_road(&self, road_id: &str) -> bool {
        self.planned_roads.last().map(String::as_str) == Some(road_id)
    }

    /// Returns the road after `road_id` in the planned route, if any.
    pub fn get_next(&self, road_id: &str) -> Option<&str> {
        let idx = self.planned_roads.iter().position(|r| r == road_id)?;
        self.planned_roads.get(idx + 1).map(String::as_str)
    }

    pub fn advance(&mut self) {
        if self.cursor + 1 < self.planned_roads.len() {
            self.cursor += 1;
        }
    }

    /// Validates that `anchors` forms a contiguous path in the graph before
    /// accepting it as a route (spec §10.5's `set_route` validation).
    pub fn validate_contiguous(net: &RoadNet, anchors: &[String]) -> bool {
        anchors.windows(2).all(|pair| successor_roads(net, &pair[0]).contains(&pair[1]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Point;
    use crate::roadnet::{Intersection, Lane, LaneLink, Road, RoadLink, RoadLinkType};

    fn line_network(n: usize) -> RoadNet {
        let mut net = RoadNet::new();
        for i in 0..n {
            let intersection = Intersection::new(format!("i{}", i), Point::new(i as f64 * 100.0, 0.0)).build();
            net.intersections.insert(intersection.id.clone(), intersection);
        }
        for i in 0..n - 1 {
            let road_id = format!("r{}", i);
            let lane = Lane::new(format!("{}_0", road_id), road_id.clone(), 0)
                .with_points(vec![Point::new(i as f64 * 100.0, 0.0), Point::new((i + 1) as f64 * 100.0, 0.0)])
                .with_max_speed(10.0)
                .build();
            let road = Road::new(road_id.clone(), format!("i{}", i), format!("i{}", i + 1))
                .with_points(vec![Point::new(i as f64 * 100.0, 0.0), Point::new((i + 1) as f64 * 100.0, 0.0)])
                .with_lane_ids(vec![lane.id.clone()])
                .build();
            net.add_road(road, vec![lane]).unwrap();
        }
        for i in 0..n - 2 {
            let road_link = RoadLink::new(format!("rl{}", i), format!("r{}", i), format!("r{}", i + 1), RoadLinkType::Straight)
                .with_lane_link_ids(vec![format!("ll{}", i)]);
            let lane_link = LaneLink::new(format!("ll{}", i), format!("rl{}", i), format!("r{}_0", i), format!("r{}_0", i + 1), RoadLinkType::Straight)
                .with_points(vec![Point::new((i + 1) as f64 * 100.0, 0.0), Point::new((i + 1) as f64 * 100.0 + 1.0, 0.0)])
                .build();
            let intersection = Intersection::new(format!("i{}", i + 1), Point::new((i + 1) as f64 * 100.0, 0.0))
                .with_road_links(vec![road_link])
                .build();
            net.intersections.insert(intersection.id.clone(), intersection);
            net.drivables.insert(lane_link.id.clone(), crate::roadnet::Drivable::LaneLink(lane_link));
        }
        net
    }

    #[test]
    fn test_shortest_path_through_chain() {
        let net = line_network(4);
        let path = shortest_road_path(&net, "r0", "r2").unwrap();
        assert_eq!(path, vec!["r0".to_string(), "r1".to_string(), "r2".to_string()]);
    }

    #[test]
    fn test_unknown_road_errors() {
        let net = line_network(3);
        assert!(matches!(shortest_road_path(&net, "nope", "r0"), Err(RouterError::UnknownRoad(_))));
    }

    #[test]
    fn test_single_anchor_route_plans_successfully() {
        let net = line_network(2);
        let mut router = Router::new(vec!["r0".to_string()]);
        router.plan(&net).unwrap();
        assert_eq!(router.current_road(), Some("r0"));
        assert!(router.is_last_road("r0"));
        assert_eq!(router.get_next("r0"), None);
    }

    #[test]
    fn test_router_plan_and_advance() {
        let net = line_network(4);
        let mut router = Router::new(vec!["r0".to_string(), "r2".to_string()]);
        router.plan(&net).unwrap();
        assert_eq!(router.current_road(), Some("r0"));
        router.advance();
        assert_eq!(router.current_road(), Some("r1"));
        assert!(!router.is_last_road("r1"));
        router.advance();
        assert!(router.is_last_road("r2"));
    }
}
