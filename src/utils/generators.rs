use crate::geom::Point;
use crate::roadnet::{Intersection, Lane, LaneLink, Road, RoadLink, RoadLinkType, RoadNet};

/// Builds a chain of `num_segments` straight roads end to end, each with
/// `lanes_per_segment` parallel lanes and straight lane-links joining
/// consecutive segments' same-index lanes. Endpoints are virtual
/// intersections so flows can start and end mid-corridor. Used by the
/// single-vehicle, car-following, and lane-change scenarios, which don't
/// need a real junction.
pub fn straight_corridor(num_segments: usize, lanes_per_segment: usize, segment_length: f64, max_speed: f64) -> RoadNet {
    let mut net = RoadNet::new();
    let lane_width = 3.5;

    for i in 0..=num_segments {
        let is_virtual = i == 0 || i == num_segments;
        let intersection = Intersection::new(format!("i{}", i), Point::new(i as f64 * segment_length, 0.0)).with_virtual(is_virtual).build();
        net.intersections.insert(intersection.id.clone(), intersection);
    }

    for i in 0..num_segments {
        let road_id = format!("r{}", i);
        let x0 = i as f64 * segment_length;
        let x1 = (i + 1) as f64 * segment_length;
        let mut lane_ids = Vec::with_capacity(lanes_per_segment);
        let mut lanes = Vec::with_capacity(lanes_per_segment);
        for lane_index in 0..lanes_per_segment {
            let offset = (lane_index as f64 - (lanes_per_segment as f64 - 1.0) / 2.0) * lane_width;
            let lane = Lane::new(format!("{}_{}", road_id, lane_index), road_id.clone(), lane_index)
                .with_width(lane_width)
                .with_max_speed(max_speed)
                .with_points(vec![Point::new(x0, offset), Point::new(x1, offset)])
                .build();
            lane_ids.push(lane.id.clone());
            lanes.push(lane);
        }
        let road = Road::new(road_id.clone(), format!("i{}", i), format!("i{}", i + 1))
            .with_points(vec![Point::new(x0, 0.0), Point::new(x1, 0.0)])
            .with_lane_ids(lane_ids)
            .build();
        net.add_road(road, lanes).unwrap();
    }

    for i in 0..num_segments.saturating_sub(1) {
        let road_a = format!("r{}", i);
        let road_b = format!("r{}", i + 1);
        let mut lane_link_ids = Vec::with_capacity(lanes_per_segment);
        let mut lane_links = Vec::with_capacity(lanes_per_segment);
        for lane_index in 0..lanes_per_segment {
            let start_lane = format!("{}_{}", road_a, lane_index);
            let end_lane = format!("{}_{}", road_b, lane_index);
            let road_link_id = format!("rl{}_{}", i, lane_index);
            let link_id = format!("ll{}_{}", i, lane_index);
            let x = (i + 1) as f64 * segment_length;
            let offset = (lane_index as f64 - (lanes_per_segment as f64 - 1.0) / 2.0) * lane_width;
            let lane_link = LaneLink::new(link_id.clone(), road_link_id.clone(), start_lane, end_lane, RoadLinkType::Straight)
                .with_width(lane_width)
                .with_max_speed(max_speed)
                .with_points(vec![Point::new(x - 0.5, offset), Point::new(x + 0.5, offset)])
                .build();
            lane_link_ids.push(link_id);
            lane_links.push(lane_link);
        }
        let road_link = RoadLink::new(format!("rl{}", i), road_a, road_b, RoadLinkType::Straight).with_lane_link_ids(lane_link_ids);
        let intersection = Intersection::new(format!("i{}", i + 1), Point::new((i + 1) as f64 * segment_length, 0.0)).with_road_links(vec![road_link]).build();
        net.add_intersection(intersection, lane_links);
    }

    net
}

/// Builds a single four-way junction: one north-south road and one
/// east-west road, each a single lane each way, crossing at the origin.
/// `init_crosses` must be called on the returned network (the engine does
/// this itself in `Engine::new`) before the crossing conflict is usable.
/// Grounded on the perpendicular-link fixture
/// [`crate::roadnet::roadnet`]'s own `init_crosses` test builds inline.
pub fn four_way_intersection(arm_length: f64, max_speed: f64) -> RoadNet {
    let mut net = RoadNet::new();

    let terminals = [("n", 0.0, arm_length), ("s", 0.0, -arm_length), ("e", arm_length, 0.0), ("w", -arm_length, 0.0)];
    for (name, x, y) in terminals {
        let intersection = Intersection::new(format!("i_{}", name), Point::new(x, y)).with_virtual(true).build();
        net.intersections.insert(intersection.id.clone(), intersection);
    }

    // Approach roads: each terminal into the center, and center back out.
    let mut lane_ids_by_direction = std::collections::HashMap::new();
    for (name, x, y) in terminals {
        let in_road = format!("in_{}", name);
        let out_road = format!("out_{}", name);
        let in_lane = Lane::new(format!("{}_0", in_road), in_road.clone(), 0).with_max_speed(max_speed).with_points(vec![Point::new(x, y), Point::new(0.0, 0.0)]).build();
        let out_lane = Lane::new(format!("{}_0", out_road), out_road.clone(), 0).with_max_speed(max_speed).with_points(vec![Point::new(0.0, 0.0), Point::new(x, y)]).build();
        lane_ids_by_direction.insert(name, (in_lane.id.clone(), out_lane.id.clone()));

        let in_road_built = Road::new(in_road.clone(), format!("i_{}", name), "center").with_points(vec![Point::new(x, y), Point::new(0.0, 0.0)]).with_lane_ids(vec![in_lane.id.clone()]).build();
        let out_road_built = Road::new(out_road.clone(), "center", format!("i_{}", name)).with_points(vec![Point::new(0.0, 0.0), Point::new(x, y)]).with_lane_ids(vec![out_lane.id.clone()]).build();
        net.add_road(in_road_built, vec![in_lane]).unwrap();
        net.add_road(out_road_built, vec![out_lane]).unwrap();
    }

    // Straight-through lane-links: north->south, south->north, east->west, west->east.
    let through_pairs = [("n", "s"), ("s", "n"), ("e", "w"), ("w", "e")];
    let mut road_links = Vec::new();
    let mut lane_links = Vec::new();
    for (from, to) in through_pairs {
        let (in_lane, _) = &lane_ids_by_direction[from];
        let (_, out_lane) = &lane_ids_by_direction[to];
        let road_link_id = format!("rl_{}_{}", from, to);
        let link_id = format!("ll_{}_{}", from, to);
        let (_, from_x, from_y) = *terminals.iter().find(|t| t.0 == from).unwrap();
        // Unit vector pointing from the approach terminal toward the center.
        let (tx, ty) = direction_unit(-from_x, -from_y);
        let link = LaneLink::new(link_id.clone(), road_link_id.clone(), in_lane.clone(), out_lane.clone(), RoadLinkType::Straight)
            .with_max_speed(max_speed)
            .with_points(vec![Point::new(tx * 3.0, ty * 3.0), Point::new(-tx * 3.0, -ty * 3.0)])
            .build();
        road_links.push(RoadLink::new(road_link_id, format!("in_{}", from), format!("out_{}", to), RoadLinkType::Straight).with_lane_link_ids(vec![link_id]));
        lane_links.push(link);
    }

    let intersection = Intersection::new("center", Point::zero()).with_road_links(road_links).build();
    net.add_intersection(intersection, lane_links);
    net
}

fn direction_unit(x: f64, y: f64) -> (f64, f64) {
    let len = (x * x + y * y).sqrt().max(1e-9);
    (x / len, y / len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_straight_corridor_chains_roads() {
        let net = straight_corridor(3, 2, 100.0, 16.7);
        assert_eq!(net.roads.len(), 3);
        assert_eq!(net.drivables.values().filter(|d| matches!(d, crate::roadnet::Drivable::Lane(_))).count(), 6);
    }

    #[test]
    fn test_straight_corridor_links_consecutive_segments() {
        let net = straight_corridor(2, 1, 50.0, 16.7);
        assert_eq!(net.intersections.len(), 3);
        assert!(net.drivables.contains_key("ll0_0"));
    }

    #[test]
    fn test_four_way_intersection_has_crossing_links() {
        let mut net = four_way_intersection(80.0, 13.9);
        net.init_crosses();
        assert!(!net.intersections["center"].crosses.is_empty());
    }
}
