use crate::geom::Point;
use crate::roadnet::cross::Cross;
use crate::roadnet::road_link::RoadLink;
use crate::roadnet::traffic_light::TrafficLight;

/// A junction: the point where one or more roads meet (spec §3). A virtual
/// intersection is an exterior terminator with no traffic light.
#[derive(Debug, Clone)]
pub struct Intersection {
    pub id: String,
    pub point: Point,
    pub is_virtual: bool,
    pub width: f64,
    pub road_ids: Vec<String>,
    pub road_links: Vec<RoadLink>,
    /// Union of all lane-link ids owned by this intersection's road-links.
    pub lane_link_ids: Vec<String>,
    pub crosses: Vec<Cross>,
    pub traffic_light: Option<TrafficLight>,
}

pub struct IntersectionBuilder {
    intersection: Intersection,
}

impl Intersection {
    pub fn new(id: impl Into<String>, point: Point) -> IntersectionBuilder {
        IntersectionBuilder {
            intersection: Intersection {
                id: id.into(),
                point,
                is_virtual: false,
                width: 0.0,
                road_ids: Vec::new(),
                road_links: Vec::new(),
                lane_link_ids: Vec::new(),
                crosses: Vec::new(),
                traffic_light: None,
            },
        }
    }

    pub fn road_link_index(&self, road_link_id: &str) -> Option<usize> {
        self.road_links.iter().position(|rl| rl.id == road_link_id)
    }

    pub fn is_road_link_available(&self, road_link_id: &str) -> bool {
        if self.is_virtual {
            return true;
        }
        match (self.road_link_index(road_link_id), &self.traffic_light) {
            (Some(idx), Some(tl)) => tl.is_road_link_available(idx),
            // No traffic light installed: treat every road-link as open.
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}

impl IntersectionBuilder {
    pub fn with_virtual(mut self, is_virtual: bool) -> Self {
        self.intersection.is_virtual = is_virtual;
        self
    }

    pub fn with_width(mut self, width: f64) -> Self {
        self.intersection.width = width;
        self
    }

    pub fn with_road_ids(mut self, road_ids: Vec<String>) -> Self {
        self.intersection.road_ids = road_ids;
        self
    }

    pub fn with_road_links(mut self, road_links: Vec<RoadLink>) -> Self {
        self.intersection.lane_link_ids = road_links.iter().flat_map(|rl| rl.lane_link_ids.clone()).collect();
        self.intersection.road_links = road_links;
        self
    }

    pub fn with_traffic_light(mut self, traffic_light: TrafficLight) -> Self {
        self.intersection.traffic_light = Some(traffic_light);
        self
    }

    pub fn build(self) -> Intersection {
        self.intersection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roadnet::lane_link::RoadLinkType;
    use crate::roadnet::traffic_light::LightPhase;

    #[test]
    fn test_virtual_intersection_always_available() {
        let intersection = Intersection::new("i0", Point::zero()).with_virtual(true).build();
        assert!(intersection.is_road_link_available("anything"));
    }

    #[test]
    fn test_phase_gates_road_link_availability() {
        let road_link = RoadLink::new("rl0", "r0", "r1", RoadLinkType::Straight).with_lane_link_ids(vec!["ll0".into()]);
        let tl = TrafficLight::new("i0")
            .with_phases(vec![LightPhase::new(2.0, vec![false]), LightPhase::new(2.0, vec![true])])
            .build();
        let intersection = Intersection::new("i0", Point::zero())
            .with_road_links(vec![road_link])
            .with_traffic_light(tl)
            .build();
        assert!(!intersection.is_road_link_available("rl0"));
    }
}
