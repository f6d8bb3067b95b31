use crate::roadnet::lane_link::RoadLinkType;

/// A bundle of lane-links between two roads that share a turning type, and
/// the unit the traffic light's phase-availability vector is indexed by.
#[derive(Debug, Clone)]
pub struct RoadLink {
    pub id: String,
    pub start_road: String,
    pub end_road: String,
    pub kind: RoadLinkType,
    pub lane_link_ids: Vec<String>,
}

impl RoadLink {
    pub fn new(id: impl Into<String>, start_road: impl Into<String>, end_road: impl Into<String>, kind: RoadLinkType) -> Self {
        RoadLink {
            id: id.into(),
            start_road: start_road.into(),
            end_road: end_road.into(),
            kind,
            lane_link_ids: Vec::new(),
        }
    }

    pub fn with_lane_link_ids(mut self, ids: Vec<String>) -> Self {
        self.lane_link_ids = ids;
        self
    }
}
