use std::error::Error;
use std::fmt;

/// Errors raised while building or querying the road-network graph.
#[derive(Debug, Clone)]
pub enum RoadNetError {
    /// A required field was missing from a loaded definition.
    MissingField { entity: String, field: &'static str },
    /// A referenced id does not exist in the network.
    UnknownId { kind: &'static str, id: String },
    /// A lane index is out of range for its road.
    LaneIndexOutOfRange { road_id: String, index: usize, lane_count: usize },
    /// A road or lane-link centerline has fewer than two points.
    DegenerateGeometry { entity: String },
}

impl fmt::Display for RoadNetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoadNetError::MissingField { entity, field } => {
                write!(f, "roadnet: '{}' is missing required field '{}'", entity, field)
            }
            RoadNetError::UnknownId { kind, id } => {
                write!(f, "roadnet: unknown {} id '{}'", kind, id)
            }
            RoadNetError::LaneIndexOutOfRange { road_id, index, lane_count } => {
                write!(
                    f,
                    "roadnet: lane index {} out of range for road '{}' ({} lanes)",
                    index, road_id, lane_count
                )
            }
            RoadNetError::DegenerateGeometry { entity } => {
                write!(f, "roadnet: '{}' has fewer than two centerline points", entity)
            }
        }
    }
}

impl Error for RoadNetError {}
