use crate::roadnet::drivable::VehicleHandle;

/// A lane-change proposal emitted by `makeSignal` (spec §4.4, phase 1).
#[derive(Debug, Clone, PartialEq)]
pub struct LaneChangeSignal {
    pub source: VehicleHandle,
    pub target_lane: String,
    pub urgency: f64,
    pub direction: i8,
}

impl LaneChangeSignal {
    pub fn new(source: VehicleHandle, target_lane: impl Into<String>, direction: i8, urgency: f64) -> Self {
        LaneChangeSignal { source, target_lane: target_lane.into(), urgency, direction }
    }
}
