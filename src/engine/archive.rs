use std::fmt;

use indexmap::IndexMap;

use crate::agents::Vehicle;
use crate::flow::Flow;
use crate::roadnet::drivable::VehicleHandle;

#[derive(Debug, Clone)]
pub enum ArchiveError {
    Empty,
}

impl fmt::Display for ArchiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveError::Empty => write!(f, "no archive has been captured yet"),
        }
    }
}

impl std::error::Error for ArchiveError {}

/// A point-in-time deep copy of everything the engine's clock advances
/// (spec §4.6). Vehicle cross-references (leader, blocker, partner,
/// `signalRecv.source`) are stored as [`VehicleHandle`] priorities rather
/// than pointers, so a deep `Clone` of the vehicle pool already carries
/// valid references into the restored pool — no rewriting pass is needed
/// as long as priorities aren't reassigned across a restore, which the
/// engine never does.
#[derive(Debug, Clone)]
pub struct Archive {
    pub step: u64,
    pub active_count: usize,
    pub finished_count: u64,
    pub cumulative_travel_time: f64,
    pub vehicles: IndexMap<VehicleHandle, Vehicle>,
    pub drivable_vehicle_lists: IndexMap<String, Vec<VehicleHandle>>,
    pub flows: Vec<Flow>,
    pub traffic_light_states: IndexMap<String, (usize, f64)>,
}

impl Archive {
    #[allow(clippy::too_many_arguments)]
    pub fn capture(
        step: u64,
        active_count: usize,
        finished_count: u64,
        cumulative_travel_time: f64,
        vehicles: &IndexMap<VehicleHandle, Vehicle>,
        drivable_vehicle_lists: &IndexMap<String, Vec<VehicleHandle>>,
        flows: &[Flow],
        traffic_light_states: &IndexMap<String, (usize, f64)>,
    ) -> Self {
        Archive {
            step,
            active_count,
            finished_count,
            cumulative_travel_time,
            vehicles: vehicles.clone(),
            drivable_vehicle_lists: drivable_vehicle_lists.clone(),
            flows: flows.to_vec(),
            traffic_light_states: traffic_light_states.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_deep_copies_vehicle_pool() {
        let vehicles: IndexMap<VehicleHandle, Vehicle> = IndexMap::new();
        let drivables: IndexMap<String, Vec<VehicleHandle>> = IndexMap::new();
        let lights: IndexMap<String, (usize, f64)> = IndexMap::new();
        let archive = Archive::capture(3, 0, 0, 0.0, &vehicles, &drivables, &[], &lights);
        assert_eq!(archive.step, 3);
        assert!(archive.vehicles.is_empty());
    }
}
