use crate::roadnet::drivable::VehicleHandle;
use crate::shortest_path::Router;

/// Longitudinal control state carried by every vehicle: which drivable it
/// occupies, its leader/gap/blocker, and its route planner (spec §3).
#[derive(Debug, Clone)]
pub struct ControllerInfo {
    pub current_drivable: String,
    pub prev_drivable: Option<String>,
    pub leader: Option<VehicleHandle>,
    pub gap: f64,
    pub blocker: Option<VehicleHandle>,
    pub enter_lane_link_time: Option<u64>,
    pub end: bool,
    pub running: bool,
    pub router: Router,
    /// `vmax^2 / (2*usualNegAcc) + 2*vmax*dt`: how far downstream a leader
    /// search is allowed to walk (spec §4.1 stage 6, §3).
    pub approaching_intersection_distance: f64,
}

impl ControllerInfo {
    pub fn new(first_drivable: impl Into<String>, router: Router) -> Self {
        ControllerInfo {
            current_drivable: first_drivable.into(),
            prev_drivable: None,
            leader: None,
            gap: f64::INFINITY,
            blocker: None,
            enter_lane_link_time: None,
            end: false,
            running: false,
            router,
            approaching_intersection_distance: 0.0,
        }
    }

    /// Clears any reference to a terminated vehicle (spec §9 Design Notes:
    /// `vehicleRemoveBuffer` is the single point consumers must scrub
    /// handles at).
    pub fn scrub_handle(&mut self, terminated: VehicleHandle) {
        if self.leader == Some(terminated) {
            self.leader = None;
        }
        if self.blocker == Some(terminated) {
            self.blocker = None;
        }
    }
}
