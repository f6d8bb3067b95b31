/// The fourteen ordered stages of a simulation step (spec §4.1). Kept as a
/// named list so the engine's `step()` and the logging layer agree on stage
/// names without repeating string literals.
pub const STAGE_NAMES: [&str; 14] = [
    "advance_flows",
    "plan_route",
    "handle_waiting",
    "init_segments",
    "plan_lane_change",
    "update_leader_and_gap",
    "schedule_lane_change",
    "notify_cross",
    "get_action",
    "update_location",
    "update_action",
    "update_leader_and_gap_2",
    "traffic_lights_advance",
    "replay_log_append",
];

/// How wide a downstream leader search is allowed to range before giving up
/// (spec §3, §4.1 stage 6): `vmax²/(2·usualNegAcc) + 2·vmax·Δt`.
pub fn approaching_intersection_distance(vmax: f64, usual_neg_acc: f64, dt: f64) -> f64 {
    (vmax * vmax) / (2.0 * usual_neg_acc.max(1e-6)) + 2.0 * vmax * dt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names_has_fourteen_entries() {
        assert_eq!(STAGE_NAMES.len(), 14);
    }

    #[test]
    fn test_approaching_intersection_distance_grows_with_speed() {
        let low = approaching_intersection_distance(5.0, 4.5, 1.0);
        let high = approaching_intersection_distance(15.0, 4.5, 1.0);
        assert!(high > low);
    }
}
