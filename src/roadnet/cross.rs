use crate::roadnet::drivable::VehicleHandle;
use crate::roadnet::lane_link::RoadLinkType;

/// A conflict point between two lane-links that cross inside an
/// intersection (spec §3, §4.5).
#[derive(Debug, Clone)]
pub struct Cross {
    pub lane_links: [String; 2],
    pub distances: [f64; 2],
    pub angle: f64,
    pub safe_distances: [f64; 2],
    /// Nearest approaching vehicle per side and its signed distance to the
    /// cross, cleared at the top of every step (spec §3, invariant in §8).
    pub notify: [Option<(VehicleHandle, f64)>; 2],
    pub leave_distance: f64,
    pub arrive_distance: f64,
}

impl Cross {
    /// Builds a cross from the two lane-links' widths, the crossing angle,
    /// and the distances where each lane-link crosses the other (spec §3's
    /// formula: c_i = w_i / sin(alpha), diag = (c1^2+c2^2+2c1c2cos(alpha))/4,
    /// safeDist_i = sqrt(diag - w_j^2/4)).
    pub fn new(
        lane_link_a: impl Into<String>,
        lane_link_b: impl Into<String>,
        distance_a: f64,
        distance_b: f64,
        width_a: f64,
        width_b: f64,
        angle: f64,
    ) -> Self {
        let sin_a = angle.sin().abs().max(1e-6);
        let c1 = width_a / sin_a;
        let c2 = width_b / sin_a;
        let diag = (c1 * c1 + c2 * c2 + 2.0 * c1 * c2 * angle.cos()) / 4.0;
        let safe_a = (diag - (width_b * width_b) / 4.0).max(0.0).sqrt();
        let safe_b = (diag - (width_a * width_a) / 4.0).max(0.0).sqrt();
        Cross {
            lane_links: [lane_link_a.into(), lane_link_b.into()],
            distances: [distance_a, distance_b],
            angle,
            safe_distances: [safe_a, safe_b],
            notify: [None, None],
            leave_distance: safe_a.max(safe_b),
            arrive_distance: (safe_a.max(safe_b)) * 2.0,
        }
    }

    pub fn clear_notify(&mut self) {
        self.notify = [None, None];
    }

    /// Records `handle` as the approaching vehicle on `side` at signed
    /// distance `distance`, unless a nearer notification within
    /// `leave_distance` already occupies that side (spec §4.1 stage 8).
    pub fn notify_side(&mut self, side: usize, handle: VehicleHandle, distance: f64) {
        if let Some((_, existing)) = self.notify[side] {
            if existing.abs() <= self.leave_distance {
                return;
            }
        }
        self.notify[side] = Some((handle, distance));
    }

    pub fn other_side(side: usize) -> usize {
        1 - side
    }
}

/// Facts about a vehicle approaching a cross, as needed by [`can_pass`].
pub struct ApproachFacts {
    pub priority: i64,
    pub road_link_type: RoadLinkType,
    pub min_brake_distance: f64,
    pub yield_distance: f64,
    pub reach_steps: f64,
    pub enter_lane_link_time: Option<u64>,
    pub length: f64,
}

/// Outcome of walking the foe's blocker chain to detect a wait-cycle.
pub trait BlockerWalk {
    /// Returns the vehicle this `handle` is currently yielding to, if any.
    fn blocker_of(&self, handle: VehicleHandle) -> Option<VehicleHandle>;
}

/// Implements `cross.canPass(self, link, d1)` (spec §4.5): returns true iff
/// `self` may enter the cross now.
pub fn can_pass<B: BlockerWalk>(
    cross: &Cross,
    self_side: usize,
    self_handle: VehicleHandle,
    self_facts: &ApproachFacts,
    foe_facts: impl Fn(VehicleHandle) -> ApproachFacts,
    blockers: &B,
) -> (bool, Option<VehicleHandle>) {
    let d1 = self_facts.min_brake_distance;
    if cross.distances[self_side] < self_facts.min_brake_distance + self_facts.yield_distance {
        // Rule 1: cannot brake in time, already committed.
        return (true, None);
    }
    let _ = d1;

    let other_side = Cross::other_side(self_side);
    let foe = match cross.notify[other_side] {
        None => return (true, None),
        Some((handle, distance)) => (handle, distance),
    };
    let (foe_handle, d2) = foe;
    let foe_info = foe_facts(foe_handle);

    if d2 < foe_info.min_brake_distance + foe_info.yield_distance {
        // Rule 2: foe cannot brake either; self yields.
        return (decide_yield(cross, self_side, self_handle, foe_handle, blockers), Some(foe_handle));
    }

    let t1 = self_facts.road_link_type.priority();
    let t2 = foe_info.road_link_type.priority();

    if t1 > t2 {
        // Rule 3.
        return (true, None);
    }

    if t1 < t2 {
        // Rule 4.
        if foe_info.reach_steps > self_facts.reach_steps {
            return (true, None);
        }
        if d2 + foe_info.length < 0.0 {
            return (true, None);
        }
        return (decide_yield(cross, self_side, self_handle, foe_handle, blockers), Some(foe_handle));
    }

    // Rule 5: equal type.
    let pass = if (self_facts.reach_steps - foe_info.reach_steps).abs() > 1e-9 {
        self_facts.reach_steps < foe_info.reach_steps
    } else {
        match (self_facts.enter_lane_link_time, foe_info.enter_lane_link_time) {
            (Some(a), Some(b)) if a != b => a < b,
            _ => {
                if (cross.distances[self_side] - d2).abs() > 1e-9 {
                    cross.distances[self_side] < d2
                } else {
                    self_facts.priority > foe_info.priority
                }
            }
        }
    };

    if pass {
        (true, None)
    } else {
        (decide_yield(cross, self_side, self_handle, foe_handle, blockers), Some(foe_handle))
    }
}

/// Rule 6: before finally yielding, walk the foe's blocker chain with
/// Floyd's cycle detection; a cycle means a deadlock, which is broken by
/// forcing a pass.
fn decide_yield<B: BlockerWalk>(
    _cross: &Cross,
    _self_side: usize,
    self_handle: VehicleHandle,
    foe_handle: VehicleHandle,
    blockers: &B,
) -> bool {
    let mut slow = Some(foe_handle);
    let mut fast = blockers.blocker_of(foe_handle);
    while let (Some(s), Some(f)) = (slow, fast) {
        if s == self_handle || f == self_handle {
            // The foe is (transitively) waiting on self: a cycle through
            // self would deadlock both. Force a pass.
            return false;
        }
        if s == f {
            return false;
        }
        slow = blockers.blocker_of(s);
        fast = blockers.blocker_of(f).and_then(|f2| blockers.blocker_of(f2));
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct NoBlockers;
    impl BlockerWalk for NoBlockers {
        fn blocker_of(&self, _handle: VehicleHandle) -> Option<VehicleHandle> {
            None
        }
    }

    fn facts(road_link_type: RoadLinkType, reach_steps: f64, priority: i64) -> ApproachFacts {
        ApproachFacts {
            priority,
            road_link_type,
            min_brake_distance: 2.0,
            yield_distance: 1.0,
            reach_steps,
            enter_lane_link_time: None,
            length: 5.0,
        }
    }

    #[test]
    fn test_higher_priority_type_always_passes() {
        let mut cross = Cross::new("a", "b", 20.0, 20.0, 3.0, 3.0, std::f64::consts::FRAC_PI_2);
        cross.notify_side(1, 42, 20.0);
        let self_facts = facts(RoadLinkType::Straight, 5.0, 1);
        let (pass, _) = can_pass(&cross, 0, 1, &self_facts, |_| facts(RoadLinkType::TurnLeft, 2.0, 2), &NoBlockers);
        assert!(pass);
    }

    #[test]
    fn test_equal_type_earlier_arrival_passes() {
        let mut cross = Cross::new("a", "b", 20.0, 20.0, 3.0, 3.0, std::f64::consts::FRAC_PI_2);
        cross.notify_side(1, 42, 20.0);
        let self_facts = facts(RoadLinkType::Straight, 2.0, 1);
        let (pass, _) = can_pass(&cross, 0, 1, &self_facts, |_| facts(RoadLinkType::Straight, 5.0, 2), &NoBlockers);
        assert!(pass);
    }

    #[test]
    fn test_equal_type_later_arrival_yields() {
        let mut cross = Cross::new("a", "b", 20.0, 20.0, 3.0, 3.0, std::f64::consts::FRAC_PI_2);
        cross.notify_side(1, 42, 20.0);
        let self_facts = facts(RoadLinkType::Straight, 5.0, 1);
        let (pass, blocker) = can_pass(&cross, 0, 1, &self_facts, |_| facts(RoadLinkType::Straight, 2.0, 2), &NoBlockers);
        assert!(!pass);
        assert_eq!(blocker, Some(42));
    }

    #[test]
    fn test_no_foe_always_passes() {
        let cross = Cross::new("a", "b", 20.0, 20.0, 3.0, 3.0, std::f64::consts::FRAC_PI_2);
        let self_facts = facts(RoadLinkType::TurnLeft, 5.0, 1);
        let (pass, _) = can_pass(&cross, 0, 1, &self_facts, |_| facts(RoadLinkType::Straight, 2.0, 2), &NoBlockers);
        assert!(pass);
    }

    #[test]
    fn test_deadlock_cycle_forces_pass() {
        let mut cross = Cross::new("a", "b", 20.0, 20.0, 3.0, 3.0, std::f64::consts::FRAC_PI_2);
        cross.notify_side(1, 2, 20.0);
        struct CycleBlockers(HashMap<VehicleHandle, VehicleHandle>);
        impl BlockerWalk for CycleBlockers {
            fn blocker_of(&self, handle: VehicleHandle) -> Option<VehicleHandle> {
                self.0.get(&handle).copied()
            }
        }
        let mut map = HashMap::new();
        map.insert(2, 1);
        let blockers = CycleBlockers(map);
        let self_facts = facts(RoadLinkType::Straight, 5.0, 1);
        let (pass, _) = can_pass(&cross, 0, 1, &self_facts, |_| facts(RoadLinkType::Straight, 2.0, 2), &blockers);
        assert!(pass);
    }
}
