use crate::agents::LaneChangeSignal;
use crate::roadnet::drivable::VehicleHandle;

pub const COOLDOWN_SECONDS: f64 = 3.0;
pub const MIN_LANE_REMAINING: f64 = 30.0;

/// A received proposal from another changer, recorded with the sender's
/// priority so a second, lower-priority sender can't overwrite it
/// (spec §4.4 phase 2).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalRecv {
    pub source: VehicleHandle,
    pub source_priority: i64,
}

/// A candidate adjacent lane considered by `makeSignal`, precomputed by the
/// caller (the engine, which alone has access to the road network and the
/// vehicle pool needed to compute `estimated_gap`).
#[derive(Debug, Clone)]
pub struct LaneCandidate {
    pub lane_id: String,
    pub direction: i8,
    pub estimated_gap: f64,
}

/// `estimateGap(lane)` from spec §4.4 phase 1: the gap the vehicle would
/// have on `lane` if it changed into it right now.
pub fn estimate_gap(self_distance: f64, leader: Option<(f64, f64)>, lane_length: f64) -> f64 {
    match leader {
        Some((leader_distance, leader_length)) => leader_distance - self_distance - leader_length,
        None => lane_length - self_distance,
    }
}

/// Per-vehicle lane-change handshake state (spec §4.4). The shadow
/// mechanism itself — the temporary second vehicle record — is expressed
/// through [`crate::agents::LaneChangeInfo`] on each side; this struct only
/// tracks the signaling and commit bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct LaneChangeController {
    pub signal_send: Option<LaneChangeSignal>,
    pub signal_recv: Option<SignalRecv>,
    pub target_leader: Option<VehicleHandle>,
    pub target_follower: Option<VehicleHandle>,
    pub gap_before: f64,
    pub gap_after: f64,
    pub changing: bool,
    pub last_change_time: Option<f64>,
}

impl LaneChangeController {
    /// Phase 1, `makeSignal`. `candidates` lists every adjacent lane that
    /// still serves the route, with its precomputed estimated gap.
    #[allow(clippy::too_many_arguments)]
    pub fn make_signal(
        &mut self,
        self_handle: VehicleHandle,
        self_length: f64,
        current_gap: f64,
        max_speed: f64,
        dt: f64,
        now: f64,
        on_lane_link: bool,
        distance_to_lane_end: f64,
        candidates: &[LaneCandidate],
    ) -> Option<LaneChangeSignal> {
        if self.changing {
            return None;
        }
        if let Some(t) = self.last_change_time {
            if now - t < COOLDOWN_SECONDS {
                return None;
            }
        }
        if on_lane_link || distance_to_lane_end < MIN_LANE_REMAINING {
            return None;
        }
        let gap_min = 1.5 * self_length;
        let gap_max = 2.0 * self_length + 4.0 * dt * max_speed;
        if current_gap < gap_min || current_gap > gap_max {
            return None;
        }

        let mut best: Option<&LaneCandidate> = None;
        for c in candidates {
            if c.estimated_gap <= current_gap + self_length {
                continue;
            }
            best = match best {
                None => Some(c),
                Some(b) if c.estimated_gap > b.estimated_gap + 1e-9 => Some(c),
                // tie: "outer > inner" — prefer the lower-numbered direction.
                Some(b) if (c.estimated_gap - b.estimated_gap).abs() <= 1e-9 && c.direction < b.direction => Some(c),
                Some(b) => Some(b),
            };
        }

        let chosen = best?;
        let signal = LaneChangeSignal::new(self_handle, chosen.lane_id.clone(), chosen.direction, 1.0);
        self.signal_send = Some(signal.clone());
        Some(signal)
    }

    /// Phase 2, `sendSignal`: records an inbound proposal iff the sender
    /// outranks both any signal already received and this vehicle's own
    /// outbound plan.
    pub fn receive_signal(&mut self, source: VehicleHandle, source_priority: i64, own_plan_priority: Option<i64>) -> bool {
        let outranks_existing = self.signal_recv.map_or(true, |r| source_priority > r.source_priority);
        let outranks_own_plan = own_plan_priority.map_or(true, |p| source_priority > p);
        if outranks_existing && outranks_own_plan {
            self.signal_recv = Some(SignalRecv { source, source_priority });
            true
        } else {
            false
        }
    }

    /// The dampened speed a vehicle with an active inbound signal must obey
    /// so it doesn't close `safe_gap_before` faster than the changer needs.
    pub fn yield_speed(&self, source_speed: f64, gap_to_source: f64, safe_gap_before: f64, dt: f64) -> Option<f64> {
        self.signal_recv.map(|_| {
            if gap_to_source <= safe_gap_before {
                (source_speed - (safe_gap_before - gap_to_source) / dt.max(1e-6)).max(0.0)
            } else {
                source_speed
            }
        })
    }

    /// Phase 3 gate: a plan survives to `insertShadow` only with no inbound
    /// signal, not already changing, and both gaps meeting their safe
    /// minimums.
    pub fn can_commit(&self, safe_gap_before: f64, safe_gap_after: f64) -> bool {
        self.signal_send.is_some() && self.signal_recv.is_none() && !self.changing && self.gap_before >= safe_gap_before && self.gap_after >= safe_gap_after
    }

    pub fn commit(&mut self, target_leader: Option<VehicleHandle>, target_follower: Option<VehicleHandle>) {
        self.changing = true;
        self.target_leader = target_leader;
        self.target_follower = target_follower;
    }

    pub fn finish(&mut self, now: f64) {
        self.changing = false;
        self.signal_send = None;
        self.signal_recv = None;
        self.target_leader = None;
        self.target_follower = None;
        self.last_change_time = Some(now);
    }

    pub fn abort(&mut self) {
        self.changing = false;
        self.signal_send = None;
        self.signal_recv = None;
        self.target_leader = None;
        self.target_follower = None;
    }
}

/// One step of the lateral offset during an active change. Returns the new
/// offset and whether it has reached `max_offset` (finish condition).
pub fn lateral_step(offset: f64, speed: f64, dt: f64, max_offset: f64) -> (f64, bool) {
    let step = (0.2 * speed).max(1.0) * dt;
    let next = (offset + step).min(max_offset);
    (next, next >= max_offset - 1e-9)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_signal_respects_cooldown() {
        let mut ctl = LaneChangeController { last_change_time: Some(10.0), ..Default::default() };
        let candidates = vec![LaneCandidate { lane_id: "l1".into(), direction: 1, estimated_gap: 100.0 }];
        let signal = ctl.make_signal(1, 5.0, 8.0, 16.7, 1.0, 11.0, false, 50.0, &candidates);
        assert!(signal.is_none());
    }

    #[test]
    fn test_make_signal_picks_larger_gap_candidate() {
        let mut ctl = LaneChangeController::default();
        let candidates = vec![
            LaneCandidate { lane_id: "small".into(), direction: 1, estimated_gap: 9.0 },
            LaneCandidate { lane_id: "big".into(), direction: -1, estimated_gap: 50.0 },
        ];
        let signal = ctl.make_signal(1, 5.0, 8.0, 16.7, 1.0, 100.0, false, 50.0, &candidates).unwrap();
        assert_eq!(signal.target_lane, "big");
    }

    #[test]
    fn test_make_signal_rejects_small_gap_window() {
        let mut ctl = LaneChangeController::default();
        let candidates = vec![LaneCandidate { lane_id: "l1".into(), direction: 1, estimated_gap: 100.0 }];
        // current_gap far outside [1.5*len, 2*len+4*dt*vmax]
        let signal = ctl.make_signal(1, 5.0, 1000.0, 16.7, 1.0, 100.0, false, 50.0, &candidates);
        assert!(signal.is_none());
    }

    #[test]
    fn test_can_commit_requires_no_inbound_signal() {
        let mut ctl = LaneChangeController { gap_before: 10.0, gap_after: 10.0, ..Default::default() };
        ctl.signal_send = Some(LaneChangeSignal::new(1, "l1", 1, 1.0));
        assert!(ctl.can_commit(5.0, 5.0));
        ctl.receive_signal(2, 99, Some(1));
        assert!(!ctl.can_commit(5.0, 5.0));
    }

    #[test]
    fn test_lateral_step_caps_at_max_offset() {
        let (offset, finished) = lateral_step(1.9, 10.0, 1.0, 2.0);
        assert_eq!(offset, 2.0);
        assert!(finished);
    }
}
