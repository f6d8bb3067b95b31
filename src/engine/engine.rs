use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::agents::{car_follow_speed, LaneChangeSignal, PartnerType, Vehicle, VehicleInfo};
use crate::config::SimulationConfig;
use crate::engine::archive::Archive;
use crate::engine::error::EngineError;
use crate::engine::pipeline::approaching_intersection_distance;
use crate::flow::Flow;
use crate::lane_change::controller::{estimate_gap, lateral_step, LaneCandidate};
use crate::log_main;
use crate::roadnet::cross::{can_pass, ApproachFacts, BlockerWalk, Cross};
use crate::roadnet::drivable::VehicleHandle;
use crate::roadnet::lane_link::RoadLinkType;
use crate::roadnet::{Drivable, RoadNet};
use crate::shortest_path::Router;
use crate::verbose::{
    EVENT_ARCHIVE_RESTORE, EVENT_ARCHIVE_SNAPSHOT, EVENT_LANE_CHANGE_ABORT, EVENT_LANE_CHANGE_FINISH, EVENT_RESET, EVENT_STEP, EVENT_TL_TICK, EVENT_VEHICLE_FINISH, EVENT_VEHICLE_SPAWN,
};

/// `reachSteps(d, link)` (spec §4.5): ceil time to cover `d` ramping at
/// `usual_pos_acc` from `current_speed` up to `cap_speed`, then cruising.
fn reach_steps(distance: f64, current_speed: f64, usual_pos_acc: f64, cap_speed: f64) -> f64 {
    let distance = distance.max(0.0);
    let cap_speed = cap_speed.max(1e-6);
    let v0 = current_speed.clamp(0.0, cap_speed);
    if v0 >= cap_speed {
        return (distance / cap_speed).ceil();
    }
    let accel = usual_pos_acc.max(1e-6);
    let t_ramp = (cap_speed - v0) / accel;
    let dist_ramp = v0 * t_ramp + 0.5 * accel * t_ramp * t_ramp;
    let time = if dist_ramp >= distance {
        let disc = (v0 * v0 + 2.0 * accel * distance).max(0.0).sqrt();
        (disc - v0) / accel
    } else {
        t_ramp + (distance - dist_ramp) / cap_speed
    };
    time.max(0.0).ceil()
}

fn partition_round_robin<T: Clone>(items: &[T], workers: usize) -> Vec<Vec<T>> {
    let w = workers.max(1);
    let mut parts = vec![Vec::new(); w];
    for (i, item) in items.iter().enumerate() {
        parts[i % w].push(item.clone());
    }
    parts
}

/// The scheduling core: owns the road network, the vehicle pool, and the
/// flow generators, and drives them through the fourteen ordered stages of
/// spec §4.1 once per `step()`. Parallel "workers over X" stages are
/// expressed as a read-only fork (`std::thread::scope`) followed by a
/// serial apply on the calling thread, rather than a persistent
/// `std::sync::Barrier`-synchronized pool: both satisfy §5's invariants
/// (deterministic partitioning, total happens-before between stages, a
/// single serial reduction point) but a scoped fan-out needs no shutdown
/// protocol, which is the right tradeoff for a library whose unit of work
/// is already one `step()` call rather than a long-running service.
pub struct Engine {
    pub config: SimulationConfig,
    net: RoadNet,
    vehicles: IndexMap<VehicleHandle, Vehicle>,
    flows: Vec<Flow>,
    rng: StdRng,
    thread_num: usize,
    step: u64,
    elapsed_time: f64,
    active_count: usize,
    finished_count: u64,
    cumulative_travel_time: f64,
    push_buffer: Vec<(VehicleHandle, f64)>,
    lane_change_notify_buffer: Vec<LaneChangeSignal>,
    vehicle_remove_buffer: Vec<VehicleHandle>,
    replay_log: Vec<String>,
    archive: Option<Archive>,
}

impl Engine {
    pub fn new(config: SimulationConfig, mut net: RoadNet, flows: Vec<Flow>) -> Self {
        config.validate();
        net.init_crosses();
        let thread_num = config.resolved_thread_num();
        let seed = config.seed;
        Engine {
            config,
            net,
            vehicles: IndexMap::new(),
            flows,
            rng: StdRng::seed_from_u64(seed),
            thread_num,
            step: 0,
            elapsed_time: 0.0,
            active_count: 0,
            finished_count: 0,
            cumulative_travel_time: 0.0,
            push_buffer: Vec::new(),
            lane_change_notify_buffer: Vec::new(),
            vehicle_remove_buffer: Vec::new(),
            replay_log: Vec::new(),
            archive: None,
        }
    }

    fn random_priority(&mut self) -> VehicleHandle {
        self.rng.random::<i64>()
    }

    /// Runs one simulation step of `config.interval` seconds (spec §4.1).
    pub fn step(&mut self) -> Result<(), EngineError> {
        let dt = self.config.interval;
        log_main!(EVENT_STEP, "simulation step begins", step = self.step);

        self.stage_advance_flows(dt);
        self.stage_plan_route();
        self.stage_handle_waiting();
        if self.config.lane_change {
            self.stage_init_segments();
            self.stage_plan_lane_change(dt);
        }
        self.stage_update_leader_and_gap();
        if self.config.lane_change {
            self.stage_schedule_lane_change();
        }
        self.stage_notify_cross();
        self.stage_get_action(dt);
        self.stage_update_location();
        self.stage_update_action();
        if self.config.lane_change {
            self.stage_progress_lane_change(dt);
        }
        self.stage_update_leader_and_gap();
        self.stage_traffic_lights_advance(dt);
        if self.config.save_replay {
            self.stage_append_replay_log();
        }

        self.elapsed_time += dt;
        self.step += 1;
        Ok(())
    }

    // ---- stage 1 ----
    fn stage_advance_flows(&mut self, dt: f64) {
        let mut spawns: Vec<(String, usize)> = Vec::new();
        for (idx, flow) in self.flows.iter_mut().enumerate() {
            for id in flow.advance(dt) {
                spawns.push((id, idx));
            }
        }
        for (id, flow_idx) in spawns {
            let route = self.flows[flow_idx].route.clone();
            let Some(first_road) = route.first().cloned() else { continue };
            let template = self.flows[flow_idx].template.clone();
            let flow_id = self.flows[flow_idx].id.clone();

            let mut priority = self.random_priority();
            while self.vehicles.contains_key(&priority) {
                priority = self.random_priority();
            }

            let mut vehicle = Vehicle::new(&id, priority, "", route)
                .with_length(template.length)
                .with_width(template.width)
                .with_max_speed(template.max_speed)
                .with_max_pos_acc(template.max_pos_acc)
                .with_max_neg_acc(template.max_neg_acc)
                .with_usual_pos_acc(template.usual_pos_acc)
                .with_usual_neg_acc(template.usual_neg_acc)
                .with_min_gap(template.min_gap)
                .with_headway_time(template.headway_time)
                .with_yield_distance(template.yield_distance)
                .with_enter_time(self.elapsed_time)
                .with_flow_id(flow_id)
                .build();
            vehicle.controller_info.approaching_intersection_distance = approaching_intersection_distance(vehicle.max_speed, vehicle.usual_neg_acc, dt);

            log_main!(EVENT_VEHICLE_SPAWN, "vehicle spawned", vehicle_id = id.as_str(), priority = priority);
            self.vehicles.insert(priority, vehicle);
            if let Some(road) = self.net.get_road_mut(&first_road) {
                road.plan_route_buffer.push(priority);
            }
        }
    }

    // ---- stage 2 ----
    fn stage_plan_route(&mut self) {
        let road_ids: Vec<String> = self.net.roads.keys().cloned().collect();
        let parts = partition_round_robin(&road_ids, self.thread_num);
        let net_ref = &self.net;
        let vehicles_ref = &self.vehicles;

        let results: Vec<(VehicleHandle, Option<(String, Router)>)> = std::thread::scope(|scope| {
            let handles: Vec<_> = parts
                .iter()
                .map(|part| {
                    scope.spawn(move || {
                        let mut outcomes = Vec::new();
                        for road_id in part {
                            let Some(road) = net_ref.get_road(road_id) else { continue };
                            for &handle in &road.plan_route_buffer {
                                let Some(vehicle) = vehicles_ref.get(&handle) else { continue };
                                let mut router = vehicle.controller_info.router.clone();
                                match router.plan(net_ref) {
                                    Ok(()) => {
                                        let first_road_id = router.current_road().unwrap_or(road_id.as_str()).to_string();
                                        let lane_id = net_ref.get_road(&first_road_id).and_then(|r| r.lane_ids.first()).cloned();
                                        outcomes.push((handle, lane_id.map(|l| (l, router))));
                                    }
                                    Err(_) => outcomes.push((handle, None)),
                                }
                            }
                        }
                        outcomes
                    })
                })
                .collect();
            handles.into_iter().flat_map(|h| h.join().unwrap()).collect()
        });

        for road_id in &road_ids {
            if let Some(road) = self.net.get_road_mut(road_id) {
                road.plan_route_buffer.clear();
            }
        }

        for (handle, outcome) in results {
            match outcome {
                Some((lane_id, router)) => {
                    if let Some(vehicle) = self.vehicles.get_mut(&handle) {
                        vehicle.controller_info.current_drivable = lane_id.clone();
                        vehicle.controller_info.router = router;
                    }
                    if let Some(Drivable::Lane(lane)) = self.net.get_drivable_mut(&lane_id) {
                        lane.waiting_buffer.push_back(handle);
                    }
                }
                None => {
                    let flow_id = self.vehicles.get(&handle).and_then(|v| v.flow_id.clone());
                    if let Some(flow_id) = flow_id {
                        if let Some(flow) = self.flows.iter_mut().find(|f| f.id == flow_id) {
                            flow.set_valid(false);
                        }
                    }
                    self.vehicles.shift_remove(&handle);
                }
            }
        }
    }

    // ---- stage 3 ----
    fn stage_handle_waiting(&mut self) {
        let lane_ids: Vec<String> = self.net.drivables.iter().filter(|(_, d)| matches!(d, Drivable::Lane(_))).map(|(id, _)| id.clone()).collect();
        for lane_id in lane_ids {
            loop {
                let Some(Drivable::Lane(lane)) = self.net.get_drivable(&lane_id) else { break };
                let Some(&head) = lane.waiting_buffer.front() else { break };
                let Some(new_vehicle_min_gap) = self.vehicles.get(&head).map(|v| v.min_gap) else {
                    if let Some(Drivable::Lane(lane)) = self.net.get_drivable_mut(&lane_id) {
                        lane.waiting_buffer.pop_front();
                    }
                    continue;
                };
                let tail_handle = lane.vehicles.last().copied();
                let fits = match tail_handle {
                    None => true,
                    Some(tail) => self.vehicles.get(&tail).map(|v| v.distance > v.length + new_vehicle_min_gap).unwrap_or(true),
                };
                if !fits {
                    break;
                }

                let Some(Drivable::Lane(lane)) = self.net.get_drivable_mut(&lane_id) else { break };
                lane.waiting_buffer.pop_front();
                lane.vehicles.push(head);

                let leader_gap = tail_handle.and_then(|t| self.vehicles.get(&t)).map(|v| v.distance - v.length);
                if let Some(vehicle) = self.vehicles.get_mut(&head) {
                    vehicle.distance = 0.0;
                    vehicle.controller_info.running = true;
                    vehicle.controller_info.current_drivable = lane_id.clone();
                    vehicle.controller_info.leader = tail_handle;
                    vehicle.controller_info.gap = leader_gap.unwrap_or(f64::INFINITY);
                }
                self.active_count += 1;
            }
        }
    }

    // ---- stage 4 ----
    fn stage_init_segments(&mut self) {
        let vehicles = &self.vehicles;
        for drivable in self.net.drivables.values_mut() {
            if let Drivable::Lane(lane) = drivable {
                lane.rebuild_segments(|h| vehicles.get(&h).map(|v| v.distance).unwrap_or(0.0));
            }
        }
    }

    // ---- stage 5 ----
    fn stage_plan_lane_change(&mut self, dt: f64) {
        let now = self.elapsed_time;
        let handles: Vec<VehicleHandle> = self
            .vehicles
            .iter()
            .filter(|(_, v)| v.controller_info.running && v.lane_change_info.partner_type == PartnerType::None)
            .map(|(&h, _)| h)
            .collect();

        let mut signals = Vec::new();
        for handle in handles {
            let Some(current_drivable) = self.vehicles.get(&handle).map(|v| v.controller_info.current_drivable.clone()) else { continue };
            let Some(Drivable::Lane(lane)) = self.net.get_drivable(&current_drivable) else { continue };
            let (road_id, lane_index, lane_length) = (lane.road_id.clone(), lane.index, lane.length);
            let Some(road) = self.net.get_road(&road_id) else { continue };

            let Some(vehicle) = self.vehicles.get(&handle) else { continue };
            let (self_distance, self_length, current_gap, max_speed) = (vehicle.distance, vehicle.length, vehicle.controller_info.gap, vehicle.max_speed);

            let mut candidates = Vec::new();
            for (offset, direction) in [(-1i64, -1i8), (1i64, 1i8)] {
                let target_index = lane_index as i64 + offset;
                if target_index < 0 {
                    continue;
                }
                let Some(adj_lane_id) = road.lane_ids.get(target_index as usize) else { continue };
                let Some(Drivable::Lane(adj_lane)) = self.net.get_drivable(adj_lane_id) else { continue };
                let leader = adj_lane
                    .vehicles
                    .iter()
                    .filter_map(|&h| self.vehicles.get(&h).map(|v| (v.distance, v.length)))
                    .filter(|(d, _)| *d > self_distance)
                    .min_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
                let gap = estimate_gap(self_distance, leader, adj_lane.length);
                candidates.push(LaneCandidate { lane_id: adj_lane_id.clone(), direction, estimated_gap: gap });
            }

            let distance_to_lane_end = lane_length - self_distance;
            if let Some(vehicle) = self.vehicles.get_mut(&handle) {
                if let Some(signal) = vehicle.lane_change_controller.make_signal(handle, self_length, current_gap, max_speed, dt, now, false, distance_to_lane_end, &candidates) {
                    signals.push(signal);
                }
            }
        }
        self.lane_change_notify_buffer = signals;
    }

    fn next_drivable_id(&self, drivable_id: &str, route_next_road: Option<&str>) -> Option<String> {
        match self.net.get_drivable(drivable_id)? {
            Drivable::Lane(lane) => {
                for link_id in &lane.lane_link_ids {
                    if let Some(Drivable::LaneLink(link)) = self.net.get_drivable(link_id) {
                        if let Some(end_lane) = self.net.get_drivable(&link.end_lane_id).and_then(Drivable::as_lane) {
                            if Some(end_lane.road_id.as_str()) == route_next_road {
                                return Some(link_id.clone());
                            }
                        }
                    }
                }
                lane.lane_link_ids.first().cloned()
            }
            Drivable::LaneLink(link) => Some(link.end_lane_id.clone()),
        }
    }

    /// The stop-before-cross component of `getAction` (spec §4.1 stage 9,
    /// §4.5): caps speed so a vehicle that `can_pass` denies still brakes to
    /// a halt at the cross rather than entering it, and surfaces the foe it
    /// yielded to so `stage_get_action` can record it as this vehicle's
    /// blocker for the next step's deadlock-cycle check.
    fn intersection_related_speed(&self, handle: VehicleHandle) -> (f64, Option<VehicleHandle>) {
        let Some(vehicle) = self.vehicles.get(&handle) else { return (f64::INFINITY, None) };
        let Some(Drivable::LaneLink(link)) = self.net.get_drivable(&vehicle.controller_info.current_drivable) else { return (f64::INFINITY, None) };
        let Some(intersection) = self.net.intersections.values().find(|i| i.lane_link_ids.contains(&link.id)) else { return (f64::INFINITY, None) };

        let mut bound = f64::INFINITY;
        let mut blocker = None;
        for &cross_index in &link.cross_indices {
            let Some(cross) = intersection.crosses.get(cross_index) else { continue };
            let side = if cross.lane_links[0] == link.id { 0 } else { 1 };
            let cross_distance = cross.distances[side];
            if cross_distance < vehicle.distance {
                continue;
            }
            let cap_speed = link.turn_speed_cap().min(vehicle.max_speed);
            let self_facts = ApproachFacts {
                priority: vehicle.priority,
                road_link_type: link.kind,
                min_brake_distance: vehicle.min_brake_distance(),
                yield_distance: vehicle.yield_distance,
                reach_steps: reach_steps(cross_distance - vehicle.distance, vehicle.speed, vehicle.usual_pos_acc, cap_speed),
                enter_lane_link_time: vehicle.controller_info.enter_lane_link_time,
                length: vehicle.length,
            };
            let other_side = Cross::other_side(side);
            let (pass, foe) = can_pass(cross, side, handle, &self_facts, |foe| self.approach_facts_for(foe, cross, other_side), self);
            if !pass && cross_distance - vehicle.distance < cross.arrive_distance {
                bound = bound.min((2.0 * (cross_distance - vehicle.distance).max(0.0) * vehicle.usual_neg_acc).sqrt());
                blocker = blocker.or(foe);
            }
        }
        (bound, blocker)
    }

    fn approach_facts_for(&self, handle: VehicleHandle, cross: &Cross, side: usize) -> ApproachFacts {
        let link_id = &cross.lane_links[side];
        let foe_link = self.net.get_drivable(link_id).and_then(Drivable::as_lane_link);
        let kind = foe_link.map(|l| l.kind).unwrap_or(RoadLinkType::Straight);
        let Some(v) = self.vehicles.get(&handle) else {
            return ApproachFacts { priority: 0, road_link_type: kind, min_brake_distance: 0.0, yield_distance: 0.0, reach_steps: f64::INFINITY, enter_lane_link_time: None, length: 0.0 };
        };
        let cap_speed = foe_link.map(|l| l.turn_speed_cap()).unwrap_or(v.max_speed).min(v.max_speed);
        ApproachFacts {
            priority: v.priority,
            road_link_type: kind,
            min_brake_distance: v.min_brake_distance(),
            yield_distance: v.yield_distance,
            reach_steps: reach_steps(cross.distances[side] - v.distance, v.speed, v.usual_pos_acc, cap_speed),
            enter_lane_link_time: v.controller_info.enter_lane_link_time,
            length: v.length,
        }
    }

    /// Caps speed so a vehicle on a lane whose next road-link is closed by
    /// its intersection's traffic light (spec §4.5, §10.1) brakes to a halt
    /// at the lane end rather than spilling onto the lane-link.
    fn traffic_light_related_speed(&self, handle: VehicleHandle) -> f64 {
        let Some(vehicle) = self.vehicles.get(&handle) else { return f64::INFINITY };
        let Some(Drivable::Lane(lane)) = self.net.get_drivable(&vehicle.controller_info.current_drivable) else { return f64::INFINITY };
        let route_next_road = vehicle.controller_info.router.get_next(vehicle.controller_info.router.current_road().unwrap_or_default());
        let Some(next_id) = self.next_drivable_id(&vehicle.controller_info.current_drivable, route_next_road) else { return f64::INFINITY };
        let Some(Drivable::LaneLink(link)) = self.net.get_drivable(&next_id) else { return f64::INFINITY };
        let Some(intersection) = self.net.intersections.values().find(|i| i.lane_link_ids.contains(&link.id)) else { return f64::INFINITY };
        if intersection.is_road_link_available(&link.road_link_id) {
            return f64::INFINITY;
        }
        let remaining = (lane.length - vehicle.distance).max(0.0);
        (2.0 * remaining * vehicle.usual_neg_acc).sqrt()
    }

    /// Single-hop approximation of the downstream leader search in spec §4.1
    /// stage 6: looks one drivable ahead rather than walking iteratively out
    /// to `approachingIntersectionDistance`.
    fn downstream_leader(&self, drivable_id: &str, handle: VehicleHandle) -> (Option<VehicleHandle>, f64) {
        let Some(vehicle) = self.vehicles.get(&handle) else { return (None, f64::INFINITY) };
        let Some(drivable) = self.net.get_drivable(drivable_id) else { return (None, f64::INFINITY) };
        let remaining = (drivable.length() - vehicle.distance).max(0.0);
        let route_next_road = vehicle.controller_info.router.get_next(vehicle.controller_info.router.current_road().unwrap_or_default()).map(str::to_string);
        let Some(next_id) = self.next_drivable_id(drivable_id, route_next_road.as_deref()) else {
            return (None, vehicle.controller_info.approaching_intersection_distance.max(remaining));
        };
        let Some(next_drivable) = self.net.get_drivable(&next_id) else { return (None, remaining) };
        match next_drivable.vehicles().last() {
            Some(&leader_handle) => {
                let leader = self.vehicles.get(&leader_handle);
                let leader_distance = leader.map(|v| v.distance).unwrap_or(0.0);
                let leader_length = leader.map(|v| v.length).unwrap_or(0.0);
                (Some(leader_handle), remaining + leader_distance - leader_length)
            }
            None => (None, remaining + next_drivable.length()),
        }
    }

    // ---- stages 6 & 12 ----
    fn stage_update_leader_and_gap(&mut self) {
        let drivable_ids: Vec<String> = self.net.drivables.keys().cloned().collect();
        for drivable_id in drivable_ids {
            let vehicle_handles: Vec<VehicleHandle> = self.net.get_drivable(&drivable_id).map(|d| d.vehicles().to_vec()).unwrap_or_default();
            for (i, &handle) in vehicle_handles.iter().enumerate() {
                let (leader, gap) = if i == 0 {
                    self.downstream_leader(&drivable_id, handle)
                } else {
                    let leader_handle = vehicle_handles[i - 1];
                    let leader_distance = self.vehicles.get(&leader_handle).map(|v| v.distance).unwrap_or(0.0);
                    let leader_length = self.vehicles.get(&leader_handle).map(|v| v.length).unwrap_or(0.0);
                    let self_distance = self.vehicles.get(&handle).map(|v| v.distance).unwrap_or(0.0);
                    (Some(leader_handle), leader_distance - leader_length - self_distance)
                };
                if let Some(vehicle) = self.vehicles.get_mut(&handle) {
                    vehicle.controller_info.leader = leader;
                    vehicle.controller_info.gap = gap;
                }
            }
        }
    }

    // ---- stage 7 ----
    fn stage_schedule_lane_change(&mut self) {
        let mut signals = std::mem::take(&mut self.lane_change_notify_buffer);
        signals.sort_by(|a, b| b.urgency.partial_cmp(&a.urgency).unwrap_or(std::cmp::Ordering::Equal));

        for signal in signals {
            let Some(Drivable::Lane(target_lane)) = self.net.get_drivable(&signal.target_lane) else { continue };
            let Some(self_distance) = self.vehicles.get(&signal.source).map(|v| v.distance) else { continue };

            let target_leader = target_lane.vehicles.iter().filter_map(|&h| self.vehicles.get(&h).map(|v| (h, v.distance))).filter(|(_, d)| *d > self_distance).min_by(|a, b| a.1.partial_cmp(&b.1).unwrap()).map(|(h, _)| h);
            let target_follower = target_lane.vehicles.iter().filter_map(|&h| self.vehicles.get(&h).map(|v| (h, v.distance))).filter(|(_, d)| *d <= self_distance).max_by(|a, b| a.1.partial_cmp(&b.1).unwrap()).map(|(h, _)| h);

            for &neighbor in [target_leader, target_follower].iter().flatten() {
                let own_plan_priority = self.vehicles.get(&neighbor).and_then(|v| v.lane_change_controller.signal_send.as_ref().map(|_| neighbor));
                if let Some(neighbor_vehicle) = self.vehicles.get_mut(&neighbor) {
                    neighbor_vehicle.lane_change_controller.receive_signal(signal.source, signal.source, own_plan_priority);
                }
            }

            let gap_before = target_follower.and_then(|h| self.vehicles.get(&h)).map(|v| self_distance - v.distance - v.length).unwrap_or(f64::INFINITY);
            let gap_after = target_leader.and_then(|h| self.vehicles.get(&h)).map(|v| v.distance - v.length - self_distance).unwrap_or(f64::INFINITY);
            if let Some(vehicle) = self.vehicles.get_mut(&signal.source) {
                vehicle.lane_change_controller.gap_before = gap_before;
                vehicle.lane_change_controller.gap_after = gap_after;
            }

            let safe_gap = self.vehicles.get(&signal.source).map(|v| v.min_gap).unwrap_or(2.5);
            let can_commit = self.vehicles.get(&signal.source).map(|v| v.lane_change_controller.can_commit(safe_gap, safe_gap)).unwrap_or(false);
            if !can_commit {
                continue;
            }

            let mut shadow_priority = self.random_priority();
            while self.vehicles.contains_key(&shadow_priority) {
                shadow_priority = self.random_priority();
            }
            let Some(mut shadow) = self.vehicles.get(&signal.source).cloned() else { continue };
            shadow.id = format!("{}_shadow", shadow.id);
            shadow.priority = shadow_priority;
            shadow.controller_info.current_drivable = signal.target_lane.clone();
            shadow.lane_change_info.partner_type = PartnerType::Shadow;
            shadow.lane_change_info.partner = Some(signal.source);

            let insert_index = if let Some(Drivable::Lane(target_lane)) = self.net.get_drivable(&signal.target_lane) {
                target_follower.and_then(|tf| target_lane.vehicles.iter().position(|&v| v == tf)).unwrap_or(target_lane.vehicles.len())
            } else {
                continue;
            };
            if let Some(Drivable::Lane(target_lane)) = self.net.get_drivable_mut(&signal.target_lane) {
                target_lane.insert_before(insert_index, shadow_priority);
            }
            self.vehicles.insert(shadow_priority, shadow);

            if let Some(vehicle) = self.vehicles.get_mut(&signal.source) {
                vehicle.lane_change_controller.commit(target_leader, target_follower);
                vehicle.lane_change_info.partner_type = PartnerType::Real;
                vehicle.lane_change_info.partner = Some(shadow_priority);
            }
        }
    }

    // ---- stage 8 ----
    fn stage_notify_cross(&mut self) {
        self.net.clear_cross_notifications();
        let intersection_ids: Vec<String> = self.net.intersections.keys().cloned().collect();
        for intersection_id in intersection_ids {
            let Some(intersection) = self.net.get_intersection(&intersection_id) else { continue };
            let link_ids = intersection.lane_link_ids.clone();
            for link_id in link_ids {
                let Some(Drivable::LaneLink(link)) = self.net.get_drivable(&link_id) else { continue };
                let Some(&nearest) = link.vehicles.first() else { continue };
                let Some(distance) = self.vehicles.get(&nearest).map(|v| v.distance) else { continue };
                let cross_indices = link.cross_indices.clone();
                let link_id_clone = link_id.clone();
                if let Some(intersection) = self.net.get_intersection_mut(&intersection_id) {
                    for cross_index in cross_indices {
                        if let Some(cross) = intersection.crosses.get_mut(cross_index) {
                            let side = if cross.lane_links[0] == link_id_clone { 0 } else { 1 };
                            let distance_to_cross = cross.distances[side] - distance;
                            cross.notify_side(side, nearest, distance_to_cross);
                        }
                    }
                }
            }
        }
    }

    // ---- stage 9 ----
    fn stage_get_action(&mut self, dt: f64) {
        let handles: Vec<VehicleHandle> = self.vehicles.iter().filter(|(_, v)| v.controller_info.running).map(|(&h, _)| h).collect();
        let parts = partition_round_robin(&handles, self.thread_num);
        let engine_ref: &Engine = self;

        let actions: Vec<(VehicleHandle, f64, f64, Option<VehicleHandle>)> = std::thread::scope(|scope| {
            let joins: Vec<_> = parts
                .iter()
                .map(|part| {
                    scope.spawn(move || {
                        let mut out = Vec::new();
                        for &handle in part {
                            let Some(vehicle) = engine_ref.vehicles.get(&handle) else { continue };
                            let leader = vehicle.controller_info.leader.and_then(|h| engine_ref.vehicles.get(&h));
                            let gap = vehicle.controller_info.gap;

                            let mut v = vehicle.max_speed.min(vehicle.speed + vehicle.max_pos_acc * dt);
                            if let Some(drivable) = engine_ref.net.get_drivable(&vehicle.controller_info.current_drivable) {
                                v = v.min(drivable.max_speed());
                            }
                            v = v.min(car_follow_speed(vehicle, leader, gap, dt));
                            if let Some(yield_speed) = vehicle.lane_change_controller.yield_speed(leader.map(|l| l.speed).unwrap_or(vehicle.max_speed), gap, vehicle.min_gap, dt) {
                                v = v.min(yield_speed);
                            }
                            let (cross_bound, blocker) = engine_ref.intersection_related_speed(handle);
                            v = v.min(cross_bound);
                            v = v.min(engine_ref.traffic_light_related_speed(handle));
                            v = v.max(vehicle.speed - vehicle.max_neg_acc * dt);

                            let (speed, delta) = if v < 0.0 {
                                (0.0, 0.5 * vehicle.speed * vehicle.speed / vehicle.max_neg_acc.max(1e-6))
                            } else {
                                (v, (vehicle.speed + v) * dt / 2.0)
                            };
                            out.push((handle, speed, delta, blocker));
                        }
                        out
                    })
                })
                .collect();
            joins.into_iter().flat_map(|h| h.join().unwrap()).collect()
        });

        let mut push_buffer = Vec::new();
        for (handle, speed, delta, blocker) in actions {
            let route_next_road = self.vehicles.get(&handle).and_then(|v| v.controller_info.router.get_next(v.controller_info.router.current_road().unwrap_or_default()).map(str::to_string));
            let Some(mut vehicle) = self.vehicles.shift_remove(&handle) else { continue };
            vehicle.write_buffer.speed = Some(speed);
            vehicle.write_buffer.blocker = Some(blocker);
            vehicle.set_delta_distance(delta, &self.net, |id| self.next_drivable_id(id, route_next_road.as_deref()));
            if let Some(d) = vehicle.write_buffer.distance {
                push_buffer.push((handle, d));
            }
            self.vehicles.insert(handle, vehicle);
        }
        push_buffer.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        self.push_buffer = push_buffer;
    }

    // ---- stage 10 ----
    fn stage_update_location(&mut self) {
        let push_buffer = std::mem::take(&mut self.push_buffer);
        for (handle, _) in push_buffer {
            let Some(vehicle) = self.vehicles.get(&handle) else { continue };
            let old_drivable = vehicle.controller_info.current_drivable.clone();
            let new_drivable = vehicle.write_buffer.drivable.clone().unwrap_or_else(|| old_drivable.clone());
            let ends = vehicle.write_buffer.end.unwrap_or(false);

            if old_drivable != new_drivable || ends {
                if let Some(d) = self.net.get_drivable_mut(&old_drivable) {
                    d.remove_vehicle(handle);
                }
            }
            if ends {
                self.vehicle_remove_buffer.push(handle);
                continue;
            }
            if old_drivable != new_drivable {
                let distance = vehicle.write_buffer.distance.unwrap_or(0.0);
                let distance_of = {
                    let vehicles = &self.vehicles;
                    move |h: VehicleHandle| vehicles.get(&h).map(|v| v.distance).unwrap_or(0.0)
                };
                let entered_lane_link = matches!(self.net.get_drivable(&new_drivable), Some(Drivable::LaneLink(_)));
                if let Some(d) = self.net.get_drivable_mut(&new_drivable) {
                    match d {
                        Drivable::Lane(lane) => lane.insert_sorted(handle, distance, distance_of),
                        Drivable::LaneLink(link) => link.insert_sorted(handle, distance, distance_of),
                    }
                }
                if let Some(vehicle) = self.vehicles.get_mut(&handle) {
                    vehicle.write_buffer.enter_lane_link_time = Some(if entered_lane_link { Some(self.step) } else { None });
                }
            }
        }
    }

    // ---- stage 11 ----
    fn stage_update_action(&mut self) {
        let removed: std::collections::HashSet<VehicleHandle> = self.vehicle_remove_buffer.iter().copied().collect();
        let handles: Vec<VehicleHandle> = self.vehicles.keys().copied().collect();
        for handle in handles {
            let Some(vehicle) = self.vehicles.get_mut(&handle) else { continue };
            if let Some(d) = vehicle.write_buffer.distance.take() {
                vehicle.distance = d;
            }
            if let Some(s) = vehicle.write_buffer.speed.take() {
                vehicle.speed = s;
            }
            if let Some(drivable) = vehicle.write_buffer.drivable.take() {
                vehicle.controller_info.prev_drivable = Some(vehicle.controller_info.current_drivable.clone());
                if let Some(Drivable::Lane(lane)) = self.net.get_drivable(&drivable) {
                    if Some(lane.road_id.as_str()) != vehicle.controller_info.router.current_road() {
                        vehicle.controller_info.router.advance();
                    }
                }
                vehicle.controller_info.current_drivable = drivable;
            }
            if let Some(blocker) = vehicle.write_buffer.blocker.take() {
                vehicle.controller_info.blocker = blocker;
            }
            if let Some(elt) = vehicle.write_buffer.enter_lane_link_time.take() {
                vehicle.controller_info.enter_lane_link_time = elt;
            }
            if let Some(end) = vehicle.write_buffer.end.take() {
                vehicle.controller_info.end = end;
                vehicle.controller_info.running = !end;
            }
            if let Some(blocker) = vehicle.controller_info.blocker {
                if removed.contains(&blocker) {
                    vehicle.controller_info.blocker = None;
                }
            }
            if let Some(leader) = vehicle.controller_info.leader {
                if removed.contains(&leader) {
                    vehicle.controller_info.leader = None;
                }
            }
            vehicle.write_buffer.clear();
        }

        for handle in self.vehicle_remove_buffer.clone() {
            if let Some(vehicle) = self.vehicles.get(&handle) {
                self.cumulative_travel_time += self.elapsed_time - vehicle.enter_time;
                self.finished_count += 1;
                self.active_count = self.active_count.saturating_sub(1);
                log_main!(EVENT_VEHICLE_FINISH, "vehicle finished its route", vehicle_id = vehicle.id.as_str());
            }
            if let Some(partner) = self.vehicles.get(&handle).and_then(|v| v.lane_change_info.partner) {
                if let Some(partner_vehicle) = self.vehicles.get_mut(&partner) {
                    partner_vehicle.lane_change_info.clear();
                    partner_vehicle.lane_change_controller.finish(self.elapsed_time);
                }
            }
            self.vehicles.shift_remove(&handle);
        }
        self.vehicle_remove_buffer.clear();
    }

    /// Lane-change progression (spec §4.4 "Progression"): advances a
    /// committed real vehicle's lateral offset each step, finishing the
    /// handshake (shadow survives under the real vehicle's id) once it
    /// reaches the lane's half-width, and aborting (shadow discarded) if
    /// the real vehicle leaves its source lane before the offset caps.
    fn stage_progress_lane_change(&mut self, dt: f64) {
        let now = self.elapsed_time;
        let changers: Vec<(VehicleHandle, VehicleHandle)> = self
            .vehicles
            .iter()
            .filter(|(_, v)| v.lane_change_info.partner_type == PartnerType::Real && v.lane_change_controller.changing)
            .filter_map(|(&h, v)| v.lane_change_info.partner.map(|p| (h, p)))
            .collect();

        let mut aborted = Vec::new();
        let mut finished = Vec::new();

        for (real_handle, shadow_handle) in changers {
            let Some(vehicle) = self.vehicles.get(&real_handle) else { continue };
            let Some(Drivable::Lane(lane)) = self.net.get_drivable(&vehicle.controller_info.current_drivable) else {
                aborted.push((real_handle, shadow_handle));
                continue;
            };
            let max_offset = lane.width / 2.0;
            let (new_offset, reached_cap) = lateral_step(vehicle.lane_change_info.offset, vehicle.speed, dt, max_offset);
            if let Some(vehicle) = self.vehicles.get_mut(&real_handle) {
                vehicle.lane_change_info.offset = new_offset;
            }
            if reached_cap {
                finished.push((real_handle, shadow_handle));
            }
        }

        for (real_handle, shadow_handle) in aborted {
            if let Some(shadow) = self.vehicles.get(&shadow_handle) {
                let drivable_id = shadow.controller_info.current_drivable.clone();
                if let Some(d) = self.net.get_drivable_mut(&drivable_id) {
                    d.remove_vehicle(shadow_handle);
                }
            }
            self.vehicles.shift_remove(&shadow_handle);
            if let Some(real) = self.vehicles.get_mut(&real_handle) {
                real.lane_change_info.clear();
                real.lane_change_controller.abort();
            }
            for v in self.vehicles.values_mut() {
                v.controller_info.scrub_handle(shadow_handle);
            }
            log_main!(EVENT_LANE_CHANGE_ABORT, "lane change aborted", vehicle_handle = real_handle);
        }

        for (real_handle, shadow_handle) in finished {
            let Some(real_id) = self.vehicles.get(&real_handle).map(|v| v.id.clone()) else { continue };
            let real_drivable = self.vehicles.get(&real_handle).map(|v| v.controller_info.current_drivable.clone());
            if let Some(shadow) = self.vehicles.get_mut(&shadow_handle) {
                shadow.id = real_id.clone();
                shadow.lane_change_info.clear();
                shadow.lane_change_controller.finish(now);
            }
            if let Some(drivable_id) = real_drivable {
                if let Some(d) = self.net.get_drivable_mut(&drivable_id) {
                    d.remove_vehicle(real_handle);
                }
            }
            self.vehicles.shift_remove(&real_handle);
            for v in self.vehicles.values_mut() {
                v.controller_info.scrub_handle(real_handle);
            }
            log_main!(EVENT_LANE_CHANGE_FINISH, "lane change completed", vehicle_id = real_id.as_str());
        }
    }

    // ---- stage 13 ----
    fn stage_traffic_lights_advance(&mut self, dt: f64) {
        if self.config.rl_traffic_light {
            return;
        }
        for intersection in self.net.intersections.values_mut() {
            if let Some(tl) = intersection.traffic_light.as_mut() {
                tl.step(dt);
            }
        }
        log_main!(EVENT_TL_TICK, "traffic lights advanced", dt = dt);
    }

    // ---- stage 14 ----
    fn stage_append_replay_log(&mut self) {
        let mut vehicles_part = String::new();
        for vehicle in self.vehicles.values().filter(|v| v.controller_info.running) {
            vehicles_part.push_str(&format!("{:.2} 0.00 0.00 {} 0 {:.1} {:.1},", vehicle.distance, vehicle.id, vehicle.length, vehicle.width));
        }
        let mut roads_part = String::new();
        for road in self.net.roads.values() {
            roads_part.push_str(&road.id);
            for lane_id in &road.lane_ids {
                let indicator = self.net.get_drivable(lane_id).and_then(Drivable::as_lane).map(|_| " g").unwrap_or(" r");
                roads_part.push_str(indicator);
            }
            roads_part.push(',');
        }
        self.replay_log.push(format!("{};{}\n", vehicles_part, roads_part));
    }

    // ---- control API (spec §6, §10.5) ----

    pub fn reset(&mut self, reseed: bool) {
        log_main!(EVENT_RESET, "engine reset", reseed = reseed);
        self.vehicles.clear();
        self.step = 0;
        self.elapsed_time = 0.0;
        self.active_count = 0;
        self.finished_count = 0;
        self.cumulative_travel_time = 0.0;
        self.push_buffer.clear();
        self.lane_change_notify_buffer.clear();
        self.vehicle_remove_buffer.clear();
        self.replay_log.clear();
        for flow in &mut self.flows {
            flow.reset();
            flow.valid = true;
        }
        for intersection in self.net.intersections.values_mut() {
            if let Some(tl) = intersection.traffic_light.as_mut() {
                tl.reset();
            }
        }
        for drivable in self.net.drivables.values_mut() {
            drivable.vehicles_mut().clear();
        }
        if reseed {
            self.rng = StdRng::seed_from_u64(self.config.seed);
        }
    }

    pub fn current_step(&self) -> u64 {
        self.step
    }

    pub fn vehicle_count(&self) -> usize {
        self.active_count
    }

    pub fn finished_count(&self) -> u64 {
        self.finished_count
    }

    /// `averageTravelTime` (spec §8): 0 when the denominator is zero.
    pub fn average_travel_time(&self) -> f64 {
        let in_flight: f64 = self.vehicles.values().map(|v| self.elapsed_time - v.enter_time).sum();
        let denom = self.finished_count as f64 + self.vehicles.len() as f64;
        if denom == 0.0 {
            0.0
        } else {
            (self.cumulative_travel_time + in_flight) / denom
        }
    }

    pub fn vehicle_info(&self, vehicle_id: &str) -> Result<VehicleInfo, EngineError> {
        let vehicle = self.vehicles.values().find(|v| v.id == vehicle_id).ok_or_else(|| EngineError::UnknownVehicle(vehicle_id.to_string()))?;
        Ok(vehicle.get_info(&self.net))
    }

    pub fn set_custom_speed(&mut self, vehicle_id: &str, speed: Option<f64>) -> Result<(), EngineError> {
        let vehicle = self.vehicles.values_mut().find(|v| v.id == vehicle_id).ok_or_else(|| EngineError::UnknownVehicle(vehicle_id.to_string()))?;
        vehicle.custom_speed = speed;
        Ok(())
    }

    /// Validates the anchor-road list is contiguous before accepting it
    /// (spec §10.5).
    pub fn set_route(&mut self, vehicle_id: &str, anchors: Vec<String>) -> Result<(), EngineError> {
        if !Router::validate_contiguous(&self.net, &anchors) {
            return Err(EngineError::Precondition(format!("route for '{}' is not contiguous", vehicle_id)));
        }
        let vehicle = self.vehicles.values_mut().find(|v| v.id == vehicle_id).ok_or_else(|| EngineError::UnknownVehicle(vehicle_id.to_string()))?;
        vehicle.controller_info.router = Router::new(anchors);
        vehicle.controller_info.router.plan(&self.net).map_err(EngineError::Router)
    }

    pub fn set_traffic_light_phase(&mut self, intersection_id: &str, phase_index: usize) -> Result<(), EngineError> {
        if !self.config.rl_traffic_light {
            return Err(EngineError::Precondition("set_traffic_light_phase requires rl_traffic_light".to_string()));
        }
        let intersection = self.net.get_intersection_mut(intersection_id).ok_or_else(|| EngineError::UnknownDrivable(intersection_id.to_string()))?;
        let tl = intersection.traffic_light.as_mut().ok_or_else(|| EngineError::Precondition(format!("intersection '{}' has no traffic light", intersection_id)))?;
        if !tl.set_phase(phase_index) {
            return Err(EngineError::Precondition(format!("phase index {} out of range", phase_index)));
        }
        Ok(())
    }

    pub fn set_replay_logging(&mut self, enabled: bool) {
        self.config.save_replay = enabled;
    }

    pub fn replay_log(&self) -> &[String] {
        &self.replay_log
    }

    pub fn check_warnings(&self) -> Vec<String> {
        self.net.check_warnings()
    }

    pub fn checkpoint(&mut self) {
        log_main!(EVENT_ARCHIVE_SNAPSHOT, "archive captured", step = self.step);
        let drivable_vehicle_lists: IndexMap<String, Vec<VehicleHandle>> = self.net.drivables.iter().map(|(id, d)| (id.clone(), d.vehicles().to_vec())).collect();
        let traffic_light_states: IndexMap<String, (usize, f64)> = self
            .net
            .intersections
            .iter()
            .filter_map(|(id, i)| i.traffic_light.as_ref().map(|tl| (id.clone(), (tl.current_phase_index(), tl.remaining_duration()))))
            .collect();
        self.archive = Some(Archive::capture(self.step, self.active_count, self.finished_count, self.cumulative_travel_time, &self.vehicles, &drivable_vehicle_lists, &self.flows, &traffic_light_states));
    }

    pub fn restore(&mut self) -> Result<(), EngineError> {
        let archive = self.archive.clone().ok_or(crate::engine::archive::ArchiveError::Empty).map_err(|_| EngineError::Precondition("no archive captured".to_string()))?;
        log_main!(EVENT_ARCHIVE_RESTORE, "archive restored", step = archive.step);
        self.step = archive.step;
        self.elapsed_time = archive.step as f64 * self.config.interval;
        self.active_count = archive.active_count;
        self.finished_count = archive.finished_count;
        self.cumulative_travel_time = archive.cumulative_travel_time;
        self.vehicles = archive.vehicles;
        self.flows = archive.flows;
        for (drivable_id, handles) in archive.drivable_vehicle_lists {
            if let Some(d) = self.net.get_drivable_mut(&drivable_id) {
                *d.vehicles_mut() = handles;
            }
        }
        for (intersection_id, (phase_index, remaining_duration)) in archive.traffic_light_states {
            if let Some(intersection) = self.net.get_intersection_mut(&intersection_id) {
                if let Some(tl) = intersection.traffic_light.as_mut() {
                    tl.restore_phase(phase_index, remaining_duration);
                }
            }
        }
        Ok(())
    }
}

impl BlockerWalk for Engine {
    fn blocker_of(&self, handle: VehicleHandle) -> Option<VehicleHandle> {
        self.vehicles.get(&handle).and_then(|v| v.controller_info.blocker)
    }
}
