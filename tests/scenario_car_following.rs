use kinetic_traffic_kernel::config::SimulationConfig;
use kinetic_traffic_kernel::engine::Engine;
use kinetic_traffic_kernel::flow::{Flow, VehicleTemplate};
use kinetic_traffic_kernel::utils::generators::straight_corridor;

/// Two vehicles on the same lane: a leader capped well below the
/// follower's vmax. The follower must never close the gap past its own
/// min-gap/headway bound, matching the car-following invariant in
/// `D.vehicles sorted by distance descending, adjacent pairs satisfy the
/// min-gap inequality` (spec Invariants).
#[test]
fn test_follower_never_violates_minimum_gap() {
    let net = straight_corridor(1, 1, 500.0, 16.7);
    let config = SimulationConfig::new("sim", "roadnet.json", "flow.json").with_interval(0.5).with_seed(3).with_thread_num(1).with_lane_change(false).build();

    let leader_template = VehicleTemplate { max_speed: 5.0, ..VehicleTemplate::default() };
    let leader_flow = Flow::new("lead", vec!["r0".to_string()], 1000.0).with_template(leader_template).with_end_time(0.1).build().unwrap();
    let follower_flow = Flow::new("follow", vec!["r0".to_string()], 1000.0).with_start_time(2.0).with_end_time(2.1).build().unwrap();

    let mut engine = Engine::new(config, net, vec![leader_flow, follower_flow]);

    for _ in 0..200 {
        engine.step().unwrap();
        let (Ok(lead), Ok(follow)) = (engine.vehicle_info("lead_0"), engine.vehicle_info("follow_0")) else { continue };
        let gap = lead.distance - follow.distance - 5.0;
        assert!(gap >= -1e-6, "follower overlapped the leader: gap={}", gap);
    }
}
