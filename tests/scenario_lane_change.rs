use kinetic_traffic_kernel::config::SimulationConfig;
use kinetic_traffic_kernel::engine::Engine;
use kinetic_traffic_kernel::flow::{Flow, VehicleTemplate};
use kinetic_traffic_kernel::utils::generators::straight_corridor;

/// Two-lane road, a slow leader and a faster follower spawned a few
/// seconds later on the same lane with a free outer lane (spec §4.4
/// scenario 5). The follower must eventually move onto the free lane
/// rather than staying queued behind the leader forever.
#[test]
fn test_follower_changes_into_free_lane() {
    let net = straight_corridor(1, 2, 400.0, 16.7);
    let config = SimulationConfig::new("sim", "roadnet.json", "flow.json").with_interval(0.5).with_seed(9).with_thread_num(1).build();

    let leader_template = VehicleTemplate { max_speed: 3.0, ..VehicleTemplate::default() };
    let leader_flow = Flow::new("lead", vec!["r0".to_string()], 1000.0).with_template(leader_template).with_end_time(0.1).build().unwrap();
    let follower_flow = Flow::new("follow", vec!["r0".to_string()], 1000.0).with_start_time(7.0).with_end_time(7.1).build().unwrap();

    let mut engine = Engine::new(config, net, vec![leader_flow, follower_flow]);

    let mut ever_changed_lane = false;
    for _ in 0..120 {
        engine.step().unwrap();
        let Ok(follow) = engine.vehicle_info("follow_0") else { break };
        if follow.drivable == "r0_1" {
            ever_changed_lane = true;
        }
    }

    assert!(ever_changed_lane, "follower never moved off its spawn lane despite a slower leader ahead and a free adjacent lane");
}
