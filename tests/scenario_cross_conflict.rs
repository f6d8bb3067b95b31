use kinetic_traffic_kernel::config::SimulationConfig;
use kinetic_traffic_kernel::engine::Engine;
use kinetic_traffic_kernel::flow::Flow;
use kinetic_traffic_kernel::utils::generators::four_way_intersection;

fn build_engine(both_flows: bool, seed: u64) -> Engine {
    let net = four_way_intersection(80.0, 10.0);
    let config = SimulationConfig::new("sim", "roadnet.json", "flow.json").with_interval(0.5).with_seed(seed).with_thread_num(1).with_lane_change(false).build();

    let south_to_north = Flow::new("sn", vec!["in_s".to_string(), "out_n".to_string()], 1000.0).with_end_time(0.1).build().unwrap();
    let mut flows = vec![south_to_north];
    if both_flows {
        let west_to_east = Flow::new("we", vec!["in_w".to_string(), "out_e".to_string()], 1000.0).with_end_time(0.1).build().unwrap();
        flows.push(west_to_east);
    }
    Engine::new(config, net, flows)
}

fn steps_until_empty(engine: &mut Engine, max_steps: u64) -> u64 {
    for step in 1..=max_steps {
        engine.step().unwrap();
        if engine.vehicle_count() == 0 && engine.finished_count() > 0 {
            return step;
        }
    }
    panic!("vehicles never cleared the intersection within {} steps", max_steps);
}

/// Two straight-through lane-links crossing at 90 degrees (spec §4.5
/// scenario 4): with a competing flow present, whichever vehicle yields
/// cannot finish its route any faster than it would with the intersection
/// to itself, and both vehicles must still finish without deadlocking.
#[test]
fn test_crossing_flow_never_finishes_faster_than_uncontested() {
    let mut alone = build_engine(false, 11);
    let alone_steps = steps_until_empty(&mut alone, 400);

    let mut contested = build_engine(true, 11);
    for step in 1..=400u64 {
        contested.step().unwrap();
        if contested.vehicle_count() == 0 && contested.finished_count() == 2 {
            assert!(step >= alone_steps, "the south-north vehicle finished faster while contested ({}) than alone ({})", step, alone_steps);
            return;
        }
    }
    panic!("both vehicles never cleared the contested intersection within 400 steps");
}
