use kinetic_traffic_kernel::config::SimulationConfig;
use kinetic_traffic_kernel::engine::Engine;
use kinetic_traffic_kernel::flow::{Flow, VehicleTemplate};
use kinetic_traffic_kernel::utils::generators::straight_corridor;

fn build_engine() -> Engine {
    let net = straight_corridor(1, 1, 500.0, 12.0);
    let config = SimulationConfig::new("sim", "roadnet.json", "flow.json").with_interval(0.5).with_seed(21).with_thread_num(1).with_lane_change(false).build();
    let template = VehicleTemplate { max_speed: 12.0, ..VehicleTemplate::default() };
    let flow = Flow::new("f", vec!["r0".to_string()], 1000.0).with_template(template).with_end_time(0.5).build().unwrap();
    Engine::new(config, net, vec![flow])
}

/// Archive round-trip law (spec §8): for any engine state, capturing an
/// archive then restoring it must reproduce the same sequence of per-step
/// outputs for any number of subsequent steps.
#[test]
fn test_archive_then_restore_replays_identically() {
    let mut engine = build_engine();
    for _ in 0..10 {
        engine.step().unwrap();
    }

    engine.checkpoint();

    let mut original_trace = Vec::new();
    for _ in 0..20 {
        engine.step().unwrap();
        original_trace.push(engine.vehicle_info("f_0").ok().map(|v| (v.distance, v.speed, v.drivable)));
    }

    engine.restore().unwrap();
    assert_eq!(engine.current_step(), 10);

    let mut replayed_trace = Vec::new();
    for _ in 0..20 {
        engine.step().unwrap();
        replayed_trace.push(engine.vehicle_info("f_0").ok().map(|v| (v.distance, v.speed, v.drivable)));
    }

    assert_eq!(original_trace, replayed_trace);
}
