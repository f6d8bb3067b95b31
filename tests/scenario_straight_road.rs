use kinetic_traffic_kernel::config::SimulationConfig;
use kinetic_traffic_kernel::engine::Engine;
use kinetic_traffic_kernel::flow::{Flow, VehicleTemplate};
use kinetic_traffic_kernel::utils::generators::straight_corridor;

fn single_vehicle_engine(lane_length: f64) -> Engine {
    let net = straight_corridor(1, 1, lane_length, 10.0);
    let config = SimulationConfig::new("sim", "roadnet.json", "flow.json").with_interval(1.0).with_seed(1).with_thread_num(1).with_lane_change(false).build();
    let template = VehicleTemplate { max_speed: 10.0, max_pos_acc: 2.0, ..VehicleTemplate::default() };
    let flow = Flow::new("f", vec!["r0".to_string()], 1000.0).with_template(template).with_end_time(0.5).build().unwrap();
    Engine::new(config, net, vec![flow])
}

/// One lane, 200m, vmax=10, maxPosAcc=2, dt=1: a vehicle ramps up to vmax in
/// exactly 5 steps and covers 25m doing so (trapezoidal integration of the
/// speed ramp 0,2,4,6,8,10).
#[test]
fn test_straight_road_ramp_matches_trapezoidal_integration() {
    let mut engine = single_vehicle_engine(200.0);
    for _ in 0..5 {
        engine.step().unwrap();
    }
    let info = engine.vehicle_info("f_0").unwrap();
    assert!((info.speed - 10.0).abs() < 1e-9, "expected speed 10.0 after ramp, got {}", info.speed);
    assert!((info.distance - 25.0).abs() < 1e-9, "expected distance 25.0 after ramp, got {}", info.distance);
}

/// With nothing else on the road the vehicle should cruise at vmax and
/// eventually exhaust the lane, finishing its route and leaving the pool.
#[test]
fn test_straight_road_vehicle_finishes_and_is_removed() {
    let mut engine = single_vehicle_engine(200.0);
    for _ in 0..30 {
        engine.step().unwrap();
    }
    assert_eq!(engine.vehicle_count(), 0);
    assert_eq!(engine.finished_count(), 1);
    assert!(engine.average_travel_time() > 0.0);
}
