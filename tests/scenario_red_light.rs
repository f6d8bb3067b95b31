use kinetic_traffic_kernel::config::SimulationConfig;
use kinetic_traffic_kernel::engine::Engine;
use kinetic_traffic_kernel::flow::{Flow, VehicleTemplate};
use kinetic_traffic_kernel::roadnet::{LightPhase, TrafficLight};
use kinetic_traffic_kernel::utils::generators::straight_corridor;

/// A single intersection with a permanently red phase for the approach
/// road's only road-link. A vehicle approaching from 200m at vmax must
/// come to rest before the lane end instead of spilling onto the
/// lane-link.
#[test]
fn test_vehicle_stops_at_red_light() {
    let mut net = straight_corridor(2, 1, 100.0, 10.0);
    {
        let intersection = net.get_intersection_mut("i1").expect("middle intersection exists");
        let light = TrafficLight::new("i1").with_phases(vec![LightPhase::new(1.0e9, vec![false])]).build();
        intersection.traffic_light = Some(light);
    }

    let config = SimulationConfig::new("sim", "roadnet.json", "flow.json").with_interval(1.0).with_seed(5).with_thread_num(1).with_lane_change(false).build();
    let template = VehicleTemplate { max_speed: 10.0, max_pos_acc: 2.0, usual_neg_acc: 4.5, ..VehicleTemplate::default() };
    let flow = Flow::new("f", vec!["r0".to_string(), "r1".to_string()], 1000.0).with_template(template).with_end_time(0.5).build().unwrap();

    let mut engine = Engine::new(config, net, vec![flow]);

    for _ in 0..60 {
        engine.step().unwrap();
    }

    let info = engine.vehicle_info("f_0").expect("vehicle is still waiting at the red light");
    assert_eq!(info.drivable, "r0_0", "vehicle must not have crossed onto the lane-link while the light is red");
    assert!(info.distance < 100.0, "vehicle overshot the lane end: distance={}", info.distance);
    assert!(info.speed < 1.0, "vehicle should have come to rest near the light: speed={}", info.speed);
}
