use kinetic_traffic_kernel::config::SimulationConfig;
use kinetic_traffic_kernel::engine::Engine;
use kinetic_traffic_kernel::flow::Flow;
use kinetic_traffic_kernel::utils::generators::{four_way_intersection, straight_corridor};

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use std::hint::black_box;

fn corridor_engine() -> Engine {
    let net = straight_corridor(40, 3, 150.0, 13.9);
    let config = SimulationConfig::new("sim", "roadnet.json", "flow.json").with_interval(1.0).with_seed(7).build();
    let flows: Vec<Flow> = (0..3)
        .map(|i| Flow::new(format!("f{}", i), vec!["r0".to_string(), "r39".to_string()], 4.0).build().expect("valid flow"))
        .collect();
    Engine::new(config, net, flows)
}

fn intersection_engine() -> Engine {
    let net = four_way_intersection(120.0, 13.9);
    let config = SimulationConfig::new("sim", "roadnet.json", "flow.json").with_interval(1.0).with_seed(7).build();
    let flows = vec![
        Flow::new("sn", vec!["in_s".to_string(), "out_n".to_string()], 3.0).build().unwrap(),
        Flow::new("we", vec!["in_w".to_string(), "out_e".to_string()], 3.0).build().unwrap(),
    ];
    Engine::new(config, net, flows)
}

/// A full multi-worker `step()` over a long multi-lane corridor: exercises
/// route planning, car-following, and lane-changing across many vehicles
/// without any cross-intersection arbitration.
pub fn benchmark_corridor_step(c: &mut Criterion) {
    c.bench_function("engine_step_corridor", |b| {
        b.iter_batched_ref(
            || {
                let mut engine = corridor_engine();
                for _ in 0..20 {
                    engine.step().unwrap();
                }
                engine
            },
            |engine| engine.step().unwrap(),
            BatchSize::SmallInput,
        )
    });
}

/// A full `step()` at a four-way intersection once the cross conflict is
/// warmed up: exercises `roadnet::cross::can_pass` and traffic-light
/// gating on every call.
pub fn benchmark_intersection_step(c: &mut Criterion) {
    c.bench_function("engine_step_intersection", |b| {
        b.iter_batched_ref(
            || {
                let mut engine = intersection_engine();
                for _ in 0..10 {
                    engine.step().unwrap();
                }
                engine
            },
            |engine| black_box(engine.step().unwrap()),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, benchmark_corridor_step, benchmark_intersection_step);
criterion_main!(benches);
