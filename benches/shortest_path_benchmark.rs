use kinetic_traffic_kernel::shortest_path::Router;
use kinetic_traffic_kernel::utils::generators::straight_corridor;

use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

pub fn benchmark_shortest_path(c: &mut Criterion) {
    let net = straight_corridor(5000, 1, 4.5, 13.9);
    let first_road = "r0".to_string();
    let last_road = format!("r{}", 4999);

    c.bench_function("router_plan_dijkstra", |b| {
        b.iter(|| {
            let mut router = Router::new(vec![black_box(first_road.clone()), black_box(last_road.clone())]);
            router.plan(black_box(&net)).expect("route should be planned across the full corridor");
        })
    });
}

criterion_group!(benches, benchmark_shortest_path);
criterion_main!(benches);
