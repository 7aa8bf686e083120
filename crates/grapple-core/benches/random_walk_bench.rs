use criterion::{black_box, criterion_group, criterion_main, Criterion};
use grapple_core::generators::{newman_watts_strogatz, ring_lattice};
use grapple_core::walk::{generate_walks, WalkConfig};

fn bench_random_walks(c: &mut Criterion) {
    let ring = ring_lattice(1000, 2).expect("valid lattice");
    let small_world = newman_watts_strogatz(1000, 10, 0.05, 42).expect("valid graph");

    let uniform = WalkConfig {
        walk_length: 10,
        walk_number: 5,
        ..Default::default()
    };
    let biased = WalkConfig {
        p: 0.5,
        q: 2.0,
        ..uniform
    };

    c.bench_function("uniform_walk_ring_1000", |b| {
        b.iter(|| generate_walks(black_box(&ring), black_box(uniform)))
    });
    c.bench_function("biased_walk_nws_1000", |b| {
        b.iter(|| generate_walks(black_box(&small_world), black_box(biased)))
    });
}

criterion_group!(benches, bench_random_walks);
criterion_main!(benches);
