//! Criterion benchmarks for the conduit transport engine.
//!
//! Three benchmark groups:
//! - `loop_transit`: items circulating a closed loop, no drops
//! - `mesh_routing`: items crossing a mesh of cross junctions
//! - `placement`: building a mesh, measuring neighbor refresh

use conduit_core::engine::Engine;
use conduit_core::geometry::GridPosition;
use conduit_core::grid::GridTopology;
use conduit_core::side::Side;
use conduit_core::test_utils::*;
use criterion::{Criterion, criterion_group, criterion_main};

// ===========================================================================
// Network builders
// ===========================================================================

/// A 16-per-edge loop carrying `items` items, spread over its first edge.
fn build_loaded_loop(items: usize) -> Engine {
    let mut engine = engine(7);
    let nodes = build_loop(&mut engine, 16);
    for i in 0..items {
        let node = nodes[1 + i % 13];
        insert_new(&mut engine, node, Side::West, 2.0 + (i % 5) as f64);
    }
    engine
}

/// A 32x32 mesh with items inserted along its west edge.
fn build_loaded_mesh(items: usize) -> Engine {
    let mut engine = engine(11);
    build_mesh(&mut engine, 32);
    let mut inserted = 0;
    let mut z = 1;
    while inserted < items {
        let position = GridPosition::new(1, 0, z);
        if let Some(id) = engine.grid().node_at(position) {
            insert_new(&mut engine, id, Side::West, 3.0);
            inserted += 1;
        }
        z = if z >= 30 { 1 } else { z + 1 };
    }
    engine
}

// ===========================================================================
// Benchmarks
// ===========================================================================

fn bench_loop_transit(c: &mut Criterion) {
    let mut group = c.benchmark_group("loop_transit");
    group.sample_size(50);

    for &count in &[100usize, 1000] {
        let mut engine = build_loaded_loop(count);
        group.bench_function(format!("step_{count}_items"), |b| {
            b.iter(|| {
                engine.step();
            });
        });
    }

    group.finish();
}

fn bench_mesh_routing(c: &mut Criterion) {
    let mut group = c.benchmark_group("mesh_routing");
    group.sample_size(30);

    group.bench_function("run_60_ticks_500_items", |b| {
        b.iter_batched(
            || build_loaded_mesh(500),
            |mut e| {
                e.run(60);
            },
            criterion::BatchSize::LargeInput,
        );
    });

    group.finish();
}

fn bench_placement(c: &mut Criterion) {
    let mut group = c.benchmark_group("placement");
    group.sample_size(20);

    group.bench_function("mesh_32x32", |b| {
        b.iter(|| {
            let mut e = engine(0);
            build_mesh(&mut e, 32);
            e
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_loop_transit,
    bench_mesh_routing,
    bench_placement
);
criterion_main!(benches);
