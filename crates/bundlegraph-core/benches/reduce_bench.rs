//! # Planner Benchmarks
//!
//! Performance benchmarks for bundlegraph-core planning passes.
//!
//! Run with: `cargo bench -p bundlegraph-core`

use bundlegraph_core::{AssetRecord, DependencyGraph, GraphBuilder, MemoryCatalog};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

/// Prefabs each owning a private texture and sharing one material.
fn create_fanout_catalog(size: usize) -> MemoryCatalog {
    let mut catalog = MemoryCatalog::new();
    catalog.add_asset(AssetRecord::new("", "Assets/shared.mat", "Material"));

    for i in 0..size {
        let prefab = format!("Assets/Prefabs/p{i}.prefab");
        let texture = format!("Assets/Textures/t{i}.png");
        catalog.add_asset(AssetRecord::new(format!("p{i}"), prefab.clone(), "Prefab"));
        catalog.add_asset(AssetRecord::new("", texture.clone(), "Texture"));
        catalog.add_dependency(prefab.clone(), texture);
        catalog.add_dependency(prefab, "Assets/shared.mat");
    }
    catalog
}

/// A root prefab on top of a chain of unloadable materials.
fn create_chain_catalog(size: usize) -> MemoryCatalog {
    let mut catalog = MemoryCatalog::new();
    catalog.add_asset(AssetRecord::new("root", "Assets/root.prefab", "Prefab"));

    let mut previous = "Assets/root.prefab".to_string();
    for i in 0..size {
        let material = format!("Assets/Chain/m{i}.mat");
        catalog.add_asset(AssetRecord::new("", material.clone(), "Material"));
        catalog.add_dependency(previous, material.clone());
        previous = material;
    }
    catalog
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_edge_insertion(c: &mut Criterion) {
    let mut group = c.benchmark_group("edge_insertion");

    for size in [100u32, 1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let mut graph = DependencyGraph::new();
                for key in 0..size {
                    graph.insert_node(key, format!("n{key}"));
                }
                for key in 1..size {
                    graph.depend(key - 1, key);
                }
                black_box(graph)
            });
        });
    }

    group.finish();
}

fn bench_plan_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan_fanout");

    for size in [100, 500, 1000].iter() {
        let catalog = create_fanout_catalog(*size);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(GraphBuilder::new(&catalog).build().expect("build")));
        });
    }

    group.finish();
}

fn bench_plan_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan_chain");

    for size in [100, 500, 1000].iter() {
        let catalog = create_chain_catalog(*size);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(GraphBuilder::new(&catalog).build().expect("build")));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_edge_insertion,
    bench_plan_fanout,
    bench_plan_chain
);
criterion_main!(benches);
