//! # Property-Based Tests
//!
//! Invariants of the graph primitive and the planning pipeline, checked
//! with proptest over random edge sequences and random catalogs.

use bundlegraph_core::{
    AssetCatalog, AssetRecord, AssetSet, BuildConfig, BuildOutput, BundleAddress, BundleSet,
    DependencyGraph, GraphBuilder, MemoryCatalog, NodeStrategies,
};
use proptest::collection::vec;
use proptest::prelude::*;
use std::collections::BTreeSet;

const TYPES: &[(&str, &str, bool)] = &[
    ("Prefab", "prefab", true),
    ("Material", "mat", false),
    ("Texture", "png", false),
    ("AudioClip", "wav", true),
    ("Shader", "shader", false),
];

/// Random catalog of `types.len()` assets. Edges only go from lower to
/// higher index, so the asset graph is a DAG.
fn catalog_from(types: &[usize], edges: &[(usize, usize)]) -> MemoryCatalog {
    let count = types.len();
    let path = |index: usize| {
        let (_, extension, _) = TYPES[types[index] % TYPES.len()];
        format!("Assets/asset_{index}.{extension}")
    };

    let mut catalog = MemoryCatalog::new();
    for (index, &type_index) in types.iter().enumerate() {
        let (tag, _, loadable) = TYPES[type_index % TYPES.len()];
        let name = if loadable {
            format!("asset_{index}")
        } else {
            String::new()
        };
        catalog.add_asset(AssetRecord::new(name, path(index), tag));
    }
    for &(a, b) in edges {
        let (from, to) = (a % count, b % count);
        if from < to {
            catalog.add_dependency(path(from), path(to));
        }
    }
    catalog
}

fn plan(catalog: &MemoryCatalog) -> BuildOutput {
    GraphBuilder::new(catalog).build().expect("build")
}

/// Expanded assets with one bundle per asset and the bundle edges built.
fn one_bundle_per_asset(catalog: &MemoryCatalog) -> (AssetSet, BundleSet) {
    let config = BuildConfig::default();
    let strategies = NodeStrategies::from_config(&config);
    let mut assets = AssetSet::new();
    for record in catalog.list_assets() {
        let kind = strategies.kind_for(&record, catalog);
        assets.catalog(record, kind).expect("catalog");
    }
    assets.setup_all(catalog, &config, &strategies).expect("setup");

    let mut bundles = BundleSet::new(config.scene_type.clone());
    let members: Vec<_> = assets
        .iter()
        .filter(|(_, node)| node.cataloged())
        .map(|(key, node)| (key, node.path().to_string()))
        .collect();
    for (key, path) in members {
        let (bundle, _) = bundles
            .get_or_create(&BundleAddress::new(path, ""))
            .expect("bundle");
        bundles.include(bundle, key, &mut assets).expect("include");
    }
    bundles.setup_all(&assets).expect("bundle setup");
    (assets, bundles)
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Random depend/break sequences keep both adjacency sides in sync.
    #[test]
    fn graph_edges_stay_symmetric(
        ops in vec((0u32..12, 0u32..12, any::<bool>()), 1..200)
    ) {
        let mut graph = DependencyGraph::new();
        for key in 0..12u32 {
            graph.insert_node(key, format!("n{key:02}"));
        }

        let mut expected: BTreeSet<(u32, u32)> = BTreeSet::new();
        for (from, to, connect) in ops {
            if connect {
                graph.depend(from, to);
                if from != to {
                    expected.insert((from, to));
                }
            } else {
                graph.break_edge(from, to);
                expected.remove(&(from, to));
            }
        }

        prop_assert!(graph.verify().is_ok());
        prop_assert_eq!(graph.edge_count(), expected.len());
        for key in 0..12u32 {
            prop_assert!(!graph.contains_edge(key, key));
            for dependency in graph.depends(key) {
                prop_assert!(graph.refers(dependency).any(|r| r == key));
            }
        }
    }

    /// A memoized signature always equals a freshly computed one.
    #[test]
    fn memoized_signature_is_fresh(
        ops in vec((0u32..6, 0u32..6, any::<bool>()), 1..80)
    ) {
        let mut graph = DependencyGraph::new();
        for key in 0..6u32 {
            graph.insert_node(key, format!("n{key}"));
        }
        for (from, to, connect) in ops {
            let _ = graph.referrer_signature(to);
            if connect {
                graph.depend(from, to);
            } else {
                graph.break_edge(from, to);
            }
        }

        for key in 0..6u32 {
            let cached = graph.referrer_signature(key);
            let expected: Vec<String> = graph.refers(key).map(|r| format!("n{r}")).collect();
            prop_assert_eq!(cached.labels(), expected.as_slice());
        }
    }

    /// Expanding twice adds nothing.
    #[test]
    fn setup_is_idempotent(
        types in vec(0usize..5, 1..20),
        edges in vec((0usize..20, 0usize..20), 0..40)
    ) {
        let catalog = catalog_from(&types, &edges);
        let config = BuildConfig::default();
        let strategies = NodeStrategies::from_config(&config);
        let mut assets = AssetSet::new();
        for record in catalog.list_assets() {
            let kind = strategies.kind_for(&record, &catalog);
            assets.catalog(record, kind).expect("catalog");
        }

        assets.setup_all(&catalog, &config, &strategies).expect("first");
        let edges_once = assets.graph().edge_count();
        let nodes_once = assets.len();
        assets.setup_all(&catalog, &config, &strategies).expect("second");

        prop_assert_eq!(assets.graph().edge_count(), edges_once);
        prop_assert_eq!(assets.len(), nodes_once);
    }

    /// Reduction never grows the bundle count and never loses an asset.
    #[test]
    fn pipeline_partitions_assets(
        types in vec(0usize..5, 1..25),
        edges in vec((0usize..25, 0usize..25), 0..60)
    ) {
        let catalog = catalog_from(&types, &edges);
        let output = plan(&catalog);

        prop_assert!(output.requests.len() <= output.report.bundles_created);
        prop_assert_eq!(output.requests.len(), output.report.bundles_surviving);

        let mut seen = BTreeSet::new();
        for request in &output.requests {
            prop_assert!(!request.asset_paths.is_empty());
            for path in &request.asset_paths {
                prop_assert!(seen.insert(path.clone()), "{} in two bundles", path);
            }
        }
        prop_assert_eq!(seen.len(), catalog.len());
    }

    /// Each inline, combine and merge step shrinks the live table or
    /// leaves it unchanged.
    #[test]
    fn bundle_count_shrinks_step_by_step(
        types in vec(0usize..5, 2..20),
        edges in vec((0usize..20, 0usize..20), 0..40)
    ) {
        let catalog = catalog_from(&types, &edges);
        let (mut assets, mut bundles) = one_bundle_per_asset(&catalog);
        let created = bundles.len();

        for bundle in bundles.keys() {
            let before = bundles.len();
            let inlined = bundles.reduce(bundle, &mut assets).expect("reduce");
            let expected = if inlined { before - 1 } else { before };
            prop_assert_eq!(bundles.len(), expected);
        }

        let before = bundles.len();
        let merged = bundles.reduce_by_same_referrer_set(&mut assets).expect("merge");
        prop_assert_eq!(bundles.len(), before - merged);

        let keys = bundles.keys();
        if let [target, other, ..] = keys.as_slice() {
            let before = bundles.len();
            bundles.combine(*target, *other, &mut assets).expect("combine");
            prop_assert_eq!(bundles.len(), before);
            bundles.discard(*other).expect("discard");
            prop_assert_eq!(bundles.len(), before - 1);
        }

        prop_assert!(bundles.len() <= created);
        prop_assert!(bundles.graph().verify().is_ok());
    }

    /// Every loadable asset is in the manifest with the bundle holding it.
    #[test]
    fn manifest_matches_build_list(
        types in vec(0usize..5, 1..25),
        edges in vec((0usize..25, 0usize..25), 0..60)
    ) {
        let catalog = catalog_from(&types, &edges);
        let output = plan(&catalog);

        let loadable = catalog.list_assets().iter().filter(|r| r.loadable()).count();
        prop_assert_eq!(output.manifest.len(), loadable);

        for record in &output.manifest {
            let holder = output
                .requests
                .iter()
                .find(|r| r.asset_paths.contains(&record.path))
                .map(|r| r.bundle_id());
            prop_assert_eq!(record.package.clone(), holder);
        }
    }

    /// Same catalog, same plan.
    #[test]
    fn planning_is_deterministic(
        types in vec(0usize..5, 1..20),
        edges in vec((0usize..20, 0usize..20), 0..40)
    ) {
        let catalog = catalog_from(&types, &edges);

        prop_assert_eq!(plan(&catalog), plan(&catalog));
    }
}
