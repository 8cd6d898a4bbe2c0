//! # bundlegraph-core
//!
//! The deterministic bundle planner for bundlegraph - THE LOGIC.
//!
//! Given an asset catalog, this crate decides which assets ship together in
//! which bundle. It builds a file-level dependency graph, assigns every asset
//! to a target bundle, lifts the edges to bundle level and then shrinks the
//! bundle graph until nothing more can be inlined or merged.
//!
//! ## Architectural Constraints
//!
//! - Never touches the filesystem; the host feeds it through `AssetCatalog`
//! - Deterministic: same catalog and configuration, same plan
//! - Single-threaded and synchronous
//! - `BTreeMap`/`BTreeSet` only, so iteration order is stable

// =============================================================================
// MODULES
// =============================================================================

pub mod asset;
pub mod builder;
pub mod bundle;
pub mod catalog;
pub mod config;
pub mod graph;
pub mod naming;
pub mod primitives;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    AssetKey, AssetRecord, BuildOutput, BuildReport, BuildRequest, BundleAddress,
    BundleGraphError, BundleKey,
};

// =============================================================================
// RE-EXPORTS: Planner
// =============================================================================

pub use asset::{AssetKind, AssetNode, AssetSet, NodeStrategies, NodeStrategy};
pub use builder::{BuildContext, GraphBuilder};
pub use bundle::{BundleNode, BundleSet};
pub use catalog::{AssetCatalog, Blake3ContentId, CatalogSnapshot, ContentId, MemoryCatalog};
pub use config::{BuildConfig, BundleOverrides, OverrideRule};
pub use graph::{DependencyGraph, ReferrerSignature};
pub use naming::AssignmentSource;
