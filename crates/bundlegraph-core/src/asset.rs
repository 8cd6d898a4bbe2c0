//! # Asset Nodes
//!
//! One node per asset path, plus the asset-level dependency graph.
//!
//! Nodes are created on first reference: eagerly while cataloging, or lazily
//! when a dependency path is met during expansion. A lazily created node for
//! a path the catalog does not list is a *placeholder*: it has an empty name,
//! is never loadable and never gets a bundle of its own.
//!
//! ## Node Strategies
//!
//! The type tag of a record picks the node kind through [`NodeStrategies`].
//! Sub-asset types (sprites) depend only on their container package; every
//! other type expands raw file dependencies.

use std::collections::BTreeMap;

use crate::catalog::AssetCatalog;
use crate::config::BuildConfig;
use crate::graph::DependencyGraph;
use crate::{AssetKey, AssetRecord, BundleGraphError, BundleKey};

// =============================================================================
// NODE KIND & STRATEGIES
// =============================================================================

/// How a node discovers its dependencies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetKind {
    /// Expands the catalog's direct file dependencies.
    Plain,
    /// Depends solely on the containing package.
    SubAsset {
        /// Path of the container.
        container: String,
    },
}

/// Constructor of a node kind for one record.
pub type NodeStrategy = fn(&AssetRecord, &dyn AssetCatalog) -> AssetKind;

/// Strategy for ordinary assets.
pub fn plain_strategy(_record: &AssetRecord, _catalog: &dyn AssetCatalog) -> AssetKind {
    AssetKind::Plain
}

/// Strategy for sub-assets. Falls back to `Plain` without a container.
pub fn sub_asset_strategy(record: &AssetRecord, catalog: &dyn AssetCatalog) -> AssetKind {
    catalog
        .container_of(&record.path)
        .filter(|container| *container != record.path)
        .map(|container| AssetKind::SubAsset { container })
        .unwrap_or(AssetKind::Plain)
}

/// Registered type tag → node kind constructors.
#[derive(Debug, Clone, Default)]
pub struct NodeStrategies {
    table: BTreeMap<String, NodeStrategy>,
}

impl NodeStrategies {
    /// A table with no registrations; every tag maps to `Plain`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The default table: configured sub-asset types use the sub-asset
    /// strategy.
    #[must_use]
    pub fn from_config(config: &BuildConfig) -> Self {
        let mut strategies = Self::new();
        for tag in &config.sub_asset_types {
            strategies.register(tag.clone(), sub_asset_strategy);
        }
        strategies
    }

    /// Register a strategy for a type tag, replacing any previous one.
    pub fn register(&mut self, tag: impl Into<String>, strategy: NodeStrategy) {
        self.table.insert(tag.into(), strategy);
    }

    /// Node kind for a record.
    #[must_use]
    pub fn kind_for(&self, record: &AssetRecord, catalog: &dyn AssetCatalog) -> AssetKind {
        let strategy = self
            .table
            .get(&record.asset_type)
            .copied()
            .unwrap_or(plain_strategy);
        strategy(record, catalog)
    }
}

// =============================================================================
// ASSET NODE
// =============================================================================

/// One asset of the build pass.
#[derive(Debug, Clone)]
pub struct AssetNode {
    record: AssetRecord,
    kind: AssetKind,
    cataloged: bool,
    bundle: Option<BundleKey>,
    done: bool,
}

impl AssetNode {
    fn new(record: AssetRecord, kind: AssetKind, cataloged: bool) -> Self {
        Self {
            record,
            kind,
            cataloged,
            bundle: None,
            done: false,
        }
    }

    /// The catalog record (or the synthesized placeholder record).
    #[must_use]
    pub fn record(&self) -> &AssetRecord {
        &self.record
    }

    /// Asset path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.record.path
    }

    /// Type tag.
    #[must_use]
    pub fn asset_type(&self) -> &str {
        &self.record.asset_type
    }

    /// How dependencies are discovered.
    #[must_use]
    pub fn kind(&self) -> &AssetKind {
        &self.kind
    }

    /// True when loadable by name.
    #[must_use]
    pub fn loadable(&self) -> bool {
        self.record.loadable()
    }

    /// False for placeholders of unresolved references.
    #[must_use]
    pub fn cataloged(&self) -> bool {
        self.cataloged
    }

    /// Owning bundle, once assignment ran.
    #[must_use]
    pub fn bundle(&self) -> Option<BundleKey> {
        self.bundle
    }

    /// True once dependencies were expanded.
    #[must_use]
    pub fn is_setup(&self) -> bool {
        self.done
    }
}

// =============================================================================
// ASSET SET
// =============================================================================

/// Arena of asset nodes and their dependency graph.
#[derive(Debug, Clone, Default)]
pub struct AssetSet {
    nodes: BTreeMap<AssetKey, AssetNode>,
    by_path: BTreeMap<String, AssetKey>,
    graph: DependencyGraph<AssetKey>,
    next_key: u32,
}

impl AssetSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self, node: AssetNode) -> AssetKey {
        let key = AssetKey(self.next_key);
        self.next_key = self.next_key.saturating_add(1);
        self.by_path.insert(node.record.path.clone(), key);
        self.graph.insert_node(key, node.record.path.clone());
        self.nodes.insert(key, node);
        key
    }

    /// Add a catalog record.
    ///
    /// A placeholder already holding the path is promoted in place. A second
    /// cataloged record for the same path is rejected with `DuplicateAsset`.
    pub fn catalog(
        &mut self,
        record: AssetRecord,
        kind: AssetKind,
    ) -> Result<AssetKey, BundleGraphError> {
        if let Some(&key) = self.by_path.get(&record.path) {
            let Some(node) = self.nodes.get_mut(&key) else {
                return Err(BundleGraphError::Corrupted(format!(
                    "path index points at missing node {:?}",
                    key
                )));
            };
            if node.cataloged {
                return Err(BundleGraphError::DuplicateAsset(record.path));
            }
            node.record = record;
            node.kind = kind;
            node.cataloged = true;
            return Ok(key);
        }
        Ok(self.allocate(AssetNode::new(record, kind, true)))
    }

    /// Key of the node for a path, creating a placeholder if needed.
    pub fn resolve_or_create(
        &mut self,
        path: &str,
        catalog: &dyn AssetCatalog,
        strategies: &NodeStrategies,
    ) -> AssetKey {
        if let Some(&key) = self.by_path.get(path) {
            return key;
        }
        let record = AssetRecord::new("", path, catalog.classify_type(path));
        let kind = strategies.kind_for(&record, catalog);
        tracing::debug!(path, "unresolved reference, creating placeholder");
        self.allocate(AssetNode::new(record, kind, false))
    }

    /// Expand the dependencies of a node and, transitively, of every node it
    /// reaches.
    ///
    /// Idempotent: nodes already expanded are skipped, so diamonds and cycles
    /// converge. A worklist stands in for recursion.
    pub fn setup(
        &mut self,
        key: AssetKey,
        catalog: &dyn AssetCatalog,
        config: &BuildConfig,
        strategies: &NodeStrategies,
    ) -> Result<(), BundleGraphError> {
        if !self.nodes.contains_key(&key) {
            return Err(BundleGraphError::UnknownAsset(format!("{:?}", key)));
        }

        let mut pending = vec![key];
        while let Some(current) = pending.pop() {
            let Some(node) = self.nodes.get_mut(&current) else {
                continue;
            };
            if node.done {
                continue;
            }
            node.done = true;

            let path = node.record.path.clone();
            let targets = match &node.kind {
                AssetKind::SubAsset { container } => vec![container.clone()],
                AssetKind::Plain => catalog.direct_dependencies(&path),
            };

            for target in targets {
                if target == path || self.is_filtered(&target, catalog, config) {
                    continue;
                }
                let dependency = self.resolve_or_create(&target, catalog, strategies);
                self.graph.depend(current, dependency);
                pending.push(dependency);
            }
        }
        Ok(())
    }

    /// Expand every node currently in the set.
    pub fn setup_all(
        &mut self,
        catalog: &dyn AssetCatalog,
        config: &BuildConfig,
        strategies: &NodeStrategies,
    ) -> Result<(), BundleGraphError> {
        let keys: Vec<AssetKey> = self.nodes.keys().copied().collect();
        for key in keys {
            self.setup(key, catalog, config, strategies)?;
        }
        Ok(())
    }

    fn is_filtered(&self, path: &str, catalog: &dyn AssetCatalog, config: &BuildConfig) -> bool {
        let asset_type = match self.key_of(path).and_then(|key| self.nodes.get(&key)) {
            Some(node) => node.record.asset_type.clone(),
            None => catalog.classify_type(path),
        };
        config.is_ignored(path, &asset_type)
    }

    /// Set or clear the owning bundle of a node.
    pub fn set_bundle(&mut self, key: AssetKey, bundle: Option<BundleKey>) {
        if let Some(node) = self.nodes.get_mut(&key) {
            node.bundle = bundle;
        }
    }

    /// Key of a path, if a node exists.
    #[must_use]
    pub fn key_of(&self, path: &str) -> Option<AssetKey> {
        self.by_path.get(path).copied()
    }

    /// Node by key.
    #[must_use]
    pub fn get(&self, key: AssetKey) -> Option<&AssetNode> {
        self.nodes.get(&key)
    }

    /// Node by path.
    #[must_use]
    pub fn by_path(&self, path: &str) -> Option<&AssetNode> {
        self.key_of(path).and_then(|key| self.nodes.get(&key))
    }

    /// All nodes in key order.
    pub fn iter(&self) -> impl Iterator<Item = (AssetKey, &AssetNode)> {
        self.nodes.iter().map(|(key, node)| (*key, node))
    }

    /// Direct asset-level dependencies of a node.
    pub fn dependencies(&self, key: AssetKey) -> impl Iterator<Item = AssetKey> + '_ {
        self.graph.depends(key)
    }

    /// Direct asset-level referrers of a node.
    pub fn referrers(&self, key: AssetKey) -> impl Iterator<Item = AssetKey> + '_ {
        self.graph.refers(key)
    }

    /// The asset-level dependency graph.
    #[must_use]
    pub fn graph(&self) -> &DependencyGraph<AssetKey> {
        &self.graph
    }

    /// Number of nodes, placeholders included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the set holds no node.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of placeholder nodes.
    #[must_use]
    pub fn placeholder_count(&self) -> usize {
        self.nodes.values().filter(|node| !node.cataloged).count()
    }
}

// =============================================================================
// TESTS
// =============================================================================
