//! # Bundle Nodes
//!
//! Bundles group asset nodes under one package identity and form the
//! bundle-level dependency graph that the reducer shrinks.
//!
//! ## Reduction Operations
//!
//! - **Inline** ([`BundleSet::reduce`]): a bundle with a single consumer and
//!   no loadable member is folded into that consumer.
//! - **Merge** ([`BundleSet::combine`]): two bundles with the same consumers
//!   become one.
//!
//! Both strictly decrease the number of live bundles.
//!
//! ## Scene Exclusivity
//!
//! A bundle whose main asset is a scene holds that scene only. It never
//! absorbs other assets, is never inlined and never merged.

use std::collections::{BTreeMap, BTreeSet};

use crate::asset::AssetSet;
use crate::graph::{DependencyGraph, ReferrerSignature};
use crate::{AssetKey, BuildRequest, BundleAddress, BundleGraphError, BundleKey};

// =============================================================================
// BUNDLE NODE
// =============================================================================

/// One bundle of the build pass.
#[derive(Debug, Clone)]
pub struct BundleNode {
    address: BundleAddress,
    id: String,
    members: Vec<AssetKey>,
    scene: bool,
    pinned: bool,
}

impl BundleNode {
    fn new(address: BundleAddress) -> Self {
        let id = address.id();
        Self {
            address,
            id,
            members: Vec::new(),
            scene: false,
            pinned: false,
        }
    }

    /// Bundle id (`name` or `name.variant`).
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Name and variant.
    #[must_use]
    pub fn address(&self) -> &BundleAddress {
        &self.address
    }

    /// Variant flavor.
    #[must_use]
    pub fn variant(&self) -> &str {
        &self.address.variant
    }

    /// Members in inclusion order.
    #[must_use]
    pub fn members(&self) -> &[AssetKey] {
        &self.members
    }

    /// The first member.
    #[must_use]
    pub fn main_asset(&self) -> Option<AssetKey> {
        self.members.first().copied()
    }

    /// True when the main asset is a scene.
    #[must_use]
    pub fn is_scene(&self) -> bool {
        self.scene
    }

    /// Scene bundles never take part in a merge.
    #[must_use]
    pub fn combinable(&self) -> bool {
        !self.scene
    }

    /// True when a member carried a pre-assigned package.
    #[must_use]
    pub fn pinned(&self) -> bool {
        self.pinned
    }

    /// True when no member is left.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

// =============================================================================
// BUNDLE SET
// =============================================================================

/// Live bundle table and the bundle-level dependency graph.
#[derive(Debug, Clone)]
pub struct BundleSet {
    bundles: BTreeMap<BundleKey, BundleNode>,
    by_id: BTreeMap<String, BundleKey>,
    graph: DependencyGraph<BundleKey>,
    scene_type: String,
    next_key: u32,
}

impl BundleSet {
    /// Create an empty table. `scene_type` marks exclusive assets.
    #[must_use]
    pub fn new(scene_type: impl Into<String>) -> Self {
        Self {
            bundles: BTreeMap::new(),
            by_id: BTreeMap::new(),
            graph: DependencyGraph::new(),
            scene_type: scene_type.into(),
            next_key: 0,
        }
    }

    /// Key of the bundle with this address, created empty on first use.
    ///
    /// Returns the key and whether the bundle is new. Fails with
    /// `InvalidConfig` when the id already belongs to a different address.
    pub fn get_or_create(
        &mut self,
        address: &BundleAddress,
    ) -> Result<(BundleKey, bool), BundleGraphError> {
        let id = address.id();
        if let Some(&key) = self.by_id.get(&id) {
            if let Some(existing) = self.bundles.get(&key)
                && existing.address != *address
            {
                return Err(BundleGraphError::InvalidConfig(format!(
                    "bundle id '{}' requested as '{}' (variant '{}') but exists as '{}' (variant '{}')",
                    id,
                    address.name,
                    address.variant,
                    existing.address.name,
                    existing.address.variant
                )));
            }
            return Ok((key, false));
        }
        let key = BundleKey(self.next_key);
        self.next_key = self.next_key.saturating_add(1);
        self.graph.insert_node(key, id.clone());
        self.by_id.insert(id, key);
        self.bundles.insert(key, BundleNode::new(address.clone()));
        Ok((key, true))
    }

    /// Mark a bundle as pinned: it keeps its identity through reduction.
    pub fn pin(&mut self, bundle: BundleKey) {
        if let Some(node) = self.bundles.get_mut(&bundle) {
            node.pinned = true;
        }
    }

    /// Add an asset to a bundle and point the asset back at it.
    ///
    /// The asset leaves its previous bundle, if any. Fails with
    /// `StructuralViolation` when the bundle is a scene bundle that already
    /// has a member, or when a scene would join a non-empty bundle; the
    /// membership is unchanged in that case.
    pub fn include(
        &mut self,
        bundle: BundleKey,
        asset: AssetKey,
        assets: &mut AssetSet,
    ) -> Result<(), BundleGraphError> {
        let asset_node = assets
            .get(asset)
            .ok_or_else(|| BundleGraphError::UnknownAsset(format!("{:?}", asset)))?;
        let asset_is_scene = asset_node.asset_type() == self.scene_type;
        let asset_path = asset_node.path().to_string();
        let previous = asset_node.bundle();

        let node = self
            .bundles
            .get_mut(&bundle)
            .ok_or_else(|| BundleGraphError::UnknownBundle(format!("{:?}", bundle)))?;
        if node.members.contains(&asset) {
            return Ok(());
        }
        if !node.members.is_empty() && (node.scene || asset_is_scene) {
            return Err(BundleGraphError::StructuralViolation {
                bundle: node.id.clone(),
                asset: asset_path,
            });
        }

        if node.members.is_empty() {
            node.scene = asset_is_scene;
        }
        node.members.push(asset);

        if let Some(previous) = previous.filter(|p| *p != bundle)
            && let Some(old) = self.bundles.get_mut(&previous)
        {
            old.members.retain(|member| *member != asset);
        }
        assets.set_bundle(asset, Some(bundle));
        Ok(())
    }

    /// Derive bundle-level edges from the member assets' edges.
    ///
    /// Dependencies without an owning bundle (placeholders) are walked
    /// through: the edge lands on the nearest owned assets below them.
    pub fn setup(&mut self, bundle: BundleKey, assets: &AssetSet) -> Result<(), BundleGraphError> {
        let node = self
            .bundles
            .get(&bundle)
            .ok_or_else(|| BundleGraphError::UnknownBundle(format!("{:?}", bundle)))?;

        let targets: BTreeSet<BundleKey> = node
            .members
            .iter()
            .flat_map(|&member| assets.dependencies(member))
            .flat_map(|dependency| owning_bundles(dependency, assets))
            .collect();

        for target in targets {
            self.graph.depend(bundle, target);
        }
        Ok(())
    }

    /// Build the edges of every live bundle.
    pub fn setup_all(&mut self, assets: &AssetSet) -> Result<(), BundleGraphError> {
        let keys: Vec<BundleKey> = self.bundles.keys().copied().collect();
        for key in keys {
            self.setup(key, assets)?;
        }
        Ok(())
    }

    /// True when the bundle can be folded into its sole consumer.
    ///
    /// Requires exactly one referrer that is not a scene bundle, no loadable
    /// member, the referrer's variant, and an unpinned non-scene bundle.
    #[must_use]
    pub fn is_reducible(&self, bundle: BundleKey, assets: &AssetSet) -> bool {
        let Some(node) = self.bundles.get(&bundle) else {
            return false;
        };
        if node.pinned || !node.combinable() {
            return false;
        }
        if self.graph.referrer_count(bundle) != 1 {
            return false;
        }
        let Some(referrer) = self
            .graph
            .refers(bundle)
            .next()
            .and_then(|key| self.bundles.get(&key))
        else {
            return false;
        };
        if referrer.scene {
            return false;
        }
        if node
            .members
            .iter()
            .any(|&member| assets.get(member).is_some_and(|asset| asset.loadable()))
        {
            return false;
        }
        node.address.variant == referrer.address.variant
    }

    /// Fold a reducible bundle into its sole referrer.
    ///
    /// The referrer inherits every member and every dependency; the bundle
    /// leaves the live table. Returns `Ok(false)` if the bundle is not
    /// reducible.
    pub fn reduce(
        &mut self,
        bundle: BundleKey,
        assets: &mut AssetSet,
    ) -> Result<bool, BundleGraphError> {
        if !self.is_reducible(bundle, assets) {
            return Ok(false);
        }
        let Some(referrer) = self.graph.refers(bundle).next() else {
            return Ok(false);
        };

        self.graph.break_edge(referrer, bundle);
        let dependencies: Vec<BundleKey> = self.graph.depends(bundle).collect();
        for &dependency in &dependencies {
            self.graph.break_edge(bundle, dependency);
        }

        let members = self.members_of(bundle);
        for member in members {
            self.include(referrer, member, assets)?;
        }

        for dependency in dependencies {
            self.graph.depend(referrer, dependency);
        }

        tracing::debug!(
            bundle = self.id_of(bundle),
            into = self.id_of(referrer),
            "inlined single-consumer bundle"
        );
        self.discard(bundle)?;
        Ok(true)
    }

    /// Merge `other` into `target`.
    ///
    /// Every referrer of `other` now refers to `target`, `target` depends on
    /// everything `other` depended on, and every member moves over. `other`
    /// is left empty for the caller to [`discard`](Self::discard).
    pub fn combine(
        &mut self,
        target: BundleKey,
        other: BundleKey,
        assets: &mut AssetSet,
    ) -> Result<(), BundleGraphError> {
        if target == other {
            return Ok(());
        }
        for key in [target, other] {
            if !self.bundles.contains_key(&key) {
                return Err(BundleGraphError::UnknownBundle(format!("{:?}", key)));
            }
        }

        let referrers: Vec<BundleKey> = self.graph.refers(other).collect();
        for referrer in referrers {
            self.graph.break_edge(referrer, other);
            self.graph.depend(referrer, target);
        }

        let dependencies: Vec<BundleKey> = self.graph.depends(other).collect();
        for dependency in dependencies {
            self.graph.break_edge(other, dependency);
            self.graph.depend(target, dependency);
        }

        for member in self.members_of(other) {
            self.include(target, member, assets)?;
        }
        Ok(())
    }

    /// Repeatedly merge combinable bundles that share variant and a
    /// non-empty referrer set. Returns the number of merges.
    pub fn reduce_by_same_referrer_set(
        &mut self,
        assets: &mut AssetSet,
    ) -> Result<usize, BundleGraphError> {
        let mut merges = 0usize;

        loop {
            let mut partitions: BTreeMap<(String, ReferrerSignature), Vec<BundleKey>> =
                BTreeMap::new();
            let keys: Vec<BundleKey> = self.bundles.keys().copied().collect();

            for key in keys {
                let Some(node) = self.bundles.get(&key) else {
                    continue;
                };
                if !node.combinable() || node.pinned {
                    continue;
                }
                let variant = node.address.variant.clone();
                let signature = self.graph.referrer_signature(key);
                if signature.is_empty() {
                    continue;
                }
                partitions.entry((variant, signature)).or_default().push(key);
            }

            let Some(group) = partitions.into_values().find(|group| group.len() >= 2) else {
                break;
            };
            let Some((&first, rest)) = group.split_first() else {
                break;
            };

            for &other in rest {
                self.combine(first, other, assets)?;
                tracing::debug!(
                    bundle = self.id_of(other),
                    into = self.id_of(first),
                    "merged bundle with identical referrers"
                );
                self.discard(other)?;
                merges = merges.saturating_add(1);
            }
        }

        Ok(merges)
    }

    /// Drop an emptied bundle from the live table.
    pub fn discard(&mut self, bundle: BundleKey) -> Result<(), BundleGraphError> {
        let node = self
            .bundles
            .get(&bundle)
            .ok_or_else(|| BundleGraphError::UnknownBundle(format!("{:?}", bundle)))?;
        if !node.members.is_empty() {
            return Err(BundleGraphError::Corrupted(format!(
                "bundle '{}' discarded with {} members",
                node.id,
                node.members.len()
            )));
        }
        self.by_id.remove(&node.id);
        self.bundles.remove(&bundle);
        self.graph.remove_node(bundle);
        Ok(())
    }

    fn members_of(&self, bundle: BundleKey) -> Vec<AssetKey> {
        self.bundles
            .get(&bundle)
            .map(|node| node.members.clone())
            .unwrap_or_default()
    }

    fn id_of(&self, bundle: BundleKey) -> &str {
        self.bundles.get(&bundle).map_or("", |node| node.id.as_str())
    }

    /// Build requests for every live bundle, sorted by bundle id.
    #[must_use]
    pub fn build_requests(&self, assets: &AssetSet) -> Vec<BuildRequest> {
        self.by_id
            .values()
            .filter_map(|key| self.bundles.get(key))
            .map(|node| BuildRequest {
                name: node.address.name.clone(),
                variant: node.address.variant.clone(),
                asset_paths: node
                    .members
                    .iter()
                    .filter_map(|&member| assets.get(member).map(|a| a.path().to_string()))
                    .collect(),
            })
            .collect()
    }

    /// Bundle by key.
    #[must_use]
    pub fn get(&self, bundle: BundleKey) -> Option<&BundleNode> {
        self.bundles.get(&bundle)
    }

    /// Key of a live bundle id.
    #[must_use]
    pub fn key_of(&self, id: &str) -> Option<BundleKey> {
        self.by_id.get(id).copied()
    }

    /// Live bundles in key order.
    pub fn iter(&self) -> impl Iterator<Item = (BundleKey, &BundleNode)> {
        self.bundles.iter().map(|(key, node)| (*key, node))
    }

    /// Live bundle keys in key order.
    #[must_use]
    pub fn keys(&self) -> Vec<BundleKey> {
        self.bundles.keys().copied().collect()
    }

    /// Bundles this bundle depends on.
    pub fn dependencies(&self, bundle: BundleKey) -> impl Iterator<Item = BundleKey> + '_ {
        self.graph.depends(bundle)
    }

    /// Bundles that depend on this bundle.
    pub fn referrers(&self, bundle: BundleKey) -> impl Iterator<Item = BundleKey> + '_ {
        self.graph.refers(bundle)
    }

    /// The bundle-level dependency graph.
    #[must_use]
    pub fn graph(&self) -> &DependencyGraph<BundleKey> {
        &self.graph
    }

    /// Number of live bundles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    /// True when no bundle is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================

// =============================================================================
// HELPERS
// =============================================================================

/// Bundles owning `start`, or reached from it through unowned nodes only.
fn owning_bundles(start: AssetKey, assets: &AssetSet) -> BTreeSet<BundleKey> {
    let mut owners = BTreeSet::new();
    let mut visited = BTreeSet::new();
    let mut pending = vec![start];

    while let Some(current) = pending.pop() {
        if !visited.insert(current) {
            continue;
        }
        let Some(node) = assets.get(current) else {
            continue;
        };
        match node.bundle() {
            Some(owner) => {
                owners.insert(owner);
            }
            None => pending.extend(assets.dependencies(current)),
        }
    }

    if owners.is_empty()
        && let Some(node) = assets.get(start)
    {
        tracing::debug!(path = node.path(), "dependency reaches no bundle, edge dropped");
    }
    owners
}
