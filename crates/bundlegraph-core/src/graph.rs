//! # Dependency Graph
//!
//! The edge-symmetric graph primitive shared by the asset and bundle layers.
//!
//! Nodes live in an arena addressed by stable keys. Each node keeps two key
//! sets: `depends` (outgoing) and `refers` (incoming). Both sets are only
//! touched by [`DependencyGraph::depend`] and [`DependencyGraph::break_edge`],
//! so `a.depends ∋ b ⇔ b.refers ∋ a` holds at all times and self-loops never
//! exist.
//!
//! All data structures use `BTreeMap`/`BTreeSet` for deterministic ordering.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;

use crate::BundleGraphError;

// =============================================================================
// REFERRER SIGNATURE
// =============================================================================

/// Canonical key of a node's referrer set: the sorted referrer labels.
///
/// Two nodes have equal signatures iff their referrers carry the same labels,
/// whatever order the edges were added in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ReferrerSignature(Vec<String>);

impl ReferrerSignature {
    /// True when the node has no referrers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The sorted referrer labels.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.0
    }
}

// =============================================================================
// NODE LINKS
// =============================================================================

#[derive(Debug, Clone)]
struct Links<K> {
    label: String,
    depends: BTreeSet<K>,
    refers: BTreeSet<K>,
    /// Memoized referrer signature. `None` after any change to `refers`.
    signature: Option<ReferrerSignature>,
}

impl<K> Links<K> {
    fn new(label: String) -> Self {
        Self {
            label,
            depends: BTreeSet::new(),
            refers: BTreeSet::new(),
            signature: None,
        }
    }
}

// =============================================================================
// GRAPH
// =============================================================================

/// A directed graph with mirrored back-references.
#[derive(Debug, Clone)]
pub struct DependencyGraph<K> {
    nodes: BTreeMap<K, Links<K>>,
}

impl<K> Default for DependencyGraph<K> {
    fn default() -> Self {
        Self {
            nodes: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Copy + Debug> DependencyGraph<K> {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node under a stable label.
    ///
    /// Returns `false` if the key is already present (the label is kept).
    pub fn insert_node(&mut self, key: K, label: impl Into<String>) -> bool {
        if self.nodes.contains_key(&key) {
            return false;
        }
        self.nodes.insert(key, Links::new(label.into()));
        true
    }

    /// Detach every edge of a node, then drop it.
    pub fn remove_node(&mut self, key: K) -> bool {
        let Some(links) = self.nodes.get(&key) else {
            return false;
        };
        let depends: Vec<K> = links.depends.iter().copied().collect();
        let refers: Vec<K> = links.refers.iter().copied().collect();

        for dependency in depends {
            self.break_edge(key, dependency);
        }
        for referrer in refers {
            self.break_edge(referrer, key);
        }
        self.nodes.remove(&key);
        true
    }

    /// Check if a node exists.
    #[must_use]
    pub fn contains_node(&self, key: K) -> bool {
        self.nodes.contains_key(&key)
    }

    /// The label a node was registered with.
    #[must_use]
    pub fn label(&self, key: K) -> Option<&str> {
        self.nodes.get(&key).map(|links| links.label.as_str())
    }

    /// Add the edge `from → to`.
    ///
    /// Self-loops and edges touching unknown nodes are ignored. Returns `true`
    /// only if the edge is new.
    pub fn depend(&mut self, from: K, to: K) -> bool {
        if from == to || !self.nodes.contains_key(&from) || !self.nodes.contains_key(&to) {
            return false;
        }

        let added = self
            .nodes
            .get_mut(&from)
            .is_some_and(|links| links.depends.insert(to));
        if !added {
            return false;
        }

        if let Some(target) = self.nodes.get_mut(&to)
            && target.refers.insert(from)
        {
            target.signature = None;
        }
        true
    }

    /// Remove the edge `from → to`. Returns `true` only if it existed.
    pub fn break_edge(&mut self, from: K, to: K) -> bool {
        let removed = self
            .nodes
            .get_mut(&from)
            .is_some_and(|links| links.depends.remove(&to));
        if !removed {
            return false;
        }

        if let Some(target) = self.nodes.get_mut(&to)
            && target.refers.remove(&from)
        {
            target.signature = None;
        }
        true
    }

    /// Check if the edge `from → to` exists.
    #[must_use]
    pub fn contains_edge(&self, from: K, to: K) -> bool {
        self.nodes
            .get(&from)
            .is_some_and(|links| links.depends.contains(&to))
    }

    /// Nodes this node depends on, in key order.
    pub fn depends(&self, key: K) -> impl Iterator<Item = K> + '_ {
        self.nodes
            .get(&key)
            .into_iter()
            .flat_map(|links| links.depends.iter().copied())
    }

    /// Nodes that depend on this node, in key order.
    pub fn refers(&self, key: K) -> impl Iterator<Item = K> + '_ {
        self.nodes
            .get(&key)
            .into_iter()
            .flat_map(|links| links.refers.iter().copied())
    }

    /// Number of nodes that depend on this node.
    #[must_use]
    pub fn referrer_count(&self, key: K) -> usize {
        self.nodes.get(&key).map_or(0, |links| links.refers.len())
    }

    /// Number of nodes this node depends on.
    #[must_use]
    pub fn dependency_count(&self, key: K) -> usize {
        self.nodes.get(&key).map_or(0, |links| links.depends.len())
    }

    /// Canonical signature of the node's referrer set.
    ///
    /// Computed on first use and memoized until `refers` changes. Unknown
    /// nodes have the empty signature.
    pub fn referrer_signature(&mut self, key: K) -> ReferrerSignature {
        let Some(links) = self.nodes.get(&key) else {
            return ReferrerSignature::default();
        };
        if let Some(signature) = &links.signature {
            return signature.clone();
        }

        let mut labels: Vec<String> = links
            .refers
            .iter()
            .filter_map(|referrer| self.nodes.get(referrer).map(|r| r.label.clone()))
            .collect();
        labels.sort();
        let signature = ReferrerSignature(labels);

        if let Some(links) = self.nodes.get_mut(&key) {
            links.signature = Some(signature.clone());
        }
        signature
    }

    /// True if the node currently holds a memoized signature.
    #[must_use]
    pub fn has_cached_signature(&self, key: K) -> bool {
        self.nodes
            .get(&key)
            .is_some_and(|links| links.signature.is_some())
    }

    /// All node keys in order.
    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.nodes.keys().copied()
    }

    /// Total number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Total number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|links| links.depends.len()).sum()
    }

    /// Check edge symmetry and self-loop freedom.
    pub fn verify(&self) -> Result<(), BundleGraphError> {
        for (&key, links) in &self.nodes {
            if links.depends.contains(&key) || links.refers.contains(&key) {
                return Err(BundleGraphError::Corrupted(format!(
                    "self-loop on {:?}",
                    key
                )));
            }
            for dependency in &links.depends {
                let mirrored = self
                    .nodes
                    .get(dependency)
                    .is_some_and(|target| target.refers.contains(&key));
                if !mirrored {
                    return Err(BundleGraphError::Corrupted(format!(
                        "edge {:?} -> {:?} has no back-reference",
                        key, dependency
                    )));
                }
            }
            for referrer in &links.refers {
                let mirrored = self
                    .nodes
                    .get(referrer)
                    .is_some_and(|source| source.depends.contains(&key));
                if !mirrored {
                    return Err(BundleGraphError::Corrupted(format!(
                        "back-reference {:?} <- {:?} has no edge",
                        key, referrer
                    )));
                }
            }
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
