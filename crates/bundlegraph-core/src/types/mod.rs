//! # Core Type Definitions
//!
//! This module contains the shared types of the bundle planner:
//! - Arena keys (`AssetKey`, `BundleKey`)
//! - Catalog rows (`AssetRecord`)
//! - Bundle identity (`BundleAddress`)
//! - Planner output (`BuildRequest`, `BuildReport`, `BuildOutput`)
//! - Error types (`BundleGraphError`)
//!
//! ## Determinism Guarantees
//!
//! All key types implement `Ord` so they can live in `BTreeMap`/`BTreeSet`.
//! Counters use saturating arithmetic.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::primitives::VARIANT_SEPARATOR;

// =============================================================================
// ARENA KEYS
// =============================================================================

/// Stable key of an asset node inside one build pass.
///
/// Keys are handed out in creation order and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssetKey(pub u32);

/// Stable key of a bundle node inside one build pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BundleKey(pub u32);

// =============================================================================
// ASSET RECORD
// =============================================================================

/// One row of the asset catalog, and one row of the emitted manifest.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct AssetRecord {
    /// Logical load key. Empty if the asset is not independently loadable.
    #[serde(default)]
    pub name: String,
    /// Unique source identifier.
    pub path: String,
    /// Classification tag ("Texture", "Prefab", "Scene", ...).
    #[serde(rename = "type", default)]
    pub asset_type: String,
    /// Pre-assigned bundle id, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
}

impl AssetRecord {
    /// Create a record without a pre-assigned package.
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<String>, asset_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            asset_type: asset_type.into(),
            package: None,
        }
    }

    /// Attach a pre-assigned package id.
    #[must_use]
    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    /// True when the asset can be loaded by name at runtime.
    #[must_use]
    pub fn loadable(&self) -> bool {
        !self.name.is_empty()
    }
}

// =============================================================================
// BUNDLE ADDRESS
// =============================================================================

/// Name and variant of a bundle.
///
/// The bundle id is `name` when the variant is empty, else `name.variant`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct BundleAddress {
    /// Bundle name.
    pub name: String,
    /// Variant flavor, empty for the default flavor.
    #[serde(default)]
    pub variant: String,
}

impl BundleAddress {
    /// Create an address.
    #[must_use]
    pub fn new(name: impl Into<String>, variant: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variant: variant.into(),
        }
    }

    /// Parse a bundle id, splitting the variant at the last separator.
    #[must_use]
    pub fn parse(id: &str) -> Self {
        match id.rsplit_once(VARIANT_SEPARATOR) {
            Some((name, variant)) if !name.is_empty() && !variant.is_empty() => {
                Self::new(name, variant)
            }
            _ => Self::new(id, ""),
        }
    }

    /// The canonical bundle id.
    #[must_use]
    pub fn id(&self) -> String {
        if self.variant.is_empty() {
            self.name.clone()
        } else {
            format!("{}{}{}", self.name, VARIANT_SEPARATOR, self.variant)
        }
    }
}

impl fmt::Display for BundleAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}

// =============================================================================
// BUILD OUTPUT
// =============================================================================

/// A request for the external bundle compiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRequest {
    /// Bundle name.
    pub name: String,
    /// Variant flavor, empty for the default flavor.
    #[serde(default)]
    pub variant: String,
    /// Member asset paths, main asset first.
    pub asset_paths: Vec<String>,
}

impl BuildRequest {
    /// The bundle id this request produces.
    #[must_use]
    pub fn bundle_id(&self) -> String {
        BundleAddress::new(self.name.clone(), self.variant.clone()).id()
    }
}

/// Counters collected over one build pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BuildReport {
    /// Catalog records accepted.
    pub assets_cataloged: usize,
    /// Paths whose second catalog occurrence was dropped.
    pub duplicates_skipped: Vec<String>,
    /// Nodes created for dependency paths missing from the catalog.
    pub placeholders: usize,
    /// Asset-level dependency edges after expansion.
    pub asset_edges: usize,
    /// Bundles created by assignment.
    pub bundles_created: usize,
    /// Bundle-level edges before reduction.
    pub bundle_edges: usize,
    /// Bundles folded into their sole consumer.
    pub bundles_inlined: usize,
    /// Bundles merged into a sibling with the same referrers.
    pub bundles_merged: usize,
    /// Fixpoint rounds executed.
    pub rounds: usize,
    /// Bundles left after reduction.
    pub bundles_surviving: usize,
}

/// Everything one build pass produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BuildOutput {
    /// Final manifest rows, sorted by path.
    pub manifest: Vec<AssetRecord>,
    /// Build requests, sorted by bundle id.
    pub requests: Vec<BuildRequest>,
    /// Pass statistics.
    pub report: BuildReport,
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur while planning bundles.
///
/// Only `StructuralViolation` aborts a build. `DuplicateAsset` is built for
/// logging and never returned by the builder.
#[derive(Debug, Error)]
pub enum BundleGraphError {
    /// A scene would share its bundle with another asset.
    #[error("Structural violation: asset '{asset}' breaks scene exclusivity of bundle '{bundle}'")]
    StructuralViolation {
        /// Bundle id.
        bundle: String,
        /// Path of the rejected asset.
        asset: String,
    },

    /// The same path appeared twice in the catalog.
    #[error("Duplicate asset path: {0}")]
    DuplicateAsset(String),

    /// No asset node exists for the path.
    #[error("Unknown asset: {0}")]
    UnknownAsset(String),

    /// No live bundle exists for the id or key.
    #[error("Unknown bundle: {0}")]
    UnknownBundle(String),

    /// The packing configuration is unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A graph invariant does not hold.
    #[error("Graph corrupted: {0}")]
    Corrupted(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_id_without_variant() {
        let address = BundleAddress::new("ui_main", "");
        assert_eq!(address.id(), "ui_main");
    }

    #[test]
    fn address_id_with_variant() {
        let address = BundleAddress::new("ui_main", "hd");
        assert_eq!(address.id(), "ui_main.hd");
        assert_eq!(address.to_string(), "ui_main.hd");
    }

    #[test]
    fn address_parse_splits_last_separator() {
        assert_eq!(BundleAddress::parse("a.b.hd"), BundleAddress::new("a.b", "hd"));
        assert_eq!(BundleAddress::parse("plain"), BundleAddress::new("plain", ""));
        assert_eq!(BundleAddress::parse("trailing."), BundleAddress::new("trailing.", ""));
    }

    #[test]
    fn record_loadable_follows_name() {
        assert!(AssetRecord::new("hero", "Assets/hero.prefab", "Prefab").loadable());
        assert!(!AssetRecord::new("", "Assets/hero.png", "Texture").loadable());
    }
}
