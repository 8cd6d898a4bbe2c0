//! # Build Configuration
//!
//! Packing conventions and explicit path overrides for one build pass.
//!
//! `BuildConfig` is plain serde data. The core never reads files; the CLI
//! parses it from TOML and hands it over.
//!
//! ```toml
//! scene_type = "Scene"
//! shader_bundle = "shaders"
//!
//! [[overrides]]
//! path = "Assets/UI/"
//! bundle = "ui"
//!
//! [[overrides]]
//! path = "Assets/UI/hud_hd.png"
//! bundle = "ui"
//! variant = "hd"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::primitives;
use crate::{BundleAddress, BundleGraphError};

// =============================================================================
// BUILD CONFIG
// =============================================================================

/// Conventions applied while assigning assets to bundles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Type tag of exclusive, non-combinable scene assets.
    pub scene_type: String,
    /// Type tag of the runtime manifest asset.
    pub manifest_type: String,
    /// Reserved bundle of the manifest asset.
    pub manifest_bundle: String,
    /// Type tags sharing the reserved shader bundle.
    pub shader_types: Vec<String>,
    /// Reserved bundle of shader-family assets.
    pub shader_bundle: String,
    /// Type tags that resolve through a container package.
    pub sub_asset_types: Vec<String>,
    /// Dependency types dropped during expansion.
    pub ignored_types: Vec<String>,
    /// Dependency path suffixes dropped during expansion.
    pub ignored_suffixes: Vec<String>,
    /// Explicit path and folder rules.
    pub overrides: Vec<OverrideRule>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| (*s).to_string()).collect();
        Self {
            scene_type: primitives::SCENE_TYPE.to_string(),
            manifest_type: primitives::MANIFEST_TYPE.to_string(),
            manifest_bundle: primitives::MANIFEST_BUNDLE.to_string(),
            shader_types: owned(primitives::SHADER_TYPES),
            shader_bundle: primitives::SHADER_BUNDLE.to_string(),
            sub_asset_types: owned(primitives::SUB_ASSET_TYPES),
            ignored_types: owned(primitives::IGNORED_TYPES),
            ignored_suffixes: owned(primitives::IGNORED_SUFFIXES),
            overrides: Vec::new(),
        }
    }
}

impl BuildConfig {
    /// Reject configurations the planner cannot honor.
    pub fn validate(&self) -> Result<(), BundleGraphError> {
        if self.scene_type.is_empty() {
            return Err(BundleGraphError::InvalidConfig(
                "scene_type must not be empty".to_string(),
            ));
        }
        if self.manifest_bundle.is_empty() || self.shader_bundle.is_empty() {
            return Err(BundleGraphError::InvalidConfig(
                "reserved bundle names must not be empty".to_string(),
            ));
        }
        if self.manifest_bundle == self.shader_bundle {
            return Err(BundleGraphError::InvalidConfig(format!(
                "manifest and shader bundles share the name '{}'",
                self.manifest_bundle
            )));
        }
        if self.shader_types.contains(&self.scene_type) {
            return Err(BundleGraphError::InvalidConfig(format!(
                "'{}' cannot be both a scene and a shader type",
                self.scene_type
            )));
        }
        Ok(())
    }

    /// True for shader-family type tags.
    #[must_use]
    pub fn is_shader(&self, asset_type: &str) -> bool {
        self.shader_types.iter().any(|t| t == asset_type)
    }

    /// True when a dependency never ships in a bundle.
    #[must_use]
    pub fn is_ignored(&self, path: &str, asset_type: &str) -> bool {
        self.ignored_types.iter().any(|t| t == asset_type)
            || self.ignored_suffixes.iter().any(|s| path.ends_with(s.as_str()))
    }
}

// =============================================================================
// OVERRIDES
// =============================================================================

/// One explicit packing rule.
///
/// A `path` ending in `/` is a folder rule covering everything below it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideRule {
    /// Asset path or folder prefix.
    pub path: String,
    /// Target bundle name.
    pub bundle: String,
    /// Target variant, empty for the default flavor.
    #[serde(default)]
    pub variant: String,
}

impl OverrideRule {
    /// Create a rule for the default variant.
    #[must_use]
    pub fn new(path: impl Into<String>, bundle: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            bundle: bundle.into(),
            variant: String::new(),
        }
    }

    /// Set the target variant.
    #[must_use]
    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = variant.into();
        self
    }
}

/// Lookup table built from the override rules.
#[derive(Debug, Clone, Default)]
pub struct BundleOverrides {
    exact: BTreeMap<String, BundleAddress>,
    folders: BTreeMap<String, BundleAddress>,
}

impl BundleOverrides {
    /// Build the table. Later rules for the same path replace earlier ones.
    ///
    /// Two rules whose bundle ids coincide must name the same address:
    /// `ui.hd` with no variant and `ui` with variant `hd` are rejected.
    pub fn from_rules(rules: &[OverrideRule]) -> Result<Self, BundleGraphError> {
        let mut table = Self::default();
        let mut ids: BTreeMap<String, BundleAddress> = BTreeMap::new();
        for rule in rules {
            if rule.path.is_empty() {
                return Err(BundleGraphError::InvalidConfig(
                    "override with empty path".to_string(),
                ));
            }
            if rule.bundle.is_empty() {
                return Err(BundleGraphError::InvalidConfig(format!(
                    "override for '{}' has an empty bundle name",
                    rule.path
                )));
            }
            let address = BundleAddress::new(rule.bundle.clone(), rule.variant.clone());
            if let Some(seen) = ids.get(&address.id())
                && *seen != address
            {
                return Err(BundleGraphError::InvalidConfig(format!(
                    "override for '{}' targets '{}' (variant '{}'), which collides with bundle '{}' (variant '{}')",
                    rule.path, address.name, address.variant, seen.name, seen.variant
                )));
            }
            ids.insert(address.id(), address.clone());
            if rule.path.ends_with('/') {
                table.folders.insert(rule.path.clone(), address);
            } else {
                table.exact.insert(rule.path.clone(), address);
            }
        }
        Ok(table)
    }

    /// Resolve a path: exact rule first, then the longest folder prefix.
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<&BundleAddress> {
        if let Some(address) = self.exact.get(path) {
            return Some(address);
        }
        self.folders
            .iter()
            .filter(|(folder, _)| path.starts_with(folder.as_str()))
            .max_by_key(|(folder, _)| folder.len())
            .map(|(_, address)| address)
    }

    /// Number of rules in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.exact.len() + self.folders.len()
    }

    /// True when no rule is defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// TESTS
// =============================================================================
