//! # Catalog Boundary
//!
//! The traits through which the host asset database feeds the planner, and
//! an in-memory implementation of them.
//!
//! - `AssetCatalog`: enumerates assets and answers dependency queries
//! - `ContentId`: stable, content-addressed id of a path
//! - `MemoryCatalog`: a catalog snapshot held in memory
//!
//! None of these perform I/O on their own.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::AssetRecord;
use crate::primitives::{CONTENT_ID_LENGTH, SUB_ASSET_SEPARATOR, UNKNOWN_TYPE};

// =============================================================================
// CATALOG TRAIT
// =============================================================================

/// The external asset database as seen by the planner.
///
/// Callers must not mutate the underlying database during a build pass.
pub trait AssetCatalog {
    /// Every asset of the considered universe.
    fn list_assets(&self) -> Vec<AssetRecord>;

    /// Direct file-level dependencies of a path.
    fn direct_dependencies(&self, path: &str) -> Vec<String>;

    /// Classification tag of a path.
    fn classify_type(&self, path: &str) -> String;

    /// Containing package of a sub-asset path.
    ///
    /// Defaults to the part before `#` (`atlas.png#hero` → `atlas.png`).
    fn container_of(&self, path: &str) -> Option<String> {
        path.split_once(SUB_ASSET_SEPARATOR)
            .map(|(container, _)| container)
            .filter(|container| !container.is_empty())
            .map(str::to_string)
    }
}

// =============================================================================
// CONTENT ID
// =============================================================================

/// Pure function from a path to a stable identifier.
///
/// Generated bundle names embed this id so that equal file names in
/// different folders never collide.
pub trait ContentId {
    /// Stable id of a path.
    fn content_id(&self, path: &str) -> String;
}

impl<F> ContentId for F
where
    F: Fn(&str) -> String,
{
    fn content_id(&self, path: &str) -> String {
        self(path)
    }
}

/// Default content id: the leading hex digits of the BLAKE3 hash of the path.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3ContentId;

impl ContentId for Blake3ContentId {
    fn content_id(&self, path: &str) -> String {
        let hash = blake3::hash(path.as_bytes());
        let hex = hash.to_hex();
        hex.as_str()[..CONTENT_ID_LENGTH].to_string()
    }
}

// =============================================================================
// EXTENSION CLASSIFICATION
// =============================================================================

/// Well-known file extensions and the tags they classify as.
const EXTENSION_TYPES: &[(&str, &str)] = &[
    ("anim", "AnimationClip"),
    ("asset", "Asset"),
    ("controller", "AnimatorController"),
    ("cs", "MonoScript"),
    ("fbx", "Model"),
    ("jpg", "Texture"),
    ("mat", "Material"),
    ("mp3", "AudioClip"),
    ("ogg", "AudioClip"),
    ("png", "Texture"),
    ("prefab", "Prefab"),
    ("psd", "Texture"),
    ("shader", "Shader"),
    ("shadervariants", "ShaderVariantCollection"),
    ("spriteatlas", "SpriteAtlas"),
    ("tga", "Texture"),
    ("ttf", "Font"),
    ("unity", "Scene"),
    ("wav", "AudioClip"),
];

/// Classify a path by its extension alone.
#[must_use]
pub fn classify_extension(path: &str) -> &'static str {
    let file = path.rsplit('/').next().unwrap_or(path);
    let Some((_, extension)) = file.rsplit_once('.') else {
        return UNKNOWN_TYPE;
    };
    let extension = extension.to_ascii_lowercase();
    EXTENSION_TYPES
        .binary_search_by(|(known, _)| (*known).cmp(extension.as_str()))
        .map(|index| EXTENSION_TYPES[index].1)
        .unwrap_or(UNKNOWN_TYPE)
}

// =============================================================================
// MEMORY CATALOG
// =============================================================================

/// Serialized shape of a catalog snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSnapshot {
    /// Asset records, in catalog order.
    pub assets: Vec<AssetRecord>,
    /// Direct dependencies per path.
    pub dependencies: BTreeMap<String, Vec<String>>,
    /// Type tags of paths that have no asset record.
    pub types: BTreeMap<String, String>,
    /// Explicit container per sub-asset path.
    pub containers: BTreeMap<String, String>,
}

/// A catalog held entirely in memory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "CatalogSnapshot", into = "CatalogSnapshot")]
pub struct MemoryCatalog {
    snapshot: CatalogSnapshot,
    /// Type of the first record per path.
    record_types: BTreeMap<String, String>,
}

impl From<CatalogSnapshot> for MemoryCatalog {
    fn from(snapshot: CatalogSnapshot) -> Self {
        let mut record_types = BTreeMap::new();
        for record in &snapshot.assets {
            record_types
                .entry(record.path.clone())
                .or_insert_with(|| record.asset_type.clone());
        }
        Self {
            snapshot,
            record_types,
        }
    }
}

impl From<MemoryCatalog> for CatalogSnapshot {
    fn from(catalog: MemoryCatalog) -> Self {
        catalog.snapshot
    }
}

impl MemoryCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an asset record.
    #[must_use]
    pub fn with_asset(mut self, record: AssetRecord) -> Self {
        self.add_asset(record);
        self
    }

    /// Append a dependency edge.
    #[must_use]
    pub fn with_dependency(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.add_dependency(from, to);
        self
    }

    /// Append an asset record in place.
    pub fn add_asset(&mut self, record: AssetRecord) {
        self.record_types
            .entry(record.path.clone())
            .or_insert_with(|| record.asset_type.clone());
        self.snapshot.assets.push(record);
    }

    /// Append a dependency edge in place.
    pub fn add_dependency(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.snapshot
            .dependencies
            .entry(from.into())
            .or_default()
            .push(to.into());
    }

    /// Record the type of a path that has no asset record.
    pub fn set_type(&mut self, path: impl Into<String>, asset_type: impl Into<String>) {
        self.snapshot.types.insert(path.into(), asset_type.into());
    }

    /// Record the container of a sub-asset path.
    pub fn set_container(&mut self, path: impl Into<String>, container: impl Into<String>) {
        self.snapshot
            .containers
            .insert(path.into(), container.into());
    }

    /// Number of asset records, duplicates included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshot.assets.len()
    }

    /// True when the catalog holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshot.assets.is_empty()
    }
}

impl AssetCatalog for MemoryCatalog {
    fn list_assets(&self) -> Vec<AssetRecord> {
        self.snapshot.assets.clone()
    }

    fn direct_dependencies(&self, path: &str) -> Vec<String> {
        self.snapshot
            .dependencies
            .get(path)
            .cloned()
            .unwrap_or_default()
    }

    fn classify_type(&self, path: &str) -> String {
        if let Some(tag) = self.record_types.get(path).filter(|t| !t.is_empty()) {
            return tag.clone();
        }
        if let Some(tag) = self.snapshot.types.get(path) {
            return tag.clone();
        }
        classify_extension(path).to_string()
    }

    fn container_of(&self, path: &str) -> Option<String> {
        if let Some(container) = self.snapshot.containers.get(path) {
            return Some(container.clone());
        }
        path.split_once(SUB_ASSET_SEPARATOR)
            .map(|(container, _)| container)
            .filter(|container| !container.is_empty())
            .map(str::to_string)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_table_is_sorted() {
        let keys: Vec<_> = EXTENSION_TYPES.iter().map(|(k, _)| *k).collect();
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn classify_by_extension() {
        assert_eq!(classify_extension("Assets/Scripts/Player.cs"), "MonoScript");
        assert_eq!(classify_extension("Assets/Art/Hero.PNG"), "Texture");
        assert_eq!(classify_extension("Assets/Scenes/Main.unity"), "Scene");
        assert_eq!(classify_extension("Assets/README"), UNKNOWN_TYPE);
        assert_eq!(classify_extension("Assets/v1.2/README"), UNKNOWN_TYPE);
    }

    #[test]
    fn record_type_wins_over_extension() {
        let catalog = MemoryCatalog::new()
            .with_asset(AssetRecord::new("", "Assets/data.asset", "Manifest"));

        assert_eq!(catalog.classify_type("Assets/data.asset"), "Manifest");
        assert_eq!(catalog.classify_type("Assets/other.asset"), "Asset");
    }

    #[test]
    fn dependencies_default_to_empty() {
        let catalog = MemoryCatalog::new().with_dependency("a.prefab", "b.png");

        assert_eq!(catalog.direct_dependencies("a.prefab"), vec!["b.png"]);
        assert!(catalog.direct_dependencies("b.png").is_empty());
    }

    #[test]
    fn container_from_separator_or_table() {
        let mut catalog = MemoryCatalog::new();
        catalog.set_container("Assets/ui/hero_sprite", "Assets/ui/atlas.png");

        assert_eq!(
            catalog.container_of("Assets/ui/atlas.png#hero"),
            Some("Assets/ui/atlas.png".to_string())
        );
        assert_eq!(
            catalog.container_of("Assets/ui/hero_sprite"),
            Some("Assets/ui/atlas.png".to_string())
        );
        assert_eq!(catalog.container_of("Assets/ui/atlas.png"), None);
        assert_eq!(catalog.container_of("#orphan"), None);
    }

    #[test]
    fn blake3_content_id_is_stable_and_short() {
        let a = Blake3ContentId.content_id("Assets/a/icon.png");
        let b = Blake3ContentId.content_id("Assets/b/icon.png");

        assert_eq!(a.len(), CONTENT_ID_LENGTH);
        assert_eq!(a, Blake3ContentId.content_id("Assets/a/icon.png"));
        assert_ne!(a, b);
    }

    #[test]
    fn closures_are_content_ids() {
        let fixed = |path: &str| format!("id-{}", path.len());
        assert_eq!(fixed.content_id("abc"), "id-3");
    }
}
