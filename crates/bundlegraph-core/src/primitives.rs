//! # Planner Primitives
//!
//! Compiled-in defaults for the bundle planner.
//!
//! Every value here is only a default: `BuildConfig` can replace each of
//! them at runtime. The planner logic itself never reads these constants
//! directly.

/// Separator between a bundle name and its variant in a bundle id.
pub const VARIANT_SEPARATOR: char = '.';

/// Separator between a container path and a sub-asset name.
///
/// `Assets/ui/atlas.png#hero` is the `hero` sprite inside `atlas.png`.
pub const SUB_ASSET_SEPARATOR: char = '#';

// =============================================================================
// TYPE TAGS
// =============================================================================

/// Type tag of scene assets. Scene bundles hold exactly one asset.
pub const SCENE_TYPE: &str = "Scene";

/// Type tag of the runtime manifest asset.
pub const MANIFEST_TYPE: &str = "Manifest";

/// Type tags that share the reserved shader bundle.
pub const SHADER_TYPES: &[&str] = &["Shader", "ShaderVariantCollection"];

/// Type tags resolved through their containing package.
pub const SUB_ASSET_TYPES: &[&str] = &["Sprite"];

/// Type tag assigned to paths nothing else can classify.
pub const UNKNOWN_TYPE: &str = "Unknown";

// =============================================================================
// RESERVED BUNDLES
// =============================================================================

/// Reserved singleton bundle of the manifest asset.
pub const MANIFEST_BUNDLE: &str = "manifest";

/// Reserved bundle shared by every shader-family asset.
pub const SHADER_BUNDLE: &str = "shaders";

// =============================================================================
// DEPENDENCY FILTERS
// =============================================================================

/// Dependency types that never ship in a bundle.
pub const IGNORED_TYPES: &[&str] = &["MonoScript", "LightingDataAsset"];

/// Path suffixes of auxiliary files (source code, baked lighting, sprite-sheet
/// metadata) that never ship in a bundle.
pub const IGNORED_SUFFIXES: &[&str] = &[".cs", ".js", ".dll", ".tpsheet", "LightingData.asset"];

/// Hex characters of the content id kept in generated bundle names.
pub const CONTENT_ID_LENGTH: usize = 16;
