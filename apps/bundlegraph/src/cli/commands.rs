//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use bundlegraph_core::{
    BuildConfig, BuildOutput, BuildReport, BundleGraphError, GraphBuilder, MemoryCatalog,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

// =============================================================================
// FILE NAMES & LIMITS
// =============================================================================

/// Manifest written by `plan`.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Build list written by `plan`.
pub const BUILD_LIST_FILE: &str = "build_list.json";

/// Maximum catalog snapshot size (100 MB).
const MAX_CATALOG_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Maximum configuration file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// Configuration written by `init`. Parses to `BuildConfig::default()`.
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# bundlegraph packing configuration

# Type tag of exclusive, non-combinable scene assets.
scene_type = "Scene"

# Runtime manifest asset and its reserved bundle.
manifest_type = "Manifest"
manifest_bundle = "manifest"

# Shader-family types sharing one reserved bundle.
shader_types = ["Shader", "ShaderVariantCollection"]
shader_bundle = "shaders"

# Types resolved through their containing package (`atlas.png#sprite`).
sub_asset_types = ["Sprite"]

# Dependencies that never ship in a bundle.
ignored_types = ["MonoScript", "LightingDataAsset"]
ignored_suffixes = [".cs", ".js", ".dll", ".tpsheet", "LightingData.asset"]

# Explicit packing rules. A path ending in "/" covers a whole folder;
# an exact path wins over any folder, the longest folder wins otherwise.
#
# [[overrides]]
# path = "Assets/UI/"
# bundle = "ui"
# variant = "hd"
"#;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), BundleGraphError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| BundleGraphError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(BundleGraphError::SerializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Canonicalize an input path and ensure it is a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, BundleGraphError> {
    let canonical = path.canonicalize().map_err(|e| {
        BundleGraphError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(BundleGraphError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Validate an output file path: the parent directory must exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, BundleGraphError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        BundleGraphError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(BundleGraphError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| BundleGraphError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

/// Create the output directory if needed and canonicalize it.
fn validate_output_dir(path: &Path) -> Result<PathBuf, BundleGraphError> {
    std::fs::create_dir_all(path).map_err(|e| {
        BundleGraphError::IoError(format!(
            "Cannot create output directory '{}': {}",
            path.display(),
            e
        ))
    })?;

    let canonical = path.canonicalize().map_err(|e| {
        BundleGraphError::IoError(format!(
            "Invalid output directory '{}': {}",
            path.display(),
            e
        ))
    })?;

    if !canonical.is_dir() {
        return Err(BundleGraphError::IoError(format!(
            "Output path '{}' is not a directory",
            path.display()
        )));
    }
    Ok(canonical)
}

// =============================================================================
// LOADING
// =============================================================================

/// Load a catalog snapshot from a JSON file.
pub fn load_catalog(path: &Path) -> Result<MemoryCatalog, BundleGraphError> {
    let validated = validate_file_path(path)?;
    validate_file_size(&validated, MAX_CATALOG_FILE_SIZE)?;

    let contents = std::fs::read(&validated)
        .map_err(|e| BundleGraphError::IoError(format!("Read catalog: {}", e)))?;
    let catalog: MemoryCatalog = serde_json::from_slice(&contents).map_err(|e| {
        BundleGraphError::SerializationError(format!(
            "Invalid catalog '{}': {}",
            path.display(),
            e
        ))
    })?;

    tracing::debug!(records = catalog.len(), "catalog loaded");
    Ok(catalog)
}

/// Load a packing configuration from a TOML file, or the defaults.
pub fn load_config(path: Option<&Path>) -> Result<BuildConfig, BundleGraphError> {
    let Some(path) = path else {
        return Ok(BuildConfig::default());
    };

    let validated = validate_file_path(path)?;
    validate_file_size(&validated, MAX_CONFIG_FILE_SIZE)?;

    let contents = std::fs::read_to_string(&validated)
        .map_err(|e| BundleGraphError::IoError(format!("Read config: {}", e)))?;
    let config: BuildConfig = toml::from_str(&contents).map_err(|e| {
        BundleGraphError::InvalidConfig(format!("'{}': {}", path.display(), e))
    })?;

    config.validate()?;
    tracing::debug!(overrides = config.overrides.len(), "config loaded");
    Ok(config)
}

/// Load both inputs and run one build pass.
pub fn plan(catalog: &Path, config: Option<&Path>) -> Result<BuildOutput, BundleGraphError> {
    let catalog = load_catalog(catalog)?;
    let config = load_config(config)?;

    GraphBuilder::new(&catalog).with_config(config).build()
}

/// Serialize a value as pretty JSON into a file.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), BundleGraphError> {
    let bytes = serde_json::to_vec_pretty(value)
        .map_err(|e| BundleGraphError::SerializationError(format!("Serialize: {}", e)))?;
    std::fs::write(path, bytes)
        .map_err(|e| BundleGraphError::IoError(format!("Write '{}': {}", path.display(), e)))
}

// =============================================================================
// PLAN COMMAND
// =============================================================================

/// Plan bundles and write the manifest and build list.
pub fn cmd_plan(
    catalog: &Path,
    config: Option<&Path>,
    output_dir: &Path,
    json_mode: bool,
) -> Result<(), BundleGraphError> {
    tracing::info!("Planning bundles from {:?}", catalog);

    let output_dir = validate_output_dir(output_dir)?;
    let output = plan(catalog, config)?;

    let manifest_path = output_dir.join(MANIFEST_FILE);
    let build_list_path = output_dir.join(BUILD_LIST_FILE);
    write_json(&manifest_path, &output.manifest)?;
    write_json(&build_list_path, &output.requests)?;

    if json_mode {
        let summary = serde_json::json!({
            "manifest": manifest_path.to_string_lossy(),
            "build_list": build_list_path.to_string_lossy(),
            "report": output.report,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).unwrap_or_default()
        );
        return Ok(());
    }

    print_report(&output.report);
    println!();
    println!("Manifest:   {}", manifest_path.display());
    println!("Build list: {}", build_list_path.display());

    Ok(())
}

// =============================================================================
// CHECK COMMAND
// =============================================================================

/// Plan bundles and print the report without writing any file.
pub fn cmd_check(
    catalog: &Path,
    config: Option<&Path>,
    json_mode: bool,
) -> Result<(), BundleGraphError> {
    let output = plan(catalog, config)?;

    if json_mode {
        let summary = serde_json::json!({
            "report": output.report,
            "bundles": output
                .requests
                .iter()
                .map(|r| serde_json::json!({
                    "id": r.bundle_id(),
                    "assets": r.asset_paths.len(),
                }))
                .collect::<Vec<_>>(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).unwrap_or_default()
        );
        return Ok(());
    }

    print_report(&output.report);
    println!();
    println!("Bundles");
    println!("-------");
    for request in &output.requests {
        println!("  {:<40} {} assets", request.bundle_id(), request.asset_paths.len());
    }

    Ok(())
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Write the default packing configuration.
pub fn cmd_init(output: &Path, force: bool) -> Result<(), BundleGraphError> {
    if output.exists() && !force {
        return Err(BundleGraphError::IoError(format!(
            "'{}' already exists. Use --force to overwrite.",
            output.display()
        )));
    }

    let validated = validate_output_path(output)?;
    std::fs::write(&validated, DEFAULT_CONFIG_TEMPLATE)
        .map_err(|e| BundleGraphError::IoError(format!("Write config: {}", e)))?;

    println!("Wrote default configuration to {}", validated.display());
    Ok(())
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

fn print_report(report: &BuildReport) {
    println!("Bundle Plan");
    println!("===========");
    println!("Assets:        {}", report.assets_cataloged);
    println!("Placeholders:  {}", report.placeholders);
    println!("Asset edges:   {}", report.asset_edges);
    println!("Bundles:       {} created, {} kept", report.bundles_created, report.bundles_surviving);
    println!("Bundle edges:  {}", report.bundle_edges);
    println!("Inlined:       {}", report.bundles_inlined);
    println!("Merged:        {}", report.bundles_merged);
    println!("Rounds:        {}", report.rounds);

    if !report.duplicates_skipped.is_empty() {
        println!();
        println!("Duplicate catalog paths (second record dropped):");
        for path in &report.duplicates_skipped {
            println!("  {}", path);
        }
    }
}
