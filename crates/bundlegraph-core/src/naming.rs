//! # Bundle Naming
//!
//! Target bundle selection for a single asset.
//!
//! Priority, highest first:
//! 1. Pre-assigned package on the record
//! 2. Explicit override rule
//! 3. Type convention (manifest, shader family)
//! 4. Generated per-asset name

use crate::catalog::ContentId;
use crate::config::{BuildConfig, BundleOverrides};
use crate::{AssetRecord, BundleAddress};

/// Where a target bundle came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentSource {
    /// The record carried a package id.
    Explicit,
    /// An override rule matched.
    Override,
    /// A reserved bundle for the asset type.
    Convention,
    /// A name generated from the file name and content id.
    Generated,
}

/// Turn a file name into a bundle-safe name: lowercase ASCII letters, digits
/// and `_`.
#[must_use]
pub fn sanitize(file_name: &str) -> String {
    let mut out = String::with_capacity(file_name.len());
    let mut last_underscore = false;
    for c in file_name.chars() {
        let mapped = if c.is_ascii_alphanumeric() {
            c.to_ascii_lowercase()
        } else {
            '_'
        };
        if mapped == '_' {
            if last_underscore {
                continue;
            }
            last_underscore = true;
        } else {
            last_underscore = false;
        }
        out.push(mapped);
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        "asset".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Generated bundle name: sanitized file name plus the content id.
#[must_use]
pub fn generated_name(path: &str, ids: &dyn ContentId) -> String {
    let file = path.rsplit('/').next().unwrap_or(path);
    format!("{}_{}", sanitize(file), ids.content_id(path))
}

/// Pick the target bundle of a cataloged asset.
#[must_use]
pub fn target_bundle(
    record: &AssetRecord,
    config: &BuildConfig,
    overrides: &BundleOverrides,
    ids: &dyn ContentId,
) -> (BundleAddress, AssignmentSource) {
    if let Some(package) = record.package.as_deref().filter(|p| !p.is_empty()) {
        return (BundleAddress::parse(package), AssignmentSource::Explicit);
    }
    if let Some(address) = overrides.lookup(&record.path) {
        return (address.clone(), AssignmentSource::Override);
    }
    if record.asset_type == config.manifest_type {
        return (
            BundleAddress::new(config.manifest_bundle.clone(), ""),
            AssignmentSource::Convention,
        );
    }
    if config.is_shader(&record.asset_type) {
        return (
            BundleAddress::new(config.shader_bundle.clone(), ""),
            AssignmentSource::Convention,
        );
    }
    (
        BundleAddress::new(generated_name(&record.path, ids), ""),
        AssignmentSource::Generated,
    )
}
