//! # Graph Builder
//!
//! Runs one bundle-planning pass from catalog to build list.
//!
//! ```text
//! overrides → catalog → expand → assign → bundle graph → reduce → manifest
//!                                                               → build list
//! ```
//!
//! All mutable state of a pass lives in a [`BuildContext`] that each phase
//! receives explicitly. [`GraphBuilder`] runs the phases in order; tests and
//! tools can drive a `BuildContext` phase by phase instead.
//!
//! ## Failure Semantics
//!
//! - A scene exclusivity violation aborts the pass.
//! - A duplicate catalog path is logged and its second record dropped.
//! - A dependency missing from the catalog becomes a placeholder node.

use crate::asset::{AssetSet, NodeStrategies, NodeStrategy};
use crate::bundle::BundleSet;
use crate::catalog::{AssetCatalog, Blake3ContentId, ContentId};
use crate::config::{BuildConfig, BundleOverrides};
use crate::naming::{AssignmentSource, target_bundle};
use crate::{AssetRecord, BuildOutput, BuildReport, BuildRequest, BundleGraphError};

// =============================================================================
// BUILD CONTEXT
// =============================================================================

/// State of one build pass.
pub struct BuildContext<'a> {
    catalog: &'a dyn AssetCatalog,
    config: &'a BuildConfig,
    ids: &'a dyn ContentId,
    strategies: NodeStrategies,
    overrides: BundleOverrides,
    assets: AssetSet,
    bundles: BundleSet,
    report: BuildReport,
}

impl<'a> BuildContext<'a> {
    /// Start a pass with the default node strategies for `config`.
    #[must_use]
    pub fn new(
        catalog: &'a dyn AssetCatalog,
        config: &'a BuildConfig,
        ids: &'a dyn ContentId,
    ) -> Self {
        Self {
            catalog,
            config,
            ids,
            strategies: NodeStrategies::from_config(config),
            overrides: BundleOverrides::default(),
            assets: AssetSet::new(),
            bundles: BundleSet::new(config.scene_type.clone()),
            report: BuildReport::default(),
        }
    }

    /// Replace the node strategy table.
    #[must_use]
    pub fn with_strategies(mut self, strategies: NodeStrategies) -> Self {
        self.strategies = strategies;
        self
    }

    /// Phase 1: build the override table from the configuration.
    pub fn ingest_overrides(&mut self) -> Result<(), BundleGraphError> {
        self.overrides = BundleOverrides::from_rules(&self.config.overrides)?;
        tracing::debug!(rules = self.overrides.len(), "overrides ingested");
        Ok(())
    }

    /// Phase 2: one asset node per catalog record.
    pub fn catalog_assets(&mut self) -> Result<(), BundleGraphError> {
        for record in self.catalog.list_assets() {
            let kind = self.strategies.kind_for(&record, self.catalog);
            match self.assets.catalog(record, kind) {
                Ok(_) => {
                    self.report.assets_cataloged = self.report.assets_cataloged.saturating_add(1);
                }
                Err(BundleGraphError::DuplicateAsset(path)) => {
                    tracing::warn!(path = path.as_str(), "duplicate catalog path, second record dropped");
                    self.report.duplicates_skipped.push(path);
                }
                Err(e) => return Err(e),
            }
        }
        tracing::debug!(assets = self.report.assets_cataloged, "catalog ingested");
        Ok(())
    }

    /// Phase 3: expand every node's file dependencies.
    pub fn expand_dependencies(&mut self) -> Result<(), BundleGraphError> {
        self.assets
            .setup_all(self.catalog, self.config, &self.strategies)?;
        self.report.placeholders = self.assets.placeholder_count();
        self.report.asset_edges = self.assets.graph().edge_count();
        tracing::debug!(
            nodes = self.assets.len(),
            edges = self.report.asset_edges,
            placeholders = self.report.placeholders,
            "dependencies expanded"
        );
        Ok(())
    }

    /// Phase 4: put every cataloged asset into its target bundle.
    pub fn assign_bundles(&mut self) -> Result<(), BundleGraphError> {
        let targets: Vec<_> = self
            .assets
            .iter()
            .filter(|(_, node)| node.cataloged())
            .map(|(key, node)| {
                let (address, source) =
                    target_bundle(node.record(), self.config, &self.overrides, self.ids);
                (key, address, source)
            })
            .collect();

        for (asset, address, source) in targets {
            let (bundle, created) = self.bundles.get_or_create(&address)?;
            if created {
                self.report.bundles_created = self.report.bundles_created.saturating_add(1);
            }
            self.bundles.include(bundle, asset, &mut self.assets)?;
            if source == AssignmentSource::Explicit {
                self.bundles.pin(bundle);
            }
        }
        tracing::debug!(bundles = self.bundles.len(), "bundles assigned");
        Ok(())
    }

    /// Phase 5: derive bundle-level edges.
    pub fn build_bundle_graph(&mut self) -> Result<(), BundleGraphError> {
        self.bundles.setup_all(&self.assets)?;
        self.report.bundle_edges = self.bundles.graph().edge_count();
        tracing::debug!(edges = self.report.bundle_edges, "bundle graph built");
        Ok(())
    }

    /// Phase 6: inline and merge until a round changes nothing.
    pub fn reduce(&mut self) -> Result<(), BundleGraphError> {
        loop {
            self.report.rounds = self.report.rounds.saturating_add(1);

            let mut inlined = 0usize;
            for bundle in self.bundles.keys() {
                if self.bundles.reduce(bundle, &mut self.assets)? {
                    inlined = inlined.saturating_add(1);
                }
            }
            let merged = self.bundles.reduce_by_same_referrer_set(&mut self.assets)?;

            self.report.bundles_inlined = self.report.bundles_inlined.saturating_add(inlined);
            self.report.bundles_merged = self.report.bundles_merged.saturating_add(merged);
            tracing::debug!(
                round = self.report.rounds,
                inlined,
                merged,
                live = self.bundles.len(),
                "reduction round"
            );

            if inlined == 0 && merged == 0 {
                break;
            }
        }

        if cfg!(debug_assertions) {
            self.bundles.graph().verify()?;
        }
        self.report.bundles_surviving = self.bundles.len();
        Ok(())
    }

    /// Phase 7: manifest rows of every loadable cataloged asset, by path.
    #[must_use]
    pub fn emit_manifest(&self) -> Vec<AssetRecord> {
        let mut manifest: Vec<AssetRecord> = self
            .assets
            .iter()
            .filter(|(_, node)| node.cataloged() && node.loadable())
            .map(|(_, node)| {
                let mut record = node.record().clone();
                if record.package.is_none() {
                    record.package = node
                        .bundle()
                        .and_then(|bundle| self.bundles.get(bundle))
                        .map(|bundle| bundle.id().to_string());
                }
                record
            })
            .collect();
        manifest.sort_by(|a, b| a.path.cmp(&b.path));
        manifest
    }

    /// Phase 8: one build request per surviving bundle, by bundle id.
    #[must_use]
    pub fn emit_build_list(&self) -> Vec<BuildRequest> {
        self.bundles.build_requests(&self.assets)
    }

    /// Emit both outputs and close the pass.
    #[must_use]
    pub fn finish(self) -> BuildOutput {
        let manifest = self.emit_manifest();
        let requests = self.emit_build_list();
        BuildOutput {
            manifest,
            requests,
            report: self.report,
        }
    }

    /// Asset nodes of the pass.
    #[must_use]
    pub fn assets(&self) -> &AssetSet {
        &self.assets
    }

    /// Live bundles of the pass.
    #[must_use]
    pub fn bundles(&self) -> &BundleSet {
        &self.bundles
    }

    /// Counters so far.
    #[must_use]
    pub fn report(&self) -> &BuildReport {
        &self.report
    }
}

// =============================================================================
// GRAPH BUILDER
// =============================================================================

/// Runs every phase of a build pass in order.
pub struct GraphBuilder<'a> {
    catalog: &'a dyn AssetCatalog,
    config: BuildConfig,
    ids: Box<dyn ContentId + 'a>,
    extra_strategies: Vec<(String, NodeStrategy)>,
}

impl<'a> GraphBuilder<'a> {
    /// A builder with the default configuration and BLAKE3 content ids.
    #[must_use]
    pub fn new(catalog: &'a dyn AssetCatalog) -> Self {
        Self {
            catalog,
            config: BuildConfig::default(),
            ids: Box::new(Blake3ContentId),
            extra_strategies: Vec::new(),
        }
    }

    /// Use a packing configuration.
    #[must_use]
    pub fn with_config(mut self, config: BuildConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a content id function for generated bundle names.
    #[must_use]
    pub fn with_content_id(mut self, ids: impl ContentId + 'a) -> Self {
        self.ids = Box::new(ids);
        self
    }

    /// Register an extra node strategy on top of the configured ones.
    #[must_use]
    pub fn with_strategy(mut self, tag: impl Into<String>, strategy: NodeStrategy) -> Self {
        self.extra_strategies.push((tag.into(), strategy));
        self
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Run the pass.
    pub fn build(&self) -> Result<BuildOutput, BundleGraphError> {
        self.config.validate()?;

        let mut strategies = NodeStrategies::from_config(&self.config);
        for (tag, strategy) in &self.extra_strategies {
            strategies.register(tag.clone(), *strategy);
        }

        let mut ctx = BuildContext::new(self.catalog, &self.config, self.ids.as_ref())
            .with_strategies(strategies);

        ctx.ingest_overrides()?;
        ctx.catalog_assets()?;
        ctx.expand_dependencies()?;
        ctx.assign_bundles()?;
        ctx.build_bundle_graph()?;
        ctx.reduce()?;

        let output = ctx.finish();
        tracing::info!(
            assets = output.report.assets_cataloged,
            bundles_created = output.report.bundles_created,
            bundles = output.report.bundles_surviving,
            rounds = output.report.rounds,
            "bundle plan complete"
        );
        Ok(output)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::AssetKind;
    use crate::catalog::MemoryCatalog;
    use crate::config::OverrideRule;

    fn fixed_id(path: &str) -> String {
        format!("{:04}", path.len())
    }

    fn request_for<'o>(output: &'o BuildOutput, path: &str) -> Option<&'o BuildRequest> {
        output
            .requests
            .iter()
            .find(|r| r.asset_paths.iter().any(|p| p == path))
    }

    #[test]
    fn texture_inlined_into_prefab() {
        let catalog = MemoryCatalog::new()
            .with_asset(AssetRecord::new("hero", "Assets/hero.prefab", "Prefab"))
            .with_asset(AssetRecord::new("", "Assets/hero.png", "Texture"))
            .with_dependency("Assets/hero.prefab", "Assets/hero.png");

        let output = GraphBuilder::new(&catalog)
            .with_content_id(fixed_id)
            .build()
            .expect("build");

        assert_eq!(output.requests.len(), 1);
        assert_eq!(
            output.requests[0].asset_paths,
            vec!["Assets/hero.prefab", "Assets/hero.png"]
        );
        assert_eq!(output.report.bundles_created, 2);
        assert_eq!(output.report.bundles_inlined, 1);
    }

    #[test]
    fn manifest_lists_loadable_assets_only() {
        let catalog = MemoryCatalog::new()
            .with_asset(AssetRecord::new("hero", "Assets/hero.prefab", "Prefab"))
            .with_asset(AssetRecord::new("", "Assets/hero.png", "Texture"))
            .with_asset(
                AssetRecord::new("boss", "Assets/boss.prefab", "Prefab").with_package("bosses"),
            )
            .with_dependency("Assets/hero.prefab", "Assets/hero.png");

        let output = GraphBuilder::new(&catalog)
            .with_content_id(fixed_id)
            .build()
            .expect("build");

        let paths: Vec<_> = output.manifest.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["Assets/boss.prefab", "Assets/hero.prefab"]);
        assert_eq!(output.manifest[0].package.as_deref(), Some("bosses"));
        assert_eq!(
            output.manifest[1].package.as_deref(),
            Some("hero_prefab_0018")
        );
    }

    #[test]
    fn duplicate_paths_are_skipped() {
        let catalog = MemoryCatalog::new()
            .with_asset(AssetRecord::new("a", "Assets/a.prefab", "Prefab"))
            .with_asset(AssetRecord::new("a_again", "Assets/a.prefab", "Prefab"));

        let output = GraphBuilder::new(&catalog).build().expect("build");

        assert_eq!(output.report.assets_cataloged, 1);
        assert_eq!(output.report.duplicates_skipped, vec!["Assets/a.prefab"]);
        assert_eq!(output.manifest.len(), 1);
        assert_eq!(output.manifest[0].name, "a");
    }

    #[test]
    fn override_targets_win_over_generated_names() {
        let catalog = MemoryCatalog::new()
            .with_asset(AssetRecord::new("menu", "Assets/UI/menu.prefab", "Prefab"))
            .with_asset(AssetRecord::new("hud", "Assets/UI/hud.prefab", "Prefab"));
        let config = BuildConfig {
            overrides: vec![OverrideRule::new("Assets/UI/", "ui")],
            ..BuildConfig::default()
        };

        let output = GraphBuilder::new(&catalog)
            .with_config(config)
            .build()
            .expect("build");

        assert_eq!(output.requests.len(), 1);
        assert_eq!(output.requests[0].name, "ui");
        assert!(output.manifest.iter().all(|r| r.package.as_deref() == Some("ui")));
    }

    #[test]
    fn two_scenes_in_one_bundle_abort() {
        let catalog = MemoryCatalog::new()
            .with_asset(AssetRecord::new("A", "Assets/a.unity", "Scene"))
            .with_asset(AssetRecord::new("B", "Assets/b.unity", "Scene"));
        let config = BuildConfig {
            overrides: vec![OverrideRule::new("Assets/", "levels")],
            ..BuildConfig::default()
        };

        let result = GraphBuilder::new(&catalog).with_config(config).build();
        assert!(matches!(
            result,
            Err(BundleGraphError::StructuralViolation { .. })
        ));
    }

    #[test]
    fn invalid_config_rejected_before_work() {
        let catalog = MemoryCatalog::new();
        let config = BuildConfig {
            overrides: vec![OverrideRule::new("Assets/", "")],
            ..BuildConfig::default()
        };

        let result = GraphBuilder::new(&catalog).with_config(config).build();
        assert!(matches!(result, Err(BundleGraphError::InvalidConfig(_))));
    }

    #[test]
    fn placeholders_never_get_bundles() {
        let catalog = MemoryCatalog::new()
            .with_asset(AssetRecord::new("hero", "Assets/hero.prefab", "Prefab"))
            .with_dependency("Assets/hero.prefab", "Packages/missing.mat");

        let output = GraphBuilder::new(&catalog).build().expect("build");

        assert_eq!(output.report.placeholders, 1);
        assert_eq!(output.requests.len(), 1);
        assert!(request_for(&output, "Packages/missing.mat").is_none());
    }

    #[test]
    fn custom_strategy_is_used() {
        fn always_container(record: &AssetRecord, _: &dyn AssetCatalog) -> AssetKind {
            AssetKind::SubAsset {
                container: format!("{}.atlas", record.path),
            }
        }
        let catalog = MemoryCatalog::new()
            .with_asset(AssetRecord::new("glyph", "Fonts/a", "Glyph"))
            .with_dependency("Fonts/a", "Fonts/unrelated.png");

        let builder = GraphBuilder::new(&catalog).with_strategy("Glyph", always_container);
        let config = builder.config().clone();
        let mut strategies = NodeStrategies::from_config(&config);
        strategies.register("Glyph", always_container);
        let ids = Blake3ContentId;
        let mut ctx = BuildContext::new(&catalog, &config, &ids).with_strategies(strategies);
        ctx.catalog_assets().expect("catalog");
        ctx.expand_dependencies().expect("expand");

        assert!(ctx.assets().key_of("Fonts/a.atlas").is_some());
        assert!(ctx.assets().key_of("Fonts/unrelated.png").is_none());
        assert!(builder.build().is_ok());
    }

    #[test]
    fn phases_can_be_driven_one_by_one() {
        let catalog = MemoryCatalog::new()
            .with_asset(AssetRecord::new("hero", "Assets/hero.prefab", "Prefab"))
            .with_asset(AssetRecord::new("", "Assets/hero.png", "Texture"))
            .with_dependency("Assets/hero.prefab", "Assets/hero.png");
        let config = BuildConfig::default();
        let ids = Blake3ContentId;
        let mut ctx = BuildContext::new(&catalog, &config, &ids);

        ctx.ingest_overrides().expect("overrides");
        ctx.catalog_assets().expect("catalog");
        ctx.expand_dependencies().expect("expand");
        ctx.assign_bundles().expect("assign");
        ctx.build_bundle_graph().expect("graph");
        assert_eq!(ctx.bundles().len(), 2);
        assert_eq!(ctx.report().bundle_edges, 1);

        ctx.reduce().expect("reduce");
        assert_eq!(ctx.bundles().len(), 1);
        assert_eq!(ctx.emit_build_list().len(), 1);
    }

    #[test]
    fn colliding_override_ids_rejected() {
        let catalog = MemoryCatalog::new()
            .with_asset(AssetRecord::new("a", "Assets/a.prefab", "Prefab"))
            .with_asset(AssetRecord::new("b", "Assets/b.prefab", "Prefab"));
        let config = BuildConfig {
            overrides: vec![
                OverrideRule::new("Assets/a.prefab", "ui.hd"),
                OverrideRule::new("Assets/b.prefab", "ui").with_variant("hd"),
            ],
            ..BuildConfig::default()
        };

        let result = GraphBuilder::new(&catalog).with_config(config).build();
        assert!(matches!(result, Err(BundleGraphError::InvalidConfig(_))));
    }

    #[test]
    fn package_colliding_with_override_rejected() {
        let catalog = MemoryCatalog::new()
            .with_asset(
                AssetRecord::new("a", "Assets/a.prefab", "Prefab").with_package("ui.hd"),
            )
            .with_asset(AssetRecord::new("b", "Assets/b.prefab", "Prefab"));
        let config = BuildConfig {
            overrides: vec![OverrideRule::new("Assets/b.prefab", "ui.hd")],
            ..BuildConfig::default()
        };

        let result = GraphBuilder::new(&catalog).with_config(config).build();
        assert!(matches!(result, Err(BundleGraphError::InvalidConfig(_))));
    }

    #[test]
    fn placeholder_chain_keeps_texture_with_prefab() {
        let catalog = MemoryCatalog::new()
            .with_asset(AssetRecord::new("hero", "Assets/hero.prefab", "Prefab"))
            .with_asset(AssetRecord::new("", "Assets/hero.png", "Texture"))
            .with_dependency("Assets/hero.prefab", "Packages/missing.mat")
            .with_dependency("Packages/missing.mat", "Assets/hero.png");

        let output = GraphBuilder::new(&catalog).build().expect("build");

        assert_eq!(output.report.placeholders, 1);
        assert_eq!(output.requests.len(), 1);
        assert_eq!(
            output.requests[0].asset_paths,
            vec!["Assets/hero.prefab", "Assets/hero.png"]
        );
        assert_eq!(output.report.bundles_inlined, 1);
    }
}
