//! Rolldown plugin for `fob-chunks`
//!
//! Runs in the `generate_bundle` hook, after Rolldown has produced every
//! chunk and asset. Each entry chunk gets `<name>-styles.html` and
//! `<name>-scripts.html` fragments, and optionally a `chunks-manifest.json`,
//! which are added to the bundle as assets.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use fob_chunks::{ChunksPluginOptions, MemoryCache, OutputOptions, PublicPathConfig};
//! use fob_plugin_chunks::FobChunksPlugin;
//!
//! # fn example() -> fob_chunks::Result<()> {
//! let plugin = FobChunksPlugin::new(
//!     ChunksPluginOptions::new().generate_chunks_manifest(true),
//!     Arc::new(MemoryCache::new()),
//!     OutputOptions::new(PublicPathConfig::parse("/dist/")),
//! )?;
//! // Register `Arc::new(plugin)` with your Rolldown bundler configuration
//! # Ok(())
//! # }
//! ```

use std::borrow::Cow;
use std::sync::Arc;

use anyhow::Context;
use fob_chunks::{
    ChunksConfig, ChunksPlugin, ChunksPluginOptions, ContentCache, MemoryCache, OutputOptions,
};
use rolldown_plugin::{HookGenerateBundleArgs, HookNoopReturn, HookUsage, Plugin, PluginContext};

mod bundle;
pub use bundle::{compilation_from_bundle, emitted_outputs, replace_outputs};

/// Rolldown plugin emitting HTML tag fragments and a chunks manifest.
///
/// The cache is shared across builds, so watch-mode rebuilds reuse
/// fragments whose assets did not change.
#[derive(Clone)]
pub struct FobChunksPlugin {
    chunks: Arc<ChunksPlugin>,
    cache: Arc<dyn ContentCache>,
    output: OutputOptions,
}

impl FobChunksPlugin {
    /// Validate `options` and create the plugin.
    pub fn new(
        options: ChunksPluginOptions,
        cache: Arc<dyn ContentCache>,
        output: OutputOptions,
    ) -> fob_chunks::Result<Self> {
        Ok(Self {
            chunks: Arc::new(ChunksPlugin::new(options)?),
            cache,
            output,
        })
    }

    /// Create the plugin from loaded configuration.
    ///
    /// Uses a persistent cache when `cache_dir` is configured and an
    /// in-memory cache otherwise. The persistent cache is scoped to the
    /// options fingerprint, so changed options start from a cold cache.
    pub fn from_config(config: ChunksConfig, output: OutputOptions) -> fob_chunks::Result<Self> {
        let cache_config = config.cache_config();
        let options = config.into_options()?;

        let cache: Arc<dyn ContentCache> = match cache_config {
            Some(cache_config) => Arc::new(
                cache_config
                    .with_scope(options.fingerprint(&output))
                    .open()?,
            ),
            None => Arc::new(MemoryCache::new()),
        };
        Self::new(options, cache, output)
    }

    pub fn options(&self) -> &ChunksPluginOptions {
        self.chunks.options()
    }
}

impl std::fmt::Debug for FobChunksPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FobChunksPlugin")
            .field("options", self.chunks.options())
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}

impl Plugin for FobChunksPlugin {
    fn name(&self) -> Cow<'static, str> {
        ChunksPlugin::NAME.into()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::GenerateBundle
    }

    fn generate_bundle(
        &self,
        _ctx: &PluginContext,
        args: &mut HookGenerateBundleArgs<'_>,
    ) -> impl std::future::Future<Output = HookNoopReturn> + Send {
        let chunks = Arc::clone(&self.chunks);
        let cache = Arc::clone(&self.cache);
        let output = self.output.clone();

        async move {
            let compilation = compilation_from_bundle(args.bundle.as_slice(), output);
            let report = chunks
                .process_assets(&compilation, cache.as_ref())
                .await
                .context("Failed to generate chunk fragments")?;

            let assets = emitted_outputs(compilation.emitted());
            tracing::debug!(
                assets = assets.len(),
                manifest = report.manifest_emitted,
                "adding chunk fragments to bundle"
            );
            replace_outputs(args.bundle, assets);

            Ok(())
        }
    }
}
