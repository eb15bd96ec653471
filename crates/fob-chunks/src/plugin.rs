//! The chunks pipeline.
//!
//! For every entrypoint, concurrently: collect its styles and scripts,
//! resolve the public path, then for each kind fingerprint the assets,
//! reuse or compute the fragment, and emit it. Once every entrypoint has
//! settled, the results are merged in entrypoint order and the manifest is
//! fingerprinted, cached and emitted.

use futures::future::try_join_all;

use crate::cache::{CachedItem, ContentCache, ETag, fold_etags};
use crate::compilation::{Asset, Compilation};
use crate::dependencies::collect;
use crate::emit::{EntryCache, emit, fragment_filename};
use crate::error::Result;
use crate::extension::AssetKind;
use crate::format::format;
use crate::manifest::{Accumulator, Manifest, emit_manifest};
use crate::options::ChunksPluginOptions;
use crate::public_path::{ResolvedPublicPath, resolve_public_path};

/// Generates HTML tag fragments and the chunks manifest for a compilation.
///
/// ```
/// use fob_chunks::{
///     ChunksPlugin, ChunksPluginOptions, MemoryCache, MemoryCompilation, OutputOptions,
///     PublicPathConfig,
/// };
///
/// # async fn run() -> fob_chunks::Result<()> {
/// let plugin = ChunksPlugin::new(ChunksPluginOptions::new().generate_chunks_manifest(true))?;
/// let compilation = MemoryCompilation::new(OutputOptions::new(PublicPathConfig::parse("/dist/")))
///     .with_entrypoint("home", ["home.css", "home.js"])
///     .with_asset("home.css", "body{}")
///     .with_asset("home.js", "console.log(1)");
///
/// let report = plugin.process_assets(&compilation, &MemoryCache::new()).await?;
/// assert_eq!(report.fragments, vec!["home-styles.html", "home-scripts.html"]);
/// assert!(report.manifest_emitted);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ChunksPlugin {
    options: ChunksPluginOptions,
}

/// Outcome of one [`ChunksPlugin::process_assets`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunksReport {
    /// Entrypoints that had at least one style or script.
    pub entries_processed: usize,
    /// Emitted fragment filenames, in entrypoint order, styles before scripts.
    pub fragments: Vec<String>,
    pub manifest_emitted: bool,
    /// Fingerprint the manifest was cached under, when it was emitted.
    pub manifest_etag: Option<ETag>,
    pub manifest: Manifest,
    pub cache_hits: usize,
    pub cache_misses: usize,
}

/// One `(entry, kind)` fragment, reused or freshly computed.
struct Fragment {
    entry: EntryCache,
    cache_hit: bool,
}

struct EntryOutcome {
    name: String,
    styles: Option<Fragment>,
    scripts: Option<Fragment>,
}

impl ChunksPlugin {
    pub const NAME: &'static str = "fob-chunks";

    /// Validate `options` and create the plugin.
    pub fn new(options: ChunksPluginOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &ChunksPluginOptions {
        &self.options
    }

    /// Generate and emit fragments and the manifest for `compilation`.
    ///
    /// Cache and host failures abort the run and are returned unchanged.
    pub async fn process_assets(
        &self,
        compilation: &dyn Compilation,
        cache: &dyn ContentCache,
    ) -> Result<ChunksReport> {
        let entry_names = compilation.entrypoint_names();

        let outcomes = try_join_all(
            entry_names
                .iter()
                .map(|name| self.process_entry(compilation, cache, name)),
        )
        .await?;

        let mut report = ChunksReport::default();
        let mut styles: Accumulator = Vec::new();
        let mut scripts: Accumulator = Vec::new();

        for outcome in outcomes {
            if outcome.styles.is_none() && outcome.scripts.is_none() {
                continue;
            }
            report.entries_processed += 1;

            for (kind, fragment) in [
                (AssetKind::Style, outcome.styles),
                (AssetKind::Script, outcome.scripts),
            ] {
                let Some(Fragment { entry, cache_hit }) = fragment else {
                    report.manifest.record(&outcome.name, kind, Vec::new());
                    continue;
                };

                if cache_hit {
                    report.cache_hits += 1;
                } else {
                    report.cache_misses += 1;
                }
                if self.options.generate_chunks_files {
                    report.fragments.push(entry.filename.clone());
                }

                report.manifest.record(&outcome.name, kind, entry.file_path);
                let accumulator = match kind {
                    AssetKind::Style => &mut styles,
                    AssetKind::Script => &mut scripts,
                };
                accumulator.push((outcome.name.clone(), entry.source));
            }
        }

        if self.options.generate_chunks_manifest {
            report.manifest_etag =
                emit_manifest(compilation, cache, &report.manifest, &styles, &scripts).await?;
            report.manifest_emitted = report.manifest_etag.is_some();
        }

        tracing::info!(
            entries = report.entries_processed,
            fragments = report.fragments.len(),
            cache_hits = report.cache_hits,
            cache_misses = report.cache_misses,
            manifest = report.manifest_emitted,
            "chunks generated"
        );

        Ok(report)
    }

    async fn process_entry(
        &self,
        compilation: &dyn Compilation,
        cache: &dyn ContentCache,
        entry_name: &str,
    ) -> Result<EntryOutcome> {
        let deps = collect(compilation, entry_name);

        if deps.is_empty() {
            tracing::debug!(entry = entry_name, "no styles or scripts, skipping entry");
            return Ok(EntryOutcome {
                name: entry_name.to_string(),
                styles: None,
                scripts: None,
            });
        }

        let public_path =
            resolve_public_path(compilation.output_options(), entry_name, &self.options.filename);

        let (styles, scripts) = futures::try_join!(
            self.process_kind(
                compilation,
                cache,
                entry_name,
                AssetKind::Style,
                &deps.styles,
                &public_path
            ),
            self.process_kind(
                compilation,
                cache,
                entry_name,
                AssetKind::Script,
                &deps.scripts,
                &public_path
            ),
        )?;

        Ok(EntryOutcome {
            name: entry_name.to_string(),
            styles,
            scripts,
        })
    }

    async fn process_kind(
        &self,
        compilation: &dyn Compilation,
        cache: &dyn ContentCache,
        entry_name: &str,
        kind: AssetKind,
        assets: &[Asset],
        public_path: &ResolvedPublicPath,
    ) -> Result<Option<Fragment>> {
        let etags = assets.iter().map(|asset| cache.etag(&asset.source));
        let Some(etag) = fold_etags(cache, etags) else {
            return Ok(None);
        };

        let key = kind.cache_key(entry_name);

        let (entry, cache_hit) = match cache.get(&key, &etag).await? {
            Some(CachedItem::Entry(entry)) => {
                tracing::debug!(key = %key, etag = %etag, "cache hit");
                (entry, true)
            }
            _ => {
                tracing::debug!(key = %key, etag = %etag, "cache miss");
                let data = format(self.options.template(kind), assets, entry_name, public_path);
                let filename = fragment_filename(&self.options.filename, entry_name, kind);
                let entry = EntryCache::new(data, filename);
                cache
                    .store(&key, &etag, CachedItem::Entry(entry.clone()))
                    .await?;
                (entry, false)
            }
        };

        if self.options.generate_chunks_files {
            emit(compilation, &entry.filename, entry.source.clone())?;
        }

        Ok(Some(Fragment { entry, cache_hit }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::template::Template;
    use crate::{MemoryCompilation, OutputOptions, PublicPathConfig};

    fn compilation() -> MemoryCompilation {
        MemoryCompilation::new(OutputOptions::new(PublicPathConfig::parse("/dist/")))
    }

    #[test]
    fn invalid_options_fail_construction() {
        let result = ChunksPlugin::new(ChunksPluginOptions::new().filename("[type].html"));
        assert!(result.is_err());

        let result = ChunksPlugin::new(ChunksPluginOptions::new().filename("[name].html"));
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn files_disabled_still_builds_the_manifest() {
        let plugin = ChunksPlugin::new(
            ChunksPluginOptions::new()
                .generate_chunks_files(false)
                .generate_chunks_manifest(true),
        )
        .unwrap();
        let compilation = compilation()
            .with_entrypoint("home", ["home.js"])
            .with_asset("home.js", "h()");

        let report = plugin
            .process_assets(&compilation, &MemoryCache::new())
            .await
            .unwrap();

        assert!(report.fragments.is_empty());
        assert_eq!(compilation.emitted_filenames(), vec!["chunks-manifest.json"]);
        assert_eq!(
            report.manifest.get("home").unwrap().scripts,
            vec!["/dist/home.js"]
        );
    }

    #[tokio::test]
    async fn manifest_disabled_emits_only_fragments() {
        let plugin = ChunksPlugin::new(ChunksPluginOptions::new()).unwrap();
        let compilation = compilation()
            .with_entrypoint("home", ["home.css"])
            .with_asset("home.css", "h{}");

        let report = plugin
            .process_assets(&compilation, &MemoryCache::new())
            .await
            .unwrap();

        assert!(!report.manifest_emitted);
        assert_eq!(report.manifest_etag, None);
        assert_eq!(compilation.emitted_filenames(), vec!["home-styles.html"]);
    }

    #[tokio::test]
    async fn single_asset_fragment_uses_the_leaf_etag() {
        let plugin = ChunksPlugin::new(ChunksPluginOptions::new()).unwrap();
        let compilation = compilation()
            .with_entrypoint("home", ["home.js"])
            .with_asset("home.js", "h()");
        let cache = MemoryCache::new();

        plugin.process_assets(&compilation, &cache).await.unwrap();

        assert_eq!(
            cache.etag_for("js|home"),
            Some(ETag::of(&"h()".into()))
        );
        assert_eq!(cache.etag_for("css|home"), None);
    }

    #[tokio::test]
    async fn per_entry_templates() {
        let plugin = ChunksPlugin::new(ChunksPluginOptions::new().template_script(
            Template::function(|url, entry| format!("<script data-entry=\"{entry}\" src=\"{url}\"></script>")),
        ))
        .unwrap();
        let compilation = compilation()
            .with_entrypoint("admin", ["admin.js"])
            .with_asset("admin.js", "a()");

        plugin
            .process_assets(&compilation, &MemoryCache::new())
            .await
            .unwrap();

        assert_eq!(
            compilation.emitted_asset("admin-scripts.html").unwrap().as_str(),
            "<script data-entry=\"admin\" src=\"/dist/admin.js\"></script>"
        );
    }
}
