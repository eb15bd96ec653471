//! The chunks manifest.
//!
//! `chunks-manifest.json` maps every entrypoint that produced fragments to
//! its style and script paths:
//!
//! ```json
//! {
//!   "home": {
//!     "styles": ["/dist/home.css"],
//!     "scripts": ["/dist/vendors.js", "/dist/home.js"]
//!   }
//! }
//! ```
//!
//! Keys are serialized in insertion order. The manifest's cache fingerprint
//! is computed from the fragments sorted by entry name, so it does not depend
//! on the order in which entrypoints finished.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::cache::{CachedItem, ContentCache, ETag, fold_etags};
use crate::compilation::{Compilation, RawSource};
use crate::emit::emit;
use crate::error::Result;
use crate::extension::AssetKind;

/// File name of the manifest, which is also its cache key.
pub const MANIFEST_FILENAME: &str = "chunks-manifest.json";

/// Paths of one entrypoint. Both lists are always present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub styles: Vec<String>,
    pub scripts: Vec<String>,
}

impl ManifestEntry {
    pub fn get(&self, kind: AssetKind) -> &[String] {
        match kind {
            AssetKind::Style => &self.styles,
            AssetKind::Script => &self.scripts,
        }
    }

    fn get_mut(&mut self, kind: AssetKind) -> &mut Vec<String> {
        match kind {
            AssetKind::Style => &mut self.styles,
            AssetKind::Script => &mut self.scripts,
        }
    }
}

/// Entry name to [`ManifestEntry`], in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest(IndexMap<String, ManifestEntry>);

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the paths of one `(entry, kind)` pair, creating the entry if needed.
    pub fn record(&mut self, entry_name: &str, kind: AssetKind, paths: Vec<String>) {
        *self
            .0
            .entry(entry_name.to_string())
            .or_default()
            .get_mut(kind) = paths;
    }

    pub fn get(&self, entry_name: &str) -> Option<&ManifestEntry> {
        self.0.get(entry_name)
    }

    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Pretty JSON with 2-space indentation, keys in insertion order.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Fragments produced for one asset kind, as `(entry_name, source)`.
pub type Accumulator = Vec<(String, RawSource)>;

/// Fingerprint of the manifest inputs.
///
/// Both accumulators are sorted by entry name, styles are followed by
/// scripts, and the fragment fingerprints are folded left to right. `None`
/// when no fragment was produced.
pub fn manifest_etag(
    cache: &dyn ContentCache,
    styles: &[(String, RawSource)],
    scripts: &[(String, RawSource)],
) -> Option<ETag> {
    let etags = sorted_by_entry(styles)
        .into_iter()
        .chain(sorted_by_entry(scripts))
        .map(|(_, source)| cache.etag(source));

    fold_etags(cache, etags)
}

fn sorted_by_entry(items: &[(String, RawSource)]) -> Vec<&(String, RawSource)> {
    let mut items: Vec<_> = items.iter().collect();
    items.sort_by(|a, b| a.0.cmp(&b.0));
    items
}

/// Cache and emit the manifest.
///
/// Returns the manifest fingerprint, or `None` when both accumulators are
/// empty, in which case nothing is emitted.
pub async fn emit_manifest(
    compilation: &dyn Compilation,
    cache: &dyn ContentCache,
    manifest: &Manifest,
    styles: &[(String, RawSource)],
    scripts: &[(String, RawSource)],
) -> Result<Option<ETag>> {
    let Some(etag) = manifest_etag(cache, styles, scripts) else {
        tracing::debug!("no fragments produced, skipping chunks manifest");
        return Ok(None);
    };

    let source = match cache.get(MANIFEST_FILENAME, &etag).await? {
        Some(CachedItem::Manifest(source)) => {
            tracing::debug!(key = MANIFEST_FILENAME, etag = %etag, "cache hit");
            source
        }
        _ => {
            tracing::debug!(key = MANIFEST_FILENAME, etag = %etag, "cache miss");
            let source = RawSource::from(manifest.to_json()?);
            cache
                .store(MANIFEST_FILENAME, &etag, CachedItem::Manifest(source.clone()))
                .await?;
            source
        }
    };

    emit(compilation, MANIFEST_FILENAME, source)?;
    Ok(Some(etag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::{MemoryCompilation, OutputOptions};

    fn acc(items: &[(&str, &str)]) -> Accumulator {
        items
            .iter()
            .map(|(name, source)| (name.to_string(), RawSource::from(*source)))
            .collect()
    }

    #[test]
    fn record_keeps_both_lists() {
        let mut manifest = Manifest::new();
        manifest.record("home", AssetKind::Style, vec!["/a.css".to_string()]);

        let entry = manifest.get("home").unwrap();
        assert_eq!(entry.styles, vec!["/a.css"]);
        assert!(entry.scripts.is_empty());
        assert_eq!(
            manifest.to_json().unwrap(),
            "{\n  \"home\": {\n    \"styles\": [\n      \"/a.css\"\n    ],\n    \"scripts\": []\n  }\n}"
        );
    }

    #[test]
    fn serializes_in_insertion_order() {
        let mut manifest = Manifest::new();
        manifest.record("b", AssetKind::Script, vec!["b.js".to_string()]);
        manifest.record("a", AssetKind::Script, vec!["a.js".to_string()]);

        let json = manifest.to_json().unwrap();
        assert!(json.find("\"b\"").unwrap() < json.find("\"a\"").unwrap());
        assert_eq!(manifest.entry_names().collect::<Vec<_>>(), vec!["b", "a"]);
    }

    #[test]
    fn etag_ignores_accumulation_order() {
        let cache = MemoryCache::new();
        let forward = manifest_etag(
            &cache,
            &acc(&[("a", "<link a>"), ("b", "<link b>")]),
            &acc(&[("a", "<script a>")]),
        );
        let backward = manifest_etag(
            &cache,
            &acc(&[("b", "<link b>"), ("a", "<link a>")]),
            &acc(&[("a", "<script a>")]),
        );
        assert_eq!(forward, backward);
        assert!(forward.is_some());
    }

    #[test]
    fn etag_puts_styles_before_scripts() {
        let cache = MemoryCache::new();
        let style = RawSource::from("s");
        let script = RawSource::from("j");

        let etag = manifest_etag(
            &cache,
            &[("home".to_string(), style.clone())],
            &[("home".to_string(), script.clone())],
        )
        .unwrap();
        assert_eq!(etag, ETag::of(&style).merge(&ETag::of(&script)));

        let single = manifest_etag(&cache, &[("home".to_string(), style.clone())], &[]);
        assert_eq!(single, Some(ETag::of(&style)));
        assert_eq!(manifest_etag(&cache, &[], &[]), None);
    }

    #[tokio::test]
    async fn empty_accumulators_emit_nothing() {
        let compilation = MemoryCompilation::new(OutputOptions::default());
        let cache = MemoryCache::new();

        let etag = emit_manifest(&compilation, &cache, &Manifest::new(), &[], &[])
            .await
            .unwrap();

        assert_eq!(etag, None);
        assert!(compilation.emitted().is_empty());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn cached_manifest_is_reused() {
        let compilation = MemoryCompilation::new(OutputOptions::default());
        let cache = MemoryCache::new();
        let styles = acc(&[("home", "<link>")]);

        let mut first = Manifest::new();
        first.record("home", AssetKind::Style, vec!["home.css".to_string()]);
        emit_manifest(&compilation, &cache, &first, &styles, &[])
            .await
            .unwrap();

        // Same fragments, different manifest value: the cached JSON wins.
        let mut second = Manifest::new();
        second.record("home", AssetKind::Style, vec!["other.css".to_string()]);
        emit_manifest(&compilation, &cache, &second, &styles, &[])
            .await
            .unwrap();

        let emitted = compilation.emitted();
        assert_eq!(emitted.len(), 2);
        assert_eq!(emitted[0].1, emitted[1].1);
        assert!(emitted[1].1.as_str().contains("home.css"));
        assert_eq!(cache.stats().hits, 1);
    }
}
