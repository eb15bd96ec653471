use std::path::Path;

use indexmap::IndexMap;
use parking_lot::Mutex;

use super::{Asset, Compilation, OutputOptions, RawSource, writer};
use crate::Result;

/// In-memory compilation.
///
/// Holds entrypoints (in insertion order), the asset table, and every asset
/// emitted through [`Compilation::emit_asset`]. Emitting a filename twice
/// keeps the last source, but the log in [`emitted`](Self::emitted) records
/// both calls.
///
/// # Example
///
/// ```
/// use fob_chunks::{Compilation, MemoryCompilation, OutputOptions, PublicPathConfig};
///
/// let compilation = MemoryCompilation::new(OutputOptions::new(PublicPathConfig::parse("/dist/")))
///     .with_entrypoint("home", ["home.css", "home.js"])
///     .with_asset("home.css", "body{}")
///     .with_asset("home.js", "console.log(1)");
///
/// assert_eq!(compilation.entrypoint_names(), vec!["home".to_string()]);
/// ```
#[derive(Debug)]
pub struct MemoryCompilation {
    output: OutputOptions,
    entrypoints: Option<IndexMap<String, Vec<String>>>,
    assets: IndexMap<String, RawSource>,
    emitted: Mutex<Vec<(String, RawSource)>>,
}

impl MemoryCompilation {
    /// Create a compilation with an empty entrypoint registry.
    pub fn new(output: OutputOptions) -> Self {
        Self {
            output,
            entrypoints: Some(IndexMap::new()),
            assets: IndexMap::new(),
            emitted: Mutex::new(Vec::new()),
        }
    }

    /// Create a compilation whose host exposes no entrypoint registry.
    pub fn without_entrypoints(output: OutputOptions) -> Self {
        Self {
            entrypoints: None,
            ..Self::new(output)
        }
    }

    pub fn with_entrypoint<I, S>(mut self, name: impl Into<String>, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entrypoints
            .get_or_insert_with(IndexMap::new)
            .insert(name.into(), files.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_asset(mut self, name: impl Into<String>, source: impl Into<RawSource>) -> Self {
        self.assets.insert(name.into(), source.into());
        self
    }

    /// Replace the content of an existing asset, e.g. to simulate a rebuild.
    pub fn set_asset(&mut self, name: impl Into<String>, source: impl Into<RawSource>) {
        self.assets.insert(name.into(), source.into());
    }

    /// Every `emit_asset` call so far, in call order.
    pub fn emitted(&self) -> Vec<(String, RawSource)> {
        self.emitted.lock().clone()
    }

    /// Last emitted source for a filename.
    pub fn emitted_asset(&self, filename: &str) -> Option<RawSource> {
        self.emitted
            .lock()
            .iter()
            .rev()
            .find(|(name, _)| name == filename)
            .map(|(_, source)| source.clone())
    }

    /// Emitted filenames, in call order.
    pub fn emitted_filenames(&self) -> Vec<String> {
        self.emitted
            .lock()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Forget emitted assets so the compilation can be processed again.
    pub fn clear_emitted(&self) {
        self.emitted.lock().clear();
    }

    /// Write every emitted asset below `dir`.
    ///
    /// See [`writer::write_assets_to`] for the path rules.
    pub fn write_to(&self, dir: &Path, overwrite: bool) -> Result<()> {
        let mut latest: IndexMap<String, RawSource> = IndexMap::new();
        for (name, source) in self.emitted.lock().iter() {
            latest.insert(name.clone(), source.clone());
        }
        writer::write_assets_to(latest.iter().map(|(n, s)| (n.as_str(), s)), dir, overwrite)
    }
}

impl Compilation for MemoryCompilation {
    fn output_options(&self) -> &OutputOptions {
        &self.output
    }

    fn has_entrypoints(&self) -> bool {
        self.entrypoints
            .as_ref()
            .is_some_and(|entries| !entries.is_empty())
    }

    fn entrypoint_names(&self) -> Vec<String> {
        self.entrypoints
            .as_ref()
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn entrypoint_files(&self, entry_name: &str) -> Option<Vec<String>> {
        self.entrypoints.as_ref()?.get(entry_name).cloned()
    }

    fn get_asset(&self, name: &str) -> Option<Asset> {
        self.assets.get(name).map(|source| Asset {
            name: name.to_string(),
            source: source.clone(),
        })
    }

    fn emit_asset(&self, filename: &str, source: RawSource) -> Result<()> {
        tracing::trace!(filename, size = source.size(), "emit asset");
        self.emitted.lock().push((filename.to_string(), source));
        Ok(())
    }
}
