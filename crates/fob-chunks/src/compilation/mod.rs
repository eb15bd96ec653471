//! Host compilation interface.
//!
//! The chunks plugin never owns the module graph or the output file system.
//! It reads entrypoints and assets from a [`Compilation`] and hands generated
//! files back through [`Compilation::emit_asset`]. The Rolldown adapter lives
//! in `fob-plugin-chunks`; [`MemoryCompilation`] is a self-contained host for
//! tests and embedders.

mod memory;
pub mod writer;

pub use memory::MemoryCompilation;

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Immutable text content of an asset.
///
/// Cloning is cheap (reference counted), so the same source can be emitted,
/// cached and fingerprinted without copying.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawSource(Arc<str>);

impl RawSource {
    pub fn new(content: impl Into<Arc<str>>) -> Self {
        Self(content.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Size in bytes.
    pub fn size(&self) -> usize {
        self.0.len()
    }
}

impl From<String> for RawSource {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for RawSource {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl std::fmt::Display for RawSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One output file of the build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub name: String,
    pub source: RawSource,
}

impl Asset {
    pub fn new(name: impl Into<String>, source: impl Into<RawSource>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }
}

/// The host's configured public path.
#[derive(Clone, Default)]
pub enum PublicPathConfig {
    /// No public path configured, equivalent to `Literal("")`.
    #[default]
    None,
    /// A fixed prefix such as `/dist/` or `https://cdn.example.com/`.
    Literal(String),
    /// The `auto` sentinel: fragments reference assets relative to their own location.
    Auto,
    /// Computed when the compilation runs.
    Function(Arc<dyn Fn() -> String + Send + Sync>),
}

impl PublicPathConfig {
    /// Parse a configured value, recognizing the `auto` sentinel.
    pub fn parse(value: &str) -> Self {
        if value == "auto" {
            PublicPathConfig::Auto
        } else {
            PublicPathConfig::Literal(value.to_string())
        }
    }

    pub fn function<F>(f: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        PublicPathConfig::Function(Arc::new(f))
    }
}

impl std::fmt::Debug for PublicPathConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PublicPathConfig::None => f.write_str("None"),
            PublicPathConfig::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            PublicPathConfig::Auto => f.write_str("Auto"),
            PublicPathConfig::Function(_) => f.write_str("Function(..)"),
        }
    }
}

/// Output configuration of the host compilation.
#[derive(Debug, Clone, Default)]
pub struct OutputOptions {
    pub public_path: PublicPathConfig,
    /// Output root directory. Only its shape matters for `auto` public paths.
    pub path: Option<PathBuf>,
    /// Build context directory, the fallback root for `auto` public paths.
    pub context: Option<PathBuf>,
}

impl OutputOptions {
    pub fn new(public_path: PublicPathConfig) -> Self {
        Self {
            public_path,
            path: None,
            context: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<PathBuf>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// The part of a bundler compilation the chunks plugin talks to.
///
/// Implementations must be usable from several concurrently running entry
/// tasks, hence `&self` everywhere and the `Send + Sync` bound.
pub trait Compilation: Send + Sync {
    fn output_options(&self) -> &OutputOptions;

    /// `false` when the host exposes no entrypoint registry at all.
    fn has_entrypoints(&self) -> bool;

    /// Entrypoint names in registry order.
    fn entrypoint_names(&self) -> Vec<String>;

    /// The materialized output files of an entrypoint, in order.
    ///
    /// `None` when no entrypoint has that name.
    fn entrypoint_files(&self, entry_name: &str) -> Option<Vec<String>>;

    fn get_asset(&self, name: &str) -> Option<Asset>;

    /// Register a new build output.
    fn emit_asset(&self, filename: &str, source: RawSource) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_source_is_shared_text() {
        let source = RawSource::from("<script></script>");
        let copy = source.clone();
        assert_eq!(copy.as_str(), "<script></script>");
        assert_eq!(copy.size(), 17);
        assert_eq!(source, copy);
    }

    #[test]
    fn public_path_parse_recognizes_auto() {
        assert!(matches!(PublicPathConfig::parse("auto"), PublicPathConfig::Auto));
        assert!(matches!(
            PublicPathConfig::parse("/dist/"),
            PublicPathConfig::Literal(ref p) if p == "/dist/"
        ));
        assert_eq!(
            format!("{:?}", PublicPathConfig::function(|| "/x/".to_string())),
            "Function(..)"
        );
    }
}
