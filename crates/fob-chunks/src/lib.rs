#![cfg_attr(docsrs, feature(doc_cfg))]

//! # fob-chunks
//!
//! HTML tag fragments and a chunks manifest for bundler entrypoints.
//!
//! After a build, every entrypoint gets one fragment per asset kind
//! (`home-styles.html`, `home-scripts.html`) holding the `<link>`/`<script>`
//! tags of its output files, ready to be included by server-rendered pages.
//! Optionally a `chunks-manifest.json` lists the same paths per entrypoint.
//!
//! Fragments and the manifest are cached under content fingerprints
//! ([`ETag`]), so rebuilds with unchanged outputs reuse the previous
//! artifacts instead of recomputing them.
//!
//! The crate is host-agnostic: the build is seen through the [`Compilation`]
//! trait and the cache through [`ContentCache`]. `fob-plugin-chunks` plugs
//! it into Rolldown.
//!
//! ## Quick Start
//!
//! ```
//! use fob_chunks::{
//!     ChunksPlugin, ChunksPluginOptions, MemoryCache, MemoryCompilation, OutputOptions,
//!     PublicPathConfig,
//! };
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> fob_chunks::Result<()> {
//! let plugin = ChunksPlugin::new(ChunksPluginOptions::new().generate_chunks_manifest(true))?;
//! let cache = MemoryCache::new();
//!
//! let compilation = MemoryCompilation::new(OutputOptions::new(PublicPathConfig::parse("/dist/")))
//!     .with_entrypoint("home", ["home.css", "home.js", "home.js.map"])
//!     .with_asset("home.css", "body{}")
//!     .with_asset("home.js", "console.log(1)")
//!     .with_asset("home.js.map", "{}");
//!
//! plugin.process_assets(&compilation, &cache).await?;
//!
//! assert_eq!(
//!     compilation.emitted_asset("home-scripts.html").unwrap().as_str(),
//!     r#"<script defer src="/dist/home.js"></script>"#
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Logging
//!
//! The crate emits `tracing` events. Enable the `logging` feature for
//! [`logging::init_logging`] when no subscriber is installed yet.

pub mod cache;
pub mod compilation;
pub mod config;
pub mod dependencies;
pub mod emit;
mod error;
pub mod extension;
pub mod format;
pub mod manifest;
pub mod options;
pub mod plugin;
pub mod public_path;
pub mod template;

#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub mod logging;

pub use cache::{
    CacheConfig, CacheError, CacheResult, CacheStats, CachedItem, ContentCache, ETag,
    MemoryCache, PersistentCache, fold_etags,
};
pub use compilation::{Asset, Compilation, MemoryCompilation, OutputOptions, PublicPathConfig, RawSource};
pub use config::ChunksConfig;
pub use dependencies::{FilesDependencies, collect};
pub use emit::{EntryCache, fragment_filename};
pub use error::{Error, Result};
pub use extension::{AssetKind, classify};
pub use format::AssetData;
pub use manifest::{MANIFEST_FILENAME, Manifest, ManifestEntry};
pub use options::ChunksPluginOptions;
pub use plugin::{ChunksPlugin, ChunksReport};
pub use public_path::{ResolvedPublicPath, resolve_public_path};
pub use template::Template;
