//! Emission-ready fragments.

use serde::{Deserialize, Serialize};

use crate::compilation::{Compilation, RawSource};
use crate::error::Result;
use crate::extension::AssetKind;
use crate::format::AssetData;

/// Cached, emission-ready form of [`AssetData`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryCache {
    /// Fragment path relative to the output root, placeholders substituted.
    pub filename: String,
    /// The fragment content (the concatenated tags).
    pub source: RawSource,
    /// Manifest paths for this `(entry, kind)` pair.
    pub file_path: Vec<String>,
}

impl EntryCache {
    pub fn new(data: AssetData, filename: String) -> Self {
        Self {
            filename,
            source: RawSource::from(data.html_tags),
            file_path: data.file_path,
        }
    }

    pub fn html_tags(&self) -> &str {
        self.source.as_str()
    }
}

/// Substitute `[name]` and `[type]` in a fragment filename pattern.
///
/// Leading slashes are dropped; fragments always land below the output root.
pub fn fragment_filename(pattern: &str, entry_name: &str, kind: AssetKind) -> String {
    pattern
        .replace("[name]", entry_name)
        .replace("[type]", kind.filename_token())
        .trim_start_matches('/')
        .to_string()
}

/// Register a generated file with the host compilation.
pub fn emit(compilation: &dyn Compilation, filename: &str, source: RawSource) -> Result<()> {
    tracing::trace!(filename, size = source.size(), "emitting chunks asset");
    compilation.emit_asset(filename, source)
}
