//! Turning assets into an HTML fragment and a list of manifest paths.

use serde::{Deserialize, Serialize};

use crate::compilation::Asset;
use crate::public_path::ResolvedPublicPath;
use crate::template::Template;

/// Computed artifact for one `(entry, kind)` pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetData {
    /// Public-path-prefixed asset paths, for the manifest.
    pub file_path: Vec<String>,
    /// Concatenated tags, for the fragment file.
    pub html_tags: String,
}

/// Render `assets` in order with `template`.
///
/// Manifest paths use `public_path.manifest`, tag URLs use `public_path.html`.
/// Tags are joined without a separator.
pub fn format(
    template: &Template,
    assets: &[Asset],
    entry_name: &str,
    public_path: &ResolvedPublicPath,
) -> AssetData {
    let mut data = AssetData::default();

    for asset in assets {
        data.file_path
            .push(format!("{}{}", public_path.manifest, asset.name));

        let url = format!("{}{}", public_path.html, asset.name);
        data.html_tags.push_str(&template.render(&url, entry_name));
    }

    data
}
