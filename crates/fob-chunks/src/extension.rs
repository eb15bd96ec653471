//! File classification by extension.

use serde::{Deserialize, Serialize};

/// The two kinds of output files that get HTML tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AssetKind {
    /// `.css` files, rendered as `<link rel="stylesheet">`
    Style,
    /// `.js` files, rendered as `<script>`
    Script,
}

impl AssetKind {
    /// Both kinds, styles first.
    pub const ALL: [AssetKind; 2] = [AssetKind::Style, AssetKind::Script];

    /// Prefix of the cache key for this kind (`css|<entry>`, `js|<entry>`).
    pub fn cache_type(self) -> &'static str {
        match self {
            AssetKind::Style => "css",
            AssetKind::Script => "js",
        }
    }

    /// Value substituted for `[type]` in the fragment filename pattern.
    pub fn filename_token(self) -> &'static str {
        match self {
            AssetKind::Style => "styles",
            AssetKind::Script => "scripts",
        }
    }

    /// Cache key for one `(entry, kind)` pair.
    pub fn cache_key(self, entry_name: &str) -> String {
        format!("{}|{}", self.cache_type(), entry_name)
    }
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.filename_token())
    }
}

/// Classify a file name as a style, a script, or neither.
///
/// The extension is the text after the last `.`, so `app.css.map` is not a
/// style. Files without a dot are ignored.
pub fn classify(file_name: &str) -> Option<AssetKind> {
    let (_, extension) = file_name.rsplit_once('.')?;
    match extension {
        "css" => Some(AssetKind::Style),
        "js" => Some(AssetKind::Script),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_styles_and_scripts() {
        assert_eq!(classify("a.css"), Some(AssetKind::Style));
        assert_eq!(classify("css/app-a.css"), Some(AssetKind::Style));
        assert_eq!(classify("a.js"), Some(AssetKind::Script));
        assert_eq!(classify("js/vendors.4f2a.js"), Some(AssetKind::Script));
    }

    #[test]
    fn ignores_source_maps_and_other_files() {
        assert_eq!(classify("a.css.map"), None);
        assert_eq!(classify("a.js.map"), None);
        assert_eq!(classify("a.jpg"), None);
        assert_eq!(classify("a.svg"), None);
        assert_eq!(classify("a.json"), None);
        assert_eq!(classify("a.mjs"), None);
        assert_eq!(classify("LICENSE"), None);
    }

    #[test]
    fn extension_match_is_exact() {
        assert_eq!(classify("a.CSS"), None);
        assert_eq!(classify("a.jsx"), None);
    }

    #[test]
    fn cache_keys_and_tokens() {
        assert_eq!(AssetKind::Style.cache_key("home"), "css|home");
        assert_eq!(AssetKind::Script.cache_key("shared/app-a"), "js|shared/app-a");
        assert_eq!(AssetKind::Style.filename_token(), "styles");
        assert_eq!(AssetKind::Script.to_string(), "scripts");
    }
}
