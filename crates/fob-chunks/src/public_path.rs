//! Public path resolution.
//!
//! The prefix embedded in fragments (`html`) and in the manifest (`manifest`)
//! is the same for configured public paths. With `auto`, fragments reference
//! assets relative to their own output directory while manifest paths stay
//! root-relative.

use std::path::{Component, Path, PathBuf};

use path_clean::PathClean;

use crate::compilation::{OutputOptions, PublicPathConfig};
use crate::emit::fragment_filename;
use crate::extension::AssetKind;

/// Prefixes for one entrypoint.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedPublicPath {
    /// Prefix for URLs inside HTML fragments.
    pub html: String,
    /// Prefix for paths listed in the chunks manifest.
    pub manifest: String,
}

impl ResolvedPublicPath {
    pub fn same(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            html: prefix.clone(),
            manifest: prefix,
        }
    }
}

/// Resolve the public path for `entry_name` given the fragment filename pattern.
///
/// Non-empty configured prefixes get a trailing `/` when they lack one.
pub fn resolve_public_path(
    output: &OutputOptions,
    entry_name: &str,
    filename_pattern: &str,
) -> ResolvedPublicPath {
    match &output.public_path {
        PublicPathConfig::None => ResolvedPublicPath::default(),
        PublicPathConfig::Literal(prefix) => ResolvedPublicPath::same(with_trailing_slash(prefix)),
        PublicPathConfig::Function(f) => ResolvedPublicPath::same(with_trailing_slash(&f())),
        PublicPathConfig::Auto => {
            let root = output_root(output);
            // Style and script fragments of an entry differ only in their file name.
            let fragment = fragment_filename(filename_pattern, entry_name, AssetKind::Style);
            let fragment_dir = Path::new(fragment.trim_start_matches('/'))
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default();

            ResolvedPublicPath {
                html: relative_to_root(&root, &root.join(fragment_dir)),
                manifest: String::new(),
            }
        }
    }
}

fn output_root(output: &OutputOptions) -> PathBuf {
    output
        .path
        .as_ref()
        .or(output.context.as_ref())
        .cloned()
        .unwrap_or_else(|| PathBuf::from("."))
        .clean()
}

/// `../` once per directory between `dir` and `root`; empty when they match.
fn relative_to_root(root: &Path, dir: &Path) -> String {
    let depth = normal_components(&dir.clean()).saturating_sub(normal_components(root));
    "../".repeat(depth)
}

fn normal_components(path: &Path) -> usize {
    path.components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .count()
}

fn with_trailing_slash(prefix: &str) -> String {
    if prefix.is_empty() || prefix.ends_with('/') {
        prefix.to_string()
    } else {
        format!("{prefix}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auto(path: &str) -> OutputOptions {
        OutputOptions::new(PublicPathConfig::Auto).with_path(path)
    }

    #[test]
    fn literal_is_shared_by_html_and_manifest() {
        let output = OutputOptions::new(PublicPathConfig::parse("/dist/"));
        assert_eq!(
            resolve_public_path(&output, "home", "[name]-[type].html"),
            ResolvedPublicPath::same("/dist/")
        );
    }

    #[test]
    fn literal_gets_trailing_slash() {
        let output = OutputOptions::new(PublicPathConfig::parse("https://cdn.example.com"));
        let resolved = resolve_public_path(&output, "home", "[name]-[type].html");
        assert_eq!(resolved.html, "https://cdn.example.com/");
        assert_eq!(resolved.manifest, "https://cdn.example.com/");
    }

    #[test]
    fn unset_public_path_is_empty() {
        let output = OutputOptions::default();
        assert_eq!(
            resolve_public_path(&output, "home", "[name]-[type].html"),
            ResolvedPublicPath::default()
        );
        let empty = OutputOptions::new(PublicPathConfig::parse(""));
        assert_eq!(
            resolve_public_path(&empty, "home", "[name]-[type].html").html,
            ""
        );
    }

    #[test]
    fn function_is_called_then_used_as_literal() {
        let output = OutputOptions::new(PublicPathConfig::function(|| "/static".to_string()));
        assert_eq!(
            resolve_public_path(&output, "home", "[name]-[type].html"),
            ResolvedPublicPath::same("/static/")
        );
    }

    #[test]
    fn auto_walks_back_from_nested_fragment_dir() {
        let resolved =
            resolve_public_path(&auto("/dist"), "shared/app-a", "templates/[name]-[type].html");
        assert_eq!(resolved.html, "../../");
        assert_eq!(resolved.manifest, "");
    }

    #[test]
    fn auto_in_output_root_is_empty() {
        let resolved = resolve_public_path(&auto("/dist"), "home", "[name]-[type].html");
        assert_eq!(resolved, ResolvedPublicPath::default());
    }

    #[test]
    fn auto_ignores_leading_slash_and_falls_back_to_context() {
        let output = OutputOptions::new(PublicPathConfig::Auto).with_context("/project");
        let resolved = resolve_public_path(&output, "admin/home", "/html/[name]-[type].html");
        assert_eq!(resolved.html, "../../");

        let relative_root = resolve_public_path(&auto("dist"), "home", "templates/[name].html");
        assert_eq!(relative_root.html, "../");
    }
}
