//! HTML tag templates.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::extension::AssetKind;

/// Placeholders replaced by the asset URL in [`Template::Pattern`].
pub const URL_PLACEHOLDERS: [&str; 2] = ["{{chunk}}", "[url]"];

/// Placeholder replaced by the entrypoint name in [`Template::Pattern`].
pub const ENTRY_PLACEHOLDER: &str = "[entry]";

type TemplateFn = dyn Fn(&str, &str) -> String + Send + Sync;

/// Produces one HTML tag for one asset URL.
#[derive(Clone)]
pub enum Template {
    /// `<link rel="stylesheet">` for styles, `<script defer>` for scripts.
    Default(AssetKind),
    /// A string with `{{chunk}}`/`[url]` and optionally `[entry]` placeholders.
    Pattern(String),
    /// `(url, entry_name) -> tag`.
    Function(Arc<TemplateFn>),
}

impl Template {
    pub fn pattern(pattern: impl Into<String>) -> Self {
        Template::Pattern(pattern.into())
    }

    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&str, &str) -> String + Send + Sync + 'static,
    {
        Template::Function(Arc::new(f))
    }

    /// Render the tag for `url`.
    pub fn render(&self, url: &str, entry_name: &str) -> String {
        match self {
            Template::Default(AssetKind::Style) => {
                format!(r#"<link rel="stylesheet" href="{url}" />"#)
            }
            Template::Default(AssetKind::Script) => {
                format!(r#"<script defer src="{url}"></script>"#)
            }
            Template::Pattern(pattern) => URL_PLACEHOLDERS
                .iter()
                .fold(pattern.clone(), |out, placeholder| out.replace(placeholder, url))
                .replace(ENTRY_PLACEHOLDER, entry_name),
            Template::Function(f) => f(url, entry_name),
        }
    }

    /// Reject patterns that would render the same tag for every asset.
    ///
    /// `field` names the option in the error.
    pub fn validate(&self, field: &str) -> Result<()> {
        if let Template::Pattern(pattern) = self {
            if !URL_PLACEHOLDERS.iter().any(|p| pattern.contains(p)) {
                return Err(Error::invalid_config(
                    field,
                    format!(
                        "template '{}' must contain {} or {}",
                        pattern, URL_PLACEHOLDERS[0], URL_PLACEHOLDERS[1]
                    ),
                ));
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Template::Default(kind) => f.debug_tuple("Default").field(kind).finish(),
            Template::Pattern(pattern) => f.debug_tuple("Pattern").field(pattern).finish(),
            Template::Function(_) => f.write_str("Function(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tags() {
        assert_eq!(
            Template::Default(AssetKind::Style).render("/dist/a.css", "home"),
            r#"<link rel="stylesheet" href="/dist/a.css" />"#
        );
        assert_eq!(
            Template::Default(AssetKind::Script).render("/dist/a.js", "home"),
            r#"<script defer src="/dist/a.js"></script>"#
        );
    }

    #[test]
    fn pattern_substitutes_url_and_entry() {
        let template = Template::pattern(r#"<script src="{{chunk}}" data-entry="[entry]"></script>"#);
        assert_eq!(
            template.render("a.js", "home"),
            r#"<script src="a.js" data-entry="home"></script>"#
        );
        assert_eq!(
            Template::pattern("<link href=\"[url]\">").render("a.css", "home"),
            "<link href=\"a.css\">"
        );
    }

    #[test]
    fn function_receives_entry_name() {
        let template = Template::function(|url, entry| {
            let host = if entry == "admin" {
                "https://admin.cdn"
            } else {
                "https://cdn"
            };
            format!("<script src=\"{host}/{url}\"></script>")
        });
        assert_eq!(
            template.render("a.js", "admin"),
            "<script src=\"https://admin.cdn/a.js\"></script>"
        );
    }

    #[test]
    fn pattern_without_url_placeholder_is_rejected() {
        let err = Template::pattern("<script></script>")
            .validate("template_script")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { ref field, .. } if field == "template_script"));
        assert!(Template::pattern("{{chunk}}").validate("template_style").is_ok());
        assert!(Template::Default(AssetKind::Style).validate("template_style").is_ok());
    }
}
