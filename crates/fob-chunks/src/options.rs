//! Plugin options.

use std::path::Component;
use std::path::Path;

use crate::compilation::{OutputOptions, PublicPathConfig};
use crate::error::{Error, Result};
use crate::extension::AssetKind;
use crate::manifest::MANIFEST_FILENAME;
use crate::template::Template;

/// Default fragment filename pattern.
pub const DEFAULT_FILENAME: &str = "[name]-[type].html";

/// Options of the chunks plugin.
///
/// ```
/// use fob_chunks::{ChunksPluginOptions, Template};
///
/// let options = ChunksPluginOptions::new()
///     .filename("templates/[name]-[type].html")
///     .template_script(Template::pattern(r#"<script type="module" src="{{chunk}}"></script>"#))
///     .generate_chunks_manifest(true);
///
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct ChunksPluginOptions {
    /// Fragment path pattern with `[name]` and `[type]` placeholders.
    pub filename: String,
    pub template_style: Template,
    pub template_script: Template,
    /// Emit `chunks-manifest.json`.
    pub generate_chunks_manifest: bool,
    /// Emit one HTML fragment per `(entry, kind)`.
    pub generate_chunks_files: bool,
}

impl Default for ChunksPluginOptions {
    fn default() -> Self {
        Self {
            filename: DEFAULT_FILENAME.to_string(),
            template_style: Template::Default(AssetKind::Style),
            template_script: Template::Default(AssetKind::Script),
            generate_chunks_manifest: false,
            generate_chunks_files: true,
        }
    }
}

impl ChunksPluginOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    pub fn template_style(mut self, template: Template) -> Self {
        self.template_style = template;
        self
    }

    pub fn template_script(mut self, template: Template) -> Self {
        self.template_script = template;
        self
    }

    pub fn generate_chunks_manifest(mut self, enabled: bool) -> Self {
        self.generate_chunks_manifest = enabled;
        self
    }

    pub fn generate_chunks_files(mut self, enabled: bool) -> Self {
        self.generate_chunks_files = enabled;
        self
    }

    /// Template for one asset kind.
    pub fn template(&self, kind: AssetKind) -> &Template {
        match kind {
            AssetKind::Style => &self.template_style,
            AssetKind::Script => &self.template_script,
        }
    }

    /// Fingerprint of everything besides asset content that shapes a cached
    /// fragment: the filename pattern, the templates and the public path.
    ///
    /// Used as the [`CacheConfig`](crate::CacheConfig) scope so a persistent
    /// cache never serves fragments built with other options. Function
    /// templates are opaque and only contribute their kind; a function public
    /// path contributes the value it returns now.
    pub fn fingerprint(&self, output: &OutputOptions) -> String {
        let mut hasher = blake3::Hasher::new();
        let mut part = |value: &str| {
            hasher.update(value.as_bytes());
            hasher.update(&[0]);
        };

        part(&self.filename);
        for template in [&self.template_style, &self.template_script] {
            match template {
                Template::Default(_) => part("default"),
                Template::Pattern(pattern) => {
                    part("pattern");
                    part(pattern);
                }
                Template::Function(_) => part("function"),
            }
        }

        match &output.public_path {
            PublicPathConfig::None => part("none"),
            PublicPathConfig::Literal(value) => {
                part("literal");
                part(value);
            }
            PublicPathConfig::Auto => {
                part("auto");
                for dir in [&output.path, &output.context] {
                    part(&dir.as_deref().map(|d| d.display().to_string()).unwrap_or_default());
                }
            }
            PublicPathConfig::Function(f) => {
                part("literal");
                part(&f());
            }
        }

        hasher.finalize().to_hex().to_string()
    }

    /// Check the options before any build runs.
    pub fn validate(&self) -> Result<()> {
        validate_filename(&self.filename)?;
        self.template_style.validate("template_style")?;
        self.template_script.validate("template_script")?;
        Ok(())
    }
}

fn validate_filename(filename: &str) -> Result<()> {
    if filename.trim().is_empty() {
        return Err(Error::invalid_config("filename", "must not be empty"));
    }

    if filename.trim_start_matches('/') == MANIFEST_FILENAME {
        return Err(Error::invalid_config(
            "filename",
            format!("'{filename}' collides with the chunks manifest"),
        ));
    }

    if !filename.contains("[name]") {
        return Err(Error::invalid_config(
            "filename",
            format!("'{filename}' must contain the [name] placeholder"),
        ));
    }

    // Without [type] the styles and scripts fragments of an entry share a path.
    if !filename.contains("[type]") {
        return Err(Error::invalid_config(
            "filename",
            format!("'{filename}' must contain the [type] placeholder"),
        ));
    }

    if Path::new(filename)
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(Error::invalid_config(
            "filename",
            format!("'{filename}' must not contain '..' segments"),
        ));
    }

    Ok(())
}
