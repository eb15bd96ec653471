//! File and environment configuration.
//!
//! Priority: environment variables > config file > defaults.
//!
//! The config file is `fob-chunks.toml` or `fob-chunks.json` in the working
//! directory unless a path is given. Environment variables use the
//! `FOB_CHUNKS_` prefix followed by the field name, e.g.
//! `FOB_CHUNKS_GENERATE_CHUNKS_MANIFEST=true`.

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format as _, Json, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::cache::CacheConfig;
use crate::error::{Error, Result};
use crate::options::{ChunksPluginOptions, DEFAULT_FILENAME};
use crate::template::Template;

/// Config files looked up when no explicit path is given, in order.
pub const DEFAULT_CONFIG_FILES: [&str; 2] = ["fob-chunks.toml", "fob-chunks.json"];

const ENV_PREFIX: &str = "FOB_CHUNKS_";

/// Serializable form of [`ChunksPluginOptions`].
///
/// Field names are snake_case in every format. Templates are patterns here;
/// function templates only exist in code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunksConfig {
    pub filename: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_style: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_script: Option<String>,

    pub generate_chunks_manifest: bool,

    pub generate_chunks_files: bool,

    /// Enables the persistent cache in this directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
}

impl Default for ChunksConfig {
    fn default() -> Self {
        Self {
            filename: DEFAULT_FILENAME.to_string(),
            template_style: None,
            template_script: None,
            generate_chunks_manifest: false,
            generate_chunks_files: true,
            cache_dir: None,
        }
    }
}

impl ChunksConfig {
    /// Load configuration from defaults, the config file and the environment.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        Self::from_figment(Self::figment(config_path))
    }

    /// The provider stack used by [`load`](Self::load), for further merging.
    pub fn figment(config_path: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        let config_file = config_path.map(Path::to_path_buf).or_else(|| {
            DEFAULT_CONFIG_FILES
                .iter()
                .map(Path::new)
                .find(|path| path.exists())
                .map(Path::to_path_buf)
        });

        if let Some(path) = config_file {
            tracing::debug!(path = %path.display(), "loading chunks config file");
            figment = if path.extension().is_some_and(|ext| ext == "json") {
                figment.merge(Json::file(path))
            } else {
                figment.merge(Toml::file(path))
            };
        }

        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        figment
            .extract()
            .map_err(|e| Error::invalid_config("configuration", e.to_string()))
    }

    /// Convert into validated plugin options.
    pub fn into_options(self) -> Result<ChunksPluginOptions> {
        let mut options = ChunksPluginOptions::new()
            .filename(self.filename)
            .generate_chunks_manifest(self.generate_chunks_manifest)
            .generate_chunks_files(self.generate_chunks_files);

        if let Some(pattern) = self.template_style {
            options = options.template_style(Template::Pattern(pattern));
        }
        if let Some(pattern) = self.template_script {
            options = options.template_script(Template::Pattern(pattern));
        }

        options.validate()?;
        Ok(options)
    }

    /// Persistent cache settings, when a cache directory is configured.
    pub fn cache_config(&self) -> Option<CacheConfig> {
        self.cache_dir.as_ref().map(CacheConfig::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn toml_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fob-chunks.toml");
        std::fs::write(
            &path,
            r#"
filename = "templates/[name]-[type].html"
generate_chunks_manifest = true
template_script = '<script type="module" src="{{chunk}}"></script>'
cache_dir = ".cache/chunks"
"#,
        )
        .unwrap();

        let config = ChunksConfig::from_figment(
            Figment::new()
                .merge(Serialized::defaults(ChunksConfig::default()))
                .merge(Toml::file(&path)),
        )
        .unwrap();

        assert_eq!(config.filename, "templates/[name]-[type].html");
        assert!(config.generate_chunks_manifest);
        assert!(config.generate_chunks_files);
        assert_eq!(config.template_style, None);
        assert_eq!(
            config.cache_config().unwrap().dir,
            PathBuf::from(".cache/chunks")
        );

        let options = config.into_options().unwrap();
        assert!(matches!(options.template_script, Template::Pattern(_)));
    }

    #[test]
    fn json_file_is_supported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chunks.json");
        std::fs::write(
            &path,
            r#"{ "generate_chunks_manifest": true, "generate_chunks_files": false }"#,
        )
        .unwrap();

        let config = ChunksConfig::from_figment(
            Figment::new()
                .merge(Serialized::defaults(ChunksConfig::default()))
                .merge(Json::file(&path)),
        )
        .unwrap();

        assert!(config.generate_chunks_manifest);
        assert!(!config.generate_chunks_files);
        assert_eq!(config.filename, DEFAULT_FILENAME);
    }

    #[test]
    fn later_providers_win() {
        let config = ChunksConfig::from_figment(
            Figment::new()
                .merge(Serialized::defaults(ChunksConfig::default()))
                .merge(Serialized::defaults(ChunksConfig {
                    filename: "[name].[type].html".to_string(),
                    ..ChunksConfig::default()
                })),
        )
        .unwrap();
        assert_eq!(config.filename, "[name].[type].html");
    }

    #[test]
    fn invalid_values_are_config_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fob-chunks.toml");
        std::fs::write(&path, "generate_chunks_manifest = \"maybe\"\n").unwrap();

        let err = ChunksConfig::from_figment(
            Figment::new()
                .merge(Serialized::defaults(ChunksConfig::default()))
                .merge(Toml::file(&path)),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { ref field, .. } if field == "configuration"));

        let bad_template = ChunksConfig {
            template_style: Some("<link>".to_string()),
            ..ChunksConfig::default()
        };
        assert!(bad_template.into_options().is_err());
    }
}
