//! Configuration file (mdbake.toml).

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use mdbake_docs::DiscoverOptions;
use mdbake_render::{BatchConfig, RenderEngine, RenderSettings};

/// Configuration file structure.
#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ConfigFile {
    pub content: ContentConfig,
    pub render: RenderConfig,
    pub build: BuildSettings,
    pub clean: CleanSettings,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ContentConfig {
    /// Directory searched recursively for Markdown
    pub root: PathBuf,
    pub source_extension: String,
    pub output_extension: String,
    /// Directory names never descended into
    pub exclude: Vec<String>,
}

impl Default for ContentConfig {
    fn default() -> Self {
        let discover = DiscoverOptions::default();
        Self {
            root: PathBuf::from("."),
            source_extension: discover.source_extension,
            output_extension: discover.output_extension,
            exclude: discover.exclude,
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    pub engine: RenderEngine,
    /// External renderer command
    pub command: String,
    /// Shared stylesheet; empty disables it
    pub stylesheet: String,
    pub extra_args: Vec<String>,
    pub minify: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            engine: RenderEngine::Pandoc,
            command: "pandoc".to_string(),
            stylesheet: "style.css".to_string(),
            extra_args: vec![],
            minify: true,
        }
    }
}

#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct BuildSettings {
    /// Worker threads, 0 for one per logical CPU
    pub jobs: usize,
    pub fail_fast: bool,
}

#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct CleanSettings {
    /// Only remove outputs that have a sibling source
    pub only_generated: bool,
}

/// Errors loading the configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: String, message: String },
}

/// Load configuration from `path` if it exists.
/// Returns an error if the config file exists but is malformed.
pub fn load_config(path: &Path) -> Result<ConfigFile, ConfigError> {
    if !path.exists() {
        tracing::debug!("No {}, using defaults", path.display());
        return Ok(ConfigFile::default());
    }

    let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let config: ConfigFile = toml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    tracing::info!("Loaded config from {}", path.display());
    Ok(config)
}

impl ConfigFile {
    /// Discovery options from the `[content]` table.
    pub fn discover_options(&self) -> DiscoverOptions {
        DiscoverOptions {
            source_extension: self.content.source_extension.clone(),
            output_extension: self.content.output_extension.clone(),
            exclude: self.content.exclude.clone(),
        }
    }

    /// Batch settings, with command-line overrides applied.
    pub fn batch_config(
        &self,
        root: Option<PathBuf>,
        jobs: Option<usize>,
        fail_fast: bool,
    ) -> BatchConfig {
        BatchConfig {
            root: root.unwrap_or_else(|| self.content.root.clone()),
            discover: self.discover_options(),
            jobs: jobs.unwrap_or(self.build.jobs),
            fail_fast: fail_fast || self.build.fail_fast,
        }
    }

    /// Renderer settings, with command-line overrides applied.
    pub fn render_settings(
        &self,
        engine: Option<RenderEngine>,
        stylesheet: Option<PathBuf>,
    ) -> RenderSettings {
        let stylesheet = stylesheet.or_else(|| {
            (!self.render.stylesheet.is_empty()).then(|| PathBuf::from(&self.render.stylesheet))
        });

        RenderSettings {
            engine: engine.unwrap_or(self.render.engine),
            command: self.render.command.clone(),
            stylesheet,
            extra_args: self.render.extra_args.clone(),
            minify: self.render.minify,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn missing_file_uses_defaults() {
        let temp = tempdir().unwrap();

        let config = load_config(&temp.path().join("mdbake.toml")).unwrap();

        assert_eq!(config, ConfigFile::default());
        assert_eq!(config.content.root, PathBuf::from("."));
        assert_eq!(config.render.command, "pandoc");
        assert_eq!(config.render.stylesheet, "style.css");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("mdbake.toml");
        fs::write(
            &path,
            r#"
[content]
root = "notes"

[render]
engine = "builtin"
extra_args = ["--toc"]

[build]
jobs = 4
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();

        assert_eq!(config.content.root, PathBuf::from("notes"));
        assert_eq!(config.content.source_extension, "md");
        assert_eq!(config.render.engine, RenderEngine::Builtin);
        assert_eq!(config.render.command, "pandoc");
        assert_eq!(config.render.extra_args, vec!["--toc".to_string()]);
        assert_eq!(config.build.jobs, 4);
        assert!(!config.build.fail_fast);
        assert!(!config.clean.only_generated);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("mdbake.toml");
        fs::write(&path, "[render]\nengine = \"markdown-it\"\n").unwrap();

        assert!(matches!(load_config(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn command_line_overrides_file_values() {
        let config = ConfigFile::default();

        let batch = config.batch_config(Some(PathBuf::from("docs")), Some(2), true);
        assert_eq!(batch.root, PathBuf::from("docs"));
        assert_eq!(batch.jobs, 2);
        assert!(batch.fail_fast);

        let settings =
            config.render_settings(Some(RenderEngine::Builtin), Some(PathBuf::from("print.css")));
        assert_eq!(settings.engine, RenderEngine::Builtin);
        assert_eq!(settings.stylesheet, Some(PathBuf::from("print.css")));
    }

    #[test]
    fn empty_stylesheet_disables_it() {
        let mut config = ConfigFile::default();
        config.render.stylesheet = String::new();

        assert_eq!(config.render_settings(None, None).stylesheet, None);
    }
}
