//! Renderer trait and renderer selection.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;

use crate::builtin::BuiltinRenderer;
use crate::pandoc::PandocRenderer;

/// A single source-to-output conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderJob {
    /// Markdown source file
    pub source: PathBuf,

    /// HTML file to write (overwritten if present)
    pub output: PathBuf,
}

/// Errors a renderer can report for one document.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Failed to start `{command}`: {message}")]
    Spawn { command: String, message: String },

    #[error("Renderer exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("Stylesheet not found: {0}")]
    MissingStylesheet(PathBuf),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Failed to render template: {0}")]
    Template(String),

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Trait for Markdown to standalone HTML renderers.
pub trait Renderer: Send + Sync {
    /// Renderer identifier (e.g., "pandoc", "builtin")
    fn name(&self) -> &'static str;

    /// Render `job.source` into `job.output`, overwriting it.
    fn render(&self, job: &RenderJob) -> Result<(), RenderError>;
}

/// Which renderer to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderEngine {
    /// External pandoc-compatible command
    #[default]
    Pandoc,
    /// In-process pulldown-cmark renderer
    Builtin,
}

impl FromStr for RenderEngine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pandoc" => Ok(Self::Pandoc),
            "builtin" => Ok(Self::Builtin),
            other => Err(format!(
                "unknown engine '{}' (expected 'pandoc' or 'builtin')",
                other
            )),
        }
    }
}

impl fmt::Display for RenderEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pandoc => f.write_str("pandoc"),
            Self::Builtin => f.write_str("builtin"),
        }
    }
}

/// Settings shared by every document in a batch.
#[derive(Debug, Clone)]
pub struct RenderSettings {
    /// Renderer to use
    pub engine: RenderEngine,

    /// External command for the pandoc engine
    pub command: String,

    /// Shared stylesheet; the built-in renderer falls back to a bundled one
    pub stylesheet: Option<PathBuf>,

    /// Extra arguments appended to the external command
    pub extra_args: Vec<String>,

    /// Minify the inlined stylesheet (built-in engine)
    pub minify: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            engine: RenderEngine::default(),
            command: "pandoc".to_string(),
            stylesheet: Some(PathBuf::from("style.css")),
            extra_args: vec![],
            minify: true,
        }
    }
}

impl RenderSettings {
    /// Build the configured renderer.
    pub fn build(&self) -> Arc<dyn Renderer> {
        match self.engine {
            RenderEngine::Pandoc => Arc::new(PandocRenderer::new(
                self.command.clone(),
                self.stylesheet.clone(),
                self.extra_args.clone(),
            )),
            RenderEngine::Builtin => {
                Arc::new(BuiltinRenderer::new(self.stylesheet.clone(), self.minify))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_engine_names() {
        assert_eq!("pandoc".parse::<RenderEngine>(), Ok(RenderEngine::Pandoc));
        assert_eq!("Builtin".parse::<RenderEngine>(), Ok(RenderEngine::Builtin));
        assert!("markdown-it".parse::<RenderEngine>().is_err());
    }

    #[test]
    fn builds_selected_engine() {
        let pandoc = RenderSettings::default().build();
        assert_eq!(pandoc.name(), "pandoc");

        let builtin = RenderSettings {
            engine: RenderEngine::Builtin,
            ..Default::default()
        }
        .build();
        assert_eq!(builtin.name(), "builtin");
    }
}
