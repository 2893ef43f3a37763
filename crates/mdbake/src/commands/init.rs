//! Initialize mdbake in a documents directory.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use mdbake_render::assets::AssetPipeline;

/// Run the init command.
pub async fn run(config_path: &Path, yes: bool) -> Result<()> {
    tracing::info!("Initializing mdbake...");

    if !config_path.exists() || yes {
        fs::write(config_path, DEFAULT_CONFIG)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
        tracing::info!("Created {}", config_path.display());
    } else {
        tracing::warn!(
            "{} already exists. Use --yes to overwrite.",
            config_path.display()
        );
    }

    let base = config_path.parent().unwrap_or(Path::new(""));
    let stylesheet = base.join("style.css");
    if !stylesheet.exists() || yes {
        fs::write(&stylesheet, AssetPipeline::default_css())
            .with_context(|| format!("Failed to write {}", stylesheet.display()))?;
        tracing::info!("Created {}", stylesheet.display());
    }

    tracing::info!("Run 'mdbake convert' to render your documents.");

    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# mdbake configuration

[content]
# Directory searched recursively for Markdown files
root = "."

# Directories never descended into
exclude = [".git", "target", "node_modules"]

[render]
# "pandoc" runs an external renderer, "builtin" needs no extra tools
engine = "pandoc"
command = "pandoc"

# Stylesheet embedded into every document ("" for none)
stylesheet = "style.css"

# Extra arguments for the external renderer
extra_args = []

[build]
# Worker threads, 0 for one per CPU
jobs = 0

# Stop after the first document that fails to render
fail_fast = false

[clean]
# Only delete HTML files that have a Markdown source next to them
only_generated = false
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{load_config, ConfigFile};
    use pretty_assertions::assert_eq;

    #[test]
    fn default_config_parses_to_defaults() {
        let parsed: ConfigFile = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(parsed, ConfigFile::default());
    }

    #[tokio::test]
    async fn writes_config_and_stylesheet_once() {
        let temp = tempfile::tempdir().unwrap();
        let config_path = temp.path().join("mdbake.toml");

        run(&config_path, false).await.unwrap();
        assert!(temp.path().join("style.css").is_file());
        assert_eq!(load_config(&config_path).unwrap(), ConfigFile::default());

        fs::write(&config_path, "[build]\njobs = 8\n").unwrap();
        run(&config_path, false).await.unwrap();
        assert_eq!(load_config(&config_path).unwrap().build.jobs, 8);

        run(&config_path, true).await.unwrap();
        assert_eq!(load_config(&config_path).unwrap().build.jobs, 0);
    }
}
