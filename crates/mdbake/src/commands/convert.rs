//! Batch convert command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use mdbake_render::{BatchConverter, ConvertSummary, RenderEngine};

use crate::config::load_config;

/// Run the convert command.
pub async fn run(
    config_path: &Path,
    root: Option<PathBuf>,
    engine: Option<RenderEngine>,
    stylesheet: Option<PathBuf>,
    jobs: Option<usize>,
    fail_fast: bool,
) -> Result<()> {
    let file_config = load_config(config_path)?;

    let settings = file_config.render_settings(engine, stylesheet);
    let batch = file_config.batch_config(root, jobs, fail_fast);

    let converter = BatchConverter::new(batch, settings.build());
    let summary = tokio::task::spawn_blocking(move || converter.convert())
        .await
        .context("Conversion task panicked")??;

    report(&summary)
}

/// Log the summary and fail if any document did not render.
pub fn report(summary: &ConvertSummary) -> Result<()> {
    tracing::info!(
        "Converted {} of {} documents in {}ms",
        summary.converted,
        summary.total,
        summary.duration_ms
    );

    for failure in &summary.failures {
        tracing::error!("{}: {}", failure.path.display(), failure.error);
    }

    if summary.skipped > 0 {
        tracing::warn!("Skipped {} documents after the first failure", summary.skipped);
    }

    if !summary.failures.is_empty() {
        anyhow::bail!(
            "{} of {} documents failed to render",
            summary.failures.len(),
            summary.total
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdbake_render::{ConvertError, ConvertFailure};

    #[test]
    fn clean_summary_reports_success() {
        let summary = ConvertSummary {
            total: 2,
            converted: 2,
            ..Default::default()
        };

        assert!(report(&summary).is_ok());
    }

    #[test]
    fn failures_make_the_command_fail() {
        let summary = ConvertSummary {
            total: 3,
            converted: 2,
            failures: vec![ConvertFailure {
                path: PathBuf::from("broken.md"),
                error: ConvertError::NotASource(PathBuf::from("broken.md")),
            }],
            ..Default::default()
        };

        let err = report(&summary).unwrap_err();
        assert_eq!(err.to_string(), "1 of 3 documents failed to render");
    }

    #[tokio::test]
    async fn converts_with_builtin_engine() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("notes");
        let config = temp.path().join("mdbake.toml");
        std::fs::create_dir_all(root.join("a")).unwrap();
        std::fs::write(root.join("a/one.md"), "# One\n").unwrap();
        std::fs::write(&config, "[render]\nengine = \"builtin\"\nstylesheet = \"\"\n").unwrap();

        run(&config, Some(root.clone()), None, None, Some(1), false)
            .await
            .unwrap();

        assert!(root.join("a/one.html").is_file());
    }

    #[tokio::test]
    async fn missing_stylesheet_fails_the_command() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("notes");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("one.md"), "# One\n").unwrap();

        let result = run(
            &temp.path().join("mdbake.toml"),
            Some(root.clone()),
            Some(RenderEngine::Builtin),
            Some(temp.path().join("missing.css")),
            None,
            false,
        )
        .await;

        assert!(result.is_err());
        assert!(!root.join("one.html").exists());
    }
}
