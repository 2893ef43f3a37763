//! Watch command.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use mdbake_render::{BatchConverter, RenderEngine};
use mdbake_server::{apply_watch_event, FileWatcher};

use crate::commands::convert::report;
use crate::config::load_config;

/// Run the watch command.
pub async fn run(
    config_path: &Path,
    root: Option<PathBuf>,
    engine: Option<RenderEngine>,
) -> Result<()> {
    let file_config = load_config(config_path)?;

    let settings = file_config.render_settings(engine, None);
    let batch = file_config.batch_config(root, None, false);
    let converter = Arc::new(BatchConverter::new(batch, settings.build()));

    let initial = Arc::clone(&converter);
    let summary = tokio::task::spawn_blocking(move || initial.convert())
        .await
        .context("Conversion task panicked")??;
    if let Err(e) = report(&summary) {
        tracing::warn!("{}", e);
    }

    let root = converter.config().root.clone();
    let (_watcher, mut rx) = FileWatcher::new(&[root.clone()], converter.config().discover.clone())
        .with_context(|| format!("Failed to watch {}", root.display()))?;

    tracing::info!("Watching {} for changes (Ctrl-C to stop)", root.display());

    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else { break };
                if let Err(e) = apply_watch_event(&converter, event).await {
                    tracing::error!("{}", e);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Stopping watcher");
                break;
            }
        }
    }

    Ok(())
}
