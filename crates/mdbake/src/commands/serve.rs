//! Live preview command.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use mdbake_render::{BatchConverter, RenderEngine};
use mdbake_server::{PreviewConfig, PreviewServer};

use crate::config::load_config;

/// Run the preview server.
pub async fn run(
    config_path: &Path,
    root: Option<PathBuf>,
    engine: Option<RenderEngine>,
    port: u16,
    open: bool,
) -> Result<()> {
    let file_config = load_config(config_path)?;

    let settings = file_config.render_settings(engine, None);
    let batch = file_config.batch_config(root, None, false);

    if !batch.root.is_dir() {
        anyhow::bail!("Content root not found: {}", batch.root.display());
    }

    tracing::info!("Starting preview server on port {}", port);

    let config = PreviewConfig {
        port,
        open,
        ..Default::default()
    };

    let converter = Arc::new(BatchConverter::new(batch, settings.build()));
    PreviewServer::new(config, converter).start().await?;

    Ok(())
}
