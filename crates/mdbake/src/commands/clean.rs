//! Clean command.

use std::path::{Path, PathBuf};

use anyhow::Result;
use mdbake_render::Cleaner;

use crate::config::load_config;

/// Run the clean command.
pub async fn run(config_path: &Path, root: Option<PathBuf>, only_generated: bool) -> Result<()> {
    let file_config = load_config(config_path)?;

    let root = root.unwrap_or_else(|| file_config.content.root.clone());
    let cleaner = Cleaner::new(
        root,
        file_config.discover_options(),
        only_generated || file_config.clean.only_generated,
    );

    cleaner.clean()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn removes_html_and_is_idempotent() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("notes");
        fs::create_dir_all(root.join("b")).unwrap();
        fs::write(root.join("b/two.md"), "# Two\n").unwrap();
        fs::write(root.join("b/two.html"), "<html></html>").unwrap();
        let config = temp.path().join("mdbake.toml");

        run(&config, Some(root.clone()), false).await.unwrap();
        assert!(!root.join("b/two.html").exists());
        assert!(root.join("b/two.md").exists());

        run(&config, Some(root), false).await.unwrap();
    }
}
