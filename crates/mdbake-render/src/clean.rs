//! Removal of generated output documents.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use mdbake_docs::{find_outputs, DiscoverOptions};

use crate::batch::ConvertError;

/// Result of a clean operation.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CleanSummary {
    /// Files removed, in path order
    pub removed: Vec<PathBuf>,
}

/// Deletes output documents under a content root.
#[derive(Debug, Clone)]
pub struct Cleaner {
    root: PathBuf,
    discover: DiscoverOptions,
    only_generated: bool,
}

impl Cleaner {
    /// Create a cleaner for `root`.
    ///
    /// With `only_generated` set, only outputs that have a sibling source
    /// document are removed.
    pub fn new(root: PathBuf, discover: DiscoverOptions, only_generated: bool) -> Self {
        Self {
            root,
            discover,
            only_generated,
        }
    }

    /// Remove every matching output file. Nothing to remove is not an error.
    pub fn clean(&self) -> Result<CleanSummary, ConvertError> {
        let outputs = find_outputs(&self.root, &self.discover, self.only_generated)?;
        let mut summary = CleanSummary::default();

        for path in outputs {
            match fs::remove_file(&path) {
                Ok(()) => {
                    tracing::debug!("Removed {}", path.display());
                    summary.removed.push(path);
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(ConvertError::Filesystem { path, source: e }),
            }
        }

        tracing::info!(
            "Removed {} generated files under {}",
            summary.removed.len(),
            self.root.display()
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{BatchConfig, BatchConverter};
    use crate::builtin::BuiltinRenderer;
    use pretty_assertions::assert_eq;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn removes_exactly_the_converted_outputs() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        write(&root.join("a/one.md"), "# One\n");
        write(&root.join("b/two.md"), "# Two\n");

        BatchConverter::new(
            BatchConfig {
                root: root.to_path_buf(),
                ..Default::default()
            },
            Arc::new(BuiltinRenderer::new(None, false)),
        )
        .convert()
        .unwrap();

        let summary = Cleaner::new(root.to_path_buf(), DiscoverOptions::default(), false)
            .clean()
            .unwrap();

        assert_eq!(
            summary.removed,
            vec![root.join("a/one.html"), root.join("b/two.html")]
        );
        assert!(!root.join("a/one.html").exists());
        assert!(!root.join("b/two.html").exists());
        assert_eq!(fs::read_to_string(root.join("a/one.md")).unwrap(), "# One\n");
        assert_eq!(fs::read_to_string(root.join("b/two.md")).unwrap(), "# Two\n");
    }

    #[test]
    fn clean_without_outputs_is_a_no_op() {
        let temp = tempdir().unwrap();
        write(&temp.path().join("only.md"), "# Only\n");

        let cleaner = Cleaner::new(temp.path().to_path_buf(), DiscoverOptions::default(), false);

        assert_eq!(cleaner.clean().unwrap(), CleanSummary::default());
        assert_eq!(cleaner.clean().unwrap().removed.len(), 0);
        assert!(temp.path().join("only.md").exists());
    }

    #[test]
    fn only_generated_keeps_orphans() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        write(&root.join("pages/index.md"), "# Index\n");
        write(&root.join("pages/index.html"), "<html></html>");
        write(&root.join("pages/handwritten.html"), "<html></html>");

        let summary = Cleaner::new(root.to_path_buf(), DiscoverOptions::default(), true)
            .clean()
            .unwrap();

        assert_eq!(summary.removed, vec![root.join("pages/index.html")]);
        assert!(root.join("pages/handwritten.html").exists());
    }

    #[test]
    fn missing_root_is_an_error() {
        let temp = tempdir().unwrap();

        let result =
            Cleaner::new(temp.path().join("gone"), DiscoverOptions::default(), false).clean();

        assert!(matches!(result, Err(ConvertError::Discover(_))));
    }

    #[cfg(unix)]
    #[test]
    fn never_removes_files_behind_symlinks() {
        use std::os::unix::fs::symlink;

        let temp = tempdir().unwrap();
        let root = temp.path().join("notes");
        let outside = temp.path().join("outside");
        write(&root.join("one.html"), "<html></html>");
        write(&outside.join("keep.html"), "<html></html>");
        write(&temp.path().join("shared.html"), "<html></html>");
        symlink(&outside, root.join("linked")).unwrap();
        symlink(temp.path().join("shared.html"), root.join("alias.html")).unwrap();

        let summary = Cleaner::new(root.clone(), DiscoverOptions::default(), false)
            .clean()
            .unwrap();

        assert_eq!(
            summary.removed,
            vec![root.join("alias.html"), root.join("one.html")]
        );
        assert!(outside.join("keep.html").is_file());
        assert!(temp.path().join("shared.html").is_file());
    }
}
