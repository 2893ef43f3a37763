//! Source document discovery and output path mapping.

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

/// Options controlling which files count as sources and outputs.
#[derive(Debug, Clone)]
pub struct DiscoverOptions {
    /// Source extension without the dot
    pub source_extension: String,

    /// Output extension without the dot
    pub output_extension: String,

    /// Directory names skipped during traversal
    pub exclude: Vec<String>,
}

impl Default for DiscoverOptions {
    fn default() -> Self {
        Self {
            source_extension: "md".to_string(),
            output_extension: "html".to_string(),
            exclude: vec![
                ".git".to_string(),
                "target".to_string(),
                "node_modules".to_string(),
            ],
        }
    }
}

/// A Markdown source and the output it renders to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDoc {
    /// Source file path
    pub source_path: PathBuf,

    /// Path relative to the content root
    pub relative_path: PathBuf,

    /// Sibling output path
    pub output_path: PathBuf,
}

/// Errors that can occur while walking the content root.
#[derive(Debug, thiserror::Error)]
pub enum DiscoverError {
    #[error("Content root not found: {0}")]
    RootNotFound(PathBuf),

    #[error("Content root is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("{}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// An entry under the root that could not be read during discovery.
#[derive(Debug)]
pub struct UnreadableEntry {
    /// Path of the entry (the root if walkdir could not name it)
    pub path: PathBuf,

    /// Underlying I/O error
    pub error: io::Error,
}

/// Source documents found under a root, plus the entries that could not be read.
#[derive(Debug, Default)]
pub struct Discovery {
    /// Source documents, sorted by path
    pub docs: Vec<SourceDoc>,

    /// Unreadable directories and dangling source links, sorted by path
    pub unreadable: Vec<UnreadableEntry>,
}

/// Map a source path to its output path.
///
/// Returns `None` if the path does not carry the source extension.
/// `guide.v2.md` maps to `guide.v2.html`.
pub fn output_path_for(path: &Path, options: &DiscoverOptions) -> Option<PathBuf> {
    if has_extension(path, &options.source_extension) {
        Some(path.with_extension(&options.output_extension))
    } else {
        None
    }
}

/// Discover all source documents under `root`.
///
/// Symlinked directories are not descended into. A symlinked source file is
/// a document when its target is a regular file; a dangling one is reported
/// as unreadable.
pub fn discover(root: &Path, options: &DiscoverOptions) -> Result<Discovery, DiscoverError> {
    let mut discovery = Discovery::default();

    for walked in walk(root, options)? {
        let file = match walked {
            Ok(file) => file,
            Err(unreadable) => {
                discovery.unreadable.push(unreadable);
                continue;
            }
        };

        let Some(output_path) = output_path_for(&file.path, options) else {
            continue;
        };

        if file.is_symlink {
            match fs::metadata(&file.path) {
                Ok(meta) if meta.is_file() => {}
                Ok(_) => continue,
                Err(error) => {
                    discovery.unreadable.push(UnreadableEntry {
                        path: file.path,
                        error,
                    });
                    continue;
                }
            }
        }

        let relative_path = file
            .path
            .strip_prefix(root)
            .unwrap_or(&file.path)
            .to_path_buf();
        discovery.docs.push(SourceDoc {
            source_path: file.path,
            relative_path,
            output_path,
        });
    }

    discovery.docs.sort_by(|a, b| a.source_path.cmp(&b.source_path));
    discovery.unreadable.sort_by(|a, b| a.path.cmp(&b.path));

    tracing::debug!(
        "Discovered {} source documents under {}",
        discovery.docs.len(),
        root.display()
    );

    Ok(discovery)
}

/// Find output files under `root`, sorted by path.
///
/// Symlinks named like outputs are returned as links, never resolved, so
/// removing them cannot touch files outside the root. With `only_generated`
/// set, an output file is only returned when its sibling source document
/// exists.
pub fn find_outputs(
    root: &Path,
    options: &DiscoverOptions,
    only_generated: bool,
) -> Result<Vec<PathBuf>, DiscoverError> {
    let mut outputs = Vec::new();

    for walked in walk(root, options)? {
        let file = walked.map_err(|u| DiscoverError::Walk {
            path: u.path,
            source: u.error,
        })?;

        if !has_extension(&file.path, &options.output_extension) {
            continue;
        }
        if only_generated && !file.path.with_extension(&options.source_extension).is_file() {
            continue;
        }
        outputs.push(file.path);
    }

    outputs.sort();

    Ok(outputs)
}

/// A non-directory entry found by the walker.
struct WalkedFile {
    path: PathBuf,
    is_symlink: bool,
}

/// Walk every file and symlink under `root` without following links,
/// skipping excluded directories.
fn walk<'a>(
    root: &Path,
    options: &'a DiscoverOptions,
) -> Result<impl Iterator<Item = Result<WalkedFile, UnreadableEntry>> + 'a, DiscoverError> {
    if !root.exists() {
        return Err(DiscoverError::RootNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(DiscoverError::NotADirectory(root.to_path_buf()));
    }

    let fallback = root.to_path_buf();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(move |entry| !is_excluded(entry, &options.exclude))
        .filter_map(move |entry| match entry {
            Ok(entry) => {
                let file_type = entry.file_type();
                if file_type.is_dir() {
                    return None;
                }
                Some(Ok(WalkedFile {
                    is_symlink: file_type.is_symlink(),
                    path: entry.into_path(),
                }))
            }
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| fallback.clone());
                tracing::debug!("Unreadable entry: {}", e);
                Some(Err(UnreadableEntry {
                    path,
                    error: e.into(),
                }))
            }
        });

    Ok(walker)
}

fn is_excluded(entry: &DirEntry, exclude: &[String]) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| exclude.iter().any(|e| e == name))
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension() == Some(OsStr::new(extension))
}
