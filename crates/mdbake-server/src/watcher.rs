//! File watching for re-rendering changed sources.

use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc as async_mpsc;

use mdbake_docs::{output_path_for, DiscoverOptions};
use mdbake_render::{BatchConverter, ConvertError};

const DEBOUNCE: Duration = Duration::from_millis(100);

/// Events emitted by the file watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// Source document was created or modified
    SourceChanged(PathBuf),

    /// Source document was removed or renamed away
    SourceRemoved(PathBuf),
}

/// File watcher for source documents.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
}

impl FileWatcher {
    /// Watch `paths` recursively for changes to source documents.
    ///
    /// Bursts of events are coalesced per path; each path is classified by
    /// whether it still exists once the burst settles. Output files and
    /// excluded directories never produce events.
    pub fn new(
        paths: &[PathBuf],
        options: DiscoverOptions,
    ) -> Result<(Self, async_mpsc::Receiver<WatchEvent>), std::io::Error> {
        let roots: Vec<PathBuf> = paths
            .iter()
            .flat_map(|p| [p.clone(), fs::canonicalize(p).unwrap_or_else(|_| p.clone())])
            .collect();

        let (sync_tx, sync_rx) = mpsc::channel();
        let (async_tx, async_rx) = async_mpsc::channel(100);

        let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, _>| {
            if let Ok(event) = res {
                let _ = sync_tx.send(event);
            }
        })
        .map_err(std::io::Error::other)?;

        for path in paths {
            if path.exists() {
                watcher
                    .watch(path, RecursiveMode::Recursive)
                    .map_err(std::io::Error::other)?;
            }
        }

        std::thread::spawn(move || {
            while let Ok(first) = sync_rx.recv() {
                let mut pending = BTreeSet::new();
                collect_paths(&first, &roots, &options, &mut pending);

                let deadline = Instant::now() + DEBOUNCE;
                loop {
                    let now = Instant::now();
                    if now >= deadline {
                        break;
                    }
                    match sync_rx.recv_timeout(deadline - now) {
                        Ok(event) => collect_paths(&event, &roots, &options, &mut pending),
                        Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                            break
                        }
                    }
                }

                for path in pending {
                    let event = if path.is_file() {
                        WatchEvent::SourceChanged(path)
                    } else {
                        WatchEvent::SourceRemoved(path)
                    };
                    if async_tx.blocking_send(event).is_err() {
                        return;
                    }
                }
            }
        });

        Ok((Self { _watcher: watcher }, async_rx))
    }
}

fn collect_paths(
    event: &notify::Event,
    roots: &[PathBuf],
    options: &DiscoverOptions,
    pending: &mut BTreeSet<PathBuf>,
) {
    if !matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) {
        return;
    }

    pending.extend(
        event
            .paths
            .iter()
            .filter(|path| is_watched_source(path, roots, options))
            .cloned(),
    );
}

/// Whether a changed path is a source document outside excluded directories.
fn is_watched_source(path: &Path, roots: &[PathBuf], options: &DiscoverOptions) -> bool {
    if output_path_for(path, options).is_none() {
        return false;
    }

    let relative = roots
        .iter()
        .find_map(|root| path.strip_prefix(root).ok())
        .unwrap_or(path);

    !relative.components().any(|c| match c {
        Component::Normal(name) => name
            .to_str()
            .is_some_and(|name| options.exclude.iter().any(|e| e == name)),
        _ => false,
    })
}

/// Bring the output in line with a watch event.
///
/// Returns the affected output path, or `None` if nothing changed.
pub async fn apply_watch_event(
    converter: &Arc<BatchConverter>,
    event: WatchEvent,
) -> Result<Option<PathBuf>, ConvertError> {
    match event {
        WatchEvent::SourceChanged(source) => {
            tracing::info!("Changed: {}", source.display());
            let converter = Arc::clone(converter);
            let output = tokio::task::spawn_blocking(move || converter.convert_path(&source))
                .await
                .map_err(|e| ConvertError::Task(e.to_string()))??;
            Ok(Some(output))
        }

        WatchEvent::SourceRemoved(source) => {
            let Some(output) = output_path_for(&source, &converter.config().discover) else {
                return Ok(None);
            };
            match fs::remove_file(&output) {
                Ok(()) => {
                    tracing::info!("Removed: {}", output.display());
                    Ok(Some(output))
                }
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
                Err(e) => Err(ConvertError::Filesystem {
                    path: output,
                    source: e,
                }),
            }
        }
    }
}
