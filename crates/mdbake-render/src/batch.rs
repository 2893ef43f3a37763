//! Batch conversion of a content root.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use mdbake_docs::{discover, output_path_for, DiscoverError, DiscoverOptions, SourceDoc};

use crate::renderer::{RenderError, RenderJob, Renderer};

/// Configuration for converting a content root.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Directory searched recursively for sources
    pub root: PathBuf,

    /// Source/output extensions and excluded directories
    pub discover: DiscoverOptions,

    /// Worker threads (0 = logical CPUs)
    pub jobs: usize,

    /// Stop scheduling new documents after the first failure
    pub fail_fast: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            discover: DiscoverOptions::default(),
            jobs: 0,
            fail_fast: false,
        }
    }
}

/// Errors for a single document or for the batch as a whole.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("Failed to render {}: {source}", path.display())]
    Render {
        path: PathBuf,
        #[source]
        source: RenderError,
    },

    #[error("{}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Discover(#[from] DiscoverError),

    #[error("Not a source document: {}", .0.display())]
    NotASource(PathBuf),

    #[error("Failed to start worker pool: {0}")]
    Pool(String),

    #[error("Background render task failed: {0}")]
    Task(String),
}

impl ConvertError {
    /// Attribute a renderer error to the document that caused it.
    fn from_render(path: &Path, error: RenderError) -> Self {
        match error {
            RenderError::Io { path, source } => ConvertError::Filesystem { path, source },
            other => ConvertError::Render {
                path: path.to_path_buf(),
                source: other,
            },
        }
    }
}

/// A document that failed to convert.
#[derive(Debug)]
pub struct ConvertFailure {
    /// Source document
    pub path: PathBuf,

    /// What went wrong
    pub error: ConvertError,
}

/// Result of converting a content root.
#[derive(Debug, Default)]
pub struct ConvertSummary {
    /// Number of source documents discovered, readable or not
    pub total: usize,

    /// Number of documents written
    pub converted: usize,

    /// Documents not attempted because of `fail_fast`
    pub skipped: usize,

    /// Documents that failed
    pub failures: Vec<ConvertFailure>,

    /// Total time in milliseconds
    pub duration_ms: u64,
}

impl ConvertSummary {
    /// Whether every discovered document was converted.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.skipped == 0
    }
}

enum Outcome {
    Converted,
    Skipped,
    Failed(ConvertFailure),
}

/// Converts every source document under a root with one renderer.
pub struct BatchConverter {
    config: BatchConfig,
    renderer: Arc<dyn Renderer>,
}

impl BatchConverter {
    /// Create a new batch converter.
    pub fn new(config: BatchConfig, renderer: Arc<dyn Renderer>) -> Self {
        Self { config, renderer }
    }

    /// The batch configuration.
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Convert every source document under the root.
    ///
    /// Per-document failures, including entries under the root that could not
    /// be read, are collected in the summary. Only a missing root or a pool
    /// that fails to start is returned as an error.
    pub fn convert(&self) -> Result<ConvertSummary, ConvertError> {
        let start = Instant::now();

        let discovery = discover(&self.config.root, &self.config.discover)?;
        let docs = discovery.docs;

        tracing::info!(
            "Converting {} documents under {} with {}",
            docs.len(),
            self.config.root.display(),
            self.renderer.name()
        );

        let pool = ThreadPoolBuilder::new()
            .num_threads(self.config.jobs)
            .build()
            .map_err(|e| ConvertError::Pool(e.to_string()))?;

        let stop = AtomicBool::new(false);

        let outcomes: Vec<Outcome> = pool.install(|| {
            docs.par_iter()
                .map(|doc| {
                    if self.config.fail_fast && stop.load(Ordering::Relaxed) {
                        return Outcome::Skipped;
                    }
                    match self.convert_doc(doc) {
                        Ok(()) => Outcome::Converted,
                        Err(error) => {
                            stop.store(true, Ordering::Relaxed);
                            tracing::error!("{}", error);
                            Outcome::Failed(ConvertFailure {
                                path: doc.source_path.clone(),
                                error,
                            })
                        }
                    }
                })
                .collect()
        });

        let mut summary = ConvertSummary {
            total: docs.len() + discovery.unreadable.len(),
            ..Default::default()
        };

        for entry in discovery.unreadable {
            tracing::error!("{}: {}", entry.path.display(), entry.error);
            summary.failures.push(ConvertFailure {
                path: entry.path.clone(),
                error: ConvertError::Filesystem {
                    path: entry.path,
                    source: entry.error,
                },
            });
        }

        for outcome in outcomes {
            match outcome {
                Outcome::Converted => summary.converted += 1,
                Outcome::Skipped => summary.skipped += 1,
                Outcome::Failed(failure) => summary.failures.push(failure),
            }
        }

        summary.duration_ms = start.elapsed().as_millis() as u64;

        Ok(summary)
    }

    /// Convert a single source document, e.g. after it changed on disk.
    pub fn convert_path(&self, source: &Path) -> Result<PathBuf, ConvertError> {
        let output = output_path_for(source, &self.config.discover)
            .ok_or_else(|| ConvertError::NotASource(source.to_path_buf()))?;

        let job = RenderJob {
            source: source.to_path_buf(),
            output,
        };

        self.render_job(&job)?;

        Ok(job.output)
    }

    fn convert_doc(&self, doc: &SourceDoc) -> Result<(), ConvertError> {
        self.render_job(&RenderJob {
            source: doc.source_path.clone(),
            output: doc.output_path.clone(),
        })
    }

    fn render_job(&self, job: &RenderJob) -> Result<(), ConvertError> {
        self.renderer
            .render(job)
            .map_err(|e| ConvertError::from_render(&job.source, e))?;

        tracing::debug!("{} -> {}", job.source.display(), job.output.display());

        Ok(())
    }
}
