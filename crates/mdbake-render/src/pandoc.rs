//! External renderer invoked as a subprocess.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::renderer::{RenderError, RenderJob, Renderer};

/// Renders documents by running pandoc (or a compatible command) once per file.
///
/// The command line is
/// `<command> <source> -o <output> [--css <stylesheet>] --standalone --embed-resources [extra...]`.
#[derive(Debug, Clone)]
pub struct PandocRenderer {
    command: String,
    stylesheet: Option<PathBuf>,
    extra_args: Vec<String>,
}

impl PandocRenderer {
    /// Create a renderer for the given command.
    pub fn new(command: String, stylesheet: Option<PathBuf>, extra_args: Vec<String>) -> Self {
        Self {
            command,
            stylesheet,
            extra_args,
        }
    }

    /// Arguments passed to the command for one job.
    pub fn args(&self, job: &RenderJob) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            job.source.clone().into_os_string(),
            "-o".into(),
            job.output.clone().into_os_string(),
        ];

        if let Some(stylesheet) = &self.stylesheet {
            args.push("--css".into());
            args.push(stylesheet.clone().into_os_string());
        }

        args.push("--standalone".into());
        args.push("--embed-resources".into());
        args.extend(self.extra_args.iter().map(OsString::from));

        args
    }
}

impl Renderer for PandocRenderer {
    fn name(&self) -> &'static str {
        "pandoc"
    }

    fn render(&self, job: &RenderJob) -> Result<(), RenderError> {
        let args = self.args(job);
        tracing::debug!("Running {} {:?}", self.command, args);

        let output = Command::new(&self.command)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| RenderError::Spawn {
                command: self.command.clone(),
                message: e.to_string(),
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if !output.status.success() {
            return Err(RenderError::Failed {
                status: output.status.to_string(),
                stderr,
            });
        }

        if !stderr.is_empty() {
            tracing::warn!("{}: {}", job.source.display(), stderr);
        }

        Ok(())
    }
}
