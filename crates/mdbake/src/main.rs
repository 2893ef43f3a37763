//! mdbake CLI - render a tree of Markdown documents to standalone HTML.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use mdbake_render::RenderEngine;
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "mdbake")]
#[command(about = "Render a tree of Markdown documents to standalone HTML")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to mdbake.toml config file
    #[arg(short, long, default_value = "mdbake.toml")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render every Markdown file under the content root to HTML
    Convert {
        /// Content root (defaults to config or ".")
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Renderer: pandoc or builtin
        #[arg(short, long)]
        engine: Option<RenderEngine>,

        /// Shared stylesheet to embed
        #[arg(short, long)]
        stylesheet: Option<PathBuf>,

        /// Worker threads (0 = one per CPU)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Stop after the first failed document
        #[arg(long)]
        fail_fast: bool,
    },

    /// Delete generated HTML files under the content root
    Clean {
        /// Content root (defaults to config or ".")
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Only delete HTML files that have a Markdown source next to them
        #[arg(long)]
        only_generated: bool,
    },

    /// Write a default mdbake.toml and stylesheet
    Init {
        /// Overwrite existing files
        #[arg(short, long)]
        yes: bool,
    },

    /// Convert, then re-render documents as they change
    Watch {
        /// Content root (defaults to config or ".")
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Renderer: pandoc or builtin
        #[arg(short, long)]
        engine: Option<RenderEngine>,
    },

    /// Convert, then serve documents with live reload
    Serve {
        /// Content root (defaults to config or ".")
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Renderer: pandoc or builtin
        #[arg(short, long)]
        engine: Option<RenderEngine>,

        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// Do not open browser
        #[arg(long)]
        no_open: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    match cli.command {
        Commands::Convert {
            root,
            engine,
            stylesheet,
            jobs,
            fail_fast,
        } => {
            commands::convert::run(&cli.config, root, engine, stylesheet, jobs, fail_fast).await?;
        }
        Commands::Clean {
            root,
            only_generated,
        } => {
            commands::clean::run(&cli.config, root, only_generated).await?;
        }
        Commands::Init { yes } => {
            commands::init::run(&cli.config, yes).await?;
        }
        Commands::Watch { root, engine } => {
            commands::watch::run(&cli.config, root, engine).await?;
        }
        Commands::Serve {
            root,
            engine,
            port,
            no_open,
        } => {
            commands::serve::run(&cli.config, root, engine, port, !no_open).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_convert_overrides() {
        let cli = Cli::try_parse_from([
            "mdbake",
            "convert",
            "--root",
            "notes",
            "--engine",
            "builtin",
            "--jobs",
            "3",
            "--fail-fast",
        ])
        .unwrap();

        match cli.command {
            Commands::Convert {
                root,
                engine,
                jobs,
                fail_fast,
                ..
            } => {
                assert_eq!(root, Some(PathBuf::from("notes")));
                assert_eq!(engine, Some(RenderEngine::Builtin));
                assert_eq!(jobs, Some(3));
                assert!(fail_fast);
            }
            _ => panic!("expected convert"),
        }
    }

    #[test]
    fn rejects_unknown_engine() {
        let result = Cli::try_parse_from(["mdbake", "convert", "--engine", "markdown-it"]);
        assert!(result.is_err());
    }
}
