//! techo: a terminal notebook.
//!
//! Usage:
//!   # Interactive shell on the welcome notebook, or on a file
//!   techo
//!   techo notes.json
//!
//!   # Run every cell of a notebook and print the results
//!   techo run notes.json
//!   techo run notes.json --write    # save outputs back to the file
//!
//! Logs go to stderr; set RUST_LOG or --log-level to see them.

mod render;
mod shell;

use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use techo_kernel::{KernelConfig, Notebook, OutputSink, persist};
use techo_types::ExecOutcome;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, fmt};

use crate::shell::{Flow, Shell};

/// Terminal notebook with undoable cells.
#[derive(Parser, Debug)]
#[command(name = "techo", version)]
#[command(about = "Terminal notebook with text, code and chart cells")]
struct Args {
    /// Notebook file to open
    file: Option<PathBuf>,

    /// Config file (default: ~/.config/techo/config.ron)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Undo steps to keep (overrides config)
    #[arg(long, global = true)]
    history_limit: Option<usize>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run every cell of FILE and print outputs and errors
    Run {
        file: PathBuf,

        /// Write outputs back to FILE
        #[arg(long)]
        write: bool,
    },
}

/// Streams script output straight to stdout.
struct StdoutSink;

impl OutputSink for StdoutSink {
    fn write(&self, text: &str) {
        let mut stdout = std::io::stdout().lock();
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    }
}

fn load_config(args: &Args) -> Result<KernelConfig> {
    let mut config = match &args.config {
        Some(path) => KernelConfig::load_from_path(path)?,
        None => KernelConfig::load_or_default(),
    };
    if let Some(limit) = args.history_limit {
        config.history_limit = limit;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Logs to stderr; stdout carries notebook output
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let config = load_config(&args)?;
    tracing::debug!(?config, "configuration");

    match &args.command {
        Some(Commands::Run { file, write }) => run_batch(file, *write, &config).await,
        None => {
            interactive(args.file.clone(), &config).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Load `file`, run every cell, report. Fails if any cell failed.
async fn run_batch(file: &Path, write: bool, config: &KernelConfig) -> Result<ExitCode> {
    let doc = persist::load_file(file)
        .await
        .with_context(|| format!("cannot open {}", file.display()))?;
    let mut notebook = Notebook::from_document(doc, config);
    let sink: Arc<dyn OutputSink> = Arc::new(StdoutSink);

    let cells: Vec<_> = notebook
        .document()
        .cells()
        .iter()
        .map(|c| (c.id().clone(), c.kind()))
        .collect();

    let mut failures = 0;
    for (i, (id, kind)) in cells.into_iter().enumerate() {
        if !kind.is_executable() {
            continue;
        }
        println!("── [{}] {} ──", i + 1, kind);
        match notebook.run_cell_with(&id, sink.clone())? {
            ExecOutcome::Failed(message) => {
                failures += 1;
                eprintln!("error: {}", message);
            }
            ExecOutcome::Validated => println!("ok"),
            ExecOutcome::Output(_) | ExecOutcome::Skipped => {}
        }
    }

    if write {
        notebook.save_to(file).await?;
        tracing::info!("wrote results to {}", file.display());
    }

    if failures > 0 {
        eprintln!("{} cell(s) failed", failures);
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Read commands from stdin until EOF or `quit`.
async fn interactive(file: Option<PathBuf>, config: &KernelConfig) -> Result<()> {
    let mut notebook = Notebook::new(config);
    if let Some(path) = &file {
        notebook
            .load_from(path)
            .await
            .with_context(|| format!("cannot open {}", path.display()))?;
    }

    let prompt = std::io::stdin().is_terminal();
    let mut shell = Shell::new(notebook, file, std::io::stdout());
    shell.handle_line("show").await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if prompt {
            print!("techo> ");
            std::io::stdout().flush()?;
        }
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match shell.handle_line(&line).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(e) => println!("warning: {:#}", e),
        }
    }
    tracing::info!(
        path = ?shell.path(),
        cells = shell.notebook().document().len(),
        "session ended"
    );
    Ok(())
}
