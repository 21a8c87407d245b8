//! One-shot report generation from the command line.
//!
//! Writes the plain-text report to `<DIR>/<topic>_report.txt`. When the run
//! ends, the timestamped stage history goes to stderr. Ctrl-C abandons the
//! run.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use market_research::{PipelineState, Report, RunContext};
use server_core::{server::AppState, Config};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "report")]
#[command(about = "Generate an industry market research report")]
struct Cli {
    /// Industry to research, e.g. "Healthcare"
    industry: String,

    /// Directory to write the report file into
    #[arg(long, default_value = ".")]
    out: PathBuf,

    /// Print the report instead of writing a file
    #[arg(long)]
    stdout: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;
    let state = AppState::from_config(&config);

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    let mut ctx = RunContext::with_cancel(cancel);
    let result = state.pipeline.run_with_context(&mut ctx, &cli.industry).await;
    print_progress(&ctx);

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            eprintln!("{}", e);
            if !e.suggestions().is_empty() {
                eprintln!("Suggestions: {}", e.suggestions().join(", "));
            }
            return Ok(ExitCode::FAILURE);
        }
    };

    if cli.stdout {
        print!("{}", report.to_text());
    } else {
        let path = write_report(&report, &cli.out)?;
        eprintln!("Report written to {}", path.display());
    }
    if report.is_low_confidence() {
        eprintln!("Warning: low confidence, no sources passed the relevance check");
    }

    Ok(ExitCode::SUCCESS)
}

fn print_progress(ctx: &RunContext) {
    for line in progress_lines(ctx) {
        eprintln!("{}", line);
    }
}

/// One `[HH:MM:SS] label` line per recorded state after `Idle`.
fn progress_lines(ctx: &RunContext) -> Vec<String> {
    ctx.history()
        .iter()
        .filter_map(|transition| {
            let label = match &transition.state {
                PipelineState::Idle => return None,
                PipelineState::Validating => "validating industry",
                PipelineState::Searching => "searching encyclopedia",
                PipelineState::Retrieving => "retrieving articles",
                PipelineState::Filtering => "filtering sources",
                PipelineState::Synthesizing => "synthesizing report",
                PipelineState::Done => "done",
                PipelineState::Failed { .. } => "failed",
            };
            Some(format!("[{}] {}", transition.at.format("%H:%M:%S"), label))
        })
        .collect()
}

fn write_report(report: &Report, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(report.file_name());
    std::fs::write(&path, report.to_text())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
