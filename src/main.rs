use kepsweep::{bench_integrators, open_in_viewer, render_heatmaps, run_sweep};
use kepsweep::{CancelToken, SweepConfig};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Sweep config (YAML). Built-in reference sweep when omitted
    #[arg(short)]
    file_name: Option<PathBuf>,

    /// Benchmark the integrators instead of sweeping
    #[arg(long)]
    bench: bool,
}

// load here to keep main clean
fn load_config(args: &Args) -> Result<SweepConfig> {
    match &args.file_name {
        Some(path) => SweepConfig::from_yaml_file(path)
            .with_context(|| format!("failed to load sweep config {}", path.display())),
        None => Ok(SweepConfig::default()),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    if args.bench {
        bench_integrators();
        return Ok(());
    }

    let cfg = load_config(&args)?;

    let cancel = CancelToken::new();
    let cancel_for_ctrlc = cancel.clone();
    ctrlc::set_handler(move || {
        warn!("interrupt received, cancelling sweep");
        cancel_for_ctrlc.cancel();
    })
    .context("error setting Ctrl-C handler")?;

    info!(
        resolution = cfg.resolution,
        workers = cfg.workers,
        integrators = ?cfg.integrators,
        "starting sweep"
    );
    let report = run_sweep(&cfg, &cancel).context("sweep failed")?;

    render_heatmaps(&report, &cfg.output).context("failed to render heatmaps")?;

    for s in report.speedups() {
        println!("{}", s.summary());
    }

    if cfg.open_output {
        open_in_viewer(&cfg.output);
    }

    Ok(())
}
