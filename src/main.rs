use std::path::PathBuf;
use std::time::Instant;

use acs_refiner::algorithm::pipeline::{Pipeline, RefinerOutput};
use acs_refiner::utils::io::{OutputWriter, RunInputs, RunManifest, RunSummary};
use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use log::info;

#[global_allocator]
static ALLOC: snmalloc_rs::SnMalloc = snmalloc_rs::SnMalloc;

#[derive(Debug, Parser)]
#[command(name = "acs-refiner")]
#[command(about = "Rake PUMS person records against published ACS marginal totals")]
#[command(version)]
struct Args {
    /// Run manifest (JSON) naming the input files
    manifest: PathBuf,

    /// Write outputs here instead of the manifest's output directory
    #[arg(short, long, env = "ACS_REFINER_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Process units one at a time
    #[arg(long)]
    sequential: bool,

    /// Worker threads for parallel raking
    #[arg(short, long, env = "ACS_REFINER_THREADS")]
    threads: Option<usize>,

    /// Solver convergence tolerance
    #[arg(long)]
    tolerance: Option<f64>,

    /// Solver sweep cap
    #[arg(long)]
    max_sweeps: Option<u32>,

    /// Also write one file per stratum
    #[arg(long)]
    partition: bool,

    /// Do not draw progress bars
    #[arg(long)]
    no_progress: bool,
}

impl Args {
    /// Apply command line overrides to the manifest
    fn apply(&self, manifest: &mut RunManifest) {
        let config = &mut manifest.config;
        if let Some(dir) = &self.output_dir {
            manifest.output_dir.clone_from(dir);
        }
        if self.sequential {
            config.parallel = false;
        }
        if self.threads.is_some() {
            config.threads = self.threads;
        }
        if let Some(tolerance) = self.tolerance {
            config.solver.tolerance = tolerance;
        }
        if let Some(max_sweeps) = self.max_sweeps {
            config.solver.max_sweeps = max_sweeps;
        }
        if self.partition {
            config.partition_output = true;
        }
        if self.no_progress {
            config.show_progress = false;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let started_at = Utc::now();
    let start = Instant::now();

    let mut manifest = RunManifest::from_json_file(&args.manifest)
        .with_context(|| format!("Failed to load manifest {}", args.manifest.display()))?;
    args.apply(&mut manifest);
    manifest.validate().context("Invalid settings")?;
    info!("{}", manifest.config);

    let RunInputs {
        units,
        marginals,
        acs,
    } = RunInputs::load(&manifest)
        .await
        .context("Failed to load inputs")?;
    info!(
        "Loaded {} units and marginals for {} states",
        units.len(),
        marginals.len()
    );

    let output = if units.is_empty() {
        RefinerOutput::default()
    } else {
        let pipeline = Pipeline::new(manifest.config.clone())?;
        tokio::task::spawn_blocking(move || pipeline.run(units, &marginals))
            .await
            .context("Raking task failed")?
            .context("Raking failed")?
    };

    let writer = OutputWriter::new(&manifest.output_dir, manifest.config.partition_output)
        .with_context(|| format!("Cannot write to {}", manifest.output_dir.display()))?;
    let mut outputs = writer.write_refiner_output(&output)?;
    if let Some(table) = &acs {
        outputs.push(writer.write_acs(table)?);
    }

    let summary = RunSummary::new(started_at, &output, outputs);
    let summary_path = writer.write_summary(&summary)?;

    info!(
        "Raked {} units ({} skipped, {} diagnostics) in {:?}; summary in {}",
        output.units_completed,
        output.failures.len(),
        output.diagnostics.len(),
        start.elapsed(),
        summary_path.display()
    );
    Ok(())
}
