//! The batch runner: rayon fan-out of independent valuation studies.

use crate::input::load_series;
use crate::job::{BatchJob, BatchJobRecord, ModelKind};
use crate::manifest::{write_batch_manifest, BatchManifest};
use anyhow::{Context, Result};
use chrono::Utc;
use esv_core::ParamOverrides;
use esv_solver::{SolverId, SolverSpec};
use esv_valuation::{write_csv, ArbitrageValuation, Optimizer, PeakShavingValuation};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::fs;
use std::path::PathBuf;
use tracing::{error, info};

/// Runner settings for one batch invocation.
pub struct BatchRunnerConfig {
    pub jobs: Vec<BatchJob>,
    pub output_root: PathBuf,
    /// Worker threads; 0 auto-detects the CPU count.
    pub threads: usize,
}

/// Summary returned after the run so clients can log success/failure counts
/// and the manifest location.
pub struct BatchSummary {
    pub success: usize,
    pub failure: usize,
    pub manifest_path: PathBuf,
    pub jobs: Vec<BatchJobRecord>,
}

pub fn run_batch(config: &BatchRunnerConfig) -> Result<BatchSummary> {
    fs::create_dir_all(&config.output_root).with_context(|| {
        format!(
            "creating batch output root '{}'",
            config.output_root.display()
        )
    })?;

    let thread_count = if config.threads == 0 {
        num_cpus::get()
    } else {
        config.threads
    };
    let pool = ThreadPoolBuilder::new()
        .num_threads(thread_count)
        .build()
        .context("building Rayon thread pool for batch runs")?;

    // Optimizer instances are independent, so jobs fan out freely.
    let job_records: Vec<BatchJobRecord> = pool.install(|| {
        config
            .jobs
            .par_iter()
            .map(|job| run_job(job, config))
            .collect()
    });

    let success = job_records
        .iter()
        .filter(|record| record.status == "ok")
        .count();
    let failure = job_records.len() - success;

    let manifest = BatchManifest {
        created_at: Utc::now(),
        num_jobs: job_records.len(),
        success,
        failure,
        jobs: job_records.clone(),
    };
    let manifest_path = config.output_root.join("batch_manifest.json");
    write_batch_manifest(&manifest_path, &manifest)?;

    Ok(BatchSummary {
        success,
        failure,
        manifest_path,
        jobs: job_records,
    })
}

/// Execute a single job, folding any failure into its record.
fn run_job(job: &BatchJob, config: &BatchRunnerConfig) -> BatchJobRecord {
    match execute_job(job, config) {
        Ok((results_path, rows)) => {
            info!(job = %job.name, rows, "batch job finished");
            BatchJobRecord::ok(job, results_path, rows)
        }
        Err(err) => {
            error!(job = %job.name, error = %format!("{:#}", err), "batch job failed");
            BatchJobRecord::failed(job, format!("{:#}", err))
        }
    }
}

fn execute_job(job: &BatchJob, config: &BatchRunnerConfig) -> Result<(PathBuf, usize)> {
    let column = job
        .column
        .as_deref()
        .unwrap_or_else(|| job.kind.default_column());
    let series = load_series(&job.input, column)?;

    let solver = match job.solver.as_deref() {
        Some(name) => SolverSpec::Local(name.parse::<SolverId>()?),
        None => SolverSpec::default(),
    };

    let mut overrides = ParamOverrides::new();
    for (name, value) in &job.overrides {
        overrides.push(name, value.clone());
    }

    let mut frame = match job.kind {
        ModelKind::Arbitrage => {
            let mut study = ArbitrageValuation::new(series, solver);
            study.apply_parameters(&overrides)?;
            study.run()?
        }
        ModelKind::PeakShaving => {
            let mut study = PeakShavingValuation::new(series, solver);
            study.apply_parameters(&overrides)?;
            study.run()?
        }
    };

    let job_dir = config.output_root.join(&job.name);
    fs::create_dir_all(&job_dir)
        .with_context(|| format!("creating job output directory '{}'", job_dir.display()))?;
    let results_path = job_dir.join("results.csv");
    write_csv(&results_path, &mut frame)?;

    Ok((results_path, frame.height()))
}
