//! `esv`: run energy-storage valuation studies from the command line.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use esv_batch::{load_series, read_jobs, run_batch, BatchRunnerConfig};
use esv_core::{ParamOverrides, ParamValue};
use esv_solver::{RemoteConfig, SolverId, SolverSpec};
use esv_valuation::{
    write_csv, write_parquet, ArbitrageValuation, Optimizer, PeakShavingValuation,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "esv", version, about = "Energy-storage valuation studies")]
struct Cli {
    /// Emit debug-level tracing.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single valuation study.
    Run {
        /// Valuation model to run.
        #[arg(value_enum)]
        model: ModelArg,

        /// CSV or Parquet file holding the input series.
        #[arg(long)]
        input: PathBuf,

        /// Input column to read; defaults to "price" or "load" per model.
        #[arg(long)]
        column: Option<String>,

        /// Local solver backend.
        #[arg(long, conflicts_with = "remote")]
        solver: Option<String>,

        /// Submit the solve to a remote service at this endpoint.
        #[arg(long)]
        remote: Option<String>,

        /// Solver identity for the remote job.
        #[arg(long, requires = "remote")]
        remote_solver: Option<String>,

        /// Remote solve timeout in seconds.
        #[arg(long, default_value_t = 300)]
        timeout: u64,

        /// Parameter override, KEY=VALUE (comma-separate series values).
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,

        /// Write the results table here (.csv or .parquet).
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Run a batch of studies described by a JSON job list.
    Batch {
        /// JSON file with the job descriptions.
        #[arg(long)]
        jobs: PathBuf,

        /// Directory receiving per-job results and the manifest.
        #[arg(long)]
        output_root: PathBuf,

        /// Worker threads; 0 auto-detects.
        #[arg(long, default_value_t = 0)]
        threads: usize,
    },

    /// List solver backends and their availability.
    Solvers,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModelArg {
    Arbitrage,
    PeakShaving,
}

impl ModelArg {
    fn default_column(self) -> &'static str {
        match self {
            ModelArg::Arbitrage => "price",
            ModelArg::PeakShaving => "load",
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("installing tracing subscriber")?;

    match cli.command {
        Commands::Run {
            model,
            input,
            column,
            solver,
            remote,
            remote_solver,
            timeout,
            set,
            output,
        } => cmd_run(
            model,
            &input,
            column.as_deref(),
            solver.as_deref(),
            remote.as_deref(),
            remote_solver.as_deref(),
            timeout,
            &set,
            output.as_deref(),
        ),
        Commands::Batch {
            jobs,
            output_root,
            threads,
        } => cmd_batch(&jobs, output_root, threads),
        Commands::Solvers => cmd_solvers(),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_run(
    model: ModelArg,
    input: &Path,
    column: Option<&str>,
    solver: Option<&str>,
    remote: Option<&str>,
    remote_solver: Option<&str>,
    timeout: u64,
    set: &[String],
    output: Option<&Path>,
) -> Result<()> {
    let column = column.unwrap_or_else(|| model.default_column());
    let series = load_series(input, column)?;
    info!(
        input = %input.display(),
        column,
        periods = series.len(),
        "loaded input series"
    );

    let spec = build_solver_spec(solver, remote, remote_solver, timeout)?;
    let overrides = parse_overrides(set)?;

    let mut frame = match model {
        ModelArg::Arbitrage => {
            let mut study = ArbitrageValuation::new(series, spec);
            study.apply_parameters(&overrides)?;
            let frame = study.run()?;
            if let Some(summary) = study.summary() {
                println!(
                    "Net revenue: ${:.2} (gross ${:.2}, charging ${:.2})",
                    summary.net_revenue, summary.gross_revenue, summary.charging_cost
                );
            }
            frame
        }
        ModelArg::PeakShaving => {
            let mut study = PeakShavingValuation::new(series, spec);
            study.apply_parameters(&overrides)?;
            let frame = study.run()?;
            if let Some(summary) = study.summary() {
                println!(
                    "Billed peak: {:.3} MW (raw {:.3} MW, reduction {:.3} MW)",
                    summary.billed_peak_mw, summary.raw_peak_mw, summary.reduction_mw
                );
            }
            frame
        }
    };

    match output {
        Some(path) => {
            if path.extension().and_then(|ext| ext.to_str()) == Some("parquet") {
                write_parquet(path, &mut frame)?;
            } else {
                write_csv(path, &mut frame)?;
            }
            println!("Results written to {}", path.display());
        }
        None => println!("{}", frame),
    }
    Ok(())
}

fn cmd_batch(jobs_path: &Path, output_root: PathBuf, threads: usize) -> Result<()> {
    let jobs = read_jobs(jobs_path)?;
    if jobs.is_empty() {
        bail!("job list '{}' contains no jobs", jobs_path.display());
    }

    let summary = run_batch(&BatchRunnerConfig {
        jobs,
        output_root,
        threads,
    })?;
    println!(
        "Batch finished: {} ok, {} failed; manifest at {}",
        summary.success,
        summary.failure,
        summary.manifest_path.display()
    );
    Ok(())
}

fn cmd_solvers() -> Result<()> {
    let available = esv_solver::available_backends();
    for id in SolverId::all() {
        let status = if available.contains(id) {
            "available"
        } else if *id == SolverId::Cbc {
            "remote jobs only"
        } else {
            "not built in"
        };
        println!("{:<10} {:<34} {}", id.display_name(), id.description(), status);
    }
    Ok(())
}

fn build_solver_spec(
    solver: Option<&str>,
    remote: Option<&str>,
    remote_solver: Option<&str>,
    timeout: u64,
) -> Result<SolverSpec> {
    if let Some(endpoint) = remote {
        let mut config = RemoteConfig::new(endpoint).with_timeout(Duration::from_secs(timeout));
        if let Some(name) = remote_solver {
            config = config.with_job_solver(name.parse::<SolverId>()?);
        }
        return Ok(SolverSpec::Remote(config));
    }
    match solver {
        Some(name) => Ok(SolverSpec::Local(name.parse::<SolverId>()?)),
        None => Ok(SolverSpec::default()),
    }
}

fn parse_overrides(pairs: &[String]) -> Result<ParamOverrides> {
    let mut overrides = ParamOverrides::new();
    for raw in pairs {
        let (name, value) = parse_override(raw)?;
        overrides.push(&name, value);
    }
    Ok(overrides)
}

fn parse_override(raw: &str) -> Result<(String, ParamValue)> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected KEY=VALUE, got '{}'", raw))?;
    let value = if value.contains(',') {
        let entries = value
            .split(',')
            .map(|item| item.trim().parse::<f64>())
            .collect::<Result<Vec<f64>, _>>()
            .with_context(|| format!("parsing series override '{}'", raw))?;
        ParamValue::Series(entries)
    } else {
        ParamValue::Scalar(
            value
                .trim()
                .parse::<f64>()
                .with_context(|| format!("parsing override '{}'", raw))?,
        )
    };
    Ok((name.trim().to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn overrides_parse_scalars_and_series() {
        let (name, value) = parse_override("power_rating_mw=2.5").unwrap();
        assert_eq!(name, "power_rating_mw");
        assert_eq!(value, ParamValue::Scalar(2.5));

        let (name, value) = parse_override("price=1.0, 2.0,3.5").unwrap();
        assert_eq!(name, "price");
        assert_eq!(value, ParamValue::Series(vec![1.0, 2.0, 3.5]));

        assert!(parse_override("power_rating_mw").is_err());
        assert!(parse_override("power_rating_mw=abc").is_err());
    }

    #[test]
    fn remote_spec_takes_precedence() {
        let spec = build_solver_spec(None, Some("solve.example.org:7421"), Some("cbc"), 60)
            .unwrap();
        match spec {
            SolverSpec::Remote(config) => {
                assert_eq!(config.endpoint, "solve.example.org:7421");
                assert_eq!(config.job_solver, SolverId::Cbc);
                assert_eq!(config.timeout, Duration::from_secs(60));
            }
            other => panic!("expected remote spec, got {:?}", other),
        }
    }
}
