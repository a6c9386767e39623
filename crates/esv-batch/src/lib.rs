//! Batch execution of valuation studies.
//!
//! Runs many independent optimizer instances in parallel, one per job, and
//! records the outcome of each in a JSON manifest. Instances share no mutable
//! state, so job-level parallelism is safe by construction.

pub mod input;
pub mod job;
pub mod manifest;
pub mod runner;

pub use input::load_series;
pub use job::{BatchJob, BatchJobRecord, ModelKind};
pub use manifest::{read_jobs, write_batch_manifest, BatchManifest};
pub use runner::{run_batch, BatchRunnerConfig, BatchSummary};
