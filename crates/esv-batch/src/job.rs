//! Batch job descriptions and per-job outcome records.

use esv_core::ParamValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Which valuation model a job runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelKind {
    Arbitrage,
    PeakShaving,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Arbitrage => "arbitrage",
            ModelKind::PeakShaving => "peak-shaving",
        }
    }

    /// Input column read when the job does not name one.
    pub fn default_column(&self) -> &'static str {
        match self {
            ModelKind::Arbitrage => "price",
            ModelKind::PeakShaving => "load",
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One valuation study to run: model kind, input series, and overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchJob {
    pub name: String,
    pub kind: ModelKind,
    /// CSV or Parquet file holding the input series.
    pub input: PathBuf,
    /// Column to read from the input; defaults per model kind.
    #[serde(default)]
    pub column: Option<String>,
    /// Local solver ID; defaults to the crate default backend.
    #[serde(default)]
    pub solver: Option<String>,
    /// Parameter overrides applied before population.
    #[serde(default)]
    pub overrides: BTreeMap<String, ParamValue>,
}

/// Outcome record for one job, as written to the batch manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchJobRecord {
    pub name: String,
    pub kind: ModelKind,
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub results_path: Option<PathBuf>,
    #[serde(default)]
    pub rows: Option<usize>,
}

impl BatchJobRecord {
    pub fn ok(job: &BatchJob, results_path: PathBuf, rows: usize) -> Self {
        Self {
            name: job.name.clone(),
            kind: job.kind,
            status: "ok".to_string(),
            message: None,
            results_path: Some(results_path),
            rows: Some(rows),
        }
    }

    pub fn failed(job: &BatchJob, message: String) -> Self {
        Self {
            name: job.name.clone(),
            kind: job.kind,
            status: "failed".to_string(),
            message: Some(message),
            results_path: None,
            rows: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_deserializes_with_defaults() {
        let job: BatchJob = serde_json::from_str(
            r#"{"name": "july", "kind": "arbitrage", "input": "prices.csv"}"#,
        )
        .unwrap();
        assert_eq!(job.kind, ModelKind::Arbitrage);
        assert!(job.column.is_none());
        assert!(job.overrides.is_empty());
    }

    #[test]
    fn overrides_accept_scalars_and_series() {
        let job: BatchJob = serde_json::from_str(
            r#"{
                "name": "july",
                "kind": "peak-shaving",
                "input": "load.parquet",
                "overrides": {"power_rating_mw": 2.5, "load": [1.0, 2.0]}
            }"#,
        )
        .unwrap();
        assert_eq!(
            job.overrides.get("power_rating_mw"),
            Some(&ParamValue::Scalar(2.5))
        );
        assert_eq!(
            job.overrides.get("load"),
            Some(&ParamValue::Series(vec![1.0, 2.0]))
        );
    }

    #[test]
    fn default_columns_per_kind() {
        assert_eq!(ModelKind::Arbitrage.default_column(), "price");
        assert_eq!(ModelKind::PeakShaving.default_column(), "load");
    }
}
