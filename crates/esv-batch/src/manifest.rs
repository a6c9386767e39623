//! Batch manifest reading and writing.

use crate::job::{BatchJob, BatchJobRecord};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// Summary manifest written next to the batch outputs, for downstream tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchManifest {
    pub created_at: DateTime<Utc>,
    pub num_jobs: usize,
    pub success: usize,
    pub failure: usize,
    pub jobs: Vec<BatchJobRecord>,
}

/// Write the manifest as pretty-printed JSON.
pub fn write_batch_manifest(path: &Path, manifest: &BatchManifest) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("creating batch manifest '{}'", path.display()))?;
    serde_json::to_writer_pretty(file, manifest)
        .with_context(|| format!("writing batch manifest '{}'", path.display()))?;
    Ok(())
}

/// Read a job list from a JSON file.
pub fn read_jobs(path: &Path) -> Result<Vec<BatchJob>> {
    let file =
        File::open(path).with_context(|| format!("opening job list '{}'", path.display()))?;
    let jobs: Vec<BatchJob> = serde_json::from_reader(file)
        .with_context(|| format!("parsing job list '{}'", path.display()))?;
    Ok(jobs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::ModelKind;

    #[test]
    fn manifest_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch_manifest.json");
        let manifest = BatchManifest {
            created_at: Utc::now(),
            num_jobs: 1,
            success: 1,
            failure: 0,
            jobs: vec![BatchJobRecord {
                name: "july".to_string(),
                kind: ModelKind::Arbitrage,
                status: "ok".to_string(),
                message: None,
                results_path: None,
                rows: Some(24),
            }],
        };

        write_batch_manifest(&path, &manifest).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let back: BatchManifest = serde_json::from_str(&text).unwrap();
        assert_eq!(back.num_jobs, 1);
        assert_eq!(back.jobs[0].status, "ok");
    }

    #[test]
    fn job_lists_parse_from_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.json");
        std::fs::write(
            &path,
            r#"[{"name": "a", "kind": "arbitrage", "input": "prices.csv"}]"#,
        )
        .unwrap();

        let jobs = read_jobs(&path).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].kind, ModelKind::Arbitrage);
    }
}
