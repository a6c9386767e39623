//! Input series loading for valuation runs.

use anyhow::{anyhow, Context, Result};
use polars::prelude::{ParquetReader, SerReader};
use std::fs::File;
use std::path::Path;

/// Load one numeric column from a CSV or Parquet file, by extension.
pub fn load_series(path: &Path, column: &str) -> Result<Vec<f64>> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("parquet") => load_parquet_column(path, column),
        _ => load_csv_column(path, column),
    }
}

fn load_parquet_column(path: &Path, column: &str) -> Result<Vec<f64>> {
    let file = File::open(path)
        .with_context(|| format!("opening parquet dataset '{}'", path.display()))?;
    let frame = ParquetReader::new(file)
        .finish()
        .with_context(|| format!("reading parquet dataset '{}'", path.display()))?;
    let series = frame
        .column(column)
        .with_context(|| format!("column '{}' not found in {}", column, path.display()))?;
    let chunked = series
        .f64()
        .with_context(|| format!("column '{}' must be float", column))?;
    Ok(chunked.into_iter().map(|v| v.unwrap_or(0.0)).collect())
}

fn load_csv_column(path: &Path, column: &str) -> Result<Vec<f64>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening CSV input '{}'", path.display()))?;
    let headers = reader
        .headers()
        .with_context(|| format!("reading CSV header of '{}'", path.display()))?
        .clone();
    let index = headers
        .iter()
        .position(|header| header == column)
        .ok_or_else(|| anyhow!("column '{}' not found in {}", column, path.display()))?;

    let mut values = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("reading CSV row {}", line + 2))?;
        let raw = record
            .get(index)
            .ok_or_else(|| anyhow!("short record at row {} of {}", line + 2, path.display()))?;
        let value = raw
            .trim()
            .parse::<f64>()
            .with_context(|| format!("parsing '{}' at row {} as a number", raw, line + 2))?;
        values.push(value);
    }
    Ok(values)
}
