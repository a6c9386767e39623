//! Export helpers for results tables.

use anyhow::{Context, Result};
use polars::prelude::{
    CsvWriter, DataFrame, ParquetCompression, ParquetWriter, SerWriter,
};
use std::fs::File;
use std::path::Path;

/// Write a results table as delimited text.
pub fn write_csv(path: &Path, frame: &mut DataFrame) -> Result<()> {
    let mut file = File::create(path)
        .with_context(|| format!("creating CSV output '{}'", path.display()))?;
    CsvWriter::new(&mut file)
        .finish(frame)
        .with_context(|| format!("writing CSV {}", path.display()))?;
    Ok(())
}

/// Write a results table as Parquet.
pub fn write_parquet(path: &Path, frame: &mut DataFrame) -> Result<()> {
    let mut file = File::create(path)
        .with_context(|| format!("creating Parquet output '{}'", path.display()))?;
    ParquetWriter::new(&mut file)
        .with_compression(ParquetCompression::Snappy)
        .finish(frame)
        .with_context(|| format!("writing Parquet {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{NamedFrom, ParquetReader, SerReader, Series};

    fn sample_frame() -> DataFrame {
        DataFrame::new(vec![
            Series::new("period", vec![0u32, 1, 2]),
            Series::new("revenue", vec![1.0, -0.5, 2.0]),
        ])
        .unwrap()
    }

    #[test]
    fn csv_export_includes_headers_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        let mut frame = sample_frame();
        write_csv(&path, &mut frame).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("period,revenue"));
        assert_eq!(lines.count(), 3);
    }

    #[test]
    fn parquet_export_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.parquet");
        let mut frame = sample_frame();
        write_parquet(&path, &mut frame).unwrap();

        let file = File::open(&path).unwrap();
        let back = ParquetReader::new(file).finish().unwrap();
        assert_eq!(back.height(), 3);
        assert_eq!(back.get_column_names(), vec!["period", "revenue"]);
    }
}
