use std::path::PathBuf;

use anyhow::{Context, Result};

use revscan_common::ReviewVerdict;

pub use crate::traits::ResultSink;

/// Writes the results table as CSV (`review,prediction,confidence`),
/// replacing the file on every run.
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ResultSink for CsvSink {
    fn write(&self, rows: &[ReviewVerdict]) -> Result<()> {
        let mut writer = csv::Writer::from_path(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;
        if rows.is_empty() {
            writer.write_record(["review", "prediction", "confidence"])?;
        }
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Sink for callers that keep results in memory only.
pub struct NoOpSink;

impl ResultSink for NoOpSink {
    fn write(&self, _rows: &[ReviewVerdict]) -> Result<()> {
        Ok(())
    }
}
