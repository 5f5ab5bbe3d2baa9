//! Report types for evaluation results.
//!
//! A finished evaluation is written as two files sharing a stem: the raw
//! matrix as CSV (for plotting) and the full report as JSON.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::confusion::{ConfusionMatrix, MatrixSummary, persist};
use crate::error::Result;

/// Result of evaluating a set of samples.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalReport {
    /// Report name, used as the file stem.
    pub name: String,

    /// Number of samples evaluated.
    pub samples: usize,

    /// Total pixels compared.
    pub pixels: u64,

    /// Accumulated confusion counts.
    pub matrix: ConfusionMatrix,

    /// Scores derived from `matrix`.
    pub summary: MatrixSummary,

    /// When this report was generated.
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl EvalReport {
    /// Build a report from a finished matrix.
    #[must_use]
    pub fn new(name: String, samples: usize, matrix: ConfusionMatrix) -> Self {
        let summary = MatrixSummary::compute(&matrix);
        Self {
            name,
            samples,
            pixels: matrix.total(),
            matrix,
            summary,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Write `{name}.csv` and `{name}.json` into `dir`, returning the CSV path.
    pub fn write(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;

        let csv_path = persist::csv_path(dir, &self.name);
        persist::write_csv(&self.matrix, &csv_path)?;

        let json_path = dir.join(format!("{}.json", self.name));
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(json_path, json)?;

        Ok(csv_path)
    }
}
