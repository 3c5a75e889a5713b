use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::solvers::Metrics;

/// One finished run as stored in the CSV ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub run_id: Uuid,
    pub timestamp: String,
    pub maze: String,
    pub algorithm: String,
    pub cost: Option<u64>,
    pub steps: Option<usize>,
    pub visited: Option<usize>,
    pub elapsed_ms: u64,
    pub visited_weight_sum: Option<u64>,
}

impl LedgerRow {
    pub fn new(maze: &str, metrics: &Metrics) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            timestamp: Utc::now().to_rfc3339(),
            maze: maze.to_string(),
            algorithm: metrics.algorithm.label().to_string(),
            cost: metrics.cost,
            steps: metrics.steps,
            visited: metrics.visited,
            elapsed_ms: metrics.elapsed_ms,
            visited_weight_sum: metrics.visited_weight_sum,
        }
    }
}

/// Append-only CSV file of run results.
#[derive(Debug, Clone)]
pub struct RunLedger {
    path: PathBuf,
}

impl RunLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one row, writing the header first if the file is new.
    pub fn append(&self, maze: &str, metrics: &Metrics) -> Result<Uuid> {
        let needs_header = fs::metadata(&self.path).map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open ledger {}", self.path.display()))?;

        let row = LedgerRow::new(maze, metrics);
        let mut writer = csv::WriterBuilder::new().has_headers(needs_header).from_writer(file);
        writer.serialize(&row).context("Failed to write ledger row")?;
        writer.flush().context("Failed to flush ledger")?;
        Ok(row.run_id)
    }

    pub fn read_all(&self) -> Result<Vec<LedgerRow>> {
        let mut reader = csv::Reader::from_path(&self.path)
            .with_context(|| format!("Failed to open ledger {}", self.path.display()))?;
        reader
            .deserialize()
            .collect::<Result<Vec<LedgerRow>, _>>()
            .context("Failed to parse ledger")
    }
}
