use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::error::{BenchError, Result};

/// Half-open range of wire lengths `[start, end)` visited with a fixed step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepRange {
    pub start: u64,
    pub end: u64,
    #[serde(default = "default_step")]
    pub step: u64,
}

fn default_step() -> u64 {
    1
}

impl SweepRange {
    #[must_use]
    pub fn lengths(&self) -> Vec<u64> {
        let step = usize::try_from(self.step.max(1)).unwrap_or(usize::MAX);
        (self.start..self.end).step_by(step).collect()
    }
}

impl Default for SweepRange {
    fn default() -> Self {
        Self {
            start: 25,
            end: 1000,
            step: 100,
        }
    }
}

/// Everything a benchmark run needs, built once and shared by reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Tool under test.
    pub program: PathBuf,
    /// Technology description passed as the first positional argument.
    pub tech_file: PathBuf,
    /// Where generated nets and captured output live.
    pub scratch_dir: PathBuf,
    /// Working directory for the tool. Defaults to `scratch_dir`.
    pub workdir: Option<PathBuf>,
    pub sweep: SweepRange,
    /// Trials per wire length.
    pub samples: usize,
    /// Parallel workers.
    pub workers: usize,
    /// Per-invocation deadline.
    pub timeout_ms: u64,
    pub table: PathBuf,
    pub rat_plot: PathBuf,
    pub time_plot: PathBuf,
    /// Sort rows by length before the table is written.
    pub sort_results: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("build/BufferInserter"),
            tech_file: PathBuf::from("tests/tech1.json"),
            scratch_dir: PathBuf::from("build"),
            workdir: None,
            sweep: SweepRange::default(),
            samples: 10,
            workers: 12,
            timeout_ms: 60_000,
            table: PathBuf::from("res/table.txt"),
            rat_plot: PathBuf::from("res/rat.png"),
            time_plot: PathBuf::from("res/time.png"),
            sort_results: true,
        }
    }
}

impl HarnessConfig {
    pub fn validate(&self) -> Result<()> {
        if self.samples == 0 {
            return Err(BenchError::InvalidConfig(
                "samples must be greater than zero".to_string(),
            ));
        }
        if self.workers == 0 {
            return Err(BenchError::InvalidConfig(
                "workers must be greater than zero".to_string(),
            ));
        }
        if self.timeout_ms == 0 {
            return Err(BenchError::InvalidConfig(
                "timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.sweep.start == 0 {
            return Err(BenchError::InvalidConfig(
                "sweep.start must be a positive length".to_string(),
            ));
        }
        if self.sweep.step == 0 {
            return Err(BenchError::InvalidConfig(
                "sweep.step must be greater than zero".to_string(),
            ));
        }
        if self.sweep.end <= self.sweep.start {
            return Err(BenchError::InvalidConfig(format!(
                "sweep.end ({}) must be greater than sweep.start ({})",
                self.sweep.end, self.sweep.start
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn workdir(&self) -> &Path {
        self.workdir.as_deref().unwrap_or(&self.scratch_dir)
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
