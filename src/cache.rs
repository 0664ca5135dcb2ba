//! Per-job result records and the skip cache built on them.
//!
//! The cache keys purely on the presence of a record file named after
//! the source file, not on source content or toolchain version. A
//! changed source with an unchanged name is not reprocessed unless
//! forced. That invalidation policy is intentional; a content-hashed
//! cache would be a different contract.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::HarnessError;
use crate::job::{JobResult, Outcome};

/// Persisted form of one job's result, one JSON file per job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub file: String,
    pub language: String,
    pub status: String,
    pub time_seconds: f64,
    pub memory_kb: i64,
    pub error: String,
}

impl ResultRecord {
    /// Flatten a job result into record fields.
    pub fn from_result(result: &JobResult) -> Self {
        let (time_seconds, memory_kb, error) = match &result.outcome {
            Outcome::Ran {
                time_seconds,
                memory_kb,
            } => (*time_seconds, *memory_kb, String::new()),
            Outcome::CompileFailed { error } => (0.0, 0, error.clone()),
            Outcome::RuntimeError { error } => (0.0, 0, error.clone()),
            Outcome::Skipped => (0.0, 0, String::new()),
        };
        Self {
            file: result.file_name.clone(),
            language: result.tag.clone(),
            status: result.outcome.status().to_string(),
            time_seconds,
            memory_kb,
            error,
        }
    }
}

/// Skip-or-reprocess decisions plus record persistence.
pub struct ResultCache {
    dir: PathBuf,
    force: bool,
}

impl ResultCache {
    /// Open the cache over a results directory, creating it if needed.
    ///
    /// An uncreatable directory is an infrastructure error: without it
    /// no record of the run could be kept.
    pub fn open(dir: &Path, force: bool) -> Result<Self, HarnessError> {
        std::fs::create_dir_all(dir).map_err(|source| HarnessError::ResultsDir {
            path: dir.to_path_buf(),
            source,
        })?;
        Ok(Self {
            dir: dir.to_path_buf(),
            force,
        })
    }

    /// Path of the record file for a source file name.
    pub fn record_path(&self, file_name: &str) -> PathBuf {
        self.dir.join(format!("{file_name}.json"))
    }

    /// True when a record exists and reprocessing is not forced.
    pub fn should_skip(&self, file_name: &str) -> bool {
        !self.force && self.record_path(file_name).exists()
    }

    /// Write (or overwrite) the record for a processed job.
    pub fn store(&self, result: &JobResult) -> std::io::Result<()> {
        let record = ResultRecord::from_result(result);
        let json = serde_json::to_string_pretty(&record)?;
        std::fs::write(self.record_path(&result.file_name), json)
    }

    /// Read a record back, if one exists and parses.
    pub fn load(&self, file_name: &str) -> Option<ResultRecord> {
        let data = std::fs::read_to_string(self.record_path(file_name)).ok()?;
        serde_json::from_str(&data).ok()
    }
}
