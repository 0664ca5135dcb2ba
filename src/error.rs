//! Infrastructure-level errors that abort a whole run.
//!
//! Per-job failures never surface here; they are classified into
//! [`crate::job::Outcome`] buckets and counted in the report.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort the entire run, as opposed to failing one job.
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("source folder not found: {0}")]
    MissingRoot(PathBuf),

    #[error("source folder is not a directory: {0}")]
    RootNotDirectory(PathBuf),

    #[error("duplicate source file name {name:?} ({first} and {second}); per-job outputs are keyed by file name")]
    BasenameCollision {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("cannot create results directory {path}: {source}")]
    ResultsDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot write report {path}: {source}")]
    ReportWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("walking source tree: {0}")]
    Walk(#[from] walkdir::Error),
}
