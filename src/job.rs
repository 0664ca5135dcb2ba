//! Core types for jobs and their outcomes.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One source file queued for processing.
///
/// Descriptors are created once during discovery and never mutated.
/// The language tag is the file extension without the dot (`"cpp"`,
/// `"py"`, ...), matching the keys of the toolchain registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDescriptor {
    /// Full path to the source file.
    pub path: PathBuf,
    /// Base name of the source file. Unique across the whole batch;
    /// all per-job output paths derive from it.
    pub file_name: String,
    /// Language tag derived from the extension.
    pub tag: String,
}

impl JobDescriptor {
    /// Build a descriptor from a path, deriving file name and tag.
    ///
    /// Returns `None` when the path has no extension or no file name.
    pub fn from_path(path: PathBuf) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?.to_string();
        let tag = path.extension()?.to_str()?.to_lowercase();
        Some(Self {
            path,
            file_name,
            tag,
        })
    }
}

/// Terminal classification of one job.
///
/// Every job ends in exactly one of these buckets; there is no retry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// Program compiled (if applicable) and exited with status 0.
    Ran {
        /// Wall-clock time of the run command, in seconds.
        time_seconds: f64,
        /// Peak resident set size of the child, in kilobytes.
        /// Best-effort: 0 where the platform exposes no counter.
        memory_kb: i64,
    },
    /// Compiler invocation failed, exited non-zero, produced no
    /// artifact, or no toolchain is registered for the extension.
    CompileFailed { error: String },
    /// Program started but exited non-zero (or was killed on timeout).
    RuntimeError { error: String },
    /// A prior result record exists and reprocessing was not forced.
    Skipped,
}

impl Outcome {
    /// Short status word used in reports and progress lines.
    pub fn status(&self) -> &'static str {
        match self {
            Outcome::Ran { .. } => "ran",
            Outcome::CompileFailed { .. } => "compile_failed",
            Outcome::RuntimeError { .. } => "runtime_error",
            Outcome::Skipped => "skipped",
        }
    }

    /// True for the two failure buckets.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Outcome::CompileFailed { .. } | Outcome::RuntimeError { .. }
        )
    }
}

/// A completed job: descriptor identity plus its terminal outcome.
///
/// Workers return these to the aggregating consumer; one record per
/// result is also persisted in the results directory.
#[derive(Debug, Clone, PartialEq)]
pub struct JobResult {
    pub file_name: String,
    pub tag: String,
    pub outcome: Outcome,
}
