//! Run orchestration: discovery, worker pool, aggregation, reports.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use rayon::prelude::*;

use crate::cache::ResultCache;
use crate::compile::{self, CompileOutcome};
use crate::discover::discover_jobs;
use crate::execute::{self, ExecConfig, ExecOutcome};
use crate::job::{JobDescriptor, JobResult, Outcome};
use crate::report;
use crate::stats::{self, StatsByLanguage};
use crate::toolchain::{ResolvedJobPaths, ToolchainRegistry};

/// Everything a finished run produced, for callers that want more
/// than the written reports.
#[derive(Debug)]
pub struct RunSummary {
    /// All job results, sorted by file name.
    pub results: Vec<JobResult>,
    /// Per-language aggregates.
    pub stats: StatsByLanguage,
}

impl RunSummary {
    /// Number of jobs ending in a failure bucket.
    pub fn failure_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.outcome.is_failure())
            .count()
    }
}

/// Orchestrates one full pass over a source tree.
///
/// Jobs are distributed over a rayon pool sized to the available
/// cores by default. Each worker independently does cache-check →
/// compile → execute → record-write, sharing nothing mutable, and
/// sends one immutable [`JobResult`] to the single consumer that
/// folds statistics and streams progress. Only infrastructure
/// failures abort the pass; per-job failures are classified and
/// counted.
pub struct Runner {
    root: PathBuf,
    registry: ToolchainRegistry,
    force: bool,
    verbose: bool,
    emit_summary_json: bool,
    jobs: Option<usize>,
    exec: ExecConfig,
}

impl Runner {
    /// A runner over the given source tree with the built-in registry.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            registry: ToolchainRegistry::default(),
            force: false,
            verbose: false,
            emit_summary_json: false,
            jobs: None,
            exec: ExecConfig::default(),
        }
    }

    /// Replace the toolchain registry (custom or stub policies).
    pub fn registry(mut self, registry: ToolchainRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Reprocess jobs even when a result record exists.
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Print failure diagnostics in the progress stream.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Also write the per-language mapping as `<report>.json`.
    pub fn emit_summary_json(mut self, emit: bool) -> Self {
        self.emit_summary_json = emit;
        self
    }

    /// Worker count; `None` uses the available processor count.
    pub fn jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs;
        self
    }

    /// Kill a job's program after this long; `None` waits forever.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.exec.timeout = timeout;
        self
    }

    /// Capture child stdout/stderr into per-job files under this
    /// directory instead of discarding them.
    pub fn capture_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.exec.capture_dir = dir;
        self
    }

    /// Run the full pass and write all report artifacts.
    ///
    /// Fails only for infrastructure-level problems: missing root,
    /// basename collision, uncreatable results directory, unwritable
    /// report. A summary is always written when the pass completes,
    /// failing jobs included.
    pub fn analyze(&self, report_path: &Path, results_dir: &Path) -> anyhow::Result<RunSummary> {
        let jobs = discover_jobs(&self.root, &self.registry)?;
        let cache = ResultCache::open(results_dir, self.force)?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs.unwrap_or(0))
            .build()?;

        let (tx, rx) = mpsc::channel::<JobResult>();
        let mut results: Vec<JobResult> = Vec::with_capacity(jobs.len());
        let mut stats = StatsByLanguage::new();

        std::thread::scope(|scope| {
            let cache = &cache;
            let jobs = &jobs;
            scope.spawn(move || {
                pool.install(|| {
                    jobs.par_iter().for_each_with(tx, |tx, job| {
                        // A send only fails when the consumer is gone,
                        // and the consumer outlives the pool.
                        let _ = tx.send(self.process_job(job, cache));
                    });
                });
            });

            for result in rx {
                report::print_progress(&result, self.verbose);
                stats::fold_result(&mut stats, &result);
                results.push(result);
            }
        });

        stats::finalize(&mut stats);
        results.sort_by(|a, b| a.file_name.cmp(&b.file_name));

        report::write_report(report_path, &results, &stats)?;
        if self.emit_summary_json {
            report::write_summary_json(&report_path.with_extension("json"), &stats)?;
        }

        Ok(RunSummary { results, stats })
    }

    /// Cache-check → compile → execute → record-write for one job.
    fn process_job(&self, job: &JobDescriptor, cache: &ResultCache) -> JobResult {
        if cache.should_skip(&job.file_name) {
            return JobResult {
                file_name: job.file_name.clone(),
                tag: job.tag.clone(),
                outcome: Outcome::Skipped,
            };
        }

        let outcome = self.compile_and_run(job);
        let result = JobResult {
            file_name: job.file_name.clone(),
            tag: job.tag.clone(),
            outcome,
        };

        if let Err(e) = cache.store(&result) {
            eprintln!(
                "Warning: failed to write result record for {}: {}",
                result.file_name, e
            );
        }
        result
    }

    fn compile_and_run(&self, job: &JobDescriptor) -> Outcome {
        let Some(policy) = self.registry.policy(&job.tag) else {
            return Outcome::CompileFailed {
                error: format!("unsupported file extension: .{}", job.tag),
            };
        };

        let paths = ResolvedJobPaths::derive(&job.path, policy.artifact);
        match compile::compile(policy, &paths) {
            CompileOutcome::Failed(error) => return Outcome::CompileFailed { error },
            CompileOutcome::NotRequired | CompileOutcome::Succeeded => {}
        }

        let cmd = policy.run.expand(&paths);
        let cwd = if policy.run_in_source_dir {
            job.path.parent()
        } else {
            None
        };
        match execute::run(&cmd, cwd, &job.file_name, &self.exec) {
            ExecOutcome::Completed {
                time_seconds,
                memory_kb,
            } => Outcome::Ran {
                time_seconds,
                memory_kb,
            },
            ExecOutcome::Failed(error) => Outcome::RuntimeError { error },
        }
    }
}
