//! Per-language statistics and the fold that builds them.
//!
//! Updates are counter increments and sum accumulation only, so the
//! final totals are independent of the order results arrive in.
//! Stats are rebuilt from scratch every run, never carried across
//! runs.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::job::{JobResult, Outcome};

/// Aggregate figures for one language tag.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LanguageStats {
    pub total: usize,
    pub success: usize,
    pub compile_fail: usize,
    pub runtime_error: usize,
    pub skipped: usize,
    /// Sum of elapsed seconds over successful runs.
    pub total_time: f64,
    /// Sum of peak RSS kilobytes over successful runs.
    pub total_memory_kb: i64,
    /// File names folded into this bucket, sorted at finalization.
    pub files: Vec<String>,
}

impl LanguageStats {
    /// Fold one result into this bucket.
    pub fn fold(&mut self, result: &JobResult) {
        self.total += 1;
        self.files.push(result.file_name.clone());
        match &result.outcome {
            Outcome::Ran {
                time_seconds,
                memory_kb,
            } => {
                self.success += 1;
                self.total_time += time_seconds;
                self.total_memory_kb += memory_kb;
            }
            Outcome::CompileFailed { .. } => self.compile_fail += 1,
            Outcome::RuntimeError { .. } => self.runtime_error += 1,
            Outcome::Skipped => self.skipped += 1,
        }
    }

    /// Average elapsed seconds over successes; 0 with no successes.
    pub fn avg_time(&self) -> f64 {
        if self.success == 0 {
            0.0
        } else {
            self.total_time / self.success as f64
        }
    }

    /// Average peak RSS over successes; 0 with no successes.
    pub fn avg_memory_kb(&self) -> f64 {
        if self.success == 0 {
            0.0
        } else {
            self.total_memory_kb as f64 / self.success as f64
        }
    }
}

/// Stats keyed by language tag; BTreeMap keeps report order stable.
pub type StatsByLanguage = BTreeMap<String, LanguageStats>;

/// Fold one result into the stats map.
pub fn fold_result(stats: &mut StatsByLanguage, result: &JobResult) {
    stats.entry(result.tag.clone()).or_default().fold(result);
}

/// Sort file lists so output is deterministic despite arrival order.
pub fn finalize(stats: &mut StatsByLanguage) {
    for bucket in stats.values_mut() {
        bucket.files.sort_unstable();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, tag: &str, outcome: Outcome) -> JobResult {
        JobResult {
            file_name: name.to_string(),
            tag: tag.to_string(),
            outcome,
        }
    }

    fn ran(time: f64, mem: i64) -> Outcome {
        Outcome::Ran {
            time_seconds: time,
            memory_kb: mem,
        }
    }

    #[test]
    fn test_buckets_always_balance() {
        let mut stats = StatsByLanguage::new();
        fold_result(&mut stats, &result("a.py", "py", ran(0.1, 100)));
        fold_result(
            &mut stats,
            &result(
                "b.py",
                "py",
                Outcome::RuntimeError {
                    error: "runtime error".into(),
                },
            ),
        );
        fold_result(
            &mut stats,
            &result("c.py", "py", Outcome::CompileFailed { error: "e".into() }),
        );
        fold_result(&mut stats, &result("d.py", "py", Outcome::Skipped));

        let py = &stats["py"];
        assert_eq!(py.total, 4);
        assert_eq!(
            py.total,
            py.success + py.compile_fail + py.runtime_error + py.skipped
        );
    }

    #[test]
    fn test_averages_over_successes_only() {
        let mut stats = StatsByLanguage::new();
        fold_result(&mut stats, &result("a.py", "py", ran(0.2, 100)));
        fold_result(&mut stats, &result("b.py", "py", ran(0.4, 300)));
        fold_result(&mut stats, &result("c.py", "py", Outcome::Skipped));

        let py = &stats["py"];
        assert!((py.avg_time() - 0.3).abs() < 1e-9);
        assert!((py.avg_memory_kb() - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_successes_means_zero_averages() {
        let mut stats = StatsByLanguage::new();
        fold_result(
            &mut stats,
            &result("bad.cpp", "cpp", Outcome::CompileFailed { error: "e".into() }),
        );
        let cpp = &stats["cpp"];
        assert_eq!(cpp.avg_time(), 0.0);
        assert_eq!(cpp.avg_memory_kb(), 0.0);
    }

    #[test]
    fn test_fold_is_order_independent() {
        let results = [
            result("a.py", "py", ran(0.1, 50)),
            result("b.cpp", "cpp", Outcome::CompileFailed { error: "e".into() }),
            result("c.py", "py", ran(0.3, 150)),
        ];

        let mut forward = StatsByLanguage::new();
        for r in &results {
            fold_result(&mut forward, r);
        }
        let mut reverse = StatsByLanguage::new();
        for r in results.iter().rev() {
            fold_result(&mut reverse, r);
        }
        finalize(&mut forward);
        finalize(&mut reverse);

        assert_eq!(forward, reverse);
    }

    #[test]
    fn test_languages_accumulate_independently() {
        let mut stats = StatsByLanguage::new();
        fold_result(&mut stats, &result("a.py", "py", ran(0.1, 50)));
        fold_result(&mut stats, &result("b.cpp", "cpp", ran(0.5, 500)));

        assert_eq!(stats.len(), 2);
        assert_eq!(stats["py"].total, 1);
        assert_eq!(stats["cpp"].total, 1);
        assert!((stats["cpp"].avg_time() - 0.5).abs() < 1e-9);
    }
}
