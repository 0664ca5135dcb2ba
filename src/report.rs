//! Report writing: flat per-job lines, per-language summary,
//! optional structured JSON dump, and the progress stream.

use std::io::Write;
use std::path::Path;

use colored::*;

use crate::error::HarnessError;
use crate::job::{JobResult, Outcome};
use crate::stats::StatsByLanguage;

/// Write the flat per-job report followed by the language summary.
///
/// Results are written sorted by file name; the batch arrives in
/// nondeterministic order and the report must not depend on it.
pub fn write_report(
    path: &Path,
    results: &[JobResult],
    stats: &StatsByLanguage,
) -> Result<(), HarnessError> {
    let file = std::fs::File::create(path).map_err(|source| HarnessError::ReportWrite {
        path: path.to_path_buf(),
        source,
    })?;
    let mut out = std::io::BufWriter::new(file);

    let mut sorted: Vec<&JobResult> = results.iter().collect();
    sorted.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    render(&mut out, &sorted, stats).map_err(|source| HarnessError::ReportWrite {
        path: path.to_path_buf(),
        source,
    })
}

fn render(
    out: &mut impl Write,
    results: &[&JobResult],
    stats: &StatsByLanguage,
) -> std::io::Result<()> {
    writeln!(out, "File, Status, Time (s), Memory (KB), Error")?;
    for result in results {
        let (time, memory, error) = match &result.outcome {
            Outcome::Ran {
                time_seconds,
                memory_kb,
            } => (format!("{time_seconds:.4}"), memory_kb.to_string(), String::new()),
            Outcome::CompileFailed { error } => {
                (String::new(), String::new(), format!("Compile Error: {error}"))
            }
            Outcome::RuntimeError { error } => (String::new(), String::new(), error.clone()),
            Outcome::Skipped => (String::new(), String::new(), String::new()),
        };
        writeln!(
            out,
            "{}, {}, {}, {}, {}",
            result.file_name,
            result.outcome.status(),
            time,
            memory,
            error.replace('\n', " | ")
        )?;
    }

    writeln!(out)?;
    writeln!(out)?;
    writeln!(out, "Summary by Language:")?;
    writeln!(
        out,
        "Language, Files, Successes, Compile Fails, Runtime Errors, Skipped, \
         Avg Time (s), Avg Memory (KB), Files Processed"
    )?;
    for (tag, bucket) in stats {
        writeln!(
            out,
            "{}, {}, {}, {}, {}, {}, {:.4}, {:.0}, {}",
            tag,
            bucket.total,
            bucket.success,
            bucket.compile_fail,
            bucket.runtime_error,
            bucket.skipped,
            bucket.avg_time(),
            bucket.avg_memory_kb(),
            bucket.files.join("; ")
        )?;
    }

    Ok(())
}

/// Write the per-language mapping as pretty JSON, keyed like the
/// summary block.
pub fn write_summary_json(path: &Path, stats: &StatsByLanguage) -> Result<(), HarnessError> {
    let json = serde_json::to_string_pretty(stats).map_err(|e| HarnessError::ReportWrite {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    std::fs::write(path, json).map_err(|source| HarnessError::ReportWrite {
        path: path.to_path_buf(),
        source,
    })
}

/// Print one progress line for a completed job.
///
/// With `verbose` the failure diagnostic is printed on a second,
/// indented line.
pub fn print_progress(result: &JobResult, verbose: bool) {
    match &result.outcome {
        Outcome::Ran {
            time_seconds,
            memory_kb,
        } => {
            println!(
                "  {} {:<32} {:.4}s  {} KB",
                "RAN ".green(),
                result.file_name,
                time_seconds,
                memory_kb
            );
        }
        Outcome::CompileFailed { error } => {
            println!("  {} {}", "COMPILE FAILED".red(), result.file_name);
            if verbose {
                println!("       {}", error.dimmed());
            }
        }
        Outcome::RuntimeError { error } => {
            println!("  {} {}", "RUNTIME ERROR ".yellow(), result.file_name);
            if verbose {
                println!("       {}", error.dimmed());
            }
        }
        Outcome::Skipped => {
            println!(
                "  {} {} {}",
                "SKIP".dimmed(),
                result.file_name,
                "(cached result)".dimmed()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{finalize, fold_result};
    use tempfile::TempDir;

    fn batch() -> (Vec<JobResult>, StatsByLanguage) {
        let results = vec![
            JobResult {
                file_name: "ok.py".to_string(),
                tag: "py".to_string(),
                outcome: Outcome::Ran {
                    time_seconds: 0.1234,
                    memory_kb: 2048,
                },
            },
            JobResult {
                file_name: "bad.cpp".to_string(),
                tag: "cpp".to_string(),
                outcome: Outcome::CompileFailed {
                    error: "expected ';'\nin line 3".to_string(),
                },
            },
            JobResult {
                file_name: "old.py".to_string(),
                tag: "py".to_string(),
                outcome: Outcome::Skipped,
            },
        ];
        let mut stats = StatsByLanguage::new();
        for r in &results {
            fold_result(&mut stats, r);
        }
        finalize(&mut stats);
        (results, stats)
    }

    #[test]
    fn test_report_has_flat_lines_and_summary() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("results.txt");
        let (results, stats) = batch();

        write_report(&path, &results, &stats).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();

        assert!(text.starts_with("File, Status, Time (s), Memory (KB), Error"));
        assert!(text.contains("ok.py, ran, 0.1234, 2048, "));
        assert!(text.contains("old.py, skipped, , , "));
        assert!(text.contains("Summary by Language:"));
        // One summary line per language, sorted tag order.
        let summary_start = text.find("Summary by Language:").unwrap();
        let cpp_pos = text[summary_start..].find("cpp, ").unwrap();
        let py_pos = text[summary_start..].find("py, ").unwrap();
        assert!(cpp_pos < py_pos);
    }

    #[test]
    fn test_multiline_errors_stay_on_one_line() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("results.txt");
        let (results, stats) = batch();

        write_report(&path, &results, &stats).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("Compile Error: expected ';' | in line 3"));
    }

    #[test]
    fn test_summary_line_fields() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("results.txt");
        let (results, stats) = batch();

        write_report(&path, &results, &stats).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("py, 2, 1, 0, 0, 1, 0.1234, 2048, ok.py; old.py"));
        assert!(text.contains("cpp, 1, 0, 1, 0, 0, 0.0000, 0, bad.cpp"));
    }

    #[test]
    fn test_empty_batch_writes_headers_only() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("results.txt");
        write_report(&path, &[], &StatsByLanguage::new()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("File, Status"));
        assert!(text.contains("Summary by Language:"));
    }

    #[test]
    fn test_unwritable_report_is_an_infrastructure_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("no/such/dir/results.txt");
        let err = write_report(&path, &[], &StatsByLanguage::new()).unwrap_err();
        assert!(matches!(err, HarnessError::ReportWrite { .. }));
    }

    #[test]
    fn test_json_dump_keys_match_summary() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("results.json");
        let (_, stats) = batch();

        write_summary_json(&path, &stats).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert!(value.get("py").is_some());
        assert!(value.get("cpp").is_some());
        assert_eq!(value["py"]["total"], 2);
        assert_eq!(value["py"]["success"], 1);
    }
}
