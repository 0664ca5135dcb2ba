//! Command-line interface for buildbench.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::runner::Runner;
use crate::toolchain::ToolchainRegistry;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Compile, run, and measure every source file in a folder.
///
/// Buildbench walks a directory tree of source files in several
/// languages, compiles each one where the language requires it, runs
/// the program as an isolated child process, measures wall-clock time
/// and peak memory, and aggregates the outcomes into per-language
/// reports.
#[derive(Parser)]
#[command(name = "buildbench")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a folder of source files
    #[command(visible_alias = "run")]
    Analyze(AnalyzeArgs),
    /// List the registered language toolchains
    Languages,
}

/// Arguments for the analyze command.
#[derive(Parser)]
pub struct AnalyzeArgs {
    /// Folder containing source files
    pub path: PathBuf,

    /// Path of the flat report to write
    #[arg(short, long, default_value = "results.txt")]
    pub report: PathBuf,

    /// Directory for per-job result records
    #[arg(long, default_value = "results")]
    pub results_dir: PathBuf,

    /// Reprocess files even when a result record exists
    #[arg(short, long)]
    pub force: bool,

    /// Print failure diagnostics in the progress stream
    #[arg(short, long)]
    pub verbose: bool,

    /// Also write the per-language summary as <report>.json
    #[arg(long)]
    pub json: bool,

    /// Worker count (default: available processor count)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Kill a program after this many seconds; 0 disables the limit
    #[arg(short, long, default_value_t = 60)]
    pub timeout: u64,

    /// Capture each program's stdout/stderr under this directory
    #[arg(long)]
    pub capture_dir: Option<PathBuf>,
}

/// Run the analyze command.
pub fn run_analyze(args: &AnalyzeArgs) -> anyhow::Result<i32> {
    let timeout = if args.timeout == 0 {
        None
    } else {
        Some(Duration::from_secs(args.timeout))
    };

    let summary = Runner::new(&args.path)
        .force(args.force)
        .verbose(args.verbose)
        .emit_summary_json(args.json)
        .jobs(args.jobs)
        .timeout(timeout)
        .capture_dir(args.capture_dir.clone())
        .analyze(&args.report, &args.results_dir)?;

    println!();
    println!(
        "Processed {} file(s) across {} language(s); report written to {}",
        summary.results.len(),
        summary.stats.len(),
        args.report.display()
    );

    if summary.failure_count() > 0 {
        Ok(EXIT_FAILED)
    } else {
        Ok(EXIT_SUCCESS)
    }
}

/// Run the languages command.
pub fn run_languages() -> anyhow::Result<i32> {
    let registry = ToolchainRegistry::default();

    println!("Registered toolchains:");
    println!();
    for tag in registry.tags() {
        let policy = registry.policy(tag).expect("tag came from the registry");
        let kind = match &policy.compile {
            Some(template) => format!("compiled ({})", describe_program(template)),
            None => format!("interpreted ({})", describe_program(&policy.run)),
        };
        println!("  .{:<6} {}", tag, kind);
    }

    Ok(EXIT_SUCCESS)
}

fn describe_program(template: &crate::toolchain::CommandTemplate) -> String {
    match &template.program {
        crate::toolchain::Token::Literal(name) => name.clone(),
        _ => "compiled artifact".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_analyze_args_defaults() {
        let cli = Cli::parse_from(["buildbench", "analyze", "sources"]);
        match cli.command {
            Commands::Analyze(args) => {
                assert_eq!(args.path, PathBuf::from("sources"));
                assert_eq!(args.report, PathBuf::from("results.txt"));
                assert_eq!(args.results_dir, PathBuf::from("results"));
                assert!(!args.force);
                assert_eq!(args.timeout, 60);
                assert!(args.jobs.is_none());
            }
            _ => panic!("expected analyze command"),
        }
    }

    #[test]
    fn test_analyze_flags() {
        let cli = Cli::parse_from([
            "buildbench",
            "analyze",
            "sources",
            "--force",
            "--json",
            "--jobs",
            "4",
            "--timeout",
            "0",
        ]);
        match cli.command {
            Commands::Analyze(args) => {
                assert!(args.force);
                assert!(args.json);
                assert_eq!(args.jobs, Some(4));
                assert_eq!(args.timeout, 0);
            }
            _ => panic!("expected analyze command"),
        }
    }
}
