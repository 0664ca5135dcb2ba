//! Buildbench - multi-language compile-run-measure harness.
//!
//! Given a directory tree of source files in several languages,
//! buildbench compiles each file (when the language requires it),
//! executes the program as an isolated child process, measures
//! wall-clock time and the child's peak memory, classifies the
//! outcome, and aggregates per-language statistics into reports.
//!
//! # Architecture
//!
//! - `discover`: walk the tree, emit one immutable job per source file
//! - `toolchain`: registry mapping language tag to a compile/run policy
//! - `compile`: invoke the compiler and classify the result
//! - `execute`: spawn the program, time it, read its peak RSS
//! - `cache`: per-job result records; skip unless forced
//! - `stats`: commutative per-language aggregation
//! - `report`: flat report, summary block, structured JSON dump
//! - `runner`: worker pool + single aggregating consumer
//!
//! # Adding a Language
//!
//! Register a [`toolchain::ToolchainPolicy`] on the registry; the
//! stages carry no per-language logic of their own.

pub mod cache;
pub mod cli;
pub mod compile;
pub mod discover;
pub mod error;
pub mod execute;
pub mod job;
pub mod report;
pub mod runner;
pub mod stats;
pub mod toolchain;

pub use cache::{ResultCache, ResultRecord};
pub use discover::discover_jobs;
pub use error::HarnessError;
pub use execute::ExecConfig;
pub use job::{JobDescriptor, JobResult, Outcome};
pub use runner::{RunSummary, Runner};
pub use stats::{LanguageStats, StatsByLanguage};
pub use toolchain::{
    ArtifactRule, CommandTemplate, ResolvedCommand, ToolchainPolicy, ToolchainRegistry,
};
