//! Toolchain registry: language tag → compile/run policy.
//!
//! The registry is a strategy table, pure data with no control flow.
//! Each policy holds a compile command template (absent for interpreted
//! languages), a run command template, and an artifact-naming rule.
//! Templates are lists of tokens expanded per job; the stages never
//! branch on the language themselves.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Suffix appended to compiled binaries in place of the source extension.
pub const BINARY_SUFFIX: &str = "out";

/// One element of a command template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Fixed string, used as-is.
    Literal(String),
    /// Path of the source file.
    SourcePath,
    /// Path of the compiled artifact (see [`ArtifactRule`]).
    ArtifactPath,
    /// Base name of the source without extension (JVM class name).
    UnitName,
}

impl Token {
    fn expand(&self, job: &ResolvedJobPaths) -> String {
        match self {
            Token::Literal(s) => s.clone(),
            Token::SourcePath => job.source.to_string_lossy().into_owned(),
            Token::ArtifactPath => job.artifact.to_string_lossy().into_owned(),
            Token::UnitName => job.unit_name.clone(),
        }
    }
}

/// A command as data: program token plus argument tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    pub program: Token,
    pub args: Vec<Token>,
}

impl CommandTemplate {
    pub fn new(program: Token, args: Vec<Token>) -> Self {
        Self { program, args }
    }

    /// Expand the template against one job's resolved paths.
    pub fn expand(&self, job: &ResolvedJobPaths) -> ResolvedCommand {
        ResolvedCommand {
            program: self.program.expand(job),
            args: self.args.iter().map(|t| t.expand(job)).collect(),
        }
    }
}

/// A fully-expanded command, ready to spawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCommand {
    pub program: String,
    pub args: Vec<String>,
}

/// How the compiled artifact for a job is named.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactRule {
    /// Source path with the extension replaced by [`BINARY_SUFFIX`].
    BinarySuffix,
    /// Compiler drops a named unit beside the source (e.g. a `.class`
    /// file); the artifact identifier is the source base name.
    UnitName,
    /// No artifact; the source itself is what runs.
    None,
}

/// Per-language rule set: how to compile and how to run.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolchainPolicy {
    /// Language tag, equal to the registry key (extension without dot).
    pub tag: String,
    /// Compile command, or `None` for interpreted languages.
    pub compile: Option<CommandTemplate>,
    /// Run command.
    pub run: CommandTemplate,
    /// Artifact-naming rule used by template expansion.
    pub artifact: ArtifactRule,
    /// Run with the source's directory as working directory. Needed
    /// for named-unit languages where the runtime resolves the unit
    /// relative to the working directory.
    pub run_in_source_dir: bool,
}

/// Paths and names derived from one job, consumed by token expansion.
#[derive(Debug, Clone)]
pub struct ResolvedJobPaths {
    pub source: PathBuf,
    pub artifact: PathBuf,
    pub unit_name: String,
}

impl ResolvedJobPaths {
    /// Derive paths for a source file under a policy's artifact rule.
    pub fn derive(source: &Path, rule: ArtifactRule) -> Self {
        let unit_name = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let artifact = match rule {
            ArtifactRule::BinarySuffix => source.with_extension(BINARY_SUFFIX),
            ArtifactRule::UnitName => {
                // The checkable on-disk artifact for the JVM case.
                source.with_extension("class")
            }
            ArtifactRule::None => source.to_path_buf(),
        };
        Self {
            source: source.to_path_buf(),
            artifact,
            unit_name,
        }
    }
}

/// Maps language tags (file extensions without the dot) to policies.
#[derive(Debug, Clone)]
pub struct ToolchainRegistry {
    policies: HashMap<String, ToolchainPolicy>,
}

impl ToolchainRegistry {
    /// An empty registry with no languages.
    pub fn empty() -> Self {
        Self {
            policies: HashMap::new(),
        }
    }

    /// Register a policy, replacing any existing entry for its tag.
    pub fn register(&mut self, policy: ToolchainPolicy) {
        self.policies.insert(policy.tag.clone(), policy);
    }

    /// Look up the policy for a language tag.
    pub fn policy(&self, tag: &str) -> Option<&ToolchainPolicy> {
        self.policies.get(tag)
    }

    /// Whether any policy is registered for this tag.
    pub fn supports(&self, tag: &str) -> bool {
        self.policies.contains_key(tag)
    }

    /// All registered tags, sorted.
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.policies.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}

impl Default for ToolchainRegistry {
    /// The built-in table: cpp, c, go, rs, hs compile to a binary;
    /// java compiles in place to a named unit; py is interpreted.
    fn default() -> Self {
        let mut registry = Self::empty();

        for (tag, compiler, arg_order) in [
            ("cpp", "g++", ArgOrder::SourceThenOutput),
            ("c", "gcc", ArgOrder::SourceThenOutput),
            ("rs", "rustc", ArgOrder::SourceThenOutput),
            ("hs", "ghc", ArgOrder::OutputThenSource),
        ] {
            registry.register(binary_policy(tag, compiler, &[], arg_order));
        }
        registry.register(binary_policy(
            "go",
            "go",
            &["build"],
            ArgOrder::OutputThenSource,
        ));

        registry.register(ToolchainPolicy {
            tag: "java".to_string(),
            compile: Some(CommandTemplate::new(
                Token::Literal("javac".to_string()),
                vec![Token::SourcePath],
            )),
            run: CommandTemplate::new(
                Token::Literal("java".to_string()),
                vec![Token::UnitName],
            ),
            artifact: ArtifactRule::UnitName,
            run_in_source_dir: true,
        });

        registry.register(ToolchainPolicy {
            tag: "py".to_string(),
            compile: None,
            run: CommandTemplate::new(
                Token::Literal("python3".to_string()),
                vec![Token::SourcePath],
            ),
            artifact: ArtifactRule::None,
            run_in_source_dir: false,
        });

        registry
    }
}

/// Argument ordering of `-o` relative to the source for binary compilers.
enum ArgOrder {
    /// `cc <src> -o <out>`
    SourceThenOutput,
    /// `cc -o <out> <src>` (ghc) or `go build -o <out> <src>`
    OutputThenSource,
}

fn binary_policy(tag: &str, compiler: &str, pre_args: &[&str], order: ArgOrder) -> ToolchainPolicy {
    let mut args: Vec<Token> = pre_args
        .iter()
        .map(|a| Token::Literal(a.to_string()))
        .collect();
    match order {
        ArgOrder::SourceThenOutput => {
            args.push(Token::SourcePath);
            args.push(Token::Literal("-o".to_string()));
            args.push(Token::ArtifactPath);
        }
        ArgOrder::OutputThenSource => {
            args.push(Token::Literal("-o".to_string()));
            args.push(Token::ArtifactPath);
            args.push(Token::SourcePath);
        }
    }
    ToolchainPolicy {
        tag: tag.to_string(),
        compile: Some(CommandTemplate::new(
            Token::Literal(compiler.to_string()),
            args,
        )),
        run: CommandTemplate::new(Token::ArtifactPath, vec![]),
        artifact: ArtifactRule::BinarySuffix,
        run_in_source_dir: false,
    }
}
