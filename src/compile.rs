//! Compile stage: run the language's compiler and classify the result.

use std::process::Command;

use crate::toolchain::{ArtifactRule, ResolvedJobPaths, ToolchainPolicy};

/// Result of the compile stage for one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileOutcome {
    /// Interpreted language, nothing to do.
    NotRequired,
    /// Compiler exited 0 and the expected artifact exists.
    Succeeded,
    /// Compiler missing, exited non-zero, or produced no artifact.
    Failed(String),
}

/// Run the policy's compile command for one job, if it has one.
///
/// A missing compiler binary is classified as a failure for this job,
/// never an error that aborts the run. The compiler's stderr is
/// captured (trimmed) as the diagnostic. After a zero exit the
/// expected artifact is additionally checked on disk; a compiler that
/// reports success without producing it is still a failure.
pub fn compile(policy: &ToolchainPolicy, paths: &ResolvedJobPaths) -> CompileOutcome {
    let Some(template) = &policy.compile else {
        return CompileOutcome::NotRequired;
    };
    let cmd = template.expand(paths);

    let output = match Command::new(&cmd.program).args(&cmd.args).output() {
        Ok(output) => output,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return CompileOutcome::Failed(format!("toolchain not found: {}", cmd.program));
        }
        Err(e) => {
            return CompileOutcome::Failed(format!("failed to invoke {}: {}", cmd.program, e));
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let diag = stderr.trim();
        let message = if diag.is_empty() {
            format!("{} exited with {}", cmd.program, output.status)
        } else {
            diag.to_string()
        };
        return CompileOutcome::Failed(message);
    }

    if policy.artifact != ArtifactRule::None && !paths.artifact.exists() {
        return CompileOutcome::Failed(format!(
            "compiler reported success but produced no artifact at {}",
            paths.artifact.display()
        ));
    }

    CompileOutcome::Succeeded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolchain::{CommandTemplate, Token};
    use tempfile::TempDir;

    fn shell_policy(script: &str, artifact: ArtifactRule) -> ToolchainPolicy {
        ToolchainPolicy {
            tag: "sh".to_string(),
            compile: Some(CommandTemplate::new(
                Token::Literal("sh".to_string()),
                vec![
                    Token::Literal("-c".to_string()),
                    Token::Literal(script.to_string()),
                    Token::Literal("compile".to_string()),
                    Token::ArtifactPath,
                ],
            )),
            run: CommandTemplate::new(Token::Literal("sh".to_string()), vec![Token::ArtifactPath]),
            artifact,
            run_in_source_dir: false,
        }
    }

    fn paths_for(temp: &TempDir, artifact: ArtifactRule) -> ResolvedJobPaths {
        let source = temp.path().join("prog.sh");
        std::fs::write(&source, "").unwrap();
        ResolvedJobPaths::derive(&source, artifact)
    }

    #[test]
    fn test_interpreted_policy_needs_no_compile() {
        let temp = TempDir::new().unwrap();
        let mut policy = shell_policy(":", ArtifactRule::None);
        policy.compile = None;
        let paths = paths_for(&temp, ArtifactRule::None);
        assert_eq!(compile(&policy, &paths), CompileOutcome::NotRequired);
    }

    #[test]
    fn test_successful_compile_with_artifact() {
        let temp = TempDir::new().unwrap();
        // $1 is the artifact path thanks to the "compile" argv[0] filler.
        let policy = shell_policy("echo 'exit 0' > \"$1\"", ArtifactRule::BinarySuffix);
        let paths = paths_for(&temp, ArtifactRule::BinarySuffix);
        assert_eq!(compile(&policy, &paths), CompileOutcome::Succeeded);
        assert!(paths.artifact.exists());
    }

    #[test]
    fn test_nonzero_exit_captures_stderr() {
        let temp = TempDir::new().unwrap();
        let policy = shell_policy("echo 'syntax error near line 3' >&2; exit 1", ArtifactRule::BinarySuffix);
        let paths = paths_for(&temp, ArtifactRule::BinarySuffix);
        match compile(&policy, &paths) {
            CompileOutcome::Failed(msg) => assert!(msg.contains("syntax error near line 3")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_toolchain_is_classified_not_fatal() {
        let temp = TempDir::new().unwrap();
        let mut policy = shell_policy(":", ArtifactRule::BinarySuffix);
        policy.compile = Some(CommandTemplate::new(
            Token::Literal("definitely-not-a-real-compiler".to_string()),
            vec![Token::SourcePath],
        ));
        let paths = paths_for(&temp, ArtifactRule::BinarySuffix);
        match compile(&policy, &paths) {
            CompileOutcome::Failed(msg) => assert!(msg.contains("toolchain not found")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_exit_without_artifact_is_a_failure() {
        let temp = TempDir::new().unwrap();
        let policy = shell_policy(":", ArtifactRule::BinarySuffix);
        let paths = paths_for(&temp, ArtifactRule::BinarySuffix);
        match compile(&policy, &paths) {
            CompileOutcome::Failed(msg) => assert!(msg.contains("no artifact")),
            other => panic!("expected failure, got {other:?}"),
        }
    }
}
