//! Verifier adapter - feeds instance + solver output to the external checker

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ToolchainConfig;
use crate::error::AppResult;

use super::process::{CommandRunner, CommandSpec};

/// External correctness checker
///
/// The checker reads the instance followed by the solver's output on stdin
/// and prints the success token when the matching is valid and its declared
/// cost is consistent.
pub struct Verifier {
    runner: Arc<dyn CommandRunner>,
    command: CommandSpec,
    success_token: String,
    time_limit: Duration,
}

impl Verifier {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        command: CommandSpec,
        success_token: impl Into<String>,
        time_limit: Duration,
    ) -> Self {
        Self {
            runner,
            command,
            success_token: success_token.into(),
            time_limit,
        }
    }

    /// Verifier described by the toolchain config, run from `work_dir`
    pub fn from_config(
        runner: Arc<dyn CommandRunner>,
        toolchain: &ToolchainConfig,
        work_dir: &Path,
    ) -> AppResult<Self> {
        Ok(Self::new(
            runner,
            CommandSpec::from_words(&toolchain.verifier_command)?.current_dir(work_dir),
            toolchain.verifier_success_token.clone(),
            Duration::from_secs_f64(toolchain.verifier_time_limit_seconds),
        ))
    }

    /// Check a captured output against its instance
    ///
    /// Returns `Ok(false)` for any verdict other than the success token,
    /// including a checker that crashed or ran out of time. Errors mean the
    /// checker could not be started.
    pub async fn verify(&self, instance: &[u8], captured: &[u8]) -> AppResult<bool> {
        let invocation = self
            .runner
            .invoke(&self.command, checker_input(instance, captured), Some(self.time_limit))
            .await?;

        if invocation.timed_out {
            tracing::error!(verifier = %self.command, "Verifier exceeded its time limit");
            return Ok(false);
        }
        if !invocation.success {
            tracing::warn!(
                verifier = %self.command,
                exit_code = ?invocation.exit_code,
                stderr = %invocation.stderr_excerpt(),
                "Verifier exited abnormally"
            );
        }

        Ok(invocation.stdout_lossy().trim() == self.success_token)
    }
}

/// Instance followed by the solver output, newline-separated
fn checker_input(instance: &[u8], captured: &[u8]) -> Vec<u8> {
    let mut input = Vec::with_capacity(instance.len() + captured.len() + 1);
    input.extend_from_slice(instance);
    if !instance.is_empty() && !instance.ends_with(b"\n") {
        input.push(b'\n');
    }
    input.extend_from_slice(captured);
    input
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmark::process::{Invocation, MockCommandRunner};

    fn verifier_returning(stdout: &'static str) -> Verifier {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_invoke()
            .withf(|command, stdin, _| {
                command.program == std::path::PathBuf::from("./_verifier")
                    && stdin.as_slice() == b"2 2\n0 0\n1 0\n0 1\n1 1\n2\n0 2\n1 3\n2.000\n"
            })
            .times(1)
            .returning(move |_, _, _| Ok(Invocation::completed(stdout, Duration::from_millis(1))));
        Verifier::new(
            Arc::new(runner),
            CommandSpec::new("./_verifier"),
            "1",
            Duration::from_secs(60),
        )
    }

    const INSTANCE: &[u8] = b"2 2\n0 0\n1 0\n0 1\n1 1\n";
    const OUTPUT: &[u8] = b"2\n0 2\n1 3\n2.000\n";

    #[tokio::test]
    async fn test_accepts_success_token() {
        let verifier = verifier_returning("1\n");
        assert!(verifier.verify(INSTANCE, OUTPUT).await.unwrap());
    }

    #[tokio::test]
    async fn test_rejects_anything_else() {
        for stdout in ["0\n", "", "11\n", "ok\n"] {
            let verifier = verifier_returning(stdout);
            assert!(!verifier.verify(INSTANCE, OUTPUT).await.unwrap(), "{:?}", stdout);
        }
    }

    #[tokio::test]
    async fn test_timeout_counts_as_rejection() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_invoke()
            .returning(|_, _, _| Ok(Invocation::killed(Duration::from_secs(60))));
        let verifier = Verifier::new(
            Arc::new(runner),
            CommandSpec::new("./_verifier"),
            "1",
            Duration::from_secs(60),
        );
        assert!(!verifier.verify(INSTANCE, OUTPUT).await.unwrap());
    }

    #[test]
    fn test_checker_input_separates_parts() {
        assert_eq!(checker_input(b"1 1\n0 0\n1 1", b"1\n0 1\n1.4"), b"1 1\n0 0\n1 1\n1\n0 1\n1.4");
        assert_eq!(checker_input(b"1 1\n", b"0\n0\n"), b"1 1\n0\n0\n");
    }
}
