//! Execution engine - runs one solver on one instance under a time limit

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::fs;

use crate::config::StorageConfig;
use crate::error::AppResult;
use crate::models::{InstanceId, Solver};

use super::process::{CommandRunner, CommandSpec};
use super::verdict::Verdict;

/// Result of running one solver on one instance
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub instance: InstanceId,
    pub solver: String,
    /// Wall time of the run
    pub elapsed: Duration,
    /// Exit code, if the process exited on its own
    pub exit_code: Option<i32>,
    pub verdict: Verdict,
    /// Captured stdout bytes (only for runs that finished cleanly)
    pub output: Option<Vec<u8>>,
    /// Where the captured stdout was persisted
    pub output_path: Option<PathBuf>,
    /// Error message (for RTE)
    pub error_message: Option<String>,
}

impl ExecutionResult {
    /// Mark the run as rejected by the verifier; the output stays on disk
    pub fn reject(mut self) -> Self {
        self.verdict = Verdict::WrongAnswer;
        self
    }
}

/// Runs solvers and persists their captured output
pub struct Executor {
    runner: Arc<dyn CommandRunner>,
    storage: StorageConfig,
}

impl Executor {
    /// Create a new executor
    pub fn new(runner: Arc<dyn CommandRunner>, storage: StorageConfig) -> Self {
        Self { runner, storage }
    }

    /// Location of the captured output of a pair
    pub fn output_path(&self, instance: &InstanceId, solver: &str) -> PathBuf {
        self.storage.output_path(instance, solver)
    }

    /// Run `solver` with `input` (the instance file content) on stdin
    ///
    /// A single attempt; launch failures classify as runtime errors. Only
    /// I/O errors on the output store are returned as errors.
    pub async fn run(
        &self,
        solver: &Solver,
        instance: &InstanceId,
        input: &[u8],
        time_limit: Duration,
    ) -> AppResult<ExecutionResult> {
        let output_path = self.output_path(instance, &solver.name);
        let command = CommandSpec::new(&solver.program).args(solver.args.iter().cloned());

        let mut result = ExecutionResult {
            instance: instance.clone(),
            solver: solver.name.clone(),
            elapsed: Duration::ZERO,
            exit_code: None,
            verdict: Verdict::RuntimeError,
            output: None,
            output_path: None,
            error_message: None,
        };

        let invocation = match self.runner.invoke(&command, input.to_vec(), Some(time_limit)).await {
            Ok(invocation) => invocation,
            Err(e) => {
                tracing::warn!(
                    instance = %instance,
                    solver = %solver.name,
                    code = e.error_code(),
                    "Solver could not be started: {}",
                    e
                );
                result.error_message = Some(e.to_string());
                discard(&output_path).await?;
                return Ok(result);
            }
        };

        result.elapsed = invocation.elapsed;
        result.exit_code = invocation.exit_code;
        result.verdict = Verdict::classify(invocation.elapsed, time_limit, invocation.success);

        if result.verdict.keeps_output() {
            if let Some(parent) = output_path.parent() {
                fs::create_dir_all(parent).await?;
            }
            fs::write(&output_path, &invocation.stdout).await?;
            result.output = Some(invocation.stdout);
            result.output_path = Some(output_path);
        } else {
            if result.verdict == Verdict::RuntimeError {
                let stderr = invocation.stderr_excerpt();
                result.error_message = Some(if stderr.is_empty() {
                    match invocation.exit_code {
                        Some(code) => format!("Process exited with code {}", code),
                        None => "Process terminated by signal".to_string(),
                    }
                } else {
                    stderr
                });
            }
            tracing::debug!(
                instance = %instance,
                solver = %solver.name,
                verdict = %result.verdict,
                elapsed_ms = invocation.elapsed.as_millis() as u64,
                "Discarding captured output"
            );
            discard(&output_path).await?;
        }

        Ok(result)
    }
}

/// Remove a captured output, tolerating its absence
async fn discard(path: &Path) -> AppResult<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
