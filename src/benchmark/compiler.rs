//! Build step for solver, generator and verifier sources

use std::sync::Arc;

use crate::config::{StorageConfig, ToolchainConfig};
use crate::constants::extensions;
use crate::error::{AppError, AppResult};
use crate::models::program_path;

use super::process::{CommandRunner, CommandSpec};

/// Outcome of a compile sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileReport {
    pub compiled: Vec<String>,
    pub failed: Vec<String>,
}

/// Compiles every program from `source_dir` into `bin_dir`
pub struct Compiler {
    runner: Arc<dyn CommandRunner>,
    toolchain: ToolchainConfig,
    storage: StorageConfig,
}

impl Compiler {
    pub fn new(runner: Arc<dyn CommandRunner>, toolchain: ToolchainConfig, storage: StorageConfig) -> Self {
        Self {
            runner,
            toolchain,
            storage,
        }
    }

    /// `{cxx} {cxxflags} {source} {ldflags} -o {binary}`
    pub fn compile_command(&self, program: &str) -> CommandSpec {
        let source = self
            .storage
            .source_dir
            .join(format!("{}.{}", program, extensions::SOURCE));
        let binary = program_path(&self.storage.bin_dir, program);

        CommandSpec::new(&self.toolchain.cxx)
            .args(self.toolchain.cxxflags.iter().cloned())
            .arg(source.to_string_lossy())
            .args(self.toolchain.ldflags.iter().cloned())
            .arg("-o")
            .arg(binary.to_string_lossy())
            .current_dir(&self.storage.work_dir)
    }

    /// Compile one program
    pub async fn compile(&self, program: &str) -> AppResult<()> {
        let command = self.compile_command(program);
        tracing::debug!(program = %program, command = %command, "Compiling");

        let invocation = self.runner.invoke(&command, Vec::new(), None).await?;
        if !invocation.success {
            return Err(AppError::CompilationError(format!(
                "{} (exit code {:?}): {}",
                program,
                invocation.exit_code,
                invocation.stderr_excerpt()
            )));
        }

        tracing::info!(
            program = %program,
            elapsed_ms = invocation.elapsed.as_millis() as u64,
            "Compiled"
        );
        Ok(())
    }

    /// Compile every program; failures are logged and do not stop the sweep
    pub async fn compile_all<'a, I>(&self, programs: I) -> CompileReport
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut report = CompileReport::default();
        for program in programs {
            match self.compile(program).await {
                Ok(()) => report.compiled.push(program.to_string()),
                Err(e) => {
                    tracing::error!(program = %program, code = e.error_code(), "{}", e);
                    report.failed.push(program.to_string());
                }
            }
        }
        report
    }
}
