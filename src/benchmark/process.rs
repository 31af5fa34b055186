//! Subprocess adapter
//!
//! Every external program the harness drives (solvers, verifier, compiler,
//! generator, geometry engine, LaTeX) goes through [`CommandRunner`], so the
//! pipeline can be exercised without spawning real processes.

use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;

use crate::error::{AppError, AppResult};

/// A program invocation: executable, arguments and working directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    /// Build from a word list where the first word is the program
    pub fn from_words(words: &[String]) -> AppResult<Self> {
        let (program, args) = words
            .split_first()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("empty command line")))?;
        Ok(Self::new(program).args(args.iter().cloned()))
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Outcome of one finished (or killed) invocation
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Exit code, `None` when killed by a signal or by the time limit
    pub exit_code: Option<i32>,
    pub success: bool,
    /// Wall time from spawn until exit or kill
    pub elapsed: Duration,
    pub timed_out: bool,
}

impl Invocation {
    /// A successful invocation with the given stdout
    pub fn completed(stdout: impl Into<Vec<u8>>, elapsed: Duration) -> Self {
        Self {
            stdout: stdout.into(),
            exit_code: Some(0),
            success: true,
            elapsed,
            ..Default::default()
        }
    }

    /// An invocation that exited with a nonzero code
    pub fn failed(exit_code: i32, stderr: impl Into<Vec<u8>>, elapsed: Duration) -> Self {
        Self {
            stderr: stderr.into(),
            exit_code: Some(exit_code),
            elapsed,
            ..Default::default()
        }
    }

    /// An invocation killed after exceeding its limit
    pub fn killed(elapsed: Duration) -> Self {
        Self {
            elapsed,
            timed_out: true,
            ..Default::default()
        }
    }

    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// First 500 characters of stderr, for log messages
    pub fn stderr_excerpt(&self) -> String {
        String::from_utf8_lossy(&self.stderr).chars().take(500).collect()
    }
}

/// Runs external programs
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command` with `stdin` as its entire standard input
    ///
    /// With a `limit`, the process is killed once the limit elapses and the
    /// returned invocation is marked `timed_out`. Errors are reserved for
    /// processes that could not be started at all.
    async fn invoke(
        &self,
        command: &CommandSpec,
        stdin: Vec<u8>,
        limit: Option<Duration>,
    ) -> AppResult<Invocation>;
}

/// [`CommandRunner`] backed by `tokio::process`
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn invoke(
        &self,
        command: &CommandSpec,
        stdin: Vec<u8>,
        limit: Option<Duration>,
    ) -> AppResult<Invocation> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &command.current_dir {
            cmd.current_dir(dir);
        }

        let start = Instant::now();
        let mut child = cmd.spawn().map_err(|source| AppError::Spawn {
            program: command.to_string(),
            source,
        })?;

        // Feed stdin concurrently so a child that writes before it finishes
        // reading cannot deadlock against a full pipe.
        if let Some(mut pipe) = child.stdin.take() {
            tokio::spawn(async move {
                if let Err(e) = pipe.write_all(&stdin).await {
                    tracing::debug!(error = %e, "Child closed stdin early");
                }
            });
        }

        let wait = child.wait_with_output();
        let output = match limit {
            Some(limit) => match timeout(limit, wait).await {
                Ok(result) => result?,
                // Dropping the wait future kills the child (kill_on_drop)
                Err(_) => return Ok(Invocation::killed(start.elapsed())),
            },
            None => wait.await?,
        };

        Ok(Invocation {
            exit_code: output.status.code(),
            success: output.status.success(),
            stdout: output.stdout,
            stderr: output.stderr,
            elapsed: start.elapsed(),
            timed_out: false,
        })
    }
}
