//! Console report and machine-readable run summary
//!
//! The console report goes to stdout in a fixed layout; logs go to stderr so
//! the two never interleave on the same stream.

use std::io::{self, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::AppResult;
use crate::models::InstanceId;
use crate::render::RenderSummary;

use super::ratio::RatioSnapshot;
use super::verdict::Verdict;

/// One (instance, solver) attempt as reported
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub instance: InstanceId,
    pub solver: String,
    pub verdict: Verdict,
    pub elapsed_seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    /// Declared objective, for verified attempts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    /// Ratio to the baseline, when the baseline has a value for the instance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratio: Option<f64>,
}

/// Everything a sweep produced, written to `summary.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub time_limit_seconds: f64,
    pub baseline: String,
    pub attempts: Vec<AttemptRecord>,
    pub stats: RatioSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render: Option<RenderSummary>,
}

impl RunSummary {
    pub async fn write(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, serde_json::to_vec_pretty(self)?).await?;
        Ok(())
    }
}

/// Line-oriented progress report
pub struct ConsoleReport<W: Write> {
    out: W,
    /// Length of the longest solver name
    padding: usize,
}

impl<W: Write> ConsoleReport<W> {
    pub fn new(out: W, padding: usize) -> Self {
        Self { out, padding }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn solving(&mut self, instance: &InstanceId) -> io::Result<()> {
        writeln!(self.out, "Solving {}...", instance)
    }

    /// Solver label with dot leader; the outcome follows on the same line
    pub fn attempt_label(&mut self, solver: &str) -> io::Result<()> {
        let dots = ".".repeat(self.padding.saturating_sub(solver.len()) + 3);
        write!(self.out, "   {}{} ", solver, dots)?;
        self.out.flush()
    }

    pub fn attempt_outcome(&mut self, attempt: &AttemptRecord) -> io::Result<()> {
        match (attempt.verdict, attempt.value) {
            (Verdict::Accepted, Some(value)) => {
                write!(
                    self.out,
                    "{:7.4} seconds, value {:9.4} ",
                    attempt.elapsed_seconds, value
                )?;
                match attempt.ratio {
                    Some(ratio) => writeln!(self.out, "({:.4})", ratio),
                    None => writeln!(self.out, "(n/a)"),
                }
            }
            (verdict, _) => writeln!(self.out, "{}", verdict.code()),
        }
    }

    pub fn stats(&mut self, snapshot: &RatioSnapshot) -> io::Result<()> {
        writeln!(self.out, "Stats")?;
        for stats in &snapshot.solvers {
            let pad = " ".repeat(self.padding.saturating_sub(stats.solver.len()));
            writeln!(self.out, "   {}{} {:.4}", stats.solver, pad, stats.worst_ratio)?;
        }
        Ok(())
    }

    pub fn drawing(&mut self, instance: &InstanceId) -> io::Result<()> {
        writeln!(self.out, "Drawing {}...", instance)
    }

    pub fn drawing_solver(&mut self, solver: &str) -> io::Result<()> {
        writeln!(self.out, "   {}...", solver)
    }
}
