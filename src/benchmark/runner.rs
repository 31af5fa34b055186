//! Harness pipeline - orchestrates a full evaluation sweep

use std::io::Write;
use std::sync::Arc;

use crate::config::Config;
use crate::constants::{GENERATOR_PROGRAM, SUMMARY_FILE, VERIFIER_PROGRAM};
use crate::error::AppResult;
use crate::models::{InstanceId, Solver, SolverRoster};
use crate::render::Renderer;
use crate::utils::{format_elapsed, now_utc};

use super::compiler::Compiler;
use super::executor::Executor;
use super::generator::InstanceGenerator;
use super::process::CommandRunner;
use super::ratio::{RatioAggregator, RatioSnapshot, extract_objective};
use super::registry::InstanceRegistry;
use super::report::{AttemptRecord, ConsoleReport, RunSummary};
use super::verdict::Verdict;
use super::verifier::Verifier;

/// Outcome of the instance x solver sweep
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub attempts: Vec<AttemptRecord>,
    pub stats: RatioSnapshot,
}

/// Sequential evaluation harness
pub struct Harness {
    config: Config,
    runner: Arc<dyn CommandRunner>,
    roster: SolverRoster,
    registry: InstanceRegistry,
    executor: Executor,
    verifier: Verifier,
}

impl Harness {
    pub fn new(config: Config, runner: Arc<dyn CommandRunner>, roster: SolverRoster) -> AppResult<Self> {
        let verifier = Verifier::from_config(runner.clone(), &config.toolchain, &config.storage.work_dir)?;
        Ok(Self {
            registry: InstanceRegistry::new(&config.storage.instances_path),
            executor: Executor::new(runner.clone(), config.storage.clone()),
            verifier,
            roster,
            runner,
            config,
        })
    }

    pub fn registry(&self) -> &InstanceRegistry {
        &self.registry
    }

    /// Create the storage directories
    pub async fn bootstrap(&self) -> AppResult<()> {
        for dir in self.config.storage.output_dirs() {
            tokio::fs::create_dir_all(dir).await?;
        }
        Ok(())
    }

    /// Run every solver on every instance, in order
    pub async fn evaluate<W: Write>(
        &self,
        ids: &[InstanceId],
        report: &mut ConsoleReport<W>,
    ) -> AppResult<Evaluation> {
        let mut aggregator = RatioAggregator::new(self.roster.names(), &self.roster.baseline().name);
        let mut attempts = Vec::with_capacity(ids.len() * self.roster.len());

        for id in ids {
            report.solving(id)?;
            let input = match self.registry.read_raw(id).await {
                Ok(input) => input,
                Err(e) => {
                    tracing::error!(instance = %id, code = e.error_code(), "Cannot read instance: {}", e);
                    continue;
                }
            };

            for solver in self.roster.iter() {
                report.attempt_label(&solver.name)?;
                let attempt = match self.attempt(solver, id, &input, &mut aggregator).await {
                    Ok(attempt) => attempt,
                    Err(e) => {
                        tracing::error!(
                            instance = %id,
                            solver = %solver.name,
                            code = e.error_code(),
                            "Attempt failed: {}",
                            e
                        );
                        AttemptRecord {
                            instance: id.clone(),
                            solver: solver.name.clone(),
                            verdict: Verdict::RuntimeError,
                            elapsed_seconds: 0.0,
                            exit_code: None,
                            value: None,
                            ratio: None,
                        }
                    }
                };
                report.attempt_outcome(&attempt)?;
                attempts.push(attempt);
            }
        }

        Ok(Evaluation {
            attempts,
            stats: aggregator.into_snapshot(),
        })
    }

    /// Execute, verify and score one pair
    async fn attempt(
        &self,
        solver: &Solver,
        id: &InstanceId,
        input: &[u8],
        aggregator: &mut RatioAggregator,
    ) -> AppResult<AttemptRecord> {
        let mut result = self
            .executor
            .run(solver, id, input, self.config.harness.time_limit())
            .await?;
        let mut value = None;
        let mut ratio = None;

        if let (Verdict::Accepted, Some(output)) = (result.verdict, result.output.take()) {
            let verified = match self.verifier.verify(input, &output).await {
                Ok(verified) => verified,
                Err(e) => {
                    tracing::error!(
                        instance = %id,
                        solver = %solver.name,
                        code = e.error_code(),
                        "Verifier could not be started: {}",
                        e
                    );
                    false
                }
            };

            match verified.then(|| extract_objective(&String::from_utf8_lossy(&output))) {
                Some(Ok(objective)) => {
                    value = Some(objective);
                    ratio = aggregator.record(&solver.name, id, objective);
                }
                Some(Err(e)) => {
                    tracing::warn!(instance = %id, solver = %solver.name, "Verified output has no objective: {}", e);
                    result = result.reject();
                }
                None => {
                    tracing::info!(instance = %id, solver = %solver.name, "Verifier rejected output");
                    result = result.reject();
                }
            }
        } else if let Some(message) = &result.error_message {
            tracing::info!(
                instance = %id,
                solver = %solver.name,
                verdict = %result.verdict,
                "{}",
                message
            );
        }

        Ok(AttemptRecord {
            instance: id.clone(),
            solver: solver.name.clone(),
            verdict: result.verdict,
            elapsed_seconds: result.elapsed.as_secs_f64(),
            exit_code: result.exit_code,
            value,
            ratio,
        })
    }

    /// Full pipeline: compile, generate, evaluate, report and render
    pub async fn run<W: Write>(&self, out: W) -> AppResult<RunSummary> {
        let started_at = now_utc();
        let clock = std::time::Instant::now();
        let mut report = ConsoleReport::new(out, self.roster.name_width());

        self.bootstrap().await?;

        if self.config.toolchain.compile_enabled {
            let compiler = Compiler::new(
                self.runner.clone(),
                self.config.toolchain.clone(),
                self.config.storage.clone(),
            );
            let programs = self
                .roster
                .names()
                .chain([GENERATOR_PROGRAM, VERIFIER_PROGRAM]);
            let compiled = compiler.compile_all(programs).await;
            if !compiled.failed.is_empty() {
                tracing::warn!(failed = ?compiled.failed, "Some programs did not compile");
            }
        }

        if self.config.generation.enabled {
            let generator = InstanceGenerator::new(
                self.runner.clone(),
                &self.config.toolchain,
                self.config.generation.clone(),
                &self.config.storage,
            )?;
            let generated = generator.generate_all().await?;
            tracing::info!(count = generated.len(), "Instances ready");
        }

        let ids = self.registry.list_instances().await?;
        tracing::info!(
            instances = ids.len(),
            solvers = self.roster.len(),
            time_limit_seconds = self.config.harness.time_limit_seconds,
            "Starting evaluation"
        );

        let evaluation = self.evaluate(&ids, &mut report).await?;
        report.stats(&evaluation.stats)?;

        let render = if self.config.render.enabled {
            let renderer = Renderer::new(
                self.runner.clone(),
                self.config.render.clone(),
                self.config.storage.clone(),
            )?;
            let rendered = renderer.render_all(&self.registry, &self.roster, &mut report).await?;
            tracing::info!(
                rendered = rendered.rendered,
                failed = rendered.failed,
                skipped = rendered.skipped,
                "Render sweep finished"
            );
            Some(rendered)
        } else {
            None
        };

        let summary = RunSummary {
            started_at,
            finished_at: now_utc(),
            time_limit_seconds: self.config.harness.time_limit_seconds,
            baseline: self.roster.baseline().name.clone(),
            attempts: evaluation.attempts,
            stats: evaluation.stats,
            render,
        };
        let path = self.config.storage.logs_path.join(SUMMARY_FILE);
        summary.write(&path).await?;

        tracing::info!(
            summary = %path.display(),
            elapsed = %format_elapsed(clock.elapsed()),
            "Run complete"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    use super::*;
    use crate::benchmark::process::{Invocation, MockCommandRunner};

    const INSTANCE: &str = "2 2\n0 0\n1 0\n0 1\n1 1\n";

    fn config(dir: &Path, extra: &'static [(&'static str, &'static str)]) -> Config {
        let work_dir = dir.to_string_lossy().into_owned();
        Config::from_lookup(move |key| {
            if key == "HARNESS_WORK_DIR" {
                return Some(work_dir.clone());
            }
            let defaults = [
                ("SOLVERS", "exact_a,heuristic_b,heuristic_slow,heuristic_wrong"),
                ("BASELINE_SOLVER", "exact_a"),
                ("TIME_LIMIT_SECONDS", "10"),
                ("VERIFIER_COMMAND", "verify"),
                ("COMPILE_ENABLED", "false"),
                ("GENERATE_ENABLED", "false"),
                ("RENDER_ENABLED", "false"),
            ];
            extra
                .iter()
                .chain(defaults.iter())
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        })
        .unwrap()
    }

    /// Solvers keyed by program name; the verifier rejects heuristic_wrong
    fn fake_programs() -> MockCommandRunner {
        let mut runner = MockCommandRunner::new();
        runner.expect_invoke().returning(|command, stdin, _| {
            let name = command
                .program
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let ms = Duration::from_millis(5);
            Ok(match name.as_str() {
                "verify" => {
                    let replaced = stdin.windows(3).any(|w| w == "\u{FFFD}".as_bytes());
                    let rejected = stdin.ends_with(b"9\n") || replaced;
                    Invocation::completed(if rejected { "0\n" } else { "1\n" }, ms)
                }
                "exact_a" => Invocation::completed("2\n0 2\n1 3\n2\n", ms),
                "heuristic_b" => Invocation::completed("2\n0 3\n1 2\n2.8284\n", ms),
                "heuristic_slow" => Invocation::killed(Duration::from_secs(10)),
                "heuristic_wrong" => Invocation::completed("0\n9\n", ms),
                "heuristic_nan" => Invocation::completed("0\nnan\n", ms),
                "heuristic_raw" => Invocation::completed(&b"2\n0 3\n1 2\n\xff\n2\n"[..], ms),
                other => Invocation::failed(127, format!("{}: not found", other), ms),
            })
        });
        runner
    }

    async fn harness(dir: &Path, extra: &'static [(&'static str, &'static str)]) -> Harness {
        let config = config(dir, extra);
        let roster = SolverRoster::from_config(&config.harness, &config.storage).unwrap();
        let instances = config.storage.instances_path.clone();
        tokio::fs::create_dir_all(&instances).await.unwrap();
        tokio::fs::write(instances.join("2_2_R_0.in"), INSTANCE).await.unwrap();
        Harness::new(config, Arc::new(fake_programs()), roster).unwrap()
    }

    #[tokio::test]
    async fn test_evaluate_classifies_every_pair() {
        let dir = tempfile::tempdir().unwrap();
        let harness = harness(dir.path(), &[]).await;
        let ids = harness.registry().list_instances().await.unwrap();

        let mut report = ConsoleReport::new(Vec::new(), 15);
        let evaluation = harness.evaluate(&ids, &mut report).await.unwrap();

        let verdicts: Vec<_> = evaluation.attempts.iter().map(|a| a.verdict).collect();
        assert_eq!(
            verdicts,
            vec![
                Verdict::Accepted,
                Verdict::Accepted,
                Verdict::TimeLimitExceeded,
                Verdict::WrongAnswer
            ]
        );
        assert_eq!(evaluation.attempts[1].ratio.map(|r| (r * 1e4).round()), Some(14142.0));
        assert!((evaluation.stats.worst("heuristic_b").unwrap() - 1.4142).abs() < 1e-9);
        assert_eq!(evaluation.stats.worst("heuristic_slow"), Some(1.0));

        let console = String::from_utf8(report.into_inner()).unwrap();
        let lines: Vec<_> = console.lines().collect();
        assert_eq!(lines[0], "Solving 2_2_R_0...");
        assert!(lines[1].ends_with("value    2.0000 (1.0000)"));
        assert_eq!(lines[3], "   heuristic_slow.... TLE");
        assert_eq!(lines[4], "   heuristic_wrong... WA");

        // WA keeps its output for inspection, TLE leaves nothing behind
        let logs = dir.path().join("logs");
        assert!(logs.join("2_2_R_0_heuristic_wrong.out").exists());
        assert!(!logs.join("2_2_R_0_heuristic_slow.out").exists());
    }

    #[tokio::test]
    async fn test_failed_baseline_reports_na() {
        let dir = tempfile::tempdir().unwrap();
        let harness = harness(
            dir.path(),
            &[("SOLVERS", "exact_missing,heuristic_b"), ("BASELINE_SOLVER", "exact_missing")],
        )
        .await;
        let ids = harness.registry().list_instances().await.unwrap();

        let mut report = ConsoleReport::new(Vec::new(), 13);
        let evaluation = harness.evaluate(&ids, &mut report).await.unwrap();

        assert_eq!(evaluation.attempts[0].verdict, Verdict::RuntimeError);
        assert_eq!(evaluation.attempts[1].verdict, Verdict::Accepted);
        assert_eq!(evaluation.attempts[1].ratio, None);
        let console = String::from_utf8(report.into_inner()).unwrap();
        assert!(console.contains("   exact_missing... RTE\n"));
        assert!(console.ends_with("(n/a)\n"));
    }

    #[tokio::test]
    async fn test_run_writes_summary() {
        let dir = tempfile::tempdir().unwrap();
        let harness = harness(dir.path(), &[]).await;

        let summary = harness.run(Vec::<u8>::new()).await.unwrap();
        assert_eq!(summary.attempts.len(), 4);
        assert_eq!(summary.baseline, "exact_a");
        assert!(summary.render.is_none());

        for sub in ["instances", "logs", "tex", "pdf"] {
            assert!(dir.path().join(sub).is_dir());
        }
        let written: RunSummary = serde_json::from_slice(
            &std::fs::read(PathBuf::from(dir.path()).join("logs/summary.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(written.stats, summary.stats);
    }

    #[tokio::test]
    async fn test_unwritable_output_does_not_abort_sweep() {
        let dir = tempfile::tempdir().unwrap();
        let harness = harness(dir.path(), &[]).await;
        // a directory where the captured output should go cannot be written
        // over or removed
        let logs = dir.path().join("logs");
        for solver in ["exact_a", "heuristic_slow"] {
            std::fs::create_dir_all(logs.join(format!("2_2_R_0_{}.out", solver)).join("x")).unwrap();
        }
        let ids = harness.registry().list_instances().await.unwrap();

        let mut report = ConsoleReport::new(Vec::new(), 15);
        let evaluation = harness.evaluate(&ids, &mut report).await.unwrap();

        let verdicts: Vec<_> = evaluation.attempts.iter().map(|a| a.verdict).collect();
        assert_eq!(
            verdicts,
            vec![
                Verdict::RuntimeError,
                Verdict::Accepted,
                Verdict::RuntimeError,
                Verdict::WrongAnswer
            ]
        );
        assert_eq!(evaluation.attempts[1].ratio, None);
        let console = String::from_utf8(report.into_inner()).unwrap();
        assert!(console.contains("   exact_a........... RTE\n"), "{}", console);

        let summary = harness.run(std::io::sink()).await.unwrap();
        assert_eq!(summary.attempts.len(), 4);
        assert!(logs.join("summary.json").exists());
    }

    #[tokio::test]
    async fn test_non_finite_objective_is_wrong_answer() {
        let dir = tempfile::tempdir().unwrap();
        let harness = harness(dir.path(), &[("SOLVERS", "exact_a,heuristic_nan")]).await;
        let ids = harness.registry().list_instances().await.unwrap();

        let mut report = ConsoleReport::new(std::io::sink(), 13);
        let evaluation = harness.evaluate(&ids, &mut report).await.unwrap();

        assert_eq!(evaluation.attempts[1].verdict, Verdict::WrongAnswer);
        assert_eq!(evaluation.attempts[1].value, None);
        assert_eq!(evaluation.stats.solvers[1].verified_count, 0);
    }

    #[tokio::test]
    async fn test_verifier_sees_raw_output_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let harness = harness(dir.path(), &[("SOLVERS", "exact_a,heuristic_raw")]).await;
        let ids = harness.registry().list_instances().await.unwrap();

        let mut report = ConsoleReport::new(std::io::sink(), 13);
        let evaluation = harness.evaluate(&ids, &mut report).await.unwrap();

        assert_eq!(evaluation.attempts[1].verdict, Verdict::Accepted);
        assert_eq!(evaluation.attempts[1].value, Some(2.0));
    }
}
