//! Ratio aggregation against the exact baseline

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::InstanceId;

/// Objective value declared by a solver: the last non-empty output line
pub fn extract_objective(output: &str) -> AppResult<f64> {
    let line = output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        .ok_or_else(|| AppError::MalformedOutput("no objective line".to_string()))?;

    match line.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(AppError::MalformedOutput(format!(
            "objective is not a finite number: {}",
            line
        ))),
    }
}

/// Ratio of a solver's value to the baseline's; 1 when the baseline is 0
pub fn ratio(value: f64, baseline: f64) -> f64 {
    if baseline == 0.0 { 1.0 } else { value / baseline }
}

/// Worst ratio observed for one solver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverStats {
    pub solver: String,
    pub worst_ratio: f64,
    /// Instances that contributed a ratio
    pub verified_count: usize,
}

/// Immutable per-solver table, in roster order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioSnapshot {
    pub baseline: String,
    pub solvers: Vec<SolverStats>,
}

impl RatioSnapshot {
    pub fn worst(&self, solver: &str) -> Option<f64> {
        self.solvers
            .iter()
            .find(|s| s.solver == solver)
            .map(|s| s.worst_ratio)
    }
}

/// Tracks the worst ratio of every solver over a sweep
#[derive(Debug, Clone)]
pub struct RatioAggregator {
    baseline: String,
    order: Vec<String>,
    stats: HashMap<String, SolverStats>,
    baseline_values: HashMap<InstanceId, f64>,
}

impl RatioAggregator {
    /// Start with every solver at ratio 1
    pub fn new<I, S>(solvers: I, baseline: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let order: Vec<String> = solvers.into_iter().map(Into::into).collect();
        let stats = order
            .iter()
            .map(|name| {
                (
                    name.clone(),
                    SolverStats {
                        solver: name.clone(),
                        worst_ratio: 1.0,
                        verified_count: 0,
                    },
                )
            })
            .collect();

        Self {
            baseline: baseline.into(),
            order,
            stats,
            baseline_values: HashMap::new(),
        }
    }

    /// Record a verified objective value
    ///
    /// Returns the ratio to the baseline's value on the same instance, or
    /// `None` when the baseline has no verified value for that instance.
    pub fn record(&mut self, solver: &str, instance: &InstanceId, value: f64) -> Option<f64> {
        if !value.is_finite() {
            tracing::warn!(instance = %instance, solver = %solver, value, "Ignoring non-finite objective");
            return None;
        }
        if solver == self.baseline {
            self.baseline_values.insert(instance.clone(), value);
        }

        let Some(&baseline_value) = self.baseline_values.get(instance) else {
            tracing::warn!(
                instance = %instance,
                solver = %solver,
                "No verified baseline value, skipping ratio"
            );
            return None;
        };

        let ratio = ratio(value, baseline_value);
        let stats = self
            .stats
            .entry(solver.to_string())
            .or_insert_with(|| {
                self.order.push(solver.to_string());
                SolverStats {
                    solver: solver.to_string(),
                    worst_ratio: 1.0,
                    verified_count: 0,
                }
            });
        stats.worst_ratio = stats.worst_ratio.max(ratio);
        stats.verified_count += 1;

        Some(ratio)
    }

    pub fn worst(&self, solver: &str) -> Option<f64> {
        self.stats.get(solver).map(|s| s.worst_ratio)
    }

    /// Current table
    pub fn snapshot(&self) -> RatioSnapshot {
        RatioSnapshot {
            baseline: self.baseline.clone(),
            solvers: self
                .order
                .iter()
                .filter_map(|name| self.stats.get(name).cloned())
                .collect(),
        }
    }

    pub fn into_snapshot(self) -> RatioSnapshot {
        self.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(size: usize) -> InstanceId {
        InstanceId::new(size, size, "R", 0)
    }

    #[test]
    fn test_extract_objective_uses_last_line() {
        assert_eq!(extract_objective("2\n0 1\n2 3\n17.5").unwrap(), 17.5);
        assert_eq!(extract_objective("1\n0 1\n3.250000000\n\n\n").unwrap(), 3.25);
        assert_eq!(extract_objective("0\n  0  \n").unwrap(), 0.0);
    }

    #[test]
    fn test_extract_objective_errors() {
        assert!(extract_objective("").is_err());
        assert!(extract_objective("\n\n").is_err());
        assert!(extract_objective("1\n0 1\n").is_err());
        for value in ["nan", "NaN", "inf", "-infinity"] {
            let err = extract_objective(&format!("0\n{}\n", value)).unwrap_err();
            assert_eq!(err.error_code(), "MALFORMED_OUTPUT", "{}", value);
        }
    }

    #[test]
    fn test_ratio_zero_baseline() {
        assert_eq!(ratio(5.0, 0.0), 1.0);
        assert_eq!(ratio(0.0, 0.0), 1.0);
        assert_eq!(ratio(3.0, 2.0), 1.5);
    }

    #[test]
    fn test_worst_starts_at_one() {
        let aggregator = RatioAggregator::new(["exact_gurobi", "heuristic_a"], "exact_gurobi");
        let snapshot = aggregator.into_snapshot();
        assert_eq!(snapshot.worst("exact_gurobi"), Some(1.0));
        assert_eq!(snapshot.worst("heuristic_a"), Some(1.0));
        assert_eq!(snapshot.solvers[1].verified_count, 0);
    }

    #[test]
    fn test_worst_is_monotonic() {
        let mut aggregator = RatioAggregator::new(["exact_gurobi", "heuristic_a"], "exact_gurobi");

        let cases = [(10.0, 12.0), (10.0, 11.0), (20.0, 30.0), (5.0, 4.0), (8.0, 8.0)];
        let mut previous = 1.0;
        for (i, (baseline, heuristic)) in cases.into_iter().enumerate() {
            let instance = id(i + 1);
            assert_eq!(aggregator.record("exact_gurobi", &instance, baseline), Some(1.0));
            aggregator.record("heuristic_a", &instance, heuristic);

            let worst = aggregator.worst("heuristic_a").unwrap();
            assert!(worst >= previous);
            assert!(worst >= 1.0);
            previous = worst;
        }
        assert_eq!(aggregator.worst("heuristic_a"), Some(1.5));
        assert_eq!(aggregator.worst("exact_gurobi"), Some(1.0));
    }

    #[test]
    fn test_zero_baseline_records_one() {
        let mut aggregator = RatioAggregator::new(["exact_gurobi", "heuristic_a"], "exact_gurobi");
        aggregator.record("exact_gurobi", &id(1), 0.0);
        assert_eq!(aggregator.record("heuristic_a", &id(1), 42.0), Some(1.0));
        assert_eq!(aggregator.worst("heuristic_a"), Some(1.0));
    }

    #[test]
    fn test_missing_baseline_skips_ratio() {
        let mut aggregator = RatioAggregator::new(["exact_gurobi", "heuristic_a"], "exact_gurobi");
        aggregator.record("exact_gurobi", &id(1), 10.0);

        // baseline failed on instance 2; its value from instance 1 must not leak
        assert_eq!(aggregator.record("heuristic_a", &id(2), 100.0), None);
        assert_eq!(aggregator.worst("heuristic_a"), Some(1.0));

        let snapshot = aggregator.snapshot();
        assert_eq!(snapshot.solvers[1].verified_count, 0);
    }

    #[test]
    fn test_nan_does_not_poison() {
        let mut aggregator = RatioAggregator::new(["exact_gurobi", "heuristic_a"], "exact_gurobi");
        aggregator.record("exact_gurobi", &id(1), 10.0);
        assert_eq!(aggregator.record("heuristic_a", &id(1), f64::NAN), None);
        assert_eq!(aggregator.record("heuristic_a", &id(1), f64::INFINITY), None);
        assert_eq!(aggregator.worst("heuristic_a"), Some(1.0));
        assert_eq!(aggregator.snapshot().solvers[1].verified_count, 0);

        // a non-finite baseline value is never stored
        assert_eq!(aggregator.record("exact_gurobi", &id(2), f64::NAN), None);
        assert_eq!(aggregator.record("heuristic_a", &id(2), 3.0), None);
    }

    #[test]
    fn test_snapshot_keeps_roster_order() {
        let mut aggregator =
            RatioAggregator::new(["exact_gurobi", "heuristic_b", "heuristic_a"], "exact_gurobi");
        aggregator.record("exact_gurobi", &id(1), 2.0);
        aggregator.record("heuristic_a", &id(1), 3.0);

        let snapshot = aggregator.snapshot();
        let names: Vec<_> = snapshot.solvers.iter().map(|s| s.solver.as_str()).collect();
        assert_eq!(names, vec!["exact_gurobi", "heuristic_b", "heuristic_a"]);
        assert_eq!(snapshot.baseline, "exact_gurobi");
    }
}
