//! Harness configuration management
//!
//! This module handles loading and validating configuration from environment variables.
//! All configuration is loaded at startup and validated before the sweep runs.

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{
    DEFAULT_BASELINE_SOLVER, DEFAULT_COST_CLASSES, DEFAULT_CXX, DEFAULT_CXXFLAGS,
    DEFAULT_GENERATOR_TIME_LIMIT_SECONDS, DEFAULT_INSTANCE_SIZES, DEFAULT_LATEX_COMMAND,
    DEFAULT_LDFLAGS, DEFAULT_RENDER_MAX_SIDE_POINTS, DEFAULT_RUST_LOG, DEFAULT_SEEDS,
    DEFAULT_SOLVERS, DEFAULT_TIME_LIMIT_SECONDS, DEFAULT_VERIFIER_SUCCESS_TOKEN,
    DEFAULT_VERIFIER_TIME_LIMIT_SECONDS, DEFAULT_VORONOI_COMMAND, GENERATOR_PROGRAM,
    VERIFIER_PROGRAM, extensions,
};
use crate::models::{InstanceId, Side};

/// Main harness configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub log: LogConfig,
    pub storage: StorageConfig,
    pub harness: HarnessConfig,
    pub toolchain: ToolchainConfig,
    pub generation: GenerationConfig,
    pub render: RenderConfig,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub rust_log: String,
    pub json: bool,
}

/// Storage layout
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory external tools run in
    pub work_dir: PathBuf,
    /// Solver, generator and verifier sources
    pub source_dir: PathBuf,
    /// Compiled programs
    pub bin_dir: PathBuf,
    pub instances_path: PathBuf,
    pub logs_path: PathBuf,
    pub tex_path: PathBuf,
    pub pdf_path: PathBuf,
}

/// Sweep configuration
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Wall-clock limit per solver run in seconds
    pub time_limit_seconds: f64,
    /// Solver names in evaluation order
    pub solvers: Vec<String>,
    /// Exact solver used as ratio denominator
    pub baseline: String,
}

/// External programs the harness drives
#[derive(Debug, Clone)]
pub struct ToolchainConfig {
    pub compile_enabled: bool,
    pub cxx: String,
    pub cxxflags: Vec<String>,
    pub ldflags: Vec<String>,
    pub generator_command: Vec<String>,
    pub generator_time_limit_seconds: f64,
    pub verifier_command: Vec<String>,
    pub verifier_time_limit_seconds: f64,
    pub verifier_success_token: String,
}

/// Instance generation plan
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub enabled: bool,
    /// Total point counts, split evenly between both sides
    pub sizes: Vec<u32>,
    pub cost_classes: Vec<String>,
    pub seeds: Vec<u64>,
}

/// Diagram rendering configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub enabled: bool,
    /// Instances with a larger side are never drawn
    pub max_side_points: usize,
    pub voronoi_command: Vec<String>,
    /// Side whose Voronoi cells are drawn as background
    pub voronoi_side: Side,
    pub latex_command: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key/value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage = StorageConfig::from_lookup(&lookup)?;
        let config = Self {
            log: LogConfig::from_lookup(&lookup)?,
            harness: HarnessConfig::from_lookup(&lookup)?,
            toolchain: ToolchainConfig::from_lookup(&lookup, &storage)?,
            generation: GenerationConfig::from_lookup(&lookup)?,
            render: RenderConfig::from_lookup(&lookup)?,
            storage,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let harness = &self.harness;
        if harness.solvers.is_empty() {
            return Err(ConfigError::InvalidValue("SOLVERS".to_string()));
        }
        if harness.solvers.first() != Some(&harness.baseline) {
            return Err(ConfigError::BaselineNotFirst(harness.baseline.clone()));
        }
        if !harness.time_limit_seconds.is_finite() || harness.time_limit_seconds <= 0.0 {
            return Err(ConfigError::InvalidValue("TIME_LIMIT_SECONDS".to_string()));
        }
        Ok(())
    }
}

impl LogConfig {
    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let json = match lookup("LOG_FORMAT").as_deref() {
            None | Some("pretty") | Some("text") => false,
            Some("json") => true,
            Some(_) => return Err(ConfigError::InvalidValue("LOG_FORMAT".to_string())),
        };
        Ok(Self {
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| DEFAULT_RUST_LOG.to_string()),
            json,
        })
    }
}

impl StorageConfig {
    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // tools run with the work dir as cwd, so every derived path is anchored
        // to the process cwd once, here
        let work_dir = absolute(
            "HARNESS_WORK_DIR",
            lookup("HARNESS_WORK_DIR").unwrap_or_else(|| ".".to_string()),
        )?;
        let path_or = |key: &str, default: PathBuf| match lookup(key) {
            Some(value) => absolute(key, value),
            None => Ok(default),
        };

        Ok(Self {
            source_dir: path_or("SOLVER_SOURCE_DIR", work_dir.clone())?,
            bin_dir: path_or("SOLVER_BIN_DIR", work_dir.clone())?,
            instances_path: path_or("INSTANCES_PATH", work_dir.join("instances"))?,
            logs_path: path_or("LOGS_PATH", work_dir.join("logs"))?,
            tex_path: path_or("TEX_PATH", work_dir.join("tex"))?,
            pdf_path: path_or("PDF_PATH", work_dir.join("pdf"))?,
            work_dir,
        })
    }

    /// Directories the sweep writes into
    pub fn output_dirs(&self) -> [&Path; 4] {
        [
            self.instances_path.as_path(),
            self.logs_path.as_path(),
            self.tex_path.as_path(),
            self.pdf_path.as_path(),
        ]
    }

    /// Captured solver output for one (instance, solver) pair
    pub fn output_path(&self, id: &InstanceId, solver: &str) -> PathBuf {
        self.logs_path
            .join(format!("{}_{}.{}", id, solver, extensions::OUTPUT))
    }

    /// Diagram source for one (instance, solver) pair
    pub fn tex_file(&self, id: &InstanceId, solver: &str) -> PathBuf {
        self.tex_path
            .join(format!("{}_{}.{}", id, solver, extensions::TEX))
    }

    /// Rendered artifact of one (instance, solver) pair with the given extension
    pub fn rendered_path(&self, id: &InstanceId, solver: &str, extension: &str) -> PathBuf {
        self.pdf_path.join(format!("{}_{}.{}", id, solver, extension))
    }
}

impl HarnessConfig {
    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            time_limit_seconds: parse_or(lookup, "TIME_LIMIT_SECONDS", DEFAULT_TIME_LIMIT_SECONDS)?,
            solvers: list_or(lookup, "SOLVERS", DEFAULT_SOLVERS)?,
            baseline: lookup("BASELINE_SOLVER")
                .unwrap_or_else(|| DEFAULT_BASELINE_SOLVER.to_string()),
        })
    }

    /// Wall-clock limit per solver run
    pub fn time_limit(&self) -> Duration {
        Duration::from_secs_f64(self.time_limit_seconds)
    }
}

impl ToolchainConfig {
    fn from_lookup(
        lookup: &impl Fn(&str) -> Option<String>,
        storage: &StorageConfig,
    ) -> Result<Self, ConfigError> {
        let program = |name: &str| vec![storage.bin_dir.join(name).to_string_lossy().into_owned()];

        Ok(Self {
            compile_enabled: parse_or(lookup, "COMPILE_ENABLED", true)?,
            cxx: lookup("CXX").unwrap_or_else(|| DEFAULT_CXX.to_string()),
            cxxflags: words(&lookup("CXXFLAGS").unwrap_or_else(|| DEFAULT_CXXFLAGS.to_string())),
            ldflags: words(&lookup("LDFLAGS").unwrap_or_else(|| DEFAULT_LDFLAGS.to_string())),
            generator_command: lookup("GENERATOR_COMMAND")
                .map(|v| words(&v))
                .unwrap_or_else(|| program(GENERATOR_PROGRAM)),
            generator_time_limit_seconds: parse_or(
                lookup,
                "GENERATOR_TIME_LIMIT_SECONDS",
                DEFAULT_GENERATOR_TIME_LIMIT_SECONDS,
            )?,
            verifier_command: lookup("VERIFIER_COMMAND")
                .map(|v| words(&v))
                .unwrap_or_else(|| program(VERIFIER_PROGRAM)),
            verifier_time_limit_seconds: parse_or(
                lookup,
                "VERIFIER_TIME_LIMIT_SECONDS",
                DEFAULT_VERIFIER_TIME_LIMIT_SECONDS,
            )?,
            verifier_success_token: lookup("VERIFIER_SUCCESS_TOKEN")
                .unwrap_or_else(|| DEFAULT_VERIFIER_SUCCESS_TOKEN.to_string()),
        })
    }
}

impl GenerationConfig {
    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            enabled: parse_or(lookup, "GENERATE_ENABLED", true)?,
            sizes: list_or(lookup, "INSTANCE_SIZES", DEFAULT_INSTANCE_SIZES)?,
            cost_classes: list_or(lookup, "COST_CLASSES", DEFAULT_COST_CLASSES)?,
            seeds: list_or(lookup, "SEEDS", DEFAULT_SEEDS)?,
        })
    }
}

impl RenderConfig {
    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            enabled: parse_or(lookup, "RENDER_ENABLED", true)?,
            max_side_points: parse_or(lookup, "RENDER_MAX_SIDE_POINTS", DEFAULT_RENDER_MAX_SIDE_POINTS)?,
            voronoi_command: words(
                &lookup("VORONOI_COMMAND").unwrap_or_else(|| DEFAULT_VORONOI_COMMAND.to_string()),
            ),
            voronoi_side: parse_or(lookup, "VORONOI_SIDE", Side::B)?,
            latex_command: words(
                &lookup("LATEX_COMMAND").unwrap_or_else(|| DEFAULT_LATEX_COMMAND.to_string()),
            ),
        })
    }
}

fn absolute(key: &str, value: impl AsRef<Path>) -> Result<PathBuf, ConfigError> {
    std::path::absolute(value).map_err(|_| ConfigError::InvalidValue(key.to_string()))
}

fn words(value: &str) -> Vec<String> {
    value.split_whitespace().map(str::to_string).collect()
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

fn list_or<T, D>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &[D],
) -> Result<Vec<T>, ConfigError>
where
    T: FromStr,
    D: ToString,
{
    let Some(value) = lookup(key) else {
        return default
            .iter()
            .map(|d| d.to_string().parse().map_err(|_| ConfigError::InvalidValue(key.to_string())))
            .collect();
    };

    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| item.parse().map_err(|_| ConfigError::InvalidValue(key.to_string())))
        .collect()
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),

    #[error("Baseline solver {0} must be the first entry of SOLVERS")]
    BaselineNotFirst(String),
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = load(&[]).unwrap();
        assert_eq!(config.harness.baseline, "exact_gurobi");
        assert_eq!(config.harness.solvers.len(), DEFAULT_SOLVERS.len());
        assert_eq!(config.harness.time_limit(), Duration::from_secs(1800));
        assert_eq!(config.generation.sizes, vec![50, 100, 500, 1000, 2500, 5000]);
        assert_eq!(config.generation.cost_classes, vec!["R", "P", "E"]);
        assert_eq!(config.render.max_side_points, 50);
        assert_eq!(config.render.voronoi_side, Side::B);
        let cwd = env::current_dir().unwrap();
        assert_eq!(config.storage.logs_path, cwd.join("logs"));
        assert_eq!(
            config.toolchain.verifier_command,
            vec![config.storage.bin_dir.join("_verifier").to_string_lossy().into_owned()]
        );
        assert!(!config.log.json);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("HARNESS_WORK_DIR", "/srv/bench"),
            ("SOLVERS", "exact_a, heuristic_b ,"),
            ("BASELINE_SOLVER", "exact_a"),
            ("TIME_LIMIT_SECONDS", "2.5"),
            ("VERIFIER_COMMAND", "sh verify.sh"),
            ("SEEDS", "0,1,2"),
            ("LOG_FORMAT", "json"),
        ])
        .unwrap();

        assert_eq!(config.harness.solvers, vec!["exact_a", "heuristic_b"]);
        assert_eq!(config.harness.time_limit(), Duration::from_millis(2500));
        assert_eq!(config.toolchain.verifier_command, vec!["sh", "verify.sh"]);
        assert_eq!(config.generation.seeds, vec![0, 1, 2]);
        assert_eq!(config.storage.instances_path, PathBuf::from("/srv/bench/instances"));
        assert!(config.log.json);
    }

    #[test]
    fn test_baseline_must_lead_roster() {
        let err = load(&[("SOLVERS", "heuristic_b,exact_a"), ("BASELINE_SOLVER", "exact_a")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::BaselineNotFirst(name) if name == "exact_a"));

        let err = load(&[("SOLVERS", "heuristic_b")]).unwrap_err();
        assert!(matches!(err, ConfigError::BaselineNotFirst(_)));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            load(&[("TIME_LIMIT_SECONDS", "soon")]),
            Err(ConfigError::InvalidValue(key)) if key == "TIME_LIMIT_SECONDS"
        ));
        assert!(matches!(
            load(&[("TIME_LIMIT_SECONDS", "0")]),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(matches!(
            load(&[("INSTANCE_SIZES", "50,lots")]),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_storage_layout() {
        let config = load(&[("HARNESS_WORK_DIR", "/w")]).unwrap();
        let id: InstanceId = "25_25_R_0".parse().unwrap();
        assert_eq!(
            config.storage.output_path(&id, "exact_gurobi"),
            PathBuf::from("/w/logs/25_25_R_0_exact_gurobi.out")
        );
        assert_eq!(
            config.storage.rendered_path(&id, "exact_gurobi", "pdf"),
            PathBuf::from("/w/pdf/25_25_R_0_exact_gurobi.pdf")
        );
    }

    #[test]
    fn test_relative_work_dir_is_anchored_once() {
        let config = load(&[("HARNESS_WORK_DIR", "bench"), ("PDF_PATH", "out/pdf")]).unwrap();
        let cwd = env::current_dir().unwrap();

        assert_eq!(config.storage.work_dir, cwd.join("bench"));
        assert_eq!(config.storage.instances_path, cwd.join("bench/instances"));
        assert_eq!(config.storage.pdf_path, cwd.join("out/pdf"));
        assert_eq!(
            config.toolchain.verifier_command,
            vec![cwd.join("bench/_verifier").to_string_lossy().into_owned()]
        );
    }
}
