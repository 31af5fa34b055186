//! MatchJudge - Evaluation harness for geometric bipartite-matching solvers
//!
//! This library drives a family of exact and heuristic solver programs over
//! generated point-set instances and reports how far each heuristic strays
//! from the exact baseline.
//!
//! # Features
//!
//! - Compilation of solver, generator and verifier sources
//! - Deterministic instance generation with a manifest
//! - Wall-clock limited execution with TLE/RTE/WA classification
//! - External verification of every output
//! - Worst-case approximation ratios against the exact baseline
//! - pgfplots diagrams of small instances and their matchings
//!
//! # Architecture
//!
//! - **Benchmark**: the evaluation pipeline and its subprocess adapters
//! - **Render**: diagram document model and LaTeX rendering
//! - **Models**: instances, solutions and the solver roster

pub mod benchmark;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod render;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, AppResult};
